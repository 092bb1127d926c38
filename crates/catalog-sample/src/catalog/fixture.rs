//! # Fixture Catalog
//!
//! An in-memory movie catalog that answers with the same payload shapes as the
//! remote movie API:
//!
//! - search: `{"Search": [..abbreviated records..], "totalResults": "2", "Response": "True"}`
//! - detail: the full record plus `"Response": "True"`
//!
//! Searches match titles case-insensitively on a substring. An unknown id is a
//! transport failure, as the remote API would answer it with an error status.

use async_trait::async_trait;
use catalog_framework::{CatalogError, CatalogSource};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

/// Fields the remote API includes in a search listing.
const LISTING_FIELDS: [&str; 5] = ["Title", "Year", "imdbID", "Type", "Poster"];

#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    movies: Vec<Map<String, Value>>,
    latency: Option<Duration>,
}

impl FixtureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one full movie record. Non-object values are ignored.
    pub fn with_movie(mut self, record: Value) -> Self {
        if let Value::Object(record) = record {
            self.movies.push(record);
        }
        self
    }

    /// Delays every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// A small catalog used by the demo and the integration tests.
    pub fn classics() -> Self {
        Self::new()
            .with_movie(json!({
                "imdbID": "tt0113277", "Title": "Heat", "Year": "1995", "Type": "movie",
                "Rated": "R", "Director": "Michael Mann",
                "Actors": "Al Pacino, Robert De Niro, Val Kilmer",
                "Plot": "A group of high-end professional thieves start to feel the heat from the LAPD.",
                "Poster": "https://img.example.com/heat.jpg", "tomatoMeter": "87"
            }))
            .with_movie(json!({
                "imdbID": "tt0122690", "Title": "Ronin", "Year": "1998", "Type": "movie",
                "Rated": "R", "Director": "John Frankenheimer",
                "Actors": "Robert De Niro, Jean Reno, Natascha McElhone",
                "Plot": "A freelancing former US intelligence agent tries to track down a mysterious package.",
                "Poster": "N/A", "tomatoMeter": "68"
            }))
            .with_movie(json!({
                "imdbID": "tt0120737", "Title": "The Lord of the Rings: The Fellowship of the Ring",
                "Year": "2001", "Type": "movie", "Rated": "PG-13", "Director": "Peter Jackson",
                "Actors": "Elijah Wood, Ian McKellen, Orlando Bloom",
                "Plot": "A meek Hobbit from the Shire and eight companions set out on a journey.",
                "Poster": "https://img.example.com/fellowship.jpg", "tomatoMeter": "91"
            }))
            .with_movie(json!({
                "imdbID": "tt0167261", "Title": "The Lord of the Rings: The Two Towers",
                "Year": "2002", "Type": "movie", "Rated": "PG-13", "Director": "Peter Jackson",
                "Actors": "Elijah Wood, Ian McKellen, Viggo Mortensen",
                "Plot": "While Frodo and Sam edge closer to Mordor, the divided fellowship fights on.",
                "Poster": "https://img.example.com/towers.jpg", "tomatoMeter": "95"
            }))
            .with_movie(json!({
                "imdbID": "tt0078748", "Title": "Alien", "Year": "1979", "Type": "movie",
                "Rated": "R", "Director": "Ridley Scott",
                "Actors": "Sigourney Weaver, Tom Skerritt, John Hurt",
                "Plot": "The crew of a commercial spacecraft encounters a deadly lifeform.",
                "Poster": "https://img.example.com/alien.jpg", "tomatoMeter": "98"
            }))
    }

    async fn settle(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn abbreviate(record: &Map<String, Value>) -> Value {
        let listing: Map<String, Value> = LISTING_FIELDS
            .iter()
            .filter_map(|&field| record.get(field).map(|v| (field.to_string(), v.clone())))
            .collect();
        Value::Object(listing)
    }
}

fn title_of(record: &Map<String, Value>) -> &str {
    record.get("Title").and_then(Value::as_str).unwrap_or_default()
}

#[async_trait]
impl CatalogSource for FixtureCatalog {
    async fn search(&mut self, term: &str) -> Result<Value, CatalogError> {
        self.settle().await;
        let needle = term.to_lowercase();
        let results: Vec<Value> = self
            .movies
            .iter()
            .filter(|m| title_of(m).to_lowercase().contains(&needle))
            .map(Self::abbreviate)
            .collect();
        debug!(%term, hits = results.len(), "Fixture search");
        Ok(json!({
            "Search": results,
            "totalResults": results.len().to_string(),
            "Response": "True"
        }))
    }

    async fn detail(&mut self, id: &str) -> Result<Value, CatalogError> {
        self.settle().await;
        let record = self
            .movies
            .iter()
            .find(|m| m.get("imdbID").and_then(Value::as_str) == Some(id))
            .ok_or_else(|| CatalogError::Transport(format!("Incorrect IMDb ID: {id}")))?;
        let mut full = record.clone();
        full.insert("Response".to_string(), json!("True"));
        Ok(Value::Object(full))
    }
}
