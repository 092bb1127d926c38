/// A movie as the remote catalog describes it.
///
/// # Catalog Framework
/// `Movie` is a typed view over an [`Entity`](catalog_framework::Entity); it owns
/// nothing and reads the entity's current attributes on every call. Listing
/// results carry only `Title`, `Year`, `imdbID`, `Type` and `Poster`, so most
/// getters return `None` until the detail record has been merged.
use catalog_framework::Entity;
use serde::Serialize;
use serde_json::Value;

/// Placeholder the catalog uses for fields it has no value for.
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy)]
pub struct Movie<'a> {
    entity: &'a Entity,
}

impl<'a> Movie<'a> {
    pub fn new(entity: &'a Entity) -> Self {
        Self { entity }
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    pub fn title(&self) -> Option<String> {
        self.text("Title")
    }

    pub fn year(&self) -> Option<String> {
        self.text("Year")
    }

    pub fn rating(&self) -> Option<String> {
        self.text("Rated")
    }

    pub fn director(&self) -> Option<String> {
        self.text("Director")
    }

    /// Actors, split on the catalog's `", "` separator.
    pub fn cast(&self) -> Vec<String> {
        self.text("Actors")
            .map(|actors| actors.split(", ").map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn description(&self) -> Option<String> {
        self.text("Plot")
    }

    /// Poster URL; `None` when the catalog reports it as unavailable.
    pub fn image(&self) -> Option<String> {
        self.text("Poster").filter(|poster| poster != NOT_AVAILABLE)
    }

    pub fn score(&self) -> Option<String> {
        self.text("tomatoMeter")
    }

    /// `movie`, `series` or `episode`.
    pub fn kind(&self) -> Option<String> {
        self.text("Type")
    }

    pub fn is_full(&self) -> bool {
        self.entity.is_full()
    }

    fn text(&self, key: &str) -> Option<String> {
        match self.entity.get(key)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// One line of the search results list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRow {
    pub id: String,
    pub title: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
    pub description: Option<String>,
    pub cast: Vec<String>,
    pub image: Option<String>,
    pub full: bool,
}

impl MovieRow {
    /// Projection handed to the results [`ViewBinder`](catalog_framework::ViewBinder).
    pub fn project(entity: &Entity) -> Self {
        let movie = Movie::new(entity);
        Self {
            id: movie.id().to_string(),
            title: movie.title(),
            year: movie.year(),
            rating: movie.rating(),
            description: movie.description(),
            cast: movie.cast(),
            image: movie.image(),
            full: movie.is_full(),
        }
    }
}
