//! # Catalog Configuration
//!
//! Describes the shape of the remote catalog: which field identifies a record and
//! where the records live inside a listing response. Nothing else about the remote
//! schema is known to the framework.

use crate::error::CatalogError;
use crate::transport::Record;
use serde::Deserialize;
use serde_json::Value;

fn default_id_attribute() -> String {
    "id".to_string()
}

fn default_transport_buffer() -> usize {
    32
}

/// Configuration shared by every entity and collection bound to one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// Field of a raw record that holds its stable identifier.
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,

    /// Key under which a listing response stores its record array.
    /// `None` means the listing response is the array itself.
    #[serde(default)]
    pub listing_field: Option<String>,

    /// Capacity of the transport actor's request channel.
    #[serde(default = "default_transport_buffer")]
    pub transport_buffer: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            id_attribute: default_id_attribute(),
            listing_field: None,
            transport_buffer: default_transport_buffer(),
        }
    }
}

impl CatalogConfig {
    pub fn new(id_attribute: impl Into<String>) -> Self {
        Self {
            id_attribute: id_attribute.into(),
            ..Self::default()
        }
    }

    pub fn with_listing_field(mut self, field: impl Into<String>) -> Self {
        self.listing_field = Some(field.into());
        self
    }

    /// Parses a JSON document; missing keys fall back to the defaults.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Extracts the identifier of a raw record.
    ///
    /// Strings are used verbatim and numbers are rendered; anything else is a
    /// parse failure.
    pub fn extract_id(&self, record: &Record) -> Result<String, CatalogError> {
        match record.get(&self.id_attribute) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(CatalogError::Parse(format!(
                "identifier `{}` has unsupported value {other}",
                self.id_attribute
            ))),
            None => Err(CatalogError::Parse(format!(
                "record is missing identifier `{}`",
                self.id_attribute
            ))),
        }
    }

    /// Splits a listing response into raw records, in response order.
    pub fn parse_listing(&self, response: Value) -> Result<Vec<Record>, CatalogError> {
        let items = match (&self.listing_field, response) {
            (Some(field), Value::Object(mut body)) => body.remove(field).ok_or_else(|| {
                CatalogError::Parse(format!("listing response has no `{field}` field"))
            })?,
            (Some(field), other) => {
                return Err(CatalogError::Parse(format!(
                    "expected an object holding `{field}`, got {}",
                    kind_of(&other)
                )))
            }
            (None, value) => value,
        };

        let Value::Array(items) = items else {
            return Err(CatalogError::Parse(format!(
                "expected a record array, got {}",
                kind_of(&items)
            )));
        };

        items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => Ok(record),
                other => Err(CatalogError::Parse(format!(
                    "expected a record object, got {}",
                    kind_of(&other)
                ))),
            })
            .collect()
    }

    /// Validates a detail response as a single record.
    pub fn parse_detail(&self, response: Value) -> Result<Record, CatalogError> {
        match response {
            Value::Object(record) => Ok(record),
            other => Err(CatalogError::Parse(format!(
                "expected a detail object, got {}",
                kind_of(&other)
            ))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movies() -> CatalogConfig {
        CatalogConfig::new("imdbID").with_listing_field("Search")
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = CatalogConfig::from_json(r#"{"id_attribute": "imdbID"}"#).unwrap();
        assert_eq!(config.id_attribute, "imdbID");
        assert_eq!(config.listing_field, None);
        assert_eq!(config.transport_buffer, 32);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(CatalogConfig::from_json("not json").unwrap_err().is_parse());
    }

    #[test]
    fn test_parse_listing_under_field() {
        let response = json!({
            "Search": [{"imdbID": "tt1", "Title": "A"}, {"imdbID": "tt2", "Title": "B"}],
            "Response": "True"
        });
        let records = movies().parse_listing(response).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["Title"], "B");
    }

    #[test]
    fn test_parse_listing_bare_array() {
        let records = CatalogConfig::default()
            .parse_listing(json!([{"id": 7}]))
            .unwrap();
        assert_eq!(CatalogConfig::default().extract_id(&records[0]).unwrap(), "7");
    }

    #[test]
    fn test_parse_listing_missing_field() {
        let err = movies()
            .parse_listing(json!({"Response": "False", "Error": "Movie not found!"}))
            .unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_listing_rejects_non_objects() {
        let err = movies().parse_listing(json!({"Search": [1, 2]})).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_extract_id_errors() {
        let config = movies();
        let missing = json!({"Title": "A"});
        let Value::Object(missing) = missing else { unreachable!() };
        assert!(config.extract_id(&missing).is_err());

        let empty = json!({"imdbID": ""});
        let Value::Object(empty) = empty else { unreachable!() };
        assert!(config.extract_id(&empty).is_err());
    }

    #[test]
    fn test_parse_detail_requires_object() {
        assert!(movies().parse_detail(json!("nope")).unwrap_err().is_parse());
        assert!(movies().parse_detail(json!({"imdbID": "tt1"})).is_ok());
    }
}
