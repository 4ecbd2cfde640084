use serde::Deserialize;
use std::collections::BTreeMap;

/// Wraps the JSON Schema `default` keyword to preserve `null`.
/// Serde deserializes `Option<Value>` with JSON null as `None`; we need to
/// distinguish absent key from `"default": null`.
#[derive(Debug, Default)]
pub enum DefaultKeyword {
    /// Key "default" was absent from the schema.
    #[default]
    Absent,
    /// Key "default" was present; the value may be `Value::Null`.
    Present(serde_json::Value),
}

impl DefaultKeyword {
    /// The raw default value, if the key was present at all.
    pub const fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Absent => None,
            Self::Present(value) => Some(value),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultKeyword {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v: serde_json::Value = Deserialize::deserialize(deserializer)?;
        Ok(DefaultKeyword::Present(v))
    }
}

/// The `type` keyword: a single type name or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TypeField {
    One(String),
    Many(Vec<String>),
}

/// A property's schema value.
///
/// Booleans (and other non-objects) are valid property schemas in JSON
/// Schema; they parse into `Other` and are skipped during generation rather
/// than rejected.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PropertySchema {
    Schema(Box<JsonSchema>),
    Other(serde_json::Value),
}

/// Root or nested JSON Schema object.
///
/// Only the schema fields used by the generator are modeled.
/// Extra keys in the JSON are ignored via serde's default behavior.
/// Uses `BTreeMap` for deterministic property ordering (alphabetical by key).
#[derive(Debug, Deserialize)]
pub struct JsonSchema {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub r#type: Option<TypeField>,

    #[serde(default)]
    pub properties: Option<BTreeMap<String, PropertySchema>>,

    #[serde(default)]
    pub required: Option<Vec<String>>,

    #[serde(default)]
    pub r#enum: Option<Vec<serde_json::Value>>,

    #[serde(default)]
    pub items: Option<Box<JsonSchema>>,

    #[serde(default)]
    pub default: DefaultKeyword,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keyword_absent_vs_null() {
        let absent: JsonSchema =
            serde_json::from_str(r#"{ "type": "string" }"#).expect("valid schema");
        assert!(absent.default.value().is_none());

        let null: JsonSchema =
            serde_json::from_str(r#"{ "type": "string", "default": null }"#).expect("valid schema");
        assert_eq!(null.default.value(), Some(&serde_json::Value::Null));
    }

    #[test]
    fn boolean_property_schema_parses_as_other() {
        let schema: JsonSchema =
            serde_json::from_str(r#"{ "type": "object", "properties": { "anything": true } }"#)
                .expect("boolean property schemas must not fail parsing");
        let properties = schema.properties.expect("properties present");
        assert!(matches!(
            properties.get("anything"),
            Some(PropertySchema::Other(_))
        ));
    }

    #[test]
    fn type_field_accepts_string_or_array() {
        let one: JsonSchema = serde_json::from_str(r#"{ "type": "string" }"#).expect("valid");
        assert!(matches!(one.r#type, Some(TypeField::One(ref t)) if t == "string"));

        let many: JsonSchema =
            serde_json::from_str(r#"{ "type": ["array", "null"] }"#).expect("valid");
        let Some(TypeField::Many(names)) = many.r#type else {
            panic!("expected a type list");
        };
        assert_eq!(names, vec!["array".to_string(), "null".to_string()]);
    }
}
