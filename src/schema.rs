//! In-memory JSON Schema nodes.
//!
//! Only the keywords the type synthesizer understands are modeled; any other
//! keyword is ignored on decode. Child maps keep document order (`IndexMap`),
//! consumers sort keys themselves wherever order affects output.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::Error;
use crate::path_de;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Root or nested schema object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, alias = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "SchemaType::is_any")]
    pub kind: SchemaType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, alias = "$defs", skip_serializing_if = "Option::is_none")]
    pub definitions: Option<IndexMap<String, Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_properties: Option<IndexMap<String, Schema>>,

    #[serde(default, rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(default, rename = "const", skip_serializing_if = "Option::is_none")]
    pub const_: Option<Value>,

    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_: Vec<Value>,
}

/// `additionalProperties` is either a flag or the schema of every extra value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

/// The `type` keyword. A missing keyword means [`SchemaType::Any`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SchemaType {
    #[default]
    Any,
    Array,
    Boolean,
    Integer,
    Number,
    Null,
    Object,
    String,
}

/// A decoded document: the typed root plus the untyped mirror of the same
/// bytes, which `$ref` resolution falls back to for out-of-keyword paths.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub root: Schema,
    pub raw: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Schema {
    /// Best available name hint: title, else the last segment of `id`
    /// (extension and punctuation stripped), else description.
    pub fn name(&self) -> String {
        if let Some(title) = non_empty(&self.title) {
            return title.to_string();
        }
        if let Some(from_id) = non_empty(&self.id).map(name_from_id).filter(|n| !n.is_empty()) {
            return from_id;
        }
        non_empty(&self.description).unwrap_or_default().to_string()
    }

    pub fn has_name(&self) -> bool {
        !self.name().is_empty()
    }

    pub fn is_open_map(&self) -> bool {
        matches!(self.additional_properties, Some(AdditionalProperties::Allowed(true)))
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn name_from_id(id: &str) -> String {
    let Some(segment) = id.trim_end_matches('#').rsplit('/').find(|s| !s.is_empty()) else {
        return String::new();
    };
    let keep = |s: &str| s.chars().filter(|c| c.is_alphanumeric()).collect::<String>();
    // `person.json` and `person.schema.json` both name `person`
    let stem = segment.split('.').next().map(keep).unwrap_or_default();
    if stem.is_empty() { keep(segment) } else { stem }
}

impl SchemaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Array => "array",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Null => "null",
            Self::Object => "object",
            Self::String => "string",
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    fn from_keyword(name: &str) -> Option<Self> {
        Some(match name {
            "array" => Self::Array,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "null" => Self::Null,
            "object" => Self::Object,
            "string" => Self::String,
            _ => return None,
        })
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SchemaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SchemaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Keyword {
            One(String),
            Many(Vec<String>),
        }

        let parse = |name: &str| {
            Self::from_keyword(name).ok_or_else(|| {
                serde::de::Error::custom(format!("unknown schema type \"{name}\""))
            })
        };

        match Keyword::deserialize(deserializer)? {
            Keyword::One(name) => parse(&name),
            // ["string", "null"] is a nullable string; nullability isn't modeled
            Keyword::Many(names) => {
                let mut kinds = Vec::with_capacity(names.len());
                for name in &names {
                    let kind = parse(name)?;
                    if kind != Self::Null && !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                Ok(match kinds.as_slice() {
                    [] => Self::Null,
                    [one] => *one,
                    _ => Self::Any,
                })
            }
        }
    }
}

impl SchemaDocument {
    /// Decode a document from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let raw: Value = path_de::from_slice_with_path(bytes)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, Error> {
        let root: Schema = path_de::from_value_with_path(raw.clone())?;
        Ok(Self { root, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn name_prefers_title_then_id_then_description() {
        let schema = parse(json!({ "title": "Pet", "id": "x/dog.json", "description": "d" }));
        assert_eq!(schema.name(), "Pet");

        let schema = parse(json!({ "id": "https://example.com/schemas/person.json" }));
        assert_eq!(schema.name(), "person");

        let schema = parse(json!({ "$id": "https://example.com/schemas/user-profile" }));
        assert_eq!(schema.name(), "userprofile");

        let schema = parse(json!({ "description": "fallback" }));
        assert_eq!(schema.name(), "fallback");

        assert_eq!(Schema::default().name(), "");
        assert!(!parse(json!({ "title": "" })).has_name());
    }

    #[test]
    fn missing_type_is_any() {
        let schema = parse(json!({ "properties": {} }));
        assert_eq!(schema.kind, SchemaType::Any);
    }

    #[test]
    fn type_arrays_drop_null() {
        assert_eq!(parse(json!({ "type": ["string", "null"] })).kind, SchemaType::String);
        assert_eq!(parse(json!({ "type": ["null"] })).kind, SchemaType::Null);
        assert_eq!(parse(json!({ "type": ["string", "integer"] })).kind, SchemaType::Any);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = serde_json::from_value::<Schema>(json!({ "type": "decimal" })).unwrap_err();
        assert!(err.to_string().contains("unknown schema type \"decimal\""));
    }

    #[test]
    fn additional_properties_accepts_flag_or_schema() {
        let open = parse(json!({ "type": "object", "additionalProperties": true }));
        assert!(open.is_open_map());

        let typed = parse(json!({ "additionalProperties": { "type": "integer" } }));
        match typed.additional_properties {
            Some(AdditionalProperties::Schema(inner)) => assert_eq!(inner.kind, SchemaType::Integer),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn defs_alias_definitions() {
        let schema = parse(json!({ "$defs": { "Foo": { "type": "string" } } }));
        assert!(schema.definitions.unwrap().contains_key("Foo"));
    }

    #[test]
    fn serializes_back_without_empty_keywords() {
        let schema = parse(json!({ "title": "Pet", "type": "object", "properties": { "name": { "type": "string" } } }));
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({ "title": "Pet", "type": "object", "properties": { "name": { "type": "string" } } })
        );
    }

    #[test]
    fn document_keeps_raw_mirror() {
        let doc = SchemaDocument::from_slice(br#"{"$special": {"thing": {"type": "string"}}}"#).unwrap();
        assert_eq!(doc.raw["$special"]["thing"]["type"], "string");
        assert_eq!(doc.root.kind, SchemaType::Any);
    }
}
