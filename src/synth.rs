//! Type synthesis: resolved schema nodes → [`TypeExpr`]s, registering a
//! named declaration for every struct, named array and named map on the way.
//!
//! Every map whose iteration order shows up in the output (properties,
//! pattern properties, oneOf groups) is walked in sorted key order, so the
//! generated code doesn't depend on the document's key order.
mod merge;

use std::borrow::Cow;

use indexmap::IndexMap;
use tracing::warn;

use crate::error::Error;
use crate::ir::{DeclKind, Field, TypeDecl, TypeExpr};
use crate::naming::{self, Naming};
use crate::registry::Registry;
use crate::resolve::ResolvedDocument;
use crate::schema::{AdditionalProperties, Schema, SchemaType};

pub struct Synthesizer<'a> {
    naming: &'a Naming,
    registry: &'a mut Registry,
    comments: bool,
    /// JSON pointer segments of the node being synthesized.
    pointer: Vec<String>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(naming: &'a Naming, registry: &'a mut Registry, comments: bool) -> Self {
        Self {
            naming,
            registry,
            comments,
            pointer: Vec::new(),
        }
    }

    /// Synthesize the top-level type of a resolved document.
    pub fn synthesize_document(&mut self, document: &ResolvedDocument) -> Result<TypeExpr, Error> {
        self.synthesize(document.root())
    }

    pub fn synthesize(&mut self, node: &Schema) -> Result<TypeExpr, Error> {
        match node.kind {
            SchemaType::Object => self.object(node),
            SchemaType::Array => self.array(node),
            SchemaType::Any => self.any(node),
            SchemaType::Boolean => Ok(TypeExpr::Bool),
            SchemaType::Integer => Ok(TypeExpr::Integer),
            SchemaType::Number => Ok(TypeExpr::Number),
            SchemaType::Null => Ok(TypeExpr::Any),
            SchemaType::String => Ok(TypeExpr::String),
        }
    }

    fn object(&mut self, node: &Schema) -> Result<TypeExpr, Error> {
        if let Some(properties) = &node.properties {
            let fields = self.fields(properties)?;
            let name = self.type_name(node)?;
            self.register(node, &name, DeclKind::Struct { fields });
            return Ok(TypeExpr::Ref(name));
        }

        if let Some(patterns) = &node.pattern_properties {
            return self.pattern_map(node, patterns);
        }

        match &node.additional_properties {
            Some(AdditionalProperties::Schema(values)) => {
                let values = in_context(values, &node.name(), "Value");
                let value = self.descend("additionalProperties", |s| s.synthesize(&values))?;
                Ok(TypeExpr::Map(Box::new(value)))
            }
            // `additionalProperties: true`, or an object with no shape at all
            _ => Ok(TypeExpr::open_map()),
        }
    }

    /// Struct fields for `properties`, sorted by key.
    fn fields(&mut self, properties: &IndexMap<String, Schema>) -> Result<Vec<Field>, Error> {
        let mut keys: Vec<&String> = properties.keys().collect();
        keys.sort();

        let mut fields = Vec::with_capacity(keys.len());
        for key in keys {
            let ty = self.descend(format!("properties/{}", escape(key)), |s| {
                s.synthesize(&properties[key])
            })?;
            fields.push(Field {
                name: self.naming.to_identifier(key),
                key: Some(key.clone()),
                ty,
            });
        }
        Ok(fields)
    }

    fn pattern_map(
        &mut self,
        node: &Schema,
        patterns: &IndexMap<String, Schema>,
    ) -> Result<TypeExpr, Error> {
        let mut keys: Vec<&String> = patterns.keys().collect();
        keys.sort();

        let context = node.name();
        let mut value: Option<TypeExpr> = None;
        let mut mixed = false;
        for key in keys {
            let pattern = in_context(&patterns[key], &context, "Value");
            let ty = self.descend(format!("patternProperties/{}", escape(key)), |s| {
                s.synthesize(&pattern)
            })?;
            if value.is_none() {
                value = Some(ty);
            } else if value.as_ref() != Some(&ty) {
                mixed = true;
            }
        }

        let value = match value {
            Some(_) if mixed => {
                warn!(pointer = %self.pointer(), "pattern properties disagree on their value type, using an open map");
                return Ok(TypeExpr::open_map());
            }
            Some(value) => value,
            None => return Ok(TypeExpr::open_map()),
        };

        match value.named_base() {
            Some(base) => {
                let name = format!("{base}Map");
                self.register(node, &name, DeclKind::Map { value });
                Ok(TypeExpr::Named(name))
            }
            None => Ok(TypeExpr::Map(Box::new(value))),
        }
    }

    fn array(&mut self, node: &Schema) -> Result<TypeExpr, Error> {
        let item = match &node.items {
            Some(items) => {
                let items = in_context(items, &node.name(), "Item");
                self.descend("items", |s| s.synthesize(&items))?
            }
            None => TypeExpr::Any,
        };

        let mut name = self.naming.to_identifier(&node.name());
        if name.is_empty() {
            if let Some(base) = item.named_base() {
                name = naming::plural(base);
            }
        }
        if name.is_empty() {
            return Ok(TypeExpr::Array(Box::new(item)));
        }

        self.register(node, &name, DeclKind::Array { item });
        Ok(TypeExpr::Named(name))
    }

    fn any(&mut self, node: &Schema) -> Result<TypeExpr, Error> {
        if !node.one_of.is_empty() {
            return self.merge(node, &node.one_of);
        }
        // closed sets aren't modeled; they degrade to plain strings
        if node.const_.is_some() || !node.enum_.is_empty() {
            return Ok(TypeExpr::String);
        }
        Ok(TypeExpr::Any)
    }

    // ————————————————————————————————————————————————————————————————————
    // helpers
    // ————————————————————————————————————————————————————————————————————

    fn type_name(&self, node: &Schema) -> Result<String, Error> {
        self.identifier(&node.name())
    }

    /// Identifier for a named type; empty names are an error.
    fn identifier(&self, raw: &str) -> Result<String, Error> {
        let name = self.naming.to_identifier(raw);
        if name.is_empty() {
            return Err(Error::AnonymousType {
                pointer: self.pointer(),
            });
        }
        Ok(name)
    }

    fn register(&mut self, node: &Schema, name: &str, kind: DeclKind) {
        let origin = if self.comments {
            serde_json::to_string_pretty(node).ok()
        } else {
            None
        };
        self.registry.register(&TypeDecl {
            name: name.to_string(),
            kind,
            origin,
        });
    }

    fn descend<T>(
        &mut self,
        segment: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.pointer.push(segment.into());
        let out = f(self);
        self.pointer.pop();
        out
    }

    fn pointer(&self) -> String {
        if self.pointer.is_empty() {
            "#".to_string()
        } else {
            format!("#/{}", self.pointer.join("/"))
        }
    }
}

/// Whether synthesizing `node` registers a struct and so needs a name.
fn declares_struct(node: &Schema) -> bool {
    match node.kind {
        SchemaType::Object => node.properties.is_some(),
        SchemaType::Any => node.one_of.len() > 1,
        _ => false,
    }
}

/// A nameless struct-declaring child of a named node is titled
/// `<context><suffix>`, e.g. the items of `animals` become `animalsItem`.
/// Anything else is used as is.
fn in_context<'n>(node: &'n Schema, context: &str, suffix: &str) -> Cow<'n, Schema> {
    if node.has_name() || context.is_empty() || !declares_struct(node) {
        return Cow::Borrowed(node);
    }
    Cow::Owned(Schema {
        title: Some(format!("{context}{suffix}")),
        ..node.clone()
    })
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Emission;
    use crate::resolve::resolve;
    use crate::schema::SchemaDocument;
    use crate::target::TargetKind;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn run_with(registry: &mut Registry, comments: bool, schema: Value) -> Result<TypeExpr, Error> {
        let naming = Naming::default();
        let document = SchemaDocument::from_value(schema).unwrap();
        let resolved = resolve(&document).unwrap();
        Synthesizer::new(&naming, registry, comments).synthesize_document(&resolved)
    }

    fn run(schema: Value) -> (Result<TypeExpr, Error>, Vec<Emission>) {
        let mut registry = Registry::new(TargetKind::Go.target());
        let result = run_with(&mut registry, false, schema);
        (result, registry.commit())
    }

    fn names(emissions: &[Emission]) -> Vec<&str> {
        emissions.iter().map(|e| e.name.as_str()).collect()
    }

    fn pet() -> Value {
        json!({
            "title": "Pet",
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "id": { "type": "integer" }
            }
        })
    }

    #[test]
    fn object_becomes_struct_with_sorted_fields() {
        let (result, emitted) = run(pet());
        assert_eq!(result.unwrap(), TypeExpr::Ref("Pet".into()));
        assert_eq!(emitted.len(), 1);
        assert_eq!(
            emitted[0].source,
            concat!(
                "type Pet struct {\n",
                "    ID int64 `json:\"id,omitempty\" yaml:\"id,omitempty\"`\n",
                "    Name string `json:\"name,omitempty\" yaml:\"name,omitempty\"`\n",
                "}\n\n",
            )
        );
    }

    #[test]
    fn primitives_map_directly() {
        for (kind, expected) in [
            ("string", TypeExpr::String),
            ("integer", TypeExpr::Integer),
            ("number", TypeExpr::Number),
            ("boolean", TypeExpr::Bool),
            ("null", TypeExpr::Any),
        ] {
            let (result, emitted) = run(json!({ "type": kind }));
            assert_eq!(result.unwrap(), expected, "type {kind}");
            assert!(emitted.is_empty());
        }
    }

    #[test]
    fn enums_degrade_to_string_and_untyped_is_any() {
        assert_eq!(run(json!({ "enum": ["a", "b"] })).0.unwrap(), TypeExpr::String);
        assert_eq!(run(json!({ "const": 3 })).0.unwrap(), TypeExpr::String);
        assert_eq!(run(json!({})).0.unwrap(), TypeExpr::Any);
    }

    #[test]
    fn referenced_items_name_the_array_after_their_element() {
        let (result, emitted) = run(json!({
            "type": "array",
            "items": { "$ref": "#/definitions/Pet" },
            "definitions": { "Pet": pet() }
        }));
        assert_eq!(result.unwrap(), TypeExpr::Named("Pets".into()));
        assert_eq!(names(&emitted), ["Pet", "Pets"]);
        assert_eq!(emitted[1].source, "type Pets []*Pet\n\n");
    }

    #[test]
    fn named_array_keeps_its_own_name() {
        let (result, emitted) = run(json!({
            "title": "tags",
            "type": "array",
            "items": { "type": "string" }
        }));
        assert_eq!(result.unwrap(), TypeExpr::Named("Tags".into()));
        assert_eq!(emitted[0].source, "type Tags []string\n\n");
    }

    #[test]
    fn anonymous_primitive_array_stays_inline() {
        let (result, emitted) = run(json!({ "type": "array", "items": { "type": "integer" } }));
        assert_eq!(result.unwrap(), TypeExpr::Array(Box::new(TypeExpr::Integer)));
        assert!(emitted.is_empty());

        let (result, _) = run(json!({ "type": "array" }));
        assert_eq!(result.unwrap(), TypeExpr::Array(Box::new(TypeExpr::Any)));
    }

    #[test]
    fn reference_synthesizes_like_the_inline_node() {
        let (by_ref, by_ref_emitted) = run(json!({
            "title": "Owner",
            "type": "object",
            "properties": { "pet": { "$ref": "#/definitions/Pet" } },
            "definitions": { "Pet": pet() }
        }));
        let (inline, inline_emitted) = run(json!({
            "title": "Owner",
            "type": "object",
            "properties": { "pet": pet() }
        }));
        assert_eq!(by_ref.unwrap(), inline.unwrap());
        assert_eq!(by_ref_emitted, inline_emitted);
    }

    #[test]
    fn pattern_properties_with_primitive_values_stay_inline() {
        let (result, emitted) = run(json!({
            "type": "object",
            "patternProperties": { "^S_": { "type": "string" } }
        }));
        assert_eq!(result.unwrap(), TypeExpr::Map(Box::new(TypeExpr::String)));
        assert!(emitted.is_empty());
    }

    #[test]
    fn pattern_properties_with_named_values_get_a_map_type() {
        let (result, emitted) = run(json!({
            "type": "object",
            "patternProperties": { ".*": { "$ref": "#/definitions/Pet" } },
            "definitions": { "Pet": pet() }
        }));
        assert_eq!(result.unwrap(), TypeExpr::Named("PetMap".into()));
        assert_eq!(names(&emitted), ["Pet", "PetMap"]);
        assert_eq!(emitted[1].source, "type PetMap map[string]*Pet\n\n");
    }

    #[test]
    fn disagreeing_pattern_properties_fall_back_to_open_map() {
        let (result, _) = run(json!({
            "type": "object",
            "patternProperties": {
                "^s_": { "type": "string" },
                "^i_": { "type": "integer" }
            }
        }));
        assert_eq!(result.unwrap(), TypeExpr::open_map());
    }

    #[test]
    fn additional_properties_shape_the_map() {
        let (result, _) = run(json!({ "type": "object", "additionalProperties": true }));
        assert_eq!(result.unwrap(), TypeExpr::open_map());

        let (result, _) = run(json!({ "type": "object", "additionalProperties": { "type": "integer" } }));
        assert_eq!(result.unwrap(), TypeExpr::Map(Box::new(TypeExpr::Integer)));

        let (result, _) = run(json!({ "type": "object" }));
        assert_eq!(result.unwrap(), TypeExpr::open_map());
    }

    #[test]
    fn one_of_hoists_shared_keys_and_embeds_the_rest() {
        let (result, emitted) = run(json!({
            "title": "Thing",
            "oneOf": [
                { "type": "object", "properties": { "a": { "type": "string" }, "b": { "type": "string" } } },
                { "type": "object", "properties": { "a": { "type": "string" }, "c": { "type": "string" } } }
            ]
        }));
        assert_eq!(result.unwrap(), TypeExpr::Named("Thing".into()));
        assert_eq!(names(&emitted), ["ThingVariant1", "ThingVariant2", "Thing"]);
        assert_eq!(
            emitted[2].source,
            concat!(
                "type Thing struct {\n",
                "    A string `json:\"a,omitempty\" yaml:\"a,omitempty\"`\n",
                "    ThingVariant1 *ThingVariant1 `json:\",inline\" yaml:\",inline\"`\n",
                "    ThingVariant2 *ThingVariant2 `json:\",inline\" yaml:\",inline\"`\n",
                "}\n\n",
            )
        );
        assert!(emitted[0].source.contains("    B string"));
        assert!(emitted[1].source.contains("    C string"));
    }

    #[test]
    fn titled_alternatives_name_their_groups() {
        let (_, emitted) = run(json!({
            "title": "Shape",
            "oneOf": [
                { "title": "Circle", "type": "object", "properties": { "kind": { "type": "string" }, "radius": { "type": "number" } } },
                { "title": "Square", "type": "object", "properties": { "kind": { "type": "string" }, "side": { "type": "number" } } }
            ]
        }));
        assert_eq!(names(&emitted), ["Circle", "Square", "Shape"]);
        assert!(emitted[2].source.contains("    Kind string"));
        assert!(emitted[2].source.contains("    Circle *Circle `json:\",inline\""));
    }

    #[test]
    fn single_alternative_names_itself() {
        let (result, emitted) = run(json!({
            "title": "Wrapper",
            "oneOf": [
                { "title": "Only", "type": "object", "properties": { "x": { "type": "number" } } }
            ]
        }));
        assert_eq!(result.unwrap(), TypeExpr::Ref("Only".into()));
        assert_eq!(names(&emitted), ["Only"]);
    }

    #[test]
    fn zero_alternatives_cannot_merge() {
        let naming = Naming::default();
        let mut registry = Registry::new(TargetKind::Go.target());
        let parent = Schema {
            title: Some("Nothing".into()),
            ..Schema::default()
        };
        let err = Synthesizer::new(&naming, &mut registry, false)
            .merge(&parent, &[])
            .unwrap_err();
        assert!(matches!(err, Error::Merge { parent } if parent == "Nothing"));
    }

    #[test]
    fn nameless_struct_is_an_error_with_its_location() {
        let (result, _) = run(json!({ "type": "object", "properties": { "a": { "type": "string" } } }));
        assert!(matches!(result, Err(Error::AnonymousType { pointer }) if pointer == "#"));

        let (result, _) = run(json!({
            "type": "array",
            "items": { "type": "object", "properties": { "a": { "type": "string" } } }
        }));
        assert!(matches!(result, Err(Error::AnonymousType { pointer }) if pointer == "#/items"));
    }

    #[test]
    fn nameless_item_structs_are_named_after_their_array() {
        let (result, emitted) = run(json!({
            "title": "Zoo",
            "type": "object",
            "properties": {
                "animals": {
                    "type": "array",
                    "items": { "type": "object", "properties": { "n": { "type": "string" } } }
                }
            }
        }));
        assert_eq!(result.unwrap(), TypeExpr::Ref("Zoo".into()));
        assert_eq!(names(&emitted), ["AnimalsItem", "Animals", "Zoo"]);
        assert_eq!(emitted[1].source, "type Animals []*AnimalsItem\n\n");
    }

    #[test]
    fn nameless_map_value_structs_are_named_after_their_map() {
        let (result, emitted) = run(json!({
            "title": "Registry",
            "type": "object",
            "patternProperties": {
                "^[a-z]+$": { "type": "object", "properties": { "port": { "type": "integer" } } }
            }
        }));
        assert_eq!(result.unwrap(), TypeExpr::Named("RegistryValueMap".into()));
        assert_eq!(names(&emitted), ["RegistryValue", "RegistryValueMap"]);

        let (result, emitted) = run(json!({
            "title": "Limits",
            "type": "object",
            "additionalProperties": { "type": "object", "properties": { "max": { "type": "integer" } } }
        }));
        assert_eq!(
            result.unwrap(),
            TypeExpr::Map(Box::new(TypeExpr::Ref("LimitsValue".into())))
        );
        assert_eq!(names(&emitted), ["LimitsValue"]);
    }

    #[test]
    fn nameless_single_alternative_takes_the_parent_name() {
        let (result, emitted) = run(json!({
            "title": "Wrapper",
            "oneOf": [{ "type": "object", "properties": { "x": { "type": "number" } } }]
        }));
        assert_eq!(result.unwrap(), TypeExpr::Ref("Wrapper".into()));
        assert_eq!(names(&emitted), ["Wrapper"]);
    }

    #[test]
    fn anonymous_definition_synthesizes_like_the_inline_node() {
        let address = json!({ "type": "object", "properties": { "city": { "type": "string" } } });
        let (by_ref, by_ref_emitted) = run(json!({
            "title": "Order",
            "type": "object",
            "properties": { "billing": { "$ref": "#/definitions/address" } },
            "definitions": { "address": address.clone() }
        }));
        let (inline, inline_emitted) = run(json!({
            "title": "Order",
            "type": "object",
            "properties": { "billing": address }
        }));
        assert_eq!(by_ref.unwrap(), inline.unwrap());
        assert_eq!(by_ref_emitted, inline_emitted);
        assert_eq!(names(&by_ref_emitted), ["Billing", "Order"]);
    }

    #[test]
    fn repeated_documents_emit_each_type_once() {
        let mut registry = Registry::new(TargetKind::Go.target());
        run_with(&mut registry, false, pet()).unwrap();
        assert_eq!(registry.commit().len(), 1);
        assert_eq!(run_with(&mut registry, false, pet()).unwrap(), TypeExpr::Ref("Pet".into()));
        assert!(registry.commit().is_empty());
    }

    #[test]
    fn comments_carry_the_originating_schema() {
        let mut registry = Registry::new(TargetKind::Go.target());
        run_with(&mut registry, true, pet()).unwrap();
        let emitted = registry.commit();
        assert!(emitted[0].source.starts_with("// Pet defined from schema:\n// {\n"));
        assert!(emitted[0].source.contains("type Pet struct {\n"));
    }
}
