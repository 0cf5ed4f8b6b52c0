//! `$ref` resolution.
//!
//! Produces a new, fully dereferenced tree from a [`SchemaDocument`]; the
//! parsed tree is never mutated. A reference is followed through the typed
//! keywords (`definitions`, `$defs`, `properties`, `patternProperties`,
//! `items`) first. When a segment falls outside of those, the whole path is
//! walked again over the raw JSON mirror and the value found there is decoded
//! as a fresh schema, so out-of-keyword locations such as
//! `#/$special/thing` still resolve.
//!
//! Referents are resolved recursively. A reference met again while it is
//! still being resolved is a cycle and is rejected.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, RefFailure};
use crate::path_de;
use crate::schema::{AdditionalProperties, Schema, SchemaDocument};

/// A document whose every reachable node has been dereferenced. Type
/// synthesis only accepts this form.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    root: Schema,
}

impl ResolvedDocument {
    pub fn root(&self) -> &Schema {
        &self.root
    }

    /// Give a nameless root a title.
    pub fn name_anonymous_root(&mut self, title: &str) {
        if !self.root.has_name() && !title.is_empty() {
            self.root.title = Some(title.to_string());
        }
    }
}

pub fn resolve(document: &SchemaDocument) -> Result<ResolvedDocument, Error> {
    let mut resolver = Resolver {
        document,
        active: Vec::new(),
    };
    let root = resolver.resolve_node(&document.root)?;
    Ok(ResolvedDocument { root })
}

struct Resolver<'a> {
    document: &'a SchemaDocument,
    /// References currently being followed, outermost first.
    active: Vec<String>,
}

#[derive(Clone, Copy)]
enum Cursor<'a> {
    Node(&'a Schema),
    Map(&'a IndexMap<String, Schema>),
}

enum Located<'a> {
    /// Found in the typed graph; `label` is the map key that led there.
    Typed { node: &'a Schema, label: Option<&'a str> },
    Raw(Schema),
}

/// Who names a nameless referent reached through a typed map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelSource {
    /// The key it was found under (`#/definitions/Foo` names `Foo`).
    TargetKey,
    /// The referring site; a property key is applied by the caller.
    Referrer,
}

impl<'a> Resolver<'a> {
    fn resolve_node(&mut self, node: &Schema) -> Result<Schema, Error> {
        self.resolve_with(node, LabelSource::TargetKey)
    }

    fn resolve_with(
        &mut self,
        node: &Schema,
        label_source: LabelSource,
    ) -> Result<Schema, Error> {
        if let Some(reference) = &node.reference {
            return self.follow(node, reference, label_source);
        }

        let mut out = Schema {
            properties: None,
            pattern_properties: None,
            items: None,
            one_of: Vec::new(),
            additional_properties: None,
            ..node.clone()
        };

        if let Some(properties) = &node.properties {
            let mut resolved = IndexMap::with_capacity(properties.len());
            for (key, child) in properties {
                let mut child = self.resolve_with(child, LabelSource::Referrer)?;
                if !child.has_name() {
                    child.title = Some(key.clone());
                }
                resolved.insert(key.clone(), child);
            }
            out.properties = Some(resolved);
        }

        if let Some(patterns) = &node.pattern_properties {
            let mut resolved = IndexMap::with_capacity(patterns.len());
            for (pattern, child) in patterns {
                resolved.insert(pattern.clone(), self.resolve_node(child)?);
            }
            out.pattern_properties = Some(resolved);
        }

        if let Some(items) = &node.items {
            out.items = Some(Box::new(self.resolve_node(items)?));
        }

        for alternative in &node.one_of {
            let resolved = self.resolve_node(alternative)?;
            out.one_of.push(resolved);
        }

        out.additional_properties = match &node.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(AdditionalProperties::Schema(
                Box::new(self.resolve_node(schema)?),
            )),
            other => other.clone(),
        };

        Ok(out)
    }

    fn follow(
        &mut self,
        from: &Schema,
        reference: &str,
        label_source: LabelSource,
    ) -> Result<Schema, Error> {
        if self.active.iter().any(|active| active == reference) {
            return Err(Error::CyclicReference {
                reference: reference.to_string(),
            });
        }
        self.active.push(reference.to_string());
        let result = self.follow_inner(from, reference, label_source);
        self.active.pop();
        result
    }

    fn follow_inner(
        &mut self,
        from: &Schema,
        reference: &str,
        label_source: LabelSource,
    ) -> Result<Schema, Error> {
        let segments: Vec<String> = reference.split('/').map(unescape).collect();
        let terminal = segments
            .iter()
            .rev()
            .find(|s| !s.is_empty() && s.as_str() != "#")
            .cloned()
            .unwrap_or_default();

        match self.locate(from, reference, &segments)? {
            Located::Typed { node, label } => {
                debug!(reference, "resolved $ref through schema keywords");
                let mut resolved = self.resolve_with(node, label_source)?;
                let label = label.filter(|_| label_source == LabelSource::TargetKey);
                if let Some(label) = label.filter(|_| !resolved.has_name()) {
                    resolved.title = Some(label.to_string());
                }
                Ok(resolved)
            }
            Located::Raw(schema) => {
                debug!(reference, "resolved $ref through raw document");
                let mut resolved = self.resolve_node(&schema)?;
                if !resolved.has_name() {
                    // best-effort label from the document path
                    resolved.description = Some(terminal);
                }
                Ok(resolved)
            }
        }
    }

    /// Walk `segments` starting at `from`, the node carrying the reference.
    fn locate<'b>(
        &self,
        from: &'b Schema,
        reference: &str,
        segments: &'b [String],
    ) -> Result<Located<'b>, Error>
    where
        'a: 'b,
    {
        let document: &'a SchemaDocument = self.document;
        let root: &'b Schema = &document.root;
        let mut cursor = Cursor::Node(from);
        let mut label = None;

        for segment in segments {
            label = None;
            let next = match (segment.as_str(), cursor) {
                ("#", _) => Some(Cursor::Node(root)),
                ("definitions" | "$defs", Cursor::Node(node)) => {
                    node.definitions.as_ref().map(Cursor::Map)
                }
                ("properties", Cursor::Node(node)) => node.properties.as_ref().map(Cursor::Map),
                ("patternProperties", Cursor::Node(node)) => {
                    node.pattern_properties.as_ref().map(Cursor::Map)
                }
                ("items", Cursor::Node(node)) => node.items.as_deref().map(Cursor::Node),
                (key, Cursor::Map(map)) => map.get_key_value(key).map(|(key, node)| {
                    label = Some(key.as_str());
                    Cursor::Node(node)
                }),
                _ => None,
            };
            match next {
                Some(next) => cursor = next,
                // out-of-keyword path: retry the whole reference on the raw mirror
                None => return self.locate_raw(reference, segments).map(Located::Raw),
            }
        }

        match cursor {
            Cursor::Node(node) => Ok(Located::Typed { node, label }),
            Cursor::Map(_) => Err(unresolved(reference, RefFailure::NotASchema)),
        }
    }

    fn locate_raw(&self, reference: &str, segments: &[String]) -> Result<Schema, Error> {
        let mut cursor = &self.document.raw;
        for segment in segments.iter().filter(|s| !s.is_empty() && s.as_str() != "#") {
            let next = match cursor {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                other => {
                    return Err(unresolved(
                        reference,
                        RefFailure::NotAContainer {
                            segment: segment.clone(),
                            found: kind_of(other),
                        },
                    ));
                }
            };
            cursor = next.ok_or_else(|| {
                unresolved(
                    reference,
                    RefFailure::MissingSegment {
                        segment: segment.clone(),
                    },
                )
            })?;
        }

        path_de::from_value_with_path(cursor.clone()).map_err(|err| {
            unresolved(
                reference,
                RefFailure::Decode {
                    message: err.to_string(),
                },
            )
        })
    }
}

fn unresolved(reference: &str, reason: RefFailure) -> Error {
    Error::UnresolvedReference {
        reference: reference.to_string(),
        reason,
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
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
