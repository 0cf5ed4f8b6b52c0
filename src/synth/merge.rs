//! `oneOf` flattening.
//!
//! Properties shared by more than one alternative are hoisted onto a merged
//! struct named after the parent. Properties owned by a single alternative
//! stay on a per-alternative struct that is embedded into the merged one as
//! a flattened field. Any combination of the groups can therefore be
//! represented, not only the combinations the alternatives spell out.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use super::{Synthesizer, in_context};
use crate::error::Error;
use crate::ir::{DeclKind, Field, TypeExpr};
use crate::schema::{Schema, SchemaType};

impl Synthesizer<'_> {
    pub(super) fn merge(&mut self, parent: &Schema, alternatives: &[Schema]) -> Result<TypeExpr, Error> {
        match alternatives {
            [] => {
                return Err(Error::Merge {
                    parent: parent.name(),
                });
            }
            // the alternative names itself, else takes the parent's name
            [only] => {
                let only = in_context(only, &parent.name(), "");
                return self.descend("oneOf/0", |s| s.synthesize(&only));
            }
            _ => {}
        }

        let parent_name = parent.name();
        let name = self.identifier(&parent_name)?;

        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for alternative in alternatives {
            for key in alternative.properties.iter().flat_map(|p| p.keys()) {
                *occurrences.entry(key.as_str()).or_default() += 1;
            }
        }

        let mut common: IndexMap<String, Schema> = IndexMap::new();
        let mut groups: BTreeMap<String, IndexMap<String, Schema>> = BTreeMap::new();
        for (index, alternative) in alternatives.iter().enumerate() {
            let group = groups.entry(group_name(&parent_name, index, alternative)).or_default();
            for (key, value) in alternative.properties.iter().flatten() {
                if occurrences[key.as_str()] > 1 {
                    common.insert(key.clone(), value.clone());
                } else {
                    group.insert(key.clone(), value.clone());
                }
            }
        }

        let mut fields = self.descend("oneOf", |s| s.fields(&common))?;

        for (group, properties) in groups {
            if properties.is_empty() {
                continue;
            }
            let extension = Schema {
                description: Some(group.clone()),
                kind: SchemaType::Object,
                properties: Some(properties),
                ..Schema::default()
            };
            let ty = self.descend("oneOf", |s| s.synthesize(&extension))?;
            fields.push(Field {
                name: self.naming.to_identifier(&group),
                key: None,
                ty,
            });
        }

        let merged = Schema {
            description: Some(parent_name),
            kind: SchemaType::Object,
            properties: Some(common),
            ..Schema::default()
        };
        self.register(&merged, &name, DeclKind::Struct { fields });
        Ok(TypeExpr::Named(name))
    }
}

fn group_name(parent: &str, index: usize, alternative: &Schema) -> String {
    let name = alternative.name();
    if name.is_empty() {
        format!("{parent}Variant{}", index + 1)
    } else {
        name
    }
}
