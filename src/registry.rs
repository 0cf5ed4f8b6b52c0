//! Per-run registry of emitted type names.
//!
//! Types are rendered when registered and staged per document. A document's
//! staged types are only released (see [`Registry::commit`]) once its whole
//! synthesis succeeded; a failed document rolls its staging back, leaving no
//! partial type set behind.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ir::TypeDecl;
use crate::target::Target;

/// One rendered named type, ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub name: String,
    pub source: String,
}

pub struct Registry {
    target: &'static dyn Target,
    committed: HashMap<String, String>,
    pending: IndexMap<String, Emission>,
}

impl Registry {
    pub fn new(target: &'static dyn Target) -> Self {
        Self {
            target,
            committed: HashMap::new(),
            pending: IndexMap::new(),
        }
    }

    /// Render and stage `decl` unless its name was already seen this run.
    /// Returns whether it was new. A different body under a known name is
    /// dropped with a warning; the first definition wins.
    pub fn register(&mut self, decl: &TypeDecl) -> bool {
        let source = self.target.render(decl);
        let known = self
            .committed
            .get(&decl.name)
            .or_else(|| self.pending.get(&decl.name).map(|e| &e.source));
        if let Some(known) = known {
            if *known != source {
                warn!(name = %decl.name, "type name collision, keeping the first definition");
            } else {
                debug!(name = %decl.name, "type already emitted");
            }
            return false;
        }
        self.pending.insert(
            decl.name.clone(),
            Emission {
                name: decl.name.clone(),
                source,
            },
        );
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.committed.contains_key(name) || self.pending.contains_key(name)
    }

    /// Release staged types in registration order and mark them emitted.
    pub fn commit(&mut self) -> Vec<Emission> {
        let staged: Vec<Emission> = self.pending.drain(..).map(|(_, e)| e).collect();
        for emission in &staged {
            self.committed.insert(emission.name.clone(), emission.source.clone());
        }
        staged
    }

    /// Forget staged types of a failed document.
    pub fn rollback(&mut self) {
        if !self.pending.is_empty() {
            debug!(discarded = self.pending.len(), "rolling back staged types");
        }
        self.pending.clear();
    }

    pub fn emitted(&self) -> usize {
        self.committed.len()
    }
}
