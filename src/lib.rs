//! Generate statically typed data definitions (Go structs, Rust serde
//! models) from JSON Schema documents.
//!
//! A document goes through four stages:
//!
//! 1. [`schema`]: decode bytes into a typed [`Schema`] tree.
//! 2. [`resolve`]: replace every `$ref` with the node it points at.
//! 3. [`synth`]: walk the resolved tree, producing a [`TypeExpr`] per node
//!    and registering named declarations along the way.
//! 4. [`emit`]: write the declarations of a successful document to a stream
//!    or to one file per type.
//!
//! [`Generator`] runs all four for a batch of documents, sharing one
//! [`Registry`] so a type is only ever emitted once per run.
pub mod emit;
pub mod error;
pub mod ir;
pub mod naming;
pub mod path_de;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod settings;
pub mod synth;
pub mod target;

pub use emit::{Destination, Emitter};
pub use error::{EmitError, Error, RefFailure};
pub use ir::{DeclKind, Field, TypeDecl, TypeExpr};
pub use naming::Naming;
pub use registry::{Emission, Registry};
pub use resolve::{ResolvedDocument, resolve};
pub use schema::{Schema, SchemaDocument, SchemaType};
pub use settings::Settings;
pub use synth::Synthesizer;
pub use target::{Target, TargetKind};

use tracing::debug;

/// Batch driver: owns the naming rules, registry and writer for one run.
pub struct Generator {
    naming: Naming,
    registry: Registry,
    emitter: Emitter,
    comments: bool,
    root_type: Option<String>,
}

impl Generator {
    pub fn new(settings: Settings, destination: Destination) -> Self {
        let target = settings.target.target();
        Self {
            naming: Naming::new(settings.replacements),
            registry: Registry::new(target),
            emitter: Emitter::new(target, destination, settings.package, settings.format),
            comments: settings.comments,
            root_type: settings.root_type,
        }
    }

    /// Decode and generate one document from raw bytes.
    pub fn generate(&mut self, bytes: &[u8]) -> Result<TypeExpr, Error> {
        let document = SchemaDocument::from_slice(bytes)?;
        self.generate_document(&document)
    }

    /// Generate one document. Its types are written only if the whole
    /// document synthesizes; on failure nothing of it is emitted and its
    /// names stay free for later documents.
    pub fn generate_document(&mut self, document: &SchemaDocument) -> Result<TypeExpr, Error> {
        let synthesized = resolve(document).and_then(|mut resolved| {
            if let Some(root_type) = &self.root_type {
                resolved.name_anonymous_root(root_type);
            }
            Synthesizer::new(&self.naming, &mut self.registry, self.comments)
                .synthesize_document(&resolved)
        });

        let root = match synthesized {
            Ok(root) => root,
            Err(err) => {
                self.registry.rollback();
                return Err(err);
            }
        };

        let emissions = self.registry.commit();
        debug!(types = emissions.len(), "document synthesized");
        for emission in &emissions {
            self.emitter.write(emission)?;
        }
        Ok(root)
    }

    /// Flush anything the writer still holds. Call once after the batch.
    pub fn finish(&mut self) -> Result<(), Error> {
        Ok(self.emitter.finish()?)
    }

    /// Number of distinct types emitted so far.
    pub fn emitted(&self) -> usize {
        self.registry.emitted()
    }
}
