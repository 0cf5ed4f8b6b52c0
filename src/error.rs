use thiserror::Error;

/// Everything that can stop a schema document from turning into types.
///
/// Each variant is scoped to the document being processed; callers working
/// through a batch report the error and move on to the next input.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid JSON, or a schema keyword with a shape we can't decode
    /// (e.g. an unknown `type` name).
    #[error("failed to decode schema at `{path}`: {message}")]
    Decode { path: String, message: String },

    #[error("unresolved $ref {reference:?}: {reason}")]
    UnresolvedReference {
        reference: String,
        reason: RefFailure,
    },

    #[error("cyclic $ref {reference:?}: the reference chain leads back to itself")]
    CyclicReference { reference: String },

    /// A struct-like type was requested for a node without a title, id or
    /// description to name it after.
    #[error("schema at `{pointer}` has no title, id or description to name its type")]
    AnonymousType { pointer: String },

    #[error("cannot merge zero oneOf alternatives for {parent:?}")]
    Merge { parent: String },

    #[error(transparent)]
    Emission(#[from] EmitError),
}

/// Why a `$ref` could not be followed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefFailure {
    #[error("segment {segment:?} not found in document")]
    MissingSegment { segment: String },

    #[error("expected an object or array at segment {segment:?}, found {found}")]
    NotAContainer { segment: String, found: &'static str },

    #[error("target is a mapping of schemas, not a schema")]
    NotASchema,

    #[error("target is not a valid schema: {message}")]
    Decode { message: String },
}

/// Failures while handing rendered types to their destination.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write {destination}: {source}")]
    Io {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    #[error("formatter `{command}` failed: {message}")]
    Formatter { command: String, message: String },
}

impl EmitError {
    pub(crate) fn io(destination: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            destination: destination.into(),
            source,
        }
    }
}
