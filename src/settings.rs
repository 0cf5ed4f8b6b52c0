//! Settings that control code generation behavior.

use crate::target::TargetKind;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Output language.
    pub target: TargetKind,

    /// Package/module label written into every generated header.
    pub package: String,

    /// Pipe generated code through the target's formatter.
    pub format: bool,

    /// Prefix each type with a comment holding its originating schema.
    pub comments: bool,

    /// Extra `(from, to)` abbreviation pairs for identifiers, applied after
    /// the built-in ones.
    pub replacements: Vec<(String, String)>,

    /// Title given to a document root that has no name of its own.
    pub root_type: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: TargetKind::Go,
            package: "main".to_string(),
            format: false,
            comments: false,
            replacements: Vec::new(),
            root_type: None,
        }
    }
}
