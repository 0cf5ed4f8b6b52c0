//! Output languages.
//!
//! A [`Target`] turns one [`TypeDecl`] into source text and knows the file
//! extension, header and formatter of its language. Go is the default; Rust
//! renders serde structs.
pub mod go;
pub mod rust;

use crate::ir::TypeDecl;

pub use go::GoTarget;
pub use rust::RustTarget;

pub const GENERATOR: &str = "json-schemagen";

/// Where rendered types end up; headers differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Everything concatenated on one stream.
    Stream,
    /// One file per type in a shared directory/package.
    FilePerType,
}

/// External source formatter invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    pub program: &'static str,
    /// Arguments for filtering stdin to stdout.
    pub stream_args: &'static [&'static str],
    /// Arguments for rewriting a file in place; the path is appended.
    pub file_args: &'static [&'static str],
}

pub trait Target: Send + Sync {
    /// Target identifier as accepted on the command line.
    fn name(&self) -> &'static str;

    /// File extension for generated files, without the dot.
    fn extension(&self) -> &'static str;

    /// Generated-code banner plus the package/module label.
    fn header(&self, package: &str, layout: Layout) -> String;

    /// Source text for one declaration, provenance comment included.
    fn render(&self, decl: &TypeDecl) -> String;

    fn formatter(&self) -> Formatter;
}

/// Selectable targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TargetKind {
    #[default]
    Go,
    Rust,
}

static GO: GoTarget = GoTarget;
static RUST: RustTarget = RustTarget;

impl TargetKind {
    pub fn target(self) -> &'static dyn Target {
        match self {
            Self::Go => &GO,
            Self::Rust => &RUST,
        }
    }
}

/// Prefix every line of a pretty-printed schema with `marker`.
pub(crate) fn provenance_comment(marker: &str, type_name: &str, origin: &str) -> String {
    let mut out = format!("{marker} {type_name} defined from schema:\n");
    for line in origin.lines() {
        out.push_str(marker);
        out.push(' ');
        out.push_str(line);
        out.push('\n');
    }
    out
}
