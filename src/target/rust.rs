use convert_case::{Case, Casing};

use super::{provenance_comment, Formatter, Layout, Target, GENERATOR};
use crate::ir::{DeclKind, Field, TypeDecl, TypeExpr};

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

// cannot be raw identifiers
const RESERVED: &[&str] = &["crate", "self", "Self", "super"];

/// Serde structs. Every field is optional; flattened groups become
/// `#[serde(flatten)]` options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTarget;

impl Target for RustTarget {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn extension(&self) -> &'static str {
        "rs"
    }

    fn header(&self, package: &str, layout: Layout) -> String {
        let mut out = format!(
            "// Code generated by {GENERATOR}. DO NOT EDIT.\n// module: {package}\n\n\
             #[allow(unused_imports)]\nuse serde::{{Deserialize, Serialize}};\n"
        );
        if layout == Layout::FilePerType {
            // siblings live in the same parent module
            out.push_str("#[allow(unused_imports)]\nuse super::*;\n");
        }
        out.push('\n');
        out
    }

    fn render(&self, decl: &TypeDecl) -> String {
        let mut out = decl
            .origin
            .as_deref()
            .map(|origin| provenance_comment("//", &decl.name, origin))
            .unwrap_or_default();

        match &decl.kind {
            DeclKind::Struct { fields } => {
                out.push_str("#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]\n");
                out.push_str(&format!("pub struct {} {{\n", decl.name));
                for field in fields {
                    render_field(&mut out, field);
                }
                out.push_str("}\n\n");
            }
            DeclKind::Array { item } => {
                out.push_str(&format!("pub type {} = {};\n\n", decl.name, rust_type(item)));
            }
            DeclKind::Map { value } => {
                out.push_str(&format!(
                    "pub type {} = std::collections::BTreeMap<String, {}>;\n\n",
                    decl.name,
                    rust_type(value)
                ));
            }
        }
        out
    }

    fn formatter(&self) -> Formatter {
        Formatter {
            program: "rustfmt",
            stream_args: &["--edition", "2021", "--emit", "stdout"],
            file_args: &["--edition", "2021"],
        }
    }
}

fn render_field(out: &mut String, field: &Field) {
    let ty = rust_type(&field.ty);
    match &field.key {
        Some(key) => {
            let ident = field_ident(key);
            let plain = ident.strip_prefix("r#").unwrap_or(&ident);
            if plain == key {
                out.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
            } else {
                out.push_str(&format!(
                    "    #[serde(rename = {key:?}, default, skip_serializing_if = \"Option::is_none\")]\n"
                ));
            }
            out.push_str(&format!("    pub {ident}: Option<{ty}>,\n"));
        }
        None => {
            out.push_str("    #[serde(flatten)]\n");
            out.push_str(&format!("    pub {}: Option<{ty}>,\n", field_ident(&field.name)));
        }
    }
}

pub fn rust_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Bool => "bool".into(),
        TypeExpr::Integer => "i64".into(),
        TypeExpr::Number => "f64".into(),
        TypeExpr::String => "String".into(),
        TypeExpr::Any => "serde_json::Value".into(),
        TypeExpr::Array(item) => format!("Vec<{}>", rust_type(item)),
        TypeExpr::Map(value) => format!("std::collections::BTreeMap<String, {}>", rust_type(value)),
        TypeExpr::Named(name) => name.clone(),
        // boxed so self-referencing structs have a size
        TypeExpr::Ref(name) => format!("Box<{name}>"),
    }
}

/// snake_case field identifier for a serialized key.
pub fn field_ident(key: &str) -> String {
    let words: String = key
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let ident = words.trim().to_case(Case::Snake);
    if ident.is_empty() {
        "field_".to_string()
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else if RESERVED.contains(&ident.as_str()) {
        format!("{ident}_")
    } else if KEYWORDS.contains(&ident.as_str()) {
        format!("r#{ident}")
    } else {
        ident
    }
}
