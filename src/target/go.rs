use super::{provenance_comment, Formatter, Layout, Target, GENERATOR};
use crate::ir::{DeclKind, TypeDecl, TypeExpr};

/// Go structs with `json`/`yaml` tags; flattened groups become embedded
/// fields tagged `,inline`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoTarget;

impl Target for GoTarget {
    fn name(&self) -> &'static str {
        "go"
    }

    fn extension(&self) -> &'static str {
        "go"
    }

    fn header(&self, package: &str, _layout: Layout) -> String {
        format!("// Code generated by {GENERATOR}. DO NOT EDIT.\npackage {package}\n\n")
    }

    fn render(&self, decl: &TypeDecl) -> String {
        let mut out = decl
            .origin
            .as_deref()
            .map(|origin| provenance_comment("//", &decl.name, origin))
            .unwrap_or_default();

        match &decl.kind {
            DeclKind::Struct { fields } => {
                out.push_str(&format!("type {} struct {{\n", decl.name));
                for field in fields {
                    let ty = go_type(&field.ty);
                    match &field.key {
                        Some(key) => out.push_str(&format!(
                            "    {} {ty} `json:\"{key},omitempty\" yaml:\"{key},omitempty\"`\n",
                            field.name
                        )),
                        None => out.push_str(&format!(
                            "    {} {ty} `json:\",inline\" yaml:\",inline\"`\n",
                            field.name
                        )),
                    }
                }
                out.push_str("}\n\n");
            }
            DeclKind::Array { item } => {
                out.push_str(&format!("type {} []{}\n\n", decl.name, go_type(item)));
            }
            DeclKind::Map { value } => {
                out.push_str(&format!("type {} map[string]{}\n\n", decl.name, go_type(value)));
            }
        }
        out
    }

    fn formatter(&self) -> Formatter {
        Formatter {
            program: "gofmt",
            stream_args: &["-s"],
            file_args: &["-s", "-w"],
        }
    }
}

pub fn go_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Bool => "bool".into(),
        TypeExpr::Integer => "int64".into(),
        TypeExpr::Number => "float64".into(),
        TypeExpr::String => "string".into(),
        TypeExpr::Any => "any".into(),
        TypeExpr::Array(item) => format!("[]{}", go_type(item)),
        TypeExpr::Map(value) => format!("map[string]{}", go_type(value)),
        TypeExpr::Named(name) => name.clone(),
        TypeExpr::Ref(name) => format!("*{name}"),
    }
}
