// Language-neutral type IR produced by synthesis. Targets render it to source.

/// The type a schema node denotes at its use site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Bool,
    Integer,                 // 64-bit
    Number,                  // double precision
    String,
    Any,                     // untyped JSON value
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>),      // string keys
    Named(String),           // a declared type, used by value
    Ref(String),             // a declared struct, used through a pointer/box
}

/// One named type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: DeclKind,
    /// Pretty-printed originating schema, for the provenance comment.
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Struct { fields: Vec<Field> },
    Array { item: TypeExpr },
    Map { value: TypeExpr },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,        // identifier in PascalCase form
    pub key: Option<String>, // serialized key; None for flattened groups
    pub ty: TypeExpr,
}

impl TypeExpr {
    pub fn open_map() -> Self {
        Self::Map(Box::new(Self::Any))
    }

    /// The declared name behind a bare named type (`Named`/`Ref`); composite
    /// and primitive expressions have none.
    pub fn named_base(&self) -> Option<&str> {
        match self {
            Self::Named(name) | Self::Ref(name) => Some(name),
            _ => None,
        }
    }
}
