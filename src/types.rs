//! Declared type specifications.
//!
//! The writer renders these in canonical lowercase form; the kind
//! parameter is omitted when it equals the category's default so that
//! `integer` round-trips as `integer`, not `integer(4)`.

use std::fmt::{Display, Formatter, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Integer,
    Real,
    Complex,
    Character,
    Logical,
}

impl TypeCategory {
    pub fn default_kind(self) -> i64 {
        match self {
            TypeCategory::Character => 1,
            _ => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeCategory::Integer => "integer",
            TypeCategory::Real => "real",
            TypeCategory::Complex => "complex",
            TypeCategory::Character => "character",
            TypeCategory::Logical => "logical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclTypeSpec {
    Intrinsic { category: TypeCategory, kind: i64 },
    /// `type(name)`
    Derived { name: String },
    /// `class(name)`
    ClassDerived { name: String },
    /// `class(*)`
    ClassStar,
    /// `type(*)`
    TypeStar,
}

impl DeclTypeSpec {
    pub fn intrinsic(category: TypeCategory, kind: i64) -> Self {
        DeclTypeSpec::Intrinsic { category, kind }
    }

    pub fn default_integer() -> Self {
        Self::intrinsic(TypeCategory::Integer, TypeCategory::Integer.default_kind())
    }

    pub fn default_logical() -> Self {
        Self::intrinsic(TypeCategory::Logical, TypeCategory::Logical.default_kind())
    }
}

impl Display for DeclTypeSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DeclTypeSpec::Intrinsic { category, kind } => {
                if *kind == category.default_kind() {
                    write!(f, "{}", category.name())
                } else {
                    write!(f, "{}({})", category.name(), kind)
                }
            }
            DeclTypeSpec::Derived { name } => write!(f, "type({})", name),
            DeclTypeSpec::ClassDerived { name } => write!(f, "class({})", name),
            DeclTypeSpec::ClassStar => write!(f, "class(*)"),
            DeclTypeSpec::TypeStar => write!(f, "type(*)"),
        }
    }
}
