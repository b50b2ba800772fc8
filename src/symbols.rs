//! Symbols: named declarations with attributes and a details payload.
//!
//! A symbol's declaring scope is fixed at creation. Its details may be
//! refined in place (e.g. `Misc` becoming `ObjectEntity` once a type is
//! seen) but never change category after the semantic pass completes.

use std::fmt::{Display, Formatter, Result};

use crate::expr::Expression;
use crate::symtab::{ScopeId, SymbolId};
use crate::types::DeclTypeSpec;

/// A source occurrence of a name. The offset is the byte position of the
/// declaring occurrence and drives declaration-order mod-file emission.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceName {
    pub text: String,
    pub offset: usize,
}

impl SourceName {
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }
}

impl Display for SourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.text)
    }
}

/// The closed attribute enumeration, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Attr {
    Abstract,
    Allocatable,
    Asynchronous,
    BindC,
    Contiguous,
    Deferred,
    Elemental,
    External,
    Impure,
    IntentIn,
    IntentInOut,
    IntentOut,
    Intrinsic,
    NoPass,
    Optional,
    Parameter,
    Pass,
    Pointer,
    Private,
    Protected,
    Public,
    Pure,
    Recursive,
    Save,
    Target,
    Value,
    Volatile,
}

pub const ALL_ATTRS: [Attr; 27] = [
    Attr::Abstract,
    Attr::Allocatable,
    Attr::Asynchronous,
    Attr::BindC,
    Attr::Contiguous,
    Attr::Deferred,
    Attr::Elemental,
    Attr::External,
    Attr::Impure,
    Attr::IntentIn,
    Attr::IntentInOut,
    Attr::IntentOut,
    Attr::Intrinsic,
    Attr::NoPass,
    Attr::Optional,
    Attr::Parameter,
    Attr::Pass,
    Attr::Pointer,
    Attr::Private,
    Attr::Protected,
    Attr::Public,
    Attr::Pure,
    Attr::Recursive,
    Attr::Save,
    Attr::Target,
    Attr::Value,
    Attr::Volatile,
];

impl Display for Attr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            Attr::Abstract => "abstract",
            Attr::Allocatable => "allocatable",
            Attr::Asynchronous => "asynchronous",
            Attr::BindC => "bind(c)",
            Attr::Contiguous => "contiguous",
            Attr::Deferred => "deferred",
            Attr::Elemental => "elemental",
            Attr::External => "external",
            Attr::Impure => "impure",
            Attr::IntentIn => "intent(in)",
            Attr::IntentInOut => "intent(inout)",
            Attr::IntentOut => "intent(out)",
            Attr::Intrinsic => "intrinsic",
            Attr::NoPass => "nopass",
            Attr::Optional => "optional",
            Attr::Parameter => "parameter",
            Attr::Pass => "pass",
            Attr::Pointer => "pointer",
            Attr::Private => "private",
            Attr::Protected => "protected",
            Attr::Public => "public",
            Attr::Pure => "pure",
            Attr::Recursive => "recursive",
            Attr::Save => "save",
            Attr::Target => "target",
            Attr::Value => "value",
            Attr::Volatile => "volatile",
        };
        write!(f, "{}", text)
    }
}

/// A set of attributes, iterable in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attrs(u32);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of(attrs: &[Attr]) -> Self {
        let mut result = Self::new();
        for &attr in attrs {
            result.insert(attr);
        }
        result
    }

    pub fn insert(&mut self, attr: Attr) {
        self.0 |= 1 << attr as u32;
    }

    pub fn remove(&mut self, attr: Attr) {
        self.0 &= !(1 << attr as u32);
    }

    pub fn test(&self, attr: Attr) -> bool {
        self.0 & (1 << attr as u32) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Attr> + '_ {
        ALL_ATTRS.iter().copied().filter(|attr| self.test(*attr))
    }
}

/// Flags orthogonal to attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Flag {
    /// Symbol was loaded from a mod file; the writer skips it.
    ModFile,
    /// Synthetic parent-type component; the writer skips it.
    ParentComp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    pub fn insert(&mut self, flag: Flag) {
        self.0 |= 1 << flag as u8;
    }

    pub fn test(&self, flag: Flag) -> bool {
        self.0 & (1 << flag as u8) != 0
    }
}

// --- Details payloads ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleDetails {
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmoduleDetails {
    pub scope: Option<ScopeId>,
    /// Immediate parent: a module or submodule scope.
    pub parent: ScopeId,
    /// Root module at the top of the parent chain.
    pub ancestor: ScopeId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedTypeDetails {
    pub param_names: Vec<SourceName>,
    pub sequence: bool,
    pub extends: Option<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubprogramDetails {
    pub is_function: bool,
    pub is_interface: bool,
    pub dummy_args: Vec<SymbolId>,
    pub result: Option<SymbolId>,
    pub bind_name: Option<Expression>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcInterface {
    pub symbol: Option<SymbolId>,
    pub type_spec: Option<DeclTypeSpec>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcEntityDetails {
    pub interface: ProcInterface,
    pub pass_name: Option<String>,
    pub bind_name: Option<Expression>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectEntityDetails {
    pub type_spec: Option<DeclTypeSpec>,
    pub shape: Vec<ShapeSpec>,
    pub init: Option<Expression>,
    pub bind_name: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParamAttr {
    Kind,
    Len,
}

impl Display for TypeParamAttr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TypeParamAttr::Kind => write!(f, "kind"),
            TypeParamAttr::Len => write!(f, "len"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDetails {
    pub type_spec: Option<DeclTypeSpec>,
    pub attr: TypeParamAttr,
    pub init: Option<Expression>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamelistDetails {
    pub objects: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonBlockDetails {
    pub objects: Vec<SymbolId>,
    pub bind_name: Option<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericKind {
    Name,
    DefinedOp,
    Assignment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericDetails {
    pub kind: GenericKind,
    pub specific_procs: Vec<SymbolId>,
    /// A specific procedure with the same name as the generic, if any.
    pub specific: Option<SymbolId>,
    /// A derived type with the same name as the generic, if any.
    pub derived_type: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseDetails {
    /// The module the association came from.
    pub module: SymbolId,
    /// The symbol in that module.
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UseErrorDetails {
    /// Names of the modules involved in the failed or ambiguous use.
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcBindingDetails {
    /// The procedure bound to this name.
    pub symbol: SymbolId,
    pub pass_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericBindingDetails {
    pub specific_procs: Vec<SymbolId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinalProcDetails;

#[derive(Debug, Clone, PartialEq)]
pub struct HostAssocDetails {
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiscDetails;

#[derive(Debug, Clone, PartialEq)]
pub enum Details {
    Module(ModuleDetails),
    Submodule(SubmoduleDetails),
    DerivedType(DerivedTypeDetails),
    Subprogram(SubprogramDetails),
    ProcEntity(ProcEntityDetails),
    ObjectEntity(ObjectEntityDetails),
    TypeParam(TypeParamDetails),
    Namelist(NamelistDetails),
    CommonBlock(CommonBlockDetails),
    Generic(GenericDetails),
    Use(UseDetails),
    UseError(UseErrorDetails),
    ProcBinding(ProcBindingDetails),
    GenericBinding(GenericBindingDetails),
    FinalProc(FinalProcDetails),
    HostAssoc(HostAssocDetails),
    Misc(MiscDetails),
}

impl Details {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Details::Module(_) => "Module",
            Details::Submodule(_) => "Submodule",
            Details::DerivedType(_) => "DerivedType",
            Details::Subprogram(_) => "Subprogram",
            Details::ProcEntity(_) => "ProcEntity",
            Details::ObjectEntity(_) => "ObjectEntity",
            Details::TypeParam(_) => "TypeParam",
            Details::Namelist(_) => "Namelist",
            Details::CommonBlock(_) => "CommonBlock",
            Details::Generic(_) => "Generic",
            Details::Use(_) => "Use",
            Details::UseError(_) => "UseError",
            Details::ProcBinding(_) => "ProcBinding",
            Details::GenericBinding(_) => "GenericBinding",
            Details::FinalProc(_) => "FinalProc",
            Details::HostAssoc(_) => "HostAssoc",
            Details::Misc(_) => "Misc",
        }
    }
}

/// Array dimension bounds as written in a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Explicit(Expression),
    /// `*` (assumed size).
    Assumed,
    /// `:` (deferred).
    Deferred,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSpec {
    pub lower: Bound,
    pub upper: Bound,
}

impl ShapeSpec {
    /// `lo:hi` with an explicit or deferred pair.
    pub fn new(lower: Bound, upper: Bound) -> Self {
        Self { lower, upper }
    }

    /// `..` (assumed rank).
    pub fn assumed_rank() -> Self {
        Self {
            lower: Bound::Assumed,
            upper: Bound::Assumed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    name: SourceName,
    owner: ScopeId,
    pub attrs: Attrs,
    pub flags: Flags,
    /// Child scope for modules, submodules, derived types, subprograms.
    pub scope: Option<ScopeId>,
    pub details: Details,
}

impl Symbol {
    pub fn new(name: SourceName, owner: ScopeId, attrs: Attrs, details: Details) -> Self {
        Self {
            name,
            owner,
            attrs,
            flags: Flags::default(),
            scope: None,
            details,
        }
    }

    pub fn name(&self) -> &SourceName {
        &self.name
    }

    pub fn owner(&self) -> ScopeId {
        self.owner
    }

    pub fn test(&self, flag: Flag) -> bool {
        self.flags.test(flag)
    }

    pub fn set(&mut self, flag: Flag) {
        self.flags.insert(flag);
    }

    pub fn is_namelist(&self) -> bool {
        matches!(self.details, Details::Namelist(_))
    }

    /// The declared type, for the detail kinds that carry one.
    pub fn type_spec(&self) -> Option<&DeclTypeSpec> {
        match &self.details {
            Details::ObjectEntity(details) => details.type_spec.as_ref(),
            Details::TypeParam(details) => details.type_spec.as_ref(),
            _ => None,
        }
    }

    /// The `bind(c, name=...)` expression, for the detail kinds that carry one.
    pub fn bind_name(&self) -> Option<&Expression> {
        match &self.details {
            Details::ObjectEntity(details) => details.bind_name.as_ref(),
            Details::ProcEntity(details) => details.bind_name.as_ref(),
            Details::Subprogram(details) => details.bind_name.as_ref(),
            Details::CommonBlock(details) => details.bind_name.as_ref(),
            _ => None,
        }
    }
}
