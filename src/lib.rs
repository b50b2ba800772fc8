//! Middle end of a Fortran 2018 compiler front-end.
//!
//! Two tightly-coupled subsystems:
//!
//! - the **mod-file engine** (`modfile`): deterministic serialization of
//!   module and submodule interfaces to checksummed `.mod` artifacts,
//!   and rehydration of those artifacts into symbol scopes;
//! - the **control-flow lowering engine** (`lower` + `fir`): a two-stage
//!   transformation from the parse tree of a subprogram body to a typed,
//!   block-structured IR of basic blocks within nested regions.
//!
//! The lexer, general parser, full name resolution, and expression
//! typing are external collaborators; this crate fixes their interfaces
//! and ships defaults for the narrow subset the mod-file engine needs.

pub mod ast;
pub mod context;
pub mod diag;
pub mod expr;
pub mod fir;
pub mod lower;
pub mod modfile;
pub mod resolve;
pub mod symbols;
pub mod symtab;
pub mod types;

pub use context::SemanticsContext;
pub use lower::lower_program;
pub use modfile::{ModFileReader, ModFileWriter};
pub use symtab::ScopeId;

/// Writes mod files for every module under the global scope. Returns
/// false when the pass accumulated a fatal diagnostic.
pub fn write_all_mods(context: &mut SemanticsContext) -> bool {
    ModFileWriter::new(context).write_all()
}

/// Reads the mod file for `name` (a submodule when `ancestor` is given)
/// and splices the resulting scope under the correct parent.
pub fn read_mod(
    context: &mut SemanticsContext,
    name: &str,
    ancestor: Option<ScopeId>,
) -> Option<ScopeId> {
    ModFileReader::new(context).read(name, ancestor)
}
