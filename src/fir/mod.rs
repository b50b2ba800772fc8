//! Typed, block-structured intermediate representation.
//!
//! ## Concepts
//!
//! - Procedures are the units of lowering; a `Program` is a set of them.
//! - Regions group the blocks of one structured construct; they form a
//!   tree per procedure.
//! - Blocks are maximal straight-line statement sequences ended by
//!   exactly one terminator.
//! - Statements live in a per-procedure arena and refer to one another
//!   by `StmtId`; branch targets are `BlockId`s.
//!
//! The builder keeps an insertion cursor (current region and block) and
//! maintains predecessor sets as terminators are inserted.

pub mod builder;
pub mod format;
pub mod model;
pub mod verify;

pub use builder::FirBuilder;
pub use model::*;
pub use verify::verify_procedure;
