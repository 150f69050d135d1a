//! Procedure definitions, the calling convention, and call-site lowering.
//!
//! A [`ProcedureDefinition`] is created once at binding time and validated
//! up front. Each call expression wraps validated arguments into a
//! [`ProcedureCall`]. The first time a declaration is needed, the
//! calling-convention algorithm in [`convention`] runs exactly once and the
//! resulting [`ProcedureDeclaration`] is cached on the definition for every
//! later use.

pub mod binder;
pub mod call;
pub mod convention;
pub mod declaration;
pub mod definition;

pub use binder::{Procedure, ProcedureBuilder};
pub use call::{Arg, ProcedureCall};
pub use convention::ParamBinding;
pub use declaration::ProcedureDeclaration;
pub use definition::{Param, ParamKind, ProcedureDefinition};
