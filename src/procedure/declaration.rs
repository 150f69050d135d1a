//! The compiled body of a procedure.

use std::fmt;

use crate::ast::{Expr, ExprRef};
use crate::context::CompileContext;
use crate::error::CompileResult;
use crate::ir::InstructionBlock;
use crate::types::{ProcedureId, StackType};

/// A procedure's fully compiled body, built once per definition and reused
/// at every call site.
///
/// The body already contains the argument-binding prologue, so lowering
/// delegates to it entirely. The declaration carries its definition's id and
/// name rather than the definition itself: the definition caches the
/// declaration, and a strong back-reference would close a cycle the cache
/// could never drop.
#[derive(Debug)]
pub struct ProcedureDeclaration {
    id: ProcedureId,
    name: String,
    body: ExprRef,
}

impl ProcedureDeclaration {
    pub(crate) fn new(id: ProcedureId, name: String, body: ExprRef) -> Self {
        Self { id, name, body }
    }

    /// The id of the definition this declaration was compiled from.
    pub fn procedure_id(&self) -> ProcedureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &ExprRef {
        &self.body
    }
}

impl Expr for ProcedureDeclaration {
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        self.body.lower(ctx)
    }

    fn type_of(&self) -> StackType {
        self.body.type_of()
    }

    fn has_return(&self) -> bool {
        self.body.has_return()
    }
}

impl fmt::Display for ProcedureDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(declaration \"{}\" {})", self.name, self.body)
    }
}
