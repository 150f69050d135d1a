//! Call-site argument and call-node lowering.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Expr, ExprRef, ScratchVar};
use crate::context::CompileContext;
use crate::error::{CompileError, CompileResult};
use crate::ir::{Instruction, InstructionBlock};
use crate::procedure::definition::{ParamKind, ProcedureDefinition};
use crate::types::StackType;

/// A call-site argument.
///
/// The two variants mirror the two parameter kinds: a value argument is an
/// expression evaluated at the call site and copied into callee-local
/// storage; a reference argument is a caller-owned variable passed by
/// address.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(ExprRef),
    Reference(ScratchVar),
}

impl Arg {
    /// The parameter kind this argument satisfies.
    pub fn kind(&self) -> ParamKind {
        match self {
            Arg::Value(_) => ParamKind::Value,
            Arg::Reference(_) => ParamKind::Reference,
        }
    }

    fn validate(&self, name: &str, index: usize) -> CompileResult<()> {
        match self {
            // A reference argument has no static value to check: its slot
            // index is always pushable.
            Arg::Reference(_) => Ok(()),
            Arg::Value(expr) => {
                if expr.type_of() == StackType::None {
                    return Err(CompileError::ValuelessArgument {
                        name: name.to_string(),
                        index,
                    });
                }
                Ok(())
            }
        }
    }

    /// The instructions pushing this argument onto the caller's stack: the
    /// lowered value itself, or the storage slot's index for a reference.
    fn push_block(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        match self {
            Arg::Value(expr) => expr.lower(ctx),
            Arg::Reference(var) => var.index_expr().lower(ctx),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(expr) => write!(f, "{}", expr),
            Arg::Reference(var) => write!(f, "{}", var),
        }
    }
}

/// A call expression referencing a definition and its concrete arguments.
///
/// Participates in expression lowering like any other node. Stateless after
/// construction.
#[derive(Debug)]
pub struct ProcedureCall {
    target: Arc<ProcedureDefinition>,
    args: Vec<Arg>,
}

impl ProcedureCall {
    pub(crate) fn new(target: Arc<ProcedureDefinition>, args: Vec<Arg>) -> CompileResult<Self> {
        for (index, arg) in args.iter().enumerate() {
            arg.validate(target.name(), index)?;
        }
        Ok(Self { target, args })
    }

    /// The definition this call targets.
    pub fn target(&self) -> &Arc<ProcedureDefinition> {
        &self.target
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Wraps the call for composition into a larger expression tree.
    pub fn into_expr(self) -> ExprRef {
        Arc::new(self)
    }
}

impl Expr for ProcedureCall {
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        let call = Instruction::CallProc(self.target.id());
        ctx.check_version(call.min_version(), call.name())?;

        let mut block = InstructionBlock::new();
        for arg in &self.args {
            block.extend(arg.push_block(ctx)?);
        }
        block.push(call);
        Ok(block)
    }

    fn type_of(&self) -> StackType {
        self.target.return_type()
    }

    fn has_return(&self) -> bool {
        // A call is an expression, not a control-flow return.
        false
    }
}

impl fmt::Display for ProcedureCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(call \"{}\"", self.target.name())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}
