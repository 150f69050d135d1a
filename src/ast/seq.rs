//! The sequencing combinator.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Expr, ExprRef};
use crate::context::CompileContext;
use crate::error::{CompileError, CompileResult};
use crate::ir::InstructionBlock;
use crate::types::StackType;

/// Evaluates an ordered list of expressions for effect, yielding the last
/// one's value.
///
/// Every non-final expression must produce no value: anything it left on the
/// stack would corrupt the stack discipline of whatever follows. A
/// single-element sequence collapses to that element, so wrapping adds no
/// node.
#[derive(Debug)]
pub struct Seq {
    exprs: Vec<ExprRef>,
}

impl Seq {
    /// Composes `exprs` into one expression.
    pub fn new(mut exprs: Vec<ExprRef>) -> CompileResult<ExprRef> {
        if exprs.len() == 1 {
            return Ok(exprs.remove(0));
        }
        if let Some((_, rest)) = exprs.split_last() {
            for (index, expr) in rest.iter().enumerate() {
                if expr.type_of().is_value() {
                    return Err(CompileError::SequenceValue {
                        index,
                        found: expr.type_of(),
                    });
                }
            }
        }
        Ok(Arc::new(Self { exprs }))
    }
}

impl Expr for Seq {
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        let mut block = InstructionBlock::new();
        for expr in &self.exprs {
            block.extend(expr.lower(ctx)?);
        }
        Ok(block)
    }

    fn type_of(&self) -> StackType {
        self.exprs
            .last()
            .map(|expr| expr.type_of())
            .unwrap_or(StackType::None)
    }

    fn has_return(&self) -> bool {
        self.exprs
            .last()
            .map(|expr| expr.has_return())
            .unwrap_or(false)
    }
}

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(seq")?;
        for expr in &self.exprs {
            write!(f, " {}", expr)?;
        }
        write!(f, ")")
    }
}
