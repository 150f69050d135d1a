//! Integer arithmetic nodes.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Expr, ExprRef};
use crate::context::CompileContext;
use crate::error::{CompileError, CompileResult};
use crate::ir::{Instruction, InstructionBlock};
use crate::types::StackType;

/// A two-operand arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
}

impl BinaryOp {
    fn instruction(self) -> Instruction {
        match self {
            BinaryOp::Add => Instruction::Add,
            BinaryOp::Sub => Instruction::Sub,
            BinaryOp::Mul => Instruction::Mul,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
        }
    }
}

/// Applies an arithmetic operation to two integer operands.
#[derive(Debug)]
pub struct BinaryExpr {
    op: BinaryOp,
    lhs: ExprRef,
    rhs: ExprRef,
}

impl BinaryExpr {
    /// Builds an arithmetic node, rejecting operands that cannot be integers.
    pub fn new(op: BinaryOp, lhs: ExprRef, rhs: ExprRef) -> CompileResult<ExprRef> {
        for operand in [&lhs, &rhs] {
            if !StackType::Uint64.accepts(operand.type_of()) {
                return Err(CompileError::TypeMismatch {
                    expected: StackType::Uint64,
                    found: operand.type_of(),
                });
            }
        }
        Ok(Arc::new(Self { op, lhs, rhs }))
    }

    pub fn add(lhs: ExprRef, rhs: ExprRef) -> CompileResult<ExprRef> {
        Self::new(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: ExprRef, rhs: ExprRef) -> CompileResult<ExprRef> {
        Self::new(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: ExprRef, rhs: ExprRef) -> CompileResult<ExprRef> {
        Self::new(BinaryOp::Mul, lhs, rhs)
    }
}

impl Expr for BinaryExpr {
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        let mut block = self.lhs.lower(ctx)?;
        block.extend(self.rhs.lower(ctx)?);
        block.push(self.op.instruction());
        Ok(block)
    }

    fn type_of(&self) -> StackType {
        StackType::Uint64
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for BinaryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.op.symbol(), self.lhs, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::literal::{byte_string, int};

    #[test]
    fn add_lowers_operands_then_op() {
        let ctx = CompileContext::default();
        let expr = BinaryExpr::add(int(1), int(2)).unwrap();
        let block = expr.lower(&ctx).unwrap();
        assert_eq!(
            block.instructions(),
            &[
                Instruction::PushInt(1),
                Instruction::PushInt(2),
                Instruction::Add
            ]
        );
    }

    #[test]
    fn rejects_byte_operand() {
        let err = BinaryExpr::mul(int(1), byte_string(vec![0])).unwrap_err();
        assert_eq!(
            err,
            CompileError::TypeMismatch {
                expected: StackType::Uint64,
                found: StackType::Bytes,
            }
        );
    }

    #[test]
    fn display_is_prefix_form() {
        let expr = BinaryExpr::sub(int(5), int(3)).unwrap();
        assert_eq!(format!("{}", expr), "(- (int 5) (int 3))");
    }
}
