//! Expression AST nodes and the lowering seam.
//!
//! Every node implements [`Expr`]: it can lower itself into an ordered
//! instruction block, report the static type of the value it leaves on the
//! stack, and report whether it ends in a return. Nodes are shared as
//! [`ExprRef`] so compiled bodies and scratch handles can appear in more
//! than one tree.

pub mod binary;
pub mod literal;
pub mod scratch;
pub mod seq;

pub use binary::{BinaryExpr, BinaryOp};
pub use literal::{byte_string, int};
pub use scratch::{ScratchSlot, ScratchVar};
pub use seq::Seq;

use std::fmt;
use std::sync::Arc;

use crate::context::CompileContext;
use crate::error::CompileResult;
use crate::ir::InstructionBlock;
use crate::types::StackType;

/// A value-producing AST node.
pub trait Expr: fmt::Debug + fmt::Display + Send + Sync {
    /// Lowers this node into target VM instructions.
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock>;

    /// The static type of the value this node leaves on the stack.
    fn type_of(&self) -> StackType;

    /// Whether every path through this node ends in a return.
    fn has_return(&self) -> bool;
}

/// A shared, immutable expression node.
pub type ExprRef = Arc<dyn Expr>;
