//! Procedure compilation for a stack-based virtual machine.
//!
//! This crate lowers a high-level expression tree into stack-machine
//! instructions, centered on its calling convention: arguments move from the
//! caller's stack into callee-local scratch storage, by-reference parameters
//! alias caller storage instead of copying it, and every procedure body is
//! compiled exactly once and reused at every call site. All of it is checked
//! statically: a contract violation fails at definition, invocation, or
//! lowering time, never inside the VM.
//!
//! The typical flow:
//!
//! ```
//! use stackscript::prelude::*;
//!
//! let add = ProcedureBuilder::new("add", StackType::Uint64)
//!     .value_param("a")
//!     .value_param("b")
//!     .build(|params| BinaryExpr::add(params[0].expr(), params[1].expr()))
//!     .unwrap();
//!
//! let program = add.call(vec![Arg::Value(int(1)), Arg::Value(int(2))]).unwrap();
//!
//! let ctx = CompileContext::default();
//! let call_site = program.lower(&ctx).unwrap();
//! let body = add.definition().declaration().unwrap().lower(&ctx).unwrap();
//! assert!(!call_site.is_empty());
//! assert!(!body.is_empty());
//! ```

pub mod ast;
pub mod context;
pub mod error;
pub mod ir;
pub mod procedure;
pub mod types;

pub mod prelude {
    pub use crate::ast::{BinaryExpr, BinaryOp, Expr, ExprRef, ScratchSlot, ScratchVar, Seq};
    pub use crate::ast::literal::{byte_string, int};
    pub use crate::context::CompileContext;
    pub use crate::error::{CompileError, CompileResult};
    pub use crate::ir::{Instruction, InstructionBlock};
    pub use crate::procedure::{
        Arg, Param, ParamBinding, ParamKind, Procedure, ProcedureBuilder, ProcedureCall,
        ProcedureDeclaration, ProcedureDefinition,
    };
    pub use crate::types::{ProcedureId, SlotId, StackType, VmVersion};
}
