//! Constant-value nodes.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Expr, ExprRef};
use crate::context::CompileContext;
use crate::error::CompileResult;
use crate::ir::{Instruction, InstructionBlock};
use crate::types::StackType;

/// An integer constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Int {
    value: u64,
}

/// Creates an integer constant node.
pub fn int(value: u64) -> ExprRef {
    Arc::new(Int { value })
}

impl Expr for Int {
    fn lower(&self, _ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        Ok(InstructionBlock::single(Instruction::PushInt(self.value)))
    }

    fn type_of(&self) -> StackType {
        StackType::Uint64
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(int {})", self.value)
    }
}

/// A byte-string constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteString {
    bytes: Vec<u8>,
}

/// Creates a byte-string constant node.
pub fn byte_string(bytes: impl Into<Vec<u8>>) -> ExprRef {
    Arc::new(ByteString {
        bytes: bytes.into(),
    })
}

impl Expr for ByteString {
    fn lower(&self, _ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        Ok(InstructionBlock::single(Instruction::PushBytes(
            self.bytes.clone(),
        )))
    }

    fn type_of(&self) -> StackType {
        StackType::Bytes
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(bytes 0x")?;
        for byte in &self.bytes {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}
