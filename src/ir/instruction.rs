//! The stack-machine instruction set this compiler emits.
//!
//! Only the subset the procedure engine needs is modeled. Each instruction
//! knows the minimum VM version that supports it; lowering consults the gate
//! through [`CompileContext::check_version`](crate::context::CompileContext::check_version).

use std::fmt;

use crate::types::{ProcedureId, SlotId, VmVersion};

/// A single stack-machine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Push an integer constant onto the stack.
    PushInt(u64),
    /// Push a byte-string constant onto the stack.
    PushBytes(Vec<u8>),

    /// Add two integers (pops 2, pushes 1).
    Add,
    /// Subtract two integers (pops 2, pushes 1).
    Sub,
    /// Multiply two integers (pops 2, pushes 1).
    Mul,

    /// Push the contents of a scratch slot.
    Load(SlotId),
    /// Pop the stack top into a scratch slot.
    Store(SlotId),
    /// Pop a slot index and push that slot's contents.
    LoadIndirect,
    /// Pop a value, then a slot index, and store the value into that slot.
    StoreIndirect,

    /// Transfer control to the procedure with the given id. The id is
    /// resolved to an address by the linker, not here.
    CallProc(ProcedureId),
}

impl Instruction {
    /// The lowest VM version at which this instruction exists.
    pub fn min_version(&self) -> VmVersion {
        match self {
            Instruction::PushInt(_)
            | Instruction::PushBytes(_)
            | Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Load(_)
            | Instruction::Store(_) => 2,
            Instruction::CallProc(_) => 4,
            Instruction::LoadIndirect | Instruction::StoreIndirect => 5,
        }
    }

    /// The instruction's mnemonic.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::PushInt(_) => "pushint",
            Instruction::PushBytes(_) => "pushbytes",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mul => "mul",
            Instruction::Load(_) => "load",
            Instruction::Store(_) => "store",
            Instruction::LoadIndirect => "loads",
            Instruction::StoreIndirect => "stores",
            Instruction::CallProc(_) => "callproc",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::PushInt(value) => write!(f, "pushint {}", value),
            Instruction::PushBytes(bytes) => {
                write!(f, "pushbytes 0x")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Instruction::Load(slot) => write!(f, "load {}", slot),
            Instruction::Store(slot) => write!(f, "store {}", slot),
            Instruction::CallProc(id) => write!(f, "callproc {}", id),
            other => write!(f, "{}", other.name()),
        }
    }
}
