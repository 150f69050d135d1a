//! Ordered instruction blocks produced by lowering.

use std::fmt;

use crate::ir::Instruction;

/// The ordered result of lowering one expression.
///
/// Blocks concatenate: a parent node lowers its children and extends its own
/// block with theirs, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstructionBlock {
    instructions: Vec<Instruction>,
}

impl InstructionBlock {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    /// Creates a block holding a single instruction.
    pub fn single(instruction: Instruction) -> Self {
        Self {
            instructions: vec![instruction],
        }
    }

    /// Appends one instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Appends every instruction of `other`, preserving order.
    pub fn extend(&mut self, other: InstructionBlock) {
        self.instructions.extend(other.instructions);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Consumes the block, yielding its instructions.
    pub fn into_vec(self) -> Vec<Instruction> {
        self.instructions
    }
}

impl FromIterator<Instruction> for InstructionBlock {
    fn from_iter<T: IntoIterator<Item = Instruction>>(iter: T) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for InstructionBlock {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

impl fmt::Display for InstructionBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, instruction) in self.instructions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", instruction)?;
        }
        Ok(())
    }
}
