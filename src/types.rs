//! Core value and identity types shared across the compiler.
//!
//! Procedure and scratch-slot ids are allocated from process-wide atomic
//! counters. Ids are unique and strictly increasing for the lifetime of the
//! process; they are never reset.

use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// A target VM version.
pub type VmVersion = u8;

/// The version compiled against when no explicit target is given.
pub const DEFAULT_VERSION: VmVersion = 6;

/// Static classification of the value an expression leaves on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackType {
    /// A 64-bit unsigned integer.
    Uint64,
    /// A byte string.
    Bytes,
    /// Unifies with any value-producing type.
    Any,
    /// Produces no value.
    None,
}

impl StackType {
    /// Whether this type produces a value at all.
    pub fn is_value(self) -> bool {
        self != StackType::None
    }

    /// Whether a value of type `other` can occupy storage of this type.
    ///
    /// `Any` unifies with every value-producing type on either side.
    /// `None` never unifies with anything, itself included: a valueless
    /// expression cannot occupy storage.
    pub fn accepts(self, other: StackType) -> bool {
        if self == StackType::None || other == StackType::None {
            return false;
        }
        self == StackType::Any || other == StackType::Any || self == other
    }
}

impl fmt::Display for StackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StackType::Uint64 => "uint64",
            StackType::Bytes => "bytes",
            StackType::Any => "any",
            StackType::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// Unique identity of a procedure definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcedureId(pub u32);

impl fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a scratch-storage cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_PROCEDURE_ID: LazyLock<AtomicU32> = LazyLock::new(|| AtomicU32::new(0));
static NEXT_SLOT_ID: LazyLock<AtomicU32> = LazyLock::new(|| AtomicU32::new(0));

/// Allocates the next procedure id.
pub fn allocate_procedure_id() -> ProcedureId {
    ProcedureId(NEXT_PROCEDURE_ID.fetch_add(1, Ordering::SeqCst))
}

/// Allocates the next scratch-slot id.
///
/// Slot numbering is shared across the whole program under compilation; a
/// slot handed to one variable is never handed out again.
pub fn allocate_slot_id() -> SlotId {
    SlotId(NEXT_SLOT_ID.fetch_add(1, Ordering::SeqCst))
}
