//! Scratch storage: indexed slots and the variable handles over them.
//!
//! A [`ScratchVar`] owns one backing slot and comes in two storage modes.
//! `Direct` keeps the value in the slot itself. `Indirect` keeps another
//! slot's index in the slot, and store/load go through that address. This
//! is the dynamic-slot variant the calling convention uses for by-reference
//! parameters, so a callee's own store/load calls transparently alias
//! whatever storage the caller passed.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Expr, ExprRef};
use crate::context::CompileContext;
use crate::error::{CompileError, CompileResult};
use crate::ir::{Instruction, InstructionBlock};
use crate::types::{SlotId, StackType, allocate_slot_id};

/// An indexed cell of VM-local scratch storage.
///
/// Slots are allocated from the program-wide counter and never reused.
#[derive(Debug, PartialEq, Eq)]
pub struct ScratchSlot {
    id: SlotId,
}

impl ScratchSlot {
    /// Allocates a fresh slot.
    pub fn allocate() -> Arc<Self> {
        Arc::new(Self {
            id: allocate_slot_id(),
        })
    }

    pub fn id(&self) -> SlotId {
        self.id
    }
}

impl fmt::Display for ScratchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Direct,
    Indirect,
}

/// A typed handle over scratch storage with store/load primitives.
#[derive(Debug, Clone)]
pub struct ScratchVar {
    slot: Arc<ScratchSlot>,
    ty: StackType,
    storage: Storage,
}

impl ScratchVar {
    /// A variable whose backing slot holds its value directly.
    pub fn new(ty: StackType) -> Self {
        Self {
            slot: ScratchSlot::allocate(),
            ty,
            storage: Storage::Direct,
        }
    }

    /// An aliasing variable: the backing slot holds another slot's index,
    /// and store/load indirect through that address. Accepts any value kind,
    /// since the slot it aliases is not statically known.
    pub fn dynamic() -> Self {
        Self {
            slot: ScratchSlot::allocate(),
            ty: StackType::Any,
            storage: Storage::Indirect,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.storage == Storage::Indirect
    }

    /// The declared type of the value this variable holds.
    pub fn storage_type(&self) -> StackType {
        self.ty
    }

    /// The slot this variable occupies. For a dynamic variable this is the
    /// slot holding the aliased address, not the aliased slot.
    pub fn backing_slot(&self) -> &Arc<ScratchSlot> {
        &self.slot
    }

    pub fn slot_id(&self) -> SlotId {
        self.slot.id()
    }

    /// Expression storing `value` into this variable.
    pub fn store(&self, value: ExprRef) -> CompileResult<ExprRef> {
        if !self.ty.accepts(value.type_of()) {
            return Err(CompileError::TypeMismatch {
                expected: self.ty,
                found: value.type_of(),
            });
        }
        Ok(match self.storage {
            Storage::Direct => Arc::new(SlotStore {
                slot: self.slot.clone(),
                value,
            }),
            Storage::Indirect => Arc::new(IndirectStore {
                index_slot: self.slot.clone(),
                value,
            }),
        })
    }

    /// Expression loading this variable's value.
    pub fn load(&self) -> ExprRef {
        match self.storage {
            Storage::Direct => Arc::new(SlotLoad {
                slot: self.slot.clone(),
                ty: self.ty,
            }),
            Storage::Indirect => Arc::new(IndirectLoad {
                index_slot: self.slot.clone(),
                ty: self.ty,
            }),
        }
    }

    /// Expression producing the index of the slot this variable's value
    /// lives in, which is what a by-reference argument pushes at a call
    /// site. For a dynamic variable that is the aliased address it currently
    /// holds, so references can be forwarded through nested calls.
    pub fn index_expr(&self) -> ExprRef {
        match self.storage {
            Storage::Direct => Arc::new(SlotIndex {
                slot: self.slot.clone(),
            }),
            Storage::Indirect => Arc::new(SlotLoad {
                slot: self.slot.clone(),
                ty: StackType::Uint64,
            }),
        }
    }

    /// Prologue expression consuming the caller-pushed stack top into the
    /// backing slot. For a by-value parameter that picks up the value; for a
    /// by-reference parameter it picks up the passed slot index.
    pub(crate) fn store_from_stack(&self) -> ExprRef {
        Arc::new(StackStore {
            slot: self.slot.clone(),
        })
    }
}

impl fmt::Display for ScratchVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.storage {
            Storage::Direct => write!(f, "(var {})", self.slot),
            Storage::Indirect => write!(f, "(dynamic-var {})", self.slot),
        }
    }
}

/// Loads a slot's contents.
#[derive(Debug)]
struct SlotLoad {
    slot: Arc<ScratchSlot>,
    ty: StackType,
}

impl Expr for SlotLoad {
    fn lower(&self, _ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        Ok(InstructionBlock::single(Instruction::Load(self.slot.id())))
    }

    fn type_of(&self) -> StackType {
        self.ty
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for SlotLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(load {})", self.slot)
    }
}

/// Stores a computed value into a slot.
#[derive(Debug)]
struct SlotStore {
    slot: Arc<ScratchSlot>,
    value: ExprRef,
}

impl Expr for SlotStore {
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        let mut block = self.value.lower(ctx)?;
        block.push(Instruction::Store(self.slot.id()));
        Ok(block)
    }

    fn type_of(&self) -> StackType {
        StackType::None
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for SlotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(store {} {})", self.slot, self.value)
    }
}

/// Stores whatever the caller already left on top of the stack into a slot.
#[derive(Debug)]
struct StackStore {
    slot: Arc<ScratchSlot>,
}

impl Expr for StackStore {
    fn lower(&self, _ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        Ok(InstructionBlock::single(Instruction::Store(self.slot.id())))
    }

    fn type_of(&self) -> StackType {
        StackType::None
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for StackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(store {})", self.slot)
    }
}

/// Pushes a slot's own index as an integer.
#[derive(Debug)]
struct SlotIndex {
    slot: Arc<ScratchSlot>,
}

impl Expr for SlotIndex {
    fn lower(&self, _ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        Ok(InstructionBlock::single(Instruction::PushInt(u64::from(
            self.slot.id().0,
        ))))
    }

    fn type_of(&self) -> StackType {
        StackType::Uint64
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(index {})", self.slot)
    }
}

/// Loads through an address: pushes the contents of the slot whose index is
/// held in `index_slot`.
#[derive(Debug)]
struct IndirectLoad {
    index_slot: Arc<ScratchSlot>,
    ty: StackType,
}

impl Expr for IndirectLoad {
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        let op = Instruction::LoadIndirect;
        ctx.check_version(op.min_version(), op.name())?;
        let mut block = InstructionBlock::single(Instruction::Load(self.index_slot.id()));
        block.push(op);
        Ok(block)
    }

    fn type_of(&self) -> StackType {
        self.ty
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for IndirectLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(loads {})", self.index_slot)
    }
}

/// Stores through an address: writes the value into the slot whose index is
/// held in `index_slot`.
#[derive(Debug)]
struct IndirectStore {
    index_slot: Arc<ScratchSlot>,
    value: ExprRef,
}

impl Expr for IndirectStore {
    fn lower(&self, ctx: &CompileContext) -> CompileResult<InstructionBlock> {
        let op = Instruction::StoreIndirect;
        ctx.check_version(op.min_version(), op.name())?;
        let mut block = InstructionBlock::single(Instruction::Load(self.index_slot.id()));
        block.extend(self.value.lower(ctx)?);
        block.push(op);
        Ok(block)
    }

    fn type_of(&self) -> StackType {
        StackType::None
    }

    fn has_return(&self) -> bool {
        false
    }
}

impl fmt::Display for IndirectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(stores {} {})", self.index_slot, self.value)
    }
}
