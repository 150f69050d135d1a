//! The calling-convention algorithm.
//!
//! Callers push arguments in declaration order, so the last-declared
//! parameter sits on top of the stack when the procedure body starts. The
//! compiled body therefore opens with a prologue that stores the stack into
//! the parameters' scratch slots in reverse declaration order, then runs the
//! authored logic against those slots.
//!
//! Each parameter's slot serves two code paths. At run time the prologue
//! stores the caller-pushed value into it: the value itself for a by-value
//! parameter, the caller's slot index for a by-reference parameter. At
//! compile time the slot's handle is exposed to the host-authored body: a
//! by-value parameter exposes its load expression, while a by-reference
//! parameter exposes the aliasing variable itself, so the body's own
//! store/load calls indirect through whatever address the caller passed.

use std::fmt;

use crate::ast::{ExprRef, ScratchVar, Seq};
use crate::error::CompileResult;
use crate::procedure::declaration::ProcedureDeclaration;
use crate::procedure::definition::{ParamKind, ProcedureDefinition};
use crate::types::StackType;

/// The handle for one parameter, passed to the host-authored body in
/// declaration order.
#[derive(Debug, Clone)]
pub enum ParamBinding {
    /// A by-value parameter: the load of the callee-local slot holding the
    /// copied value.
    Value(ExprRef),
    /// A by-reference parameter: the aliasing variable itself. Store and
    /// load on it reach the caller's slot.
    Reference(ScratchVar),
}

impl ParamBinding {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamBinding::Value(_) => ParamKind::Value,
            ParamBinding::Reference(_) => ParamKind::Reference,
        }
    }

    /// The value expression of a by-value parameter.
    ///
    /// # Panics
    ///
    /// Panics on a by-reference binding; read one through `var().load()`.
    pub fn expr(&self) -> ExprRef {
        match self {
            ParamBinding::Value(expr) => expr.clone(),
            ParamBinding::Reference(_) => {
                panic!("by-reference parameter has no value expression; use var()")
            }
        }
    }

    /// The aliasing variable of a by-reference parameter.
    ///
    /// # Panics
    ///
    /// Panics on a by-value binding.
    pub fn var(&self) -> &ScratchVar {
        match self {
            ParamBinding::Reference(var) => var,
            ParamBinding::Value(_) => {
                panic!("by-value parameter has no variable handle; use expr()")
            }
        }
    }
}

impl fmt::Display for ParamBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamBinding::Value(expr) => write!(f, "{}", expr),
            ParamBinding::Reference(var) => write!(f, "{}", var),
        }
    }
}

/// Builds the declaration for `definition`.
///
/// Runs the host implementation exactly once; the memoization in
/// [`ProcedureDefinition::declaration`] guarantees this function itself is
/// entered at most once per definition at a time.
pub(crate) fn evaluate_procedure(
    definition: &ProcedureDefinition,
) -> CompileResult<ProcedureDeclaration> {
    let mut vars = Vec::with_capacity(definition.param_count());
    let mut bindings = Vec::with_capacity(definition.param_count());

    for index in 0..definition.param_count() {
        if definition.is_by_ref(index) {
            let var = ScratchVar::dynamic();
            bindings.push(ParamBinding::Reference(var.clone()));
            vars.push(var);
        } else {
            let var = ScratchVar::new(StackType::Any);
            bindings.push(ParamBinding::Value(var.load()));
            vars.push(var);
        }
    }

    let authored = definition.run_implementation(&bindings)?;

    // The last-declared parameter was pushed last, so it is popped first.
    let mut body: Vec<ExprRef> = vars
        .iter()
        .rev()
        .map(|var| var.store_from_stack())
        .collect();
    body.push(authored);

    Ok(ProcedureDeclaration::new(
        definition.id(),
        definition.name().to_string(),
        Seq::new(body)?,
    ))
}
