//! Binding host-authored bodies to procedure definitions.

use std::sync::Arc;

use crate::ast::{Expr, ExprRef};
use crate::error::CompileResult;
use crate::procedure::call::Arg;
use crate::procedure::convention::ParamBinding;
use crate::procedure::definition::{Param, ParamKind, ProcedureDefinition};
use crate::types::StackType;

/// Collects a procedure's contract, then binds a host-authored body to it.
///
/// # Example
///
/// ```
/// use stackscript::prelude::*;
///
/// let add = ProcedureBuilder::new("add", StackType::Uint64)
///     .value_param("a")
///     .value_param("b")
///     .build(|params| BinaryExpr::add(params[0].expr(), params[1].expr()))
///     .unwrap();
///
/// let call = add.call(vec![Arg::Value(int(1)), Arg::Value(int(2))]).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ProcedureBuilder {
    name: String,
    return_type: StackType,
    params: Vec<Param>,
    input_types: Option<Vec<StackType>>,
}

impl ProcedureBuilder {
    pub fn new(name: impl Into<String>, return_type: StackType) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            input_types: None,
        }
    }

    /// Appends a parameter of the given kind.
    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param::new(name, kind));
        self
    }

    /// Appends a by-value parameter.
    pub fn value_param(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Value)
    }

    /// Appends a by-reference parameter.
    pub fn reference_param(self, name: impl Into<String>) -> Self {
        self.param(name, ParamKind::Reference)
    }

    /// Declares the expected argument types, one per parameter.
    pub fn input_types(mut self, types: Vec<StackType>) -> Self {
        self.input_types = Some(types);
        self
    }

    /// Validates the contract and binds `implementation` to a fresh
    /// definition. The implementation runs once, on first declaration use.
    pub fn build<F>(self, implementation: F) -> CompileResult<Procedure>
    where
        F: Fn(&[ParamBinding]) -> CompileResult<ExprRef> + Send + Sync + 'static,
    {
        let definition = ProcedureDefinition::new(
            self.name,
            self.params,
            self.return_type,
            self.input_types,
            Box::new(implementation),
        )?;
        Ok(Procedure { definition })
    }
}

/// A callable handle over one bound procedure.
#[derive(Debug, Clone)]
pub struct Procedure {
    definition: Arc<ProcedureDefinition>,
}

impl Procedure {
    pub fn definition(&self) -> &Arc<ProcedureDefinition> {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Invokes the procedure with positional arguments, yielding the call
    /// expression. Arity and kind mismatches fail here, before any
    /// instruction exists.
    pub fn call(&self, args: Vec<Arg>) -> CompileResult<ExprRef> {
        Ok(self.definition.invoke(args)?.into_expr())
    }

    /// The compiled body's type. Compiles the declaration if needed.
    pub fn type_of(&self) -> CompileResult<StackType> {
        Ok(self.definition.declaration()?.type_of())
    }

    /// Whether the compiled body ends in a return. Compiles the declaration
    /// if needed.
    pub fn has_return(&self) -> CompileResult<bool> {
        Ok(self.definition.declaration()?.has_return())
    }
}
