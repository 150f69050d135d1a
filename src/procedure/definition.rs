//! Validated metadata for one procedure.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashSet;

use crate::ast::ExprRef;
use crate::error::{CompileError, CompileResult};
use crate::procedure::call::{Arg, ProcedureCall};
use crate::procedure::convention::{ParamBinding, evaluate_procedure};
use crate::procedure::declaration::ProcedureDeclaration;
use crate::types::{ProcedureId, StackType, allocate_procedure_id};

/// How a parameter receives its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// The argument's value is copied into callee-local storage.
    Value,
    /// The argument's storage address is passed; the callee aliases and may
    /// mutate the caller's slot.
    Reference,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Value => write!(f, "by-value"),
            ParamKind::Reference => write!(f, "by-reference"),
        }
    }
}

/// One declared parameter. Positional only; no defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    kind: ParamKind,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// The host-authored body: invoked exactly once, with one binding per
/// declared parameter in declaration order.
pub type Implementation = Box<dyn Fn(&[ParamBinding]) -> CompileResult<ExprRef> + Send + Sync>;

enum DeclarationCache {
    Uncompiled,
    InProgress,
    Compiled(Arc<ProcedureDeclaration>),
}

/// Identity, parameter contract, and lazily compiled body of one procedure.
///
/// Definitions compare and hash by id, so the surrounding compiler can use
/// them directly as map/set keys when collecting referenced procedures for
/// layout.
pub struct ProcedureDefinition {
    id: ProcedureId,
    name: String,
    params: Vec<Param>,
    by_ref_params: FxHashSet<usize>,
    return_type: StackType,
    input_types: Option<Vec<StackType>>,
    implementation: Implementation,
    declaration: Mutex<DeclarationCache>,
}

impl ProcedureDefinition {
    /// Validates the parameter contract and creates the definition.
    ///
    /// Fails when the declared input-type list does not match the parameter
    /// count, when two parameters share a name, when a value parameter is
    /// declared with input type `none`, or when a reference parameter is
    /// declared with a concrete input type (a dynamic slot stores an
    /// address, not a typed value).
    pub fn new(
        name: impl Into<String>,
        params: Vec<Param>,
        return_type: StackType,
        input_types: Option<Vec<StackType>>,
        implementation: Implementation,
    ) -> CompileResult<Arc<Self>> {
        let name = name.into();

        if let Some(types) = &input_types {
            if types.len() != params.len() {
                return Err(CompileError::InputTypeCount {
                    name,
                    declared: types.len(),
                    params: params.len(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for param in &params {
            if !seen.insert(param.name()) {
                return Err(CompileError::DuplicateParam {
                    name,
                    param: param.name().to_string(),
                });
            }
        }

        let mut by_ref_params = FxHashSet::default();
        for (index, param) in params.iter().enumerate() {
            let declared = input_types.as_ref().map(|types| types[index]);
            match param.kind() {
                ParamKind::Value => {
                    if declared == Some(StackType::None) {
                        return Err(CompileError::ValuelessParam {
                            name,
                            param: param.name().to_string(),
                        });
                    }
                }
                ParamKind::Reference => {
                    if let Some(ty) = declared {
                        if ty != StackType::Any {
                            return Err(CompileError::ReferenceInputType {
                                name,
                                param: param.name().to_string(),
                                declared: ty,
                            });
                        }
                    }
                    by_ref_params.insert(index);
                }
            }
        }

        Ok(Arc::new(Self {
            id: allocate_procedure_id(),
            name,
            params,
            by_ref_params,
            return_type,
            input_types,
            implementation,
            declaration: Mutex::new(DeclarationCache::Uncompiled),
        }))
    }

    pub fn id(&self) -> ProcedureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> StackType {
        self.return_type
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// The declared parameters, in declaration order.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Parameter names, in declaration order.
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|param| param.name()).collect()
    }

    pub fn input_types(&self) -> Option<&[StackType]> {
        self.input_types.as_deref()
    }

    /// Whether the parameter at `index` is declared by-reference.
    pub fn is_by_ref(&self, index: usize) -> bool {
        self.by_ref_params.contains(&index)
    }

    pub(crate) fn run_implementation(&self, bindings: &[ParamBinding]) -> CompileResult<ExprRef> {
        (self.implementation)(bindings)
    }

    /// Validates `args` against the parameter contract and wraps them into a
    /// call node. Fails on any arity mismatch, and on the first argument
    /// whose kind does not match its parameter's declared kind.
    pub fn invoke(self: &Arc<Self>, args: Vec<Arg>) -> CompileResult<ProcedureCall> {
        if args.len() != self.param_count() {
            return Err(CompileError::ArgumentCount {
                name: self.name.clone(),
                expected: self.param_count(),
                found: args.len(),
            });
        }

        for (index, (arg, param)) in args.iter().zip(&self.params).enumerate() {
            if arg.kind() != param.kind() {
                return Err(CompileError::ArgumentKind {
                    name: self.name.clone(),
                    index,
                    param: param.name().to_string(),
                    expected: param.kind(),
                    found: arg.kind(),
                });
            }
        }

        ProcedureCall::new(self.clone(), args)
    }

    /// The compiled declaration, built on first use.
    ///
    /// The calling-convention algorithm runs at most once per definition:
    /// repeated calls return the identical cached declaration. A failure is
    /// not cached; the next call re-invokes the implementation. The cache
    /// lock is released while the implementation runs, so an implementation
    /// that requests its own declaration observes the in-progress state and
    /// fails instead of deadlocking.
    pub fn declaration(&self) -> CompileResult<Arc<ProcedureDeclaration>> {
        {
            let mut cache = self.declaration.lock().unwrap();
            match &*cache {
                DeclarationCache::Compiled(declaration) => return Ok(declaration.clone()),
                DeclarationCache::InProgress => {
                    return Err(CompileError::DeclarationInProgress {
                        name: self.name.clone(),
                    });
                }
                DeclarationCache::Uncompiled => *cache = DeclarationCache::InProgress,
            }
        }

        let result = evaluate_procedure(self);

        let mut cache = self.declaration.lock().unwrap();
        match result {
            Ok(declaration) => {
                let declaration = Arc::new(declaration);
                *cache = DeclarationCache::Compiled(declaration.clone());
                Ok(declaration)
            }
            Err(error) => {
                *cache = DeclarationCache::Uncompiled;
                Err(error)
            }
        }
    }
}

impl fmt::Debug for ProcedureDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ProcedureDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "procedure#{}", self.id)
    }
}

impl PartialEq for ProcedureDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProcedureDefinition {}

impl Hash for ProcedureDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
