//! Compile-time error types.
//!
//! Every failure in this crate is synchronous and fatal to the enclosing
//! compilation: nothing is retried or silently coerced. Each variant carries
//! enough context (procedure name, argument index) to locate the source of
//! the error.

use thiserror::Error;

use crate::procedure::ParamKind;
use crate::types::{StackType, VmVersion};

/// Result alias for every fallible operation in the compiler.
pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("procedure '{name}': {declared} input types declared for {params} parameters")]
    InputTypeCount {
        name: String,
        declared: usize,
        params: usize,
    },

    #[error("procedure '{name}': duplicate parameter name '{param}'")]
    DuplicateParam { name: String, param: String },

    #[error("procedure '{name}': value parameter '{param}' cannot have input type 'none'")]
    ValuelessParam { name: String, param: String },

    #[error(
        "procedure '{name}': reference parameter '{param}' cannot declare input type '{declared}'"
    )]
    ReferenceInputType {
        name: String,
        param: String,
        declared: StackType,
    },

    #[error("procedure '{name}': expected {expected} arguments, found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "procedure '{name}': argument {index} for parameter '{param}' is {found} but the parameter is declared {expected}"
    )]
    ArgumentKind {
        name: String,
        index: usize,
        param: String,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("procedure '{name}': argument {index} produces no value")]
    ValuelessArgument { name: String, index: usize },

    #[error("procedure '{name}': declaration requested while it is still being compiled")]
    DeclarationInProgress { name: String },

    #[error("version {target} is too low for {instruction} (requires version {required})")]
    VersionTooLow {
        instruction: String,
        required: VmVersion,
        target: VmVersion,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: StackType,
        found: StackType,
    },

    #[error("expression {index} in a sequence produces a value of type {found} but is not last")]
    SequenceValue { index: usize, found: StackType },
}
