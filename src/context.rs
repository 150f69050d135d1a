//! Per-program compilation context.

use crate::error::{CompileError, CompileResult};
use crate::types::{DEFAULT_VERSION, VmVersion};

/// State threaded through every lowering call: the VM version being
/// targeted, and the gate that rejects instructions the target does not
/// support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileContext {
    version: VmVersion,
}

impl CompileContext {
    /// Creates a context targeting the given VM version.
    pub fn new(version: VmVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> VmVersion {
        self.version
    }

    /// Fails when `instruction` (requiring `required`) is unsupported at the
    /// target version. Called before the instruction is emitted, so a
    /// rejected lowering produces no instructions at all.
    pub fn check_version(&self, required: VmVersion, instruction: &str) -> CompileResult<()> {
        if self.version < required {
            return Err(CompileError::VersionTooLow {
                instruction: instruction.to_string(),
                required,
                target: self.version,
            });
        }
        Ok(())
    }
}

impl Default for CompileContext {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION)
    }
}
