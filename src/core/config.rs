//! Compiler configuration.

/// Hard limit on argument slots.
///
/// Slot offsets are encoded as `f64.load` immediates; 2^16 slots keep every
/// offset well inside a single 32-bit address space.
pub const MAX_SLOTS: usize = 1 << 16;

/// Options controlling one [`ExpressionCompiler`](crate::ExpressionCompiler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Run the peephole constant folder.
    pub fold_constants: bool,

    /// Validate the complete module after encoding.
    pub validate_module: bool,

    /// Maximum number of distinct symbols. Clamped to [`MAX_SLOTS`].
    pub max_slots: usize,

    /// Attach a text disassembly of the generated function to the output.
    pub disassembly: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            fold_constants: true,
            validate_module: true,
            max_slots: MAX_SLOTS,
            disassembly: false,
        }
    }
}

impl CompilerConfig {
    pub fn with_fold_constants(mut self, enabled: bool) -> Self {
        self.fold_constants = enabled;
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_module = enabled;
        self
    }

    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots;
        self
    }

    pub fn with_disassembly(mut self, enabled: bool) -> Self {
        self.disassembly = enabled;
        self
    }

    /// Effective slot limit.
    pub fn slot_limit(&self) -> usize {
        self.max_slots.min(MAX_SLOTS)
    }
}
