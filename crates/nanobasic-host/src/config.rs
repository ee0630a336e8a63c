use std::fmt;

use crate::arena::ArenaLayout;

/// Default size in bytes of the engine's code region.
pub const DEFAULT_CODE_CAPACITY: usize = 128;
/// Default size in bytes of the engine's value/variable region.
pub const DEFAULT_VALUE_CAPACITY: usize = 24 * 3;
/// Default size in bytes of the engine's call-stack region.
pub const DEFAULT_STACK_CAPACITY: usize = 16;
/// Default size of the REPL input buffer. Inputs must be strictly shorter.
pub const DEFAULT_INPUT_CAPACITY: usize = 1024;
/// Default number of output bytes retained per host call.
///
/// One less than the 1024-byte host buffer, which keeps a slot for the terminator.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 1023;
/// Default capacity in bytes of a virtual file's write buffer.
pub const DEFAULT_FILE_CAPACITY: usize = 1024;
/// Default maximum length in bytes of a virtual file name.
pub const DEFAULT_MAX_FILE_NAME: usize = 32;

/// Fixed capacities for one session.
///
/// Every buffer the adapter owns is sized here once, at session construction, and
/// never resized afterwards. Use `SessionConfig::default()` for the sizes of the
/// reference WebAssembly build, or adjust them with the builder methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionConfig {
    /// Size of the code region of the interpreter arena.
    pub code_capacity: usize,
    /// Size of the value/variable region of the interpreter arena.
    pub value_capacity: usize,
    /// Size of the call-stack region of the interpreter arena.
    pub stack_capacity: usize,
    /// Size of the REPL input buffer.
    pub input_capacity: usize,
    /// Number of output bytes kept per host call.
    pub output_capacity: usize,
    /// Capacity of the virtual file write buffer.
    pub file_capacity: usize,
    /// Maximum virtual file name length.
    pub max_file_name: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            code_capacity: DEFAULT_CODE_CAPACITY,
            value_capacity: DEFAULT_VALUE_CAPACITY,
            stack_capacity: DEFAULT_STACK_CAPACITY,
            input_capacity: DEFAULT_INPUT_CAPACITY,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            file_capacity: DEFAULT_FILE_CAPACITY,
            max_file_name: DEFAULT_MAX_FILE_NAME,
        }
    }
}

impl SessionConfig {
    /// Creates a config with the default capacities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the code region size.
    #[must_use]
    pub fn code_capacity(mut self, bytes: usize) -> Self {
        self.code_capacity = bytes;
        self
    }

    /// Sets the value region size.
    #[must_use]
    pub fn value_capacity(mut self, bytes: usize) -> Self {
        self.value_capacity = bytes;
        self
    }

    /// Sets the call-stack region size.
    #[must_use]
    pub fn stack_capacity(mut self, bytes: usize) -> Self {
        self.stack_capacity = bytes;
        self
    }

    /// Sets the REPL input buffer size.
    #[must_use]
    pub fn input_capacity(mut self, bytes: usize) -> Self {
        self.input_capacity = bytes;
        self
    }

    /// Sets how many output bytes are kept per host call.
    #[must_use]
    pub fn output_capacity(mut self, bytes: usize) -> Self {
        self.output_capacity = bytes;
        self
    }

    /// Sets the virtual file write buffer capacity.
    #[must_use]
    pub fn file_capacity(mut self, bytes: usize) -> Self {
        self.file_capacity = bytes;
        self
    }

    /// Sets the maximum virtual file name length.
    #[must_use]
    pub fn max_file_name(mut self, bytes: usize) -> Self {
        self.max_file_name = bytes;
        self
    }

    /// Returns the arena partitioning described by this config.
    #[must_use]
    pub fn layout(&self) -> ArenaLayout {
        ArenaLayout::new(self.code_capacity, self.value_capacity, self.stack_capacity)
    }

    /// Checks that every capacity is usable.
    ///
    /// All capacities must be non-zero, and the arena as a whole must fit in
    /// the address space.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("code_capacity", self.code_capacity),
            ("value_capacity", self.value_capacity),
            ("stack_capacity", self.stack_capacity),
            ("input_capacity", self.input_capacity),
            ("output_capacity", self.output_capacity),
            ("file_capacity", self.file_capacity),
            ("max_file_name", self.max_file_name),
        ];
        if let Some(&(field, _)) = fields.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero { field });
        }
        self.code_capacity
            .checked_add(self.value_capacity)
            .and_then(|sum| sum.checked_add(self.stack_capacity))
            .ok_or(ConfigError::ArenaTooLarge)?;
        Ok(())
    }
}

/// Error returned when a [`SessionConfig`] cannot be used to build a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A capacity was set to zero.
    Zero { field: &'static str },
    /// The three arena regions do not fit in one allocation.
    ArenaTooLarge,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero { field } => write!(f, "{field} must be greater than zero"),
            Self::ArenaTooLarge => f.write_str("arena regions exceed the addressable size"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_build() {
        let config = SessionConfig::default();
        assert_eq!(config.layout().total(), 128 + 72 + 16);
        assert_eq!(config.output_capacity, config.input_capacity - 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = SessionConfig::new().file_capacity(0).validate().unwrap_err();
        assert_eq!(err, ConfigError::Zero { field: "file_capacity" });
    }

    #[test]
    fn overflowing_arena_is_rejected() {
        let err = SessionConfig::new()
            .code_capacity(usize::MAX)
            .value_capacity(1)
            .validate()
            .unwrap_err();
        assert_eq!(err, ConfigError::ArenaTooLarge);
    }
}
