//! Engine configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via BYTEFSM_CONFIG or --config)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity limits for machines, states and tables.
    pub limits: Limits,
    /// Output buffer layout.
    pub output: OutputConfig,
}

impl EngineConfig {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("BYTEFSM_CONFIG").ok().map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Like [`load`](EngineConfig::load), with the file path given explicitly.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: EngineConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.limits.apply_env_overrides();
        self.output.apply_env_overrides();
    }

    /// Checks that every capacity is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits.validate()?;

        // One byte past the header is kept for the terminator.
        let reserved = self.output.header_size + usize::from(self.output.auto_terminate);
        if reserved > self.limits.max_output_size {
            return Err(ConfigError::ValidationError(format!(
                "output header of {} bytes does not fit in an output buffer of {} bytes",
                self.output.header_size, self.limits.max_output_size
            )));
        }

        Ok(())
    }
}

/// Fixed capacities enforced at build and run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum machine name length in bytes.
    pub max_machine_name: usize,
    /// Maximum state name length in bytes.
    pub max_state_name: usize,
    /// Maximum literal transition key length in bytes.
    pub max_key_size: usize,
    /// Entries per transition table.
    pub max_table_size: usize,
    /// Predicates per transition entry.
    pub max_predicates: usize,
    /// Hard ceiling on input length.
    pub max_input_size: usize,
    /// Output buffer capacity in bytes.
    pub max_output_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_machine_name: 32,
            max_state_name: 32,
            max_key_size: 64,
            max_table_size: 128,
            max_predicates: 8,
            max_input_size: 128,
            max_output_size: 1024,
        }
    }
}

impl Limits {
    fn apply_env_overrides(&mut self) {
        override_usize("BYTEFSM_MAX_MACHINE_NAME", &mut self.max_machine_name);
        override_usize("BYTEFSM_MAX_STATE_NAME", &mut self.max_state_name);
        override_usize("BYTEFSM_MAX_KEY_SIZE", &mut self.max_key_size);
        override_usize("BYTEFSM_MAX_TABLE_SIZE", &mut self.max_table_size);
        override_usize("BYTEFSM_MAX_PREDICATES", &mut self.max_predicates);
        override_usize("BYTEFSM_MAX_INPUT_SIZE", &mut self.max_input_size);
        override_usize("BYTEFSM_MAX_OUTPUT_SIZE", &mut self.max_output_size);
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("max_machine_name", self.max_machine_name),
            ("max_state_name", self.max_state_name),
            ("max_table_size", self.max_table_size),
            ("max_predicates", self.max_predicates),
            ("max_input_size", self.max_input_size),
            ("max_output_size", self.max_output_size),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Output buffer layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Bytes reserved at the front of the buffer before the first write.
    pub header_size: usize,
    /// Append a zero byte after the output when a run finishes.
    pub auto_terminate: bool,
}

impl OutputConfig {
    fn apply_env_overrides(&mut self) {
        override_usize("BYTEFSM_OUTPUT_HEADER_SIZE", &mut self.header_size);

        if let Ok(enabled) = std::env::var("BYTEFSM_OUTPUT_AUTO_TERMINATE") {
            self.auto_terminate = enabled == "1" || enabled.to_lowercase() == "true";
        }
    }

    pub fn with_header_size(mut self, size: usize) -> Self {
        self.header_size = size;
        self
    }

    pub fn with_auto_terminate(mut self, enabled: bool) -> Self {
        self.auto_terminate = enabled;
        self
    }
}

fn override_usize(var: &str, target: &mut usize) {
    if let Ok(value) = std::env::var(var) {
        if let Ok(n) = value.parse() {
            *target = n;
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
