use serde::{Deserialize, Serialize};
use std::path::MAIN_SEPARATOR;

use crate::error::{CrypterError, CrypterResult};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrypterConfig {
    pub output: OutputConfig,
    pub decrypt: DecryptConfig,
    pub log: LogConfig,
}

impl CrypterConfig {
    /// Reject settings that would make default output paths ambiguous.
    pub fn validate(&self) -> CrypterResult<()> {
        self.output.validate()
    }
}

/// Default output naming when no explicit `--output` is given
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Appended to the input path by `encrypt` (default: .enc)
    pub encrypted_suffix: String,
    /// Used for the output of `decrypt` (default: .dec)
    pub decrypted_suffix: String,
}

impl OutputConfig {
    fn validate(&self) -> CrypterResult<()> {
        for (name, suffix) in [
            ("output.encrypted_suffix", &self.encrypted_suffix),
            ("output.decrypted_suffix", &self.decrypted_suffix),
        ] {
            if suffix.is_empty() {
                return Err(CrypterError::Config(format!("{name} must not be empty")));
            }
            if suffix.contains('/') || suffix.contains(MAIN_SEPARATOR) {
                return Err(CrypterError::Config(format!(
                    "{name} must not contain a path separator: {suffix:?}"
                )));
            }
        }
        if self.encrypted_suffix == self.decrypted_suffix {
            return Err(CrypterError::Config(format!(
                "output.encrypted_suffix and output.decrypted_suffix are both {:?}",
                self.encrypted_suffix
            )));
        }
        Ok(())
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            encrypted_suffix: ".enc".into(),
            decrypted_suffix: ".dec".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecryptConfig {
    /// Reject tokens older than this many seconds (default: no limit)
    pub max_age_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}
