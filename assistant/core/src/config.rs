//! Configuration
//!
//! Runtime settings for the study assistant, assembled from (lowest to
//! highest precedence) built-in defaults, a TOML file, and environment
//! variables. Surfaces layer their own flags on top.
//!
//! # File Format
//!
//! ```toml
//! model = "llama3.2"
//! max_prompt_tokens = 1024
//! timeout_secs = 30
//! flashcard_count = 5
//! temperature = 0.7
//! top_k = 3
//! system_prompt = "You are an expert study assistant..."
//! ```
//!
//! # Environment Variables
//!
//! - `STUDYSPACE_MODEL`, `STUDYSPACE_MAX_TOKENS`, `STUDYSPACE_TIMEOUT_SECS`
//! - `STUDYSPACE_FLASHCARDS`, `STUDYSPACE_TEMPERATURE`, `STUDYSPACE_TOP_K`
//! - `STUDYSPACE_SYSTEM_PROMPT`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::prompts::DEFAULT_SYSTEM_PROMPT;

/// Default model name
pub const DEFAULT_MODEL: &str = "llama3.2";
/// Token budget checked before generation
pub const DEFAULT_MAX_PROMPT_TOKENS: usize = 1024;
/// Deadline for each operation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Flashcards requested per summary
pub const DEFAULT_FLASHCARD_COUNT: usize = 5;

/// Assistant configuration
#[derive(Clone, Debug, PartialEq)]
pub struct StudyConfig {
    /// Model to generate with
    pub model: String,
    /// Maximum tokens accepted in user input
    pub max_prompt_tokens: usize,
    /// Deadline raced against each operation
    pub processing_timeout: Duration,
    /// System prompt applied to every session
    pub system_prompt: String,
    /// Sampling temperature; `None` uses the source default
    pub temperature: Option<f32>,
    /// Top-k sampling; `None` uses the source default
    pub top_k: Option<u32>,
    /// Flashcards requested per summary
    pub flashcard_count: usize,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_prompt_tokens: DEFAULT_MAX_PROMPT_TOKENS,
            processing_timeout: DEFAULT_TIMEOUT,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
            top_k: None,
            flashcard_count: DEFAULT_FLASHCARD_COUNT,
        }
    }
}

/// Configuration file contents; every field is optional
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyToml {
    /// Model name
    pub model: Option<String>,
    /// Token budget
    pub max_prompt_tokens: Option<usize>,
    /// Operation deadline in seconds
    pub timeout_secs: Option<u64>,
    /// System prompt
    pub system_prompt: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Top-k sampling
    pub top_k: Option<u32>,
    /// Flashcards per summary
    pub flashcard_count: Option<usize>,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending setting
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl StudyConfig {
    /// Defaults overlaid with environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay the fields a file sets
    pub fn apply_file(&mut self, file: StudyToml) {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(tokens) = file.max_prompt_tokens {
            self.max_prompt_tokens = tokens;
        }
        if let Some(secs) = file.timeout_secs {
            self.processing_timeout = Duration::from_secs(secs);
        }
        if let Some(prompt) = file.system_prompt {
            self.system_prompt = prompt;
        }
        if file.temperature.is_some() {
            self.temperature = file.temperature;
        }
        if file.top_k.is_some() {
            self.top_k = file.top_k;
        }
        if let Some(count) = file.flashcard_count {
            self.flashcard_count = count;
        }
    }

    /// Overlay `STUDYSPACE_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(
            var: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            let raw = var(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key, value = %raw, "Ignoring unparseable environment value");
                    None
                }
            }
        }

        if let Some(model) = var("STUDYSPACE_MODEL") {
            self.model = model;
        }
        if let Some(tokens) = parsed(&var, "STUDYSPACE_MAX_TOKENS") {
            self.max_prompt_tokens = tokens;
        }
        if let Some(secs) = parsed(&var, "STUDYSPACE_TIMEOUT_SECS") {
            self.processing_timeout = Duration::from_secs(secs);
        }
        if let Some(prompt) = var("STUDYSPACE_SYSTEM_PROMPT") {
            self.system_prompt = prompt;
        }
        if let Some(temperature) = parsed(&var, "STUDYSPACE_TEMPERATURE") {
            self.temperature = Some(temperature);
        }
        if let Some(top_k) = parsed(&var, "STUDYSPACE_TOP_K") {
            self.top_k = Some(top_k);
        }
        if let Some(count) = parsed(&var, "STUDYSPACE_FLASHCARDS") {
            self.flashcard_count = count;
        }
    }

    /// Check that values are usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for empty models, zero budgets or
    /// timeouts, and temperatures outside 0.0-1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model",
                reason: "must not be empty".to_string(),
            });
        }
        if self.max_prompt_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "max_prompt_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.processing_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.flashcard_count == 0 {
            return Err(ConfigError::Invalid {
                field: "flashcard_count",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::Invalid {
                    field: "temperature",
                    reason: format!("{t} is outside 0.0-1.0"),
                });
            }
        }
        Ok(())
    }
}

/// Default config file location (`$XDG_CONFIG_HOME/studyspace/config.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("studyspace").join("config.toml"))
}

/// Parse a config file without applying it
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
pub fn load_config_file(path: &Path) -> Result<StudyToml, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Defaults, then `path`, then the environment
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the merged
/// configuration is invalid.
pub fn load_config_from_path(path: &Path) -> Result<StudyConfig, ConfigError> {
    let mut config = StudyConfig::default();
    config.apply_file(load_config_file(path)?);
    config.apply_env();
    config.validate()?;
    debug!(path = ?path, model = %config.model, "Loaded configuration");
    Ok(config)
}

/// Defaults, then the default config file if it exists, then the environment
///
/// # Errors
///
/// Returns an error if an existing default file is malformed, or the merged
/// configuration is invalid.
pub fn load_config() -> Result<StudyConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => {
            let config = StudyConfig::from_env();
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StudyConfig::default();
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.max_prompt_tokens, 1024);
        assert_eq!(config.processing_timeout, Duration::from_secs(30));
        assert_eq!(config.flashcard_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay_ignores_garbage() {
        let mut config = StudyConfig::default();
        config.apply_vars(vars(&[
            ("STUDYSPACE_MODEL", "phi3"),
            ("STUDYSPACE_MAX_TOKENS", "2048"),
            ("STUDYSPACE_TIMEOUT_SECS", "soon"),
            ("STUDYSPACE_TEMPERATURE", "0.2"),
        ]));

        assert_eq!(config.model, "phi3");
        assert_eq!(config.max_prompt_tokens, 2048);
        assert_eq!(config.processing_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.top_k, None);
    }

    #[test]
    fn test_file_overlay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = \"gemma2\"\ntimeout_secs = 5\ntop_k = 8").unwrap();

        let mut config = StudyConfig::default();
        config.apply_file(load_config_file(file.path()).unwrap());

        assert_eq!(config.model, "gemma2");
        assert_eq!(config.processing_timeout, Duration::from_secs(5));
        assert_eq!(config.top_k, Some(8));
        assert_eq!(config.max_prompt_tokens, DEFAULT_MAX_PROMPT_TOKENS);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "modle = \"typo\"").unwrap();
        assert!(matches!(
            load_config_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config_file(Path::new("/nonexistent/studyspace.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validation() {
        let config = StudyConfig {
            temperature: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "temperature", .. })
        ));

        let config = StudyConfig {
            processing_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
