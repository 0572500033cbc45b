//! Engine configuration.
//!
//! Configuration comes from defaults, a JSON document, or environment
//! overrides:
//!
//! | Variable                      | Field                  |
//! |-------------------------------|------------------------|
//! | `ENGINE_PROPERTY_CACHE_LIMIT` | `property_cache_limit` |
//! | `ENGINE_MAX_CALL_DEPTH`       | `max_call_depth`       |
//! | `ENGINE_DENSE_ELEMENT_LIMIT`  | `dense_element_limit`  |
//!
//! Every constructor validates the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`EngineConfig::property_cache_limit`].
pub const ENV_PROPERTY_CACHE_LIMIT: &str = "ENGINE_PROPERTY_CACHE_LIMIT";
/// Environment variable overriding [`EngineConfig::max_call_depth`].
pub const ENV_MAX_CALL_DEPTH: &str = "ENGINE_MAX_CALL_DEPTH";
/// Environment variable overriding [`EngineConfig::dense_element_limit`].
pub const ENV_DENSE_ELEMENT_LIMIT: &str = "ENGINE_DENSE_ELEMENT_LIMIT";

const CACHE_LIMIT_RANGE: (usize, usize) = (1, 64);
const CALL_DEPTH_RANGE: (usize, usize) = (1, 100_000);
const DENSE_LIMIT_RANGE: (usize, usize) = (16, 1 << 28);

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed
    #[error("invalid engine configuration: {0}")]
    Parse(String),
    /// An environment override is not a number
    #[error("invalid value {value:?} for {variable}")]
    InvalidOverride {
        /// Variable name
        variable: &'static str,
        /// Raw value
        value: String,
    },
    /// A numeric setting is outside its accepted range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: usize,
        /// Smallest accepted value
        min: usize,
        /// Largest accepted value
        max: usize,
    },
}

/// Engine configuration
///
/// # Examples
///
/// ```
/// use interpreter::EngineConfig;
///
/// let config = EngineConfig::from_json(r#"{ "property_cache_limit": 3 }"#).unwrap();
/// assert_eq!(config.property_cache_limit, 3);
/// assert_eq!(config.max_call_depth, 512);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Entries per inline cache chain before it turns megamorphic
    pub property_cache_limit: usize,
    /// Nested calls before `RangeError: Maximum call stack size exceeded`
    pub max_call_depth: usize,
    /// Highest array index a write may reach by growing dense element
    /// storage across holes. Farther writes are stored sparsely.
    pub dense_element_limit: usize,
    /// Run all code in strict mode
    pub strict: bool,
    /// Report unhandled rejections to the rejection tracker
    pub track_rejections: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            property_cache_limit: 5,
            max_call_depth: 512,
            dense_element_limit: 1 << 20,
            strict: false,
            track_rejections: true,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup` (usually the process environment).
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_PROPERTY_CACHE_LIMIT) {
            self.property_cache_limit = parse_override(ENV_PROPERTY_CACHE_LIMIT, raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_CALL_DEPTH) {
            self.max_call_depth = parse_override(ENV_MAX_CALL_DEPTH, raw)?;
        }
        if let Some(raw) = lookup(ENV_DENSE_ELEMENT_LIMIT) {
            self.dense_element_limit = parse_override(ENV_DENSE_ELEMENT_LIMIT, raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "property_cache_limit",
            self.property_cache_limit,
            CACHE_LIMIT_RANGE,
        )?;
        check_range("max_call_depth", self.max_call_depth, CALL_DEPTH_RANGE)?;
        check_range(
            "dense_element_limit",
            self.dense_element_limit,
            DENSE_LIMIT_RANGE,
        )
    }
}

fn parse_override(variable: &'static str, raw: String) -> Result<usize, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride {
            variable,
            value: raw,
        })
}

fn check_range(
    field: &'static str,
    value: usize,
    (min, max): (usize, usize),
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}
