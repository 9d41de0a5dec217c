//! Error types for configuration loading and vehicle activation.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the expected schema
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// A field holds a value the pipeline cannot run with
    #[error("Invalid config field `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Vehicle activation errors
#[derive(Error, Debug)]
pub enum VehicleError {
    /// No skeleton/rig was supplied, the vehicle stays inert
    #[error("Vehicle has no skeleton asset, tick disabled until reconfigured")]
    MissingSkeleton,

    /// Tuning rejected at activation
    #[error(transparent)]
    Config(#[from] ConfigError),
}
