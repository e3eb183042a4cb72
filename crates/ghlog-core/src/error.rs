//! Error types for ghlog-core

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Input anomalies that make a changelog impossible to compile correctly.
///
/// These abort compilation; anything recoverable is reported as a
/// [`Warning`](crate::classify::Warning) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Two fetched records share the same number.
    #[error("duplicate record #{number} in input")]
    DuplicateRecord {
        /// The repeated record number.
        number: u64,
    },

    /// Two tags share the same name.
    #[error("duplicate tag {tag} in input")]
    DuplicateTag {
        /// The repeated tag name.
        tag: String,
    },

    /// A tag's timestamp could not be parsed, so tags cannot be ordered.
    #[error("tag {tag} has an unparseable timestamp {value:?}")]
    InvalidTagTimestamp {
        /// The tag whose timestamp is malformed.
        tag: String,
        /// The raw timestamp text.
        value: String,
    },
}

/// Result type alias using [`CompileError`].
pub type CompileResult<T> = Result<T, CompileError>;
