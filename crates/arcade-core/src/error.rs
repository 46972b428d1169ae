//! Error types for Arcade

use thiserror::Error;

/// The main error type for Arcade operations
#[derive(Debug, Error)]
pub enum ArcadeError {
    #[error("Archetype not found: {0}")]
    ArchetypeNotFound(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Invalid field type for {field}: expected {expected}, got {got}")]
    InvalidFieldType {
        field: String,
        expected: String,
        got: String,
    },

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Unknown animation clip: {selector} is not one of {available:?}")]
    UnknownClip {
        selector: String,
        available: Vec<String>,
    },

    #[error("Unknown input action: {0}")]
    UnknownAction(String),

    #[error("Unknown texture: {0}")]
    UnknownTexture(String),

    #[error("Invalid behavior reference for {field}: {reason}")]
    InvalidBehavior { field: String, reason: String },
}

impl ArcadeError {
    /// True for errors raised while decoding a single component block
    pub fn is_field_error(&self) -> bool {
        matches!(
            self,
            ArcadeError::InvalidFieldType { .. }
                | ArcadeError::ValueOutOfRange { .. }
                | ArcadeError::UnknownClip { .. }
                | ArcadeError::UnknownAction(_)
                | ArcadeError::UnknownTexture(_)
                | ArcadeError::InvalidBehavior { .. }
        )
    }
}

/// Result type alias for Arcade operations
pub type Result<T> = std::result::Result<T, ArcadeError>;

impl From<toml::de::Error> for ArcadeError {
    fn from(err: toml::de::Error) -> Self {
        ArcadeError::TomlParseError(err.to_string())
    }
}
