//! Crate-level error types.

use std::fmt;

use crate::property::PropertyId;
use crate::scene::SceneError;

/// Errors produced by the viso-selection crate.
#[derive(Debug)]
pub enum SelectionError {
    /// The scene graph rejected an operation (unknown node, material, ...).
    Scene(SceneError),
    /// The display context cannot host selection handlers.
    InvalidContext(String),
    /// Every non-zero pick handle is currently in use.
    HandlesExhausted,
    /// A property id does not exist in the property tree.
    MissingProperty(PropertyId),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scene(e) => write!(f, "scene error: {e}"),
            Self::InvalidContext(msg) => {
                write!(f, "invalid display context: {msg}")
            }
            Self::HandlesExhausted => write!(f, "no free pick handles left"),
            Self::MissingProperty(id) => {
                write!(f, "property {id:?} does not exist")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for SelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Scene(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SceneError> for SelectionError {
    fn from(e: SceneError) -> Self {
        Self::Scene(e)
    }
}

impl From<std::io::Error> for SelectionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for SelectionError {
    fn from(e: toml::de::Error) -> Self {
        Self::OptionsParse(e.to_string())
    }
}

impl From<toml::ser::Error> for SelectionError {
    fn from(e: toml::ser::Error) -> Self {
        Self::OptionsParse(e.to_string())
    }
}
