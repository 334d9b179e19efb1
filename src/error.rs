use std::path::PathBuf;

use thiserror::Error;

/// Construction-time failures. Everything after construction recovers locally.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("invalid color for `{key}`: {reason}")]
    InvalidColor { key: &'static str, reason: String },

    #[error("icon asset `{key}` could not be read from {}", path.display())]
    MissingAsset {
        key: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("icon asset `{key}` at {} could not be decoded: {reason}", path.display())]
    UndecodableAsset {
        key: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, WidgetError>;
