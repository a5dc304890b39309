//! Settings error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("read {}: {source}", path.display())]
    Read {
        /// Settings file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The settings file is not valid JSON.
    #[error("parse {}: {source}", path.display())]
    Parse {
        /// Settings file path.
        path: PathBuf,
        /// Parser error with line and column.
        #[source]
        source: serde_json::Error,
    },
    /// The merged settings do not fit the settings types (e.g. a string port).
    #[error("settings do not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
    /// A value is outside its allowed range.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_path() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/wsecho.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "read /etc/wsecho.json: denied");
    }

    #[test]
    fn parse_error_keeps_position() {
        let source = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err = SettingsError::Parse {
            path: PathBuf::from("settings.json"),
            source,
        };
        let text = err.to_string();
        assert!(text.starts_with("parse settings.json: "));
        assert!(text.contains("line 1"));
    }

    #[test]
    fn shape_error_converts_from_serde() {
        let source = serde_json::from_str::<u16>("\"eighty\"").unwrap_err();
        let err: SettingsError = source.into();
        assert!(matches!(err, SettingsError::Shape(_)));
    }

    #[test]
    fn invalid_value_display() {
        let err = SettingsError::InvalidValue("server.workerThreads must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "invalid settings value: server.workerThreads must be at least 1"
        );
    }
}
