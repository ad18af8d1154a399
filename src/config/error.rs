use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::format::BoxError;
use crate::validation::ValidationError;

/// Errors raised while building, loading or validating a node.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("unsupported config format '{0}'")]
    UnsupportedFormat(String),

    #[error("{what} is not available; enable the `{feature}` feature")]
    MissingDependency {
        what: &'static str,
        feature: &'static str,
    },

    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {format} config{}: {source}", origin(.path))]
    Decode {
        format: String,
        path: Option<PathBuf>,
        source: BoxError,
    },

    #[error("expected a mapping at the top level, found {found}")]
    NotAMapping { found: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid validation schema: {0}")]
    InvalidSchema(String),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl ConfigError {
    /// Returns the validation error if this is a schema rejection.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ConfigError::Validation(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Decode {
                format,
                path: None,
                source,
            } => ConfigError::Decode {
                format,
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" from '{}'", path.display()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_includes_path() {
        let err = ConfigError::Decode {
            format: "json".into(),
            path: None,
            source: "expected value".into(),
        }
        .with_path(Path::new("conf/app.json"));

        assert_eq!(
            err.to_string(),
            "failed to decode json config from 'conf/app.json': expected value"
        );
    }

    #[test]
    fn test_decode_message_without_path() {
        let err = ConfigError::Decode {
            format: "toml".into(),
            path: None,
            source: "bad key".into(),
        };
        assert_eq!(err.to_string(), "failed to decode toml config: bad key");
    }

    #[test]
    fn test_missing_dependency_message() {
        let err = ConfigError::MissingDependency {
            what: "yaml decoder",
            feature: "yaml",
        };
        assert_eq!(
            err.to_string(),
            "yaml decoder is not available; enable the `yaml` feature"
        );
    }
}
