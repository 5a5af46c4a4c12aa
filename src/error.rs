use std::fmt;
use std::path::PathBuf;

/// Fatal errors raised while loading inputs or writing the gateway document.
#[derive(Debug)]
pub enum GeneratorError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    Toml { path: PathBuf, source: toml::de::Error },
    InvalidDocument { path: PathBuf, reason: String },
    Config(String),
}

impl GeneratorError {
    pub fn invalid_document(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GeneratorError::InvalidDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::Io { path, .. } => write!(f, "io error on {}", path.display()),
            GeneratorError::Json { path, .. } => write!(f, "invalid json in {}", path.display()),
            GeneratorError::Toml { path, .. } => write!(f, "invalid toml in {}", path.display()),
            GeneratorError::InvalidDocument { path, reason } => {
                write!(f, "unexpected document shape in {}: {}", path.display(), reason)
            }
            GeneratorError::Config(msg) => write!(f, "config error: {}", msg),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::Io { source, .. } => Some(source),
            GeneratorError::Json { source, .. } => Some(source),
            GeneratorError::Toml { source, .. } => Some(source),
            GeneratorError::InvalidDocument { .. } | GeneratorError::Config(_) => None,
        }
    }
}

/// Why a single endpoint record was dropped. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRejection {
    NotAnObject,
    MissingField(&'static str),
    NotAString(&'static str),
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRejection::NotAnObject => write!(f, "record is not a json object"),
            RecordRejection::MissingField(name) => write!(f, "missing required field '{}'", name),
            RecordRejection::NotAString(name) => write!(f, "field '{}' is not a string", name),
        }
    }
}

impl std::error::Error for RecordRejection {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_document() {
        assert_eq!(
            GeneratorError::invalid_document("config/base/krakend_config.json", "expected object")
                .to_string(),
            "unexpected document shape in config/base/krakend_config.json: expected object"
        );
    }

    #[test]
    fn display_config() {
        assert_eq!(
            GeneratorError::Config("default_host is empty".to_string()).to_string(),
            "config error: default_host is empty"
        );
    }

    #[test]
    fn display_io_keeps_source() {
        let err = GeneratorError::Io {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.to_string(), "io error on missing.json");
        assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "not found");
    }

    #[test]
    fn chain_prints_cause_once() {
        let err = anyhow::Error::new(GeneratorError::Io {
            path: PathBuf::from("services.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
        .context("failed to load service host mapping");
        let rendered = format!("{:#}", err);
        assert_eq!(
            rendered,
            "failed to load service host mapping: io error on services.json: not found"
        );
        assert_eq!(rendered.matches("not found").count(), 1);
    }

    #[test]
    fn display_missing_field() {
        assert_eq!(
            RecordRejection::MissingField("path").to_string(),
            "missing required field 'path'"
        );
    }

    #[test]
    fn display_not_a_string() {
        assert_eq!(
            RecordRejection::NotAString("method").to_string(),
            "field 'method' is not a string"
        );
    }
}
