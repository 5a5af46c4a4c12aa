use crate::config::{json_kind, read_json_file};
use crate::error::GeneratorError;
use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Service name → base host URL. Not required to be exhaustive.
#[derive(Debug, Clone, Default)]
pub struct ServiceHostMapping {
    hosts: HashMap<String, String>,
}

impl ServiceHostMapping {
    pub fn new(hosts: HashMap<String, String>) -> Self {
        Self { hosts }
    }

    /// Host for `service`, or `default_host` when the service is unmapped.
    pub fn resolve<'a>(&'a self, service: &str, default_host: &'a str) -> &'a str {
        self.hosts
            .get(service)
            .map(String::as_str)
            .unwrap_or(default_host)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Load the flat `{"service": "http://host"}` mapping. Any failure is fatal.
pub fn load_service_host_mapping(path: &Path) -> Result<ServiceHostMapping> {
    let value = read_json_file(path).context("failed to load service host mapping")?;
    let obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(GeneratorError::invalid_document(
                path,
                format!("expected a json object, found {}", json_kind(&other)),
            )
            .into())
        }
    };

    let mut hosts = HashMap::with_capacity(obj.len());
    for (service, host) in obj {
        match host {
            Value::String(host) => {
                hosts.insert(service, host);
            }
            other => {
                return Err(GeneratorError::invalid_document(
                    path,
                    format!(
                        "host of service '{}' must be a string, found {}",
                        service,
                        json_kind(&other)
                    ),
                )
                .into())
            }
        }
    }

    tracing::info!(
        "mapping: loaded service hosts, path={}, services={}",
        path.display(),
        hosts.len()
    );
    Ok(ServiceHostMapping::new(hosts))
}

/// Raw endpoint rows gathered from every definition file, plus per-file
/// bookkeeping for the run summary.
#[derive(Debug, Default)]
pub struct RecordBatch {
    pub records: Vec<Value>,
    pub files_loaded: usize,
    pub files_skipped: usize,
}

fn json_file_matcher() -> GlobMatcher {
    Glob::new("*.json")
        .expect("static glob pattern")
        .compile_matcher()
}

/// List `*.json` files directly inside `dir`, sorted by file name. Dotfiles
/// are hidden, as with shell globbing. A missing directory lists nothing.
fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let matcher = json_file_matcher();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                "mapping: endpoint definitions directory not found, path={}, endpoints=[]",
                dir.display()
            );
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(GeneratorError::Io {
                path: dir.to_path_buf(),
                source,
            }
            .into())
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| GeneratorError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| !name.starts_with('.') && matcher.is_match(name))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenate the top-level arrays of every `*.json` file in `dir`.
///
/// A file that cannot be read, does not parse, or is not an array is logged
/// and skipped; the remaining files still contribute. A missing directory
/// yields an empty batch; only an unreadable one is fatal.
pub fn load_endpoint_records(dir: &Path) -> Result<RecordBatch> {
    let files = list_json_files(dir).context("failed to list endpoint definition files")?;
    let mut batch = RecordBatch::default();

    for file in files {
        match read_json_file(&file) {
            Ok(Value::Array(rows)) => {
                tracing::info!(
                    "mapping: loaded endpoint definitions, path={}, records={}",
                    file.display(),
                    rows.len()
                );
                batch.records.extend(rows);
                batch.files_loaded += 1;
            }
            Ok(other) => {
                tracing::error!(
                    "mapping: skipped endpoint definitions, path={}, error=expected a json array, found {}",
                    file.display(),
                    json_kind(&other)
                );
                batch.files_skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    "mapping: skipped endpoint definitions, path={}, error={:#}",
                    file.display(),
                    anyhow::Error::new(e)
                );
                batch.files_skipped += 1;
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_default() {
        let mapping = ServiceHostMapping::new(
            [("orders".to_string(), "http://orders:8080".to_string())]
                .into_iter()
                .collect(),
        );
        assert_eq!(mapping.resolve("orders", "http://fallback"), "http://orders:8080");
        assert_eq!(mapping.resolve("billing", "http://fallback"), "http://fallback");
    }

    #[test]
    fn test_load_service_host_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, r#"{"orders": "http://orders:8080", "users": "http://users"}"#).unwrap();
        let mapping = load_service_host_mapping(&path).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.resolve("users", "x"), "http://users");
    }

    #[test]
    fn test_service_host_mapping_rejects_non_string_host() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, r#"{"orders": 8080}"#).unwrap();
        assert!(load_service_host_mapping(&path).is_err());
    }

    #[test]
    fn test_service_host_mapping_missing_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_service_host_mapping(&dir.path().join("services.json")).is_err());
    }

    #[test]
    fn test_load_records_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.json"),
            r#"[{"service": "orders", "method": "GET", "path": "/list"}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("b.json"), r#"[{"service": "#).unwrap();
        std::fs::write(dir.path().join("c.json"), r#"{"service": "orders"}"#).unwrap();
        std::fs::write(
            dir.path().join("d.json"),
            r#"[{"service": "users", "method": "POST", "path": "/"}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "[1]").unwrap();

        let batch = load_endpoint_records(dir.path()).unwrap();
        assert_eq!(batch.files_loaded, 2);
        assert_eq!(batch.files_skipped, 2);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0]["service"], "orders");
        assert_eq!(batch.records[1]["service"], "users");
    }

    #[test]
    fn test_load_records_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let batch = load_endpoint_records(&dir.path().join("nope")).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.files_loaded, 0);
        assert_eq!(batch.files_skipped, 0);
    }

    #[test]
    fn test_dotfiles_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".bak.json"),
            r#"[{"service": "orders", "method": "GET", "path": "/old"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("live.json"),
            r#"[{"service": "orders", "method": "GET", "path": "/new"}]"#,
        )
        .unwrap();

        let batch = load_endpoint_records(dir.path()).unwrap();
        assert_eq!(batch.files_loaded, 1);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0]["path"], "/new");
    }

    #[test]
    fn test_subdirectories_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();
        let batch = load_endpoint_records(dir.path()).unwrap();
        assert_eq!(batch.files_loaded, 0);
        assert!(batch.records.is_empty());
    }
}
