pub mod types;


pub use types::*;

use crate::error::GeneratorError;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Key of the CORS block inside the gateway `extra_config`.
pub const CORS_NAMESPACE: &str = "security/cors";

impl GeneratorSettings {
    /// Load settings from a file (if given and it exists) and apply
    /// environment variable overrides. When no file exists, built-in defaults
    /// are used so a plain installation tree needs no settings file at all.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path).map_err(|source| GeneratorError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                match path.extension().and_then(|e| e.to_str()) {
                    Some("toml") => toml::from_str(&content).map_err(|source| GeneratorError::Toml {
                        path: path.to_path_buf(),
                        source,
                    })?,
                    Some("json") => {
                        serde_json::from_str(&content).map_err(|source| GeneratorError::Json {
                            path: path.to_path_buf(),
                            source,
                        })?
                    }
                    Some(ext) => anyhow::bail!("unsupported settings format: .{ext}, use .toml or .json"),
                    None => anyhow::bail!("settings file has no extension, use .toml or .json"),
                }
            }
            Some(path) => {
                tracing::info!("config: settings file not found at {}, using defaults", path.display());
                GeneratorSettings::default()
            }
            None => GeneratorSettings::default(),
        };

        settings.apply_env_overrides();
        settings.validate()?;

        tracing::debug!(
            passthrough_services = ?settings.passthrough_services,
            default_host = %settings.default_host,
            auth_header = %settings.auth_header,
            "config: generator settings resolved"
        );
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup so tests need not touch the
    /// process environment.
    pub(crate) fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("KRAKEND_GEN_PASSTHROUGH_SERVICES") {
            self.passthrough_services = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("KRAKEND_GEN_DEFAULT_HOST") {
            self.default_host = v;
        }
        if let Some(v) = lookup("KRAKEND_GEN_AUTH_HEADER") {
            self.auth_header = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_host.trim().is_empty() {
            return Err(GeneratorError::Config("default_host must not be empty".into()).into());
        }
        if self.auth_header.trim().is_empty() {
            return Err(GeneratorError::Config("auth_header must not be empty".into()).into());
        }
        if self.passthrough_services.iter().any(|s| s.is_empty()) {
            return Err(
                GeneratorError::Config("passthrough_services has an empty entry".into()).into(),
            );
        }
        Ok(())
    }

    pub fn is_passthrough(&self, service: &str) -> bool {
        self.passthrough_services.iter().any(|s| s == service)
    }
}

/// Read and parse one JSON file.
pub fn read_json_file(path: &Path) -> Result<Value, GeneratorError> {
    let content = std::fs::read_to_string(path).map_err(|source| GeneratorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| GeneratorError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pick the environment variant of a config file if it exists, otherwise the
/// base variant.
fn resolve_config_path<'a>(base_path: &'a Path, env_path: &'a Path) -> &'a Path {
    if env_path.exists() {
        env_path
    } else {
        base_path
    }
}

/// Load the environment variant of a config file if it exists, otherwise the
/// base variant. The environment file replaces the base file wholesale.
/// Returns the path that was actually read along with its content.
pub fn load_json_config<'a>(base_path: &'a Path, env_path: &'a Path) -> Result<(&'a Path, Value)> {
    let path = resolve_config_path(base_path, env_path);
    tracing::info!("config: loading, path={}", path.display());
    let value = read_json_file(path).context("failed to load required config")?;
    Ok((path, value))
}

/// Same as [`load_json_config`], but the document must be a JSON object.
pub fn load_json_object<'a>(
    base_path: &'a Path,
    env_path: &'a Path,
) -> Result<(&'a Path, Map<String, Value>)> {
    match load_json_config(base_path, env_path)? {
        (path, Value::Object(map)) => Ok((path, map)),
        (path, other) => Err(GeneratorError::invalid_document(
            path,
            format!("expected a json object, found {}", json_kind(&other)),
        )
        .into()),
    }
}

/// Extra config with a guaranteed `security/cors` object.
pub fn load_extra_config(layout: &Layout) -> Result<Map<String, Value>> {
    let (base, env) = layout.config_pair(EXTRA_CONFIG_FILE);
    let (path, mut extra) = load_json_object(&base, &env)?;
    let cors = extra
        .entry(CORS_NAMESPACE)
        .or_insert_with(|| Value::Object(Map::new()));
    if !cors.is_object() {
        return Err(GeneratorError::invalid_document(
            path,
            format!("'{}' must be an object, found {}", CORS_NAMESPACE, json_kind(cors)),
        )
        .into());
    }
    Ok(extra)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
