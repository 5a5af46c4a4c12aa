use crate::config::{json_kind, read_json_file};
use crate::endpoint::NormalizedEndpoint;
use crate::error::GeneratorError;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::Path;

/// Methods and header keys seen across every accepted record.
///
/// Fed once per record, before merging, so headers contributed by duplicate
/// records are counted even though the endpoint itself already existed.
#[derive(Debug, Default)]
pub struct CorsAccumulator {
    methods: BTreeSet<String>,
    headers: BTreeSet<String>,
}

impl CorsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, endpoint: &NormalizedEndpoint) {
        self.methods.insert(endpoint.method.clone());
        self.headers.extend(endpoint.input_headers.iter().cloned());
    }

    pub fn finish(self, allow_origins: Vec<String>) -> CorsPolicy {
        CorsPolicy {
            allow_origins,
            allow_methods: self.methods.into_iter().collect(),
            allow_headers: self.headers.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

impl CorsPolicy {
    /// Overwrite the three allow-lists in an existing `security/cors` block,
    /// leaving any other keys (max_age, allow_credentials, ...) alone.
    pub fn apply_to(&self, cors: &mut Map<String, Value>) {
        cors.insert("allow_origins".into(), strings(&self.allow_origins));
        cors.insert("allow_methods".into(), strings(&self.allow_methods));
        cors.insert("allow_headers".into(), strings(&self.allow_headers));
    }
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

/// Origins from the environment allow-list file. A missing file means no
/// origin is allowed; a malformed one is fatal.
pub fn load_allow_origins(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        tracing::info!(
            "policy: origin allow-list not found, path={}, allow_origins=[]",
            path.display()
        );
        return Ok(Vec::new());
    }

    let value = read_json_file(path).context("failed to load origin allow-list")?;
    if !value.is_object() {
        return Err(GeneratorError::invalid_document(
            path,
            format!("expected a json object, found {}", json_kind(&value)),
        )
        .into());
    }
    let origins = match value.get("allow_origins") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut origins = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => origins.push(s.clone()),
                    other => {
                        return Err(GeneratorError::invalid_document(
                            path,
                            format!("allow_origins entries must be strings, found {}", json_kind(other)),
                        )
                        .into())
                    }
                }
            }
            origins
        }
        Some(other) => {
            return Err(GeneratorError::invalid_document(
                path,
                format!("allow_origins must be an array, found {}", json_kind(other)),
            )
            .into())
        }
    };

    tracing::info!(
        "policy: loaded origin allow-list, path={}, origins={}",
        path.display(),
        origins.len()
    );
    Ok(origins)
}
