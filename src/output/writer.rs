use crate::config::CORS_NAMESPACE;
use crate::endpoint::NormalizedEndpoint;
use crate::error::GeneratorError;
use crate::policy::CorsPolicy;
use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Build the root gateway document.
///
/// Every key of `gateway` is kept in its original position; `endpoints` and
/// `extra_config` are overwritten. The CORS allow-lists are written into
/// `extra_config["security/cors"]`, which must already be an object.
pub fn assemble(
    mut gateway: Map<String, Value>,
    endpoints: Vec<NormalizedEndpoint>,
    mut extra_config: Map<String, Value>,
    cors: &CorsPolicy,
) -> Result<Value> {
    let cors_block = extra_config
        .entry(CORS_NAMESPACE)
        .or_insert_with(|| Value::Object(Map::new()));
    match cors_block.as_object_mut() {
        Some(block) => cors.apply_to(block),
        None => {
            return Err(GeneratorError::Config(format!(
                "extra_config['{}'] is not an object",
                CORS_NAMESPACE
            ))
            .into())
        }
    }

    gateway.insert("endpoints".into(), serde_json::to_value(endpoints)?);
    gateway.insert("extra_config".into(), Value::Object(extra_config));
    Ok(Value::Object(gateway))
}

/// Serialize with 4-space indentation.
pub fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(16 * 1024);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write the document, creating the parent directory first. The file is
/// written in place; an interrupted write leaves a truncated file behind.
pub fn write_document(path: &Path, value: &Value) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| GeneratorError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let bytes = to_pretty_json(value)?;
    std::fs::write(path, &bytes).map_err(|source| GeneratorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        "output: wrote gateway config, path={}, bytes={}",
        path.display(),
        bytes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> CorsPolicy {
        CorsPolicy {
            allow_origins: vec!["https://app.example.com".into()],
            allow_methods: vec!["GET".into()],
            allow_headers: vec![],
        }
    }

    #[test]
    fn test_assemble_keeps_top_level_order() {
        let gateway = json!({
            "version": 3,
            "name": "gw",
            "endpoints": ["stale"],
            "timeout": "3s"
        })
        .as_object()
        .cloned()
        .unwrap();
        let extra = json!({"security/cors": {"max_age": "12h"}, "telemetry/logging": {}})
            .as_object()
            .cloned()
            .unwrap();

        let doc = assemble(gateway, vec![], extra, &policy()).unwrap();
        let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["version", "name", "endpoints", "timeout", "extra_config"]);
        assert_eq!(doc["endpoints"], json!([]));
        assert_eq!(doc["extra_config"]["security/cors"]["max_age"], "12h");
        assert_eq!(
            doc["extra_config"]["security/cors"]["allow_origins"],
            json!(["https://app.example.com"])
        );
        assert_eq!(doc["extra_config"]["telemetry/logging"], json!({}));
    }

    #[test]
    fn test_assemble_rejects_non_object_cors() {
        let extra = json!({"security/cors": true}).as_object().cloned().unwrap();
        assert!(assemble(Map::new(), vec![], extra, &policy()).is_err());
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let out = to_pretty_json(&json!({"a": [1]})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n    \"a\": [\n        1\n    ]\n}\n");
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result").join("DEV").join("krakend.json");
        write_document(&path, &json!({"version": 3})).unwrap();
        let back: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back["version"], 3);
    }
}
