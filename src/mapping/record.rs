use crate::error::RecordRejection;
use serde_json::{Map, Value};

/// One endpoint definition as written in `mapping/api/base/*.json`, after
/// required-field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEndpointRecord {
    pub service: String,
    pub method: String,
    /// Raw path, may contain `:name` placeholders.
    pub path: String,
    /// Query-string-like text, e.g. `?page=1&sort=desc`.
    pub params: Option<String>,
    /// Comma separated `key:value` pairs.
    pub header: Option<String>,
    pub encoding_type: Option<String>,
}

impl RawEndpointRecord {
    /// Validate one array element. `null` counts as missing; optional fields
    /// that are not strings are treated as absent.
    pub fn from_value(value: &Value) -> Result<Self, RecordRejection> {
        let obj = value.as_object().ok_or(RecordRejection::NotAnObject)?;
        Ok(Self {
            service: required(obj, "service")?,
            method: required(obj, "method")?,
            path: required(obj, "path")?,
            params: optional(obj, "params"),
            header: optional(obj, "header"),
            encoding_type: optional(obj, "encoding_type"),
        })
    }
}

fn required(obj: &Map<String, Value>, field: &'static str) -> Result<String, RecordRejection> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(RecordRejection::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RecordRejection::NotAString(field)),
    }
}

fn optional(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}
