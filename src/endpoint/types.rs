use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Load-balancing / service discovery mode written for every backend.
pub const STATIC_SD: &str = "static";

/// Internal service target of a gateway endpoint.
///
/// Field order matches the KrakenD backend schema as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Backend {
    pub url_pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub sd: String,
    pub method: String,
    pub disable_host_sanitize: bool,
    /// Always exactly one host.
    pub host: Vec<String>,
}

/// One gateway endpoint ready to be serialized into `endpoints`.
///
/// Header and query-string sets are `BTreeSet`s so the output is always
/// sorted and deduplicated, regardless of how many records contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEndpoint {
    pub endpoint: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_encoding: Option<String>,
    pub backend: Vec<Backend>,
    pub input_headers: BTreeSet<String>,
    pub input_query_strings: BTreeSet<String>,
    pub extra_config: Value,
}

impl NormalizedEndpoint {
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            path: self.endpoint.clone(),
            method: self.method.clone(),
        }
    }
}

/// Identity of an endpoint in the output: normalized path plus method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub path: String,
    pub method: String,
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
