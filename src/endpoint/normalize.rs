use crate::config::GeneratorSettings;
use crate::endpoint::types::{Backend, NormalizedEndpoint, STATIC_SD};
use crate::mapping::{RawEndpointRecord, ServiceHostMapping};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Shared, read-only inputs of the normalizer.
pub struct NormalizeContext<'a> {
    pub hosts: &'a ServiceHostMapping,
    /// Attached as `extra_config` to endpoints that take the auth header.
    pub auth_config: &'a Value,
    pub settings: &'a GeneratorSettings,
}

/// Query parameter keys from `?a=1&b=2` style text.
/// "?page=1&sort=desc" -> ["page", "sort"]
/// "" / "?" -> []
pub fn parse_query_params(params: Option<&str>) -> Vec<String> {
    let Some(params) = params else {
        return Vec::new();
    };
    params
        .trim_start_matches('?')
        .split('&')
        .filter_map(|segment| {
            let key = segment.split('=').next().unwrap_or_default().trim();
            (!key.is_empty()).then(|| key.to_string())
        })
        .collect()
}

/// Header keys from `Key: value, Other: value` text.
/// "Authorization: Bearer xyz, X-Trace: 1" -> ["Authorization", "X-Trace"]
pub fn parse_header_keys(header: Option<&str>) -> Vec<String> {
    let Some(header) = header else {
        return Vec::new();
    };
    header
        .split(',')
        .filter_map(|segment| {
            let key = segment.split(':').next().unwrap_or_default().trim();
            (!key.is_empty()).then(|| key.to_string())
        })
        .collect()
}

fn path_variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([A-Za-z0-9_-]+)").expect("static path variable pattern"))
}

/// Rewrite `:name` placeholders into KrakenD's `{name}` form.
/// "/users/:id/orders/:orderId" -> "/users/{id}/orders/{orderId}"
pub fn convert_path_variables(path: &str) -> String {
    path_variable_regex().replace_all(path, "{$1}").into_owned()
}

/// Public endpoint path. Passthrough services keep the raw path, everyone
/// else is namespaced under `/{service}`.
pub fn endpoint_path(service: &str, path: &str, settings: &GeneratorSettings) -> String {
    let path = if settings.is_passthrough(service) {
        path.to_string()
    } else {
        format!("/{service}{path}")
    };
    convert_path_variables(&path)
}

/// Build the gateway endpoint for a single record. The result is a merge
/// candidate; see [`EndpointSet::merge`](crate::endpoint::EndpointSet::merge)
/// for how duplicates are folded.
pub fn normalize(record: &RawEndpointRecord, ctx: &NormalizeContext<'_>) -> NormalizedEndpoint {
    let input_headers: BTreeSet<String> = parse_header_keys(record.header.as_deref())
        .into_iter()
        .collect();
    let input_query_strings: BTreeSet<String> = parse_query_params(record.params.as_deref())
        .into_iter()
        .collect();

    let host = ctx
        .hosts
        .resolve(&record.service, &ctx.settings.default_host)
        .to_string();

    let backend = Backend {
        url_pattern: convert_path_variables(&record.path),
        encoding: record.encoding_type.clone(),
        sd: STATIC_SD.to_string(),
        method: record.method.clone(),
        disable_host_sanitize: false,
        host: vec![host],
    };

    let extra_config = if input_headers.contains(&ctx.settings.auth_header) {
        ctx.auth_config.clone()
    } else {
        Value::Object(Map::new())
    };

    NormalizedEndpoint {
        endpoint: endpoint_path(&record.service, &record.path, ctx.settings),
        method: record.method.clone(),
        output_encoding: record.encoding_type.clone(),
        backend: vec![backend],
        input_headers,
        input_query_strings,
        extra_config,
    }
}
