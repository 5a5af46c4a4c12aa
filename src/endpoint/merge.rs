use crate::endpoint::types::{EndpointKey, NormalizedEndpoint};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First record for this key; the candidate was stored as-is.
    Created,
    /// Key already present; only headers and query strings were unioned.
    Merged,
}

/// Endpoints keyed by `(path, method)`, kept in first-occurrence order.
#[derive(Debug, Default)]
pub struct EndpointSet {
    endpoints: Vec<NormalizedEndpoint>,
    index: HashMap<EndpointKey, usize>,
}

impl EndpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `candidate` into the set.
    ///
    /// Tie-break: the first record for a key wins. Its backend, output
    /// encoding and extra_config are never touched again; later records for
    /// the same key only add to `input_headers` and `input_query_strings`.
    pub fn merge(&mut self, candidate: NormalizedEndpoint) -> MergeOutcome {
        let key = candidate.key();
        if let Some(&idx) = self.index.get(&key) {
            let existing = &mut self.endpoints[idx];
            existing.input_headers.extend(candidate.input_headers);
            existing.input_query_strings.extend(candidate.input_query_strings);
            tracing::info!("endpoint: merged params and headers into existing, key={}", key);
            return MergeOutcome::Merged;
        }

        tracing::info!("endpoint: added new endpoint, key={}", key);
        tracing::debug!(endpoint = ?candidate, "endpoint: created");
        self.index.insert(key, self.endpoints.len());
        self.endpoints.push(candidate);
        MergeOutcome::Created
    }

    pub fn get(&self, path: &str, method: &str) -> Option<&NormalizedEndpoint> {
        let key = EndpointKey {
            path: path.to_string(),
            method: method.to_string(),
        };
        self.index.get(&key).map(|&idx| &self.endpoints[idx])
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedEndpoint> {
        self.endpoints.iter()
    }

    pub fn into_endpoints(self) -> Vec<NormalizedEndpoint> {
        self.endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::types::Backend;
    use serde_json::json;

    fn make_endpoint(path: &str, method: &str, host: &str, headers: &[&str], params: &[&str]) -> NormalizedEndpoint {
        NormalizedEndpoint {
            endpoint: path.to_string(),
            method: method.to_string(),
            output_encoding: Some("json".to_string()),
            backend: vec![Backend {
                url_pattern: path.to_string(),
                encoding: Some("json".to_string()),
                sd: "static".to_string(),
                method: method.to_string(),
                disable_host_sanitize: false,
                host: vec![host.to_string()],
            }],
            input_headers: headers.iter().map(|s| s.to_string()).collect(),
            input_query_strings: params.iter().map(|s| s.to_string()).collect(),
            extra_config: json!({}),
        }
    }

    #[test]
    fn test_first_backend_wins() {
        let mut set = EndpointSet::new();
        assert_eq!(
            set.merge(make_endpoint("/orders/list", "GET", "http://first", &["X-B"], &["sort"])),
            MergeOutcome::Created
        );

        let mut second = make_endpoint("/orders/list", "GET", "http://second", &["X-A", "X-B"], &["page"]);
        second.output_encoding = Some("xml".to_string());
        second.extra_config = json!({"auth/validator": {}});
        assert_eq!(set.merge(second), MergeOutcome::Merged);

        assert_eq!(set.len(), 1);
        let merged = set.get("/orders/list", "GET").unwrap();
        assert_eq!(merged.backend[0].host, vec!["http://first"]);
        assert_eq!(merged.output_encoding.as_deref(), Some("json"));
        assert_eq!(merged.extra_config, json!({}));
        assert_eq!(
            merged.input_headers.iter().collect::<Vec<_>>(),
            vec!["X-A", "X-B"]
        );
        assert_eq!(
            merged.input_query_strings.iter().collect::<Vec<_>>(),
            vec!["page", "sort"]
        );
    }

    #[test]
    fn test_method_is_part_of_key() {
        let mut set = EndpointSet::new();
        set.merge(make_endpoint("/orders/list", "GET", "h", &[], &[]));
        set.merge(make_endpoint("/orders/list", "POST", "h", &[], &[]));
        assert_eq!(set.len(), 2);
        assert!(set.get("/orders/list", "POST").is_some());
        assert!(set.get("/orders/list", "DELETE").is_none());
    }

    #[test]
    fn test_first_occurrence_order() {
        let mut set = EndpointSet::new();
        set.merge(make_endpoint("/b", "GET", "h", &[], &[]));
        set.merge(make_endpoint("/a", "GET", "h", &[], &[]));
        set.merge(make_endpoint("/b", "GET", "h", &["X"], &[]));
        let paths: Vec<_> = set.into_endpoints().into_iter().map(|e| e.endpoint).collect();
        assert_eq!(paths, vec!["/b", "/a"]);
    }
}
