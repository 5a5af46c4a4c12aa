use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENV: &str = "DEV";

pub const KRAKEND_CONFIG_FILE: &str = "krakend_config.json";
pub const EXTRA_CONFIG_FILE: &str = "krakend_extra_config.json";
pub const ENDPOINT_AUTH_CONFIG_FILE: &str = "endpoint_auth_config.json";
pub const SERVICE_HOST_MAPPING_FILE: &str = "services.json";
pub const ORIGIN_ALLOW_LIST_FILE: &str = "krakend_origin_allow_list.json";
pub const RESULT_FILE: &str = "krakend.json";

/// Settings file names looked up under the installation root when `--settings`
/// is not given. First existing file wins.
pub const SETTINGS_FILE_CANDIDATES: &[&str] = &["krakend-gen.toml", "krakend-gen.json"];

/// Deserialize a `T` that implements `Default`, treating JSON `null` the same as
/// a missing field (returns `T::default()`).  Use with:
///   `#[serde(default, deserialize_with = "deserialize_null_default")]`
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Knobs of the endpoint normalizer that are fixed in most deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Services whose paths are published verbatim, without the
    /// `/{service}` prefix. An explicit `null` disables passthrough.
    #[serde(
        default = "default_passthrough_services",
        deserialize_with = "deserialize_null_default"
    )]
    pub passthrough_services: Vec<String>,

    /// Host used for services absent from `services.json`.
    #[serde(default = "default_host")]
    pub default_host: String,

    /// Header whose presence attaches the endpoint-auth block.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            passthrough_services: default_passthrough_services(),
            default_host: default_host(),
            auth_header: default_auth_header(),
        }
    }
}

fn default_passthrough_services() -> Vec<String> {
    vec!["we".to_string(), "ne".to_string()]
}

fn default_host() -> String {
    "http://default-service.example.com".to_string()
}

fn default_auth_header() -> String {
    "Authorization".to_string()
}

/// On-disk layout of one installation, resolved for a single environment.
///
/// ```text
/// <root>/config/base/*.json          base configs
/// <root>/config/<env>/*.json         environment overrides + origin allow-list
/// <root>/mapping/host/base/services.json
/// <root>/mapping/api/base/*.json     raw endpoint records
/// <root>/result/<env>/krakend.json   output
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    env: String,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, env: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            env: env.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn base_config_dir(&self) -> PathBuf {
        self.root.join("config").join("base")
    }

    pub fn env_config_dir(&self) -> PathBuf {
        self.root.join("config").join(&self.env)
    }

    /// `(base, env)` candidates for one config file name.
    pub fn config_pair(&self, file_name: &str) -> (PathBuf, PathBuf) {
        (
            self.base_config_dir().join(file_name),
            self.env_config_dir().join(file_name),
        )
    }

    pub fn origin_allow_list(&self) -> PathBuf {
        self.env_config_dir().join(ORIGIN_ALLOW_LIST_FILE)
    }

    pub fn service_host_mapping(&self) -> PathBuf {
        self.root
            .join("mapping")
            .join("host")
            .join("base")
            .join(SERVICE_HOST_MAPPING_FILE)
    }

    pub fn api_mapping_dir(&self) -> PathBuf {
        self.root.join("mapping").join("api").join("base")
    }

    pub fn result_dir(&self) -> PathBuf {
        self.root.join("result").join(&self.env)
    }

    pub fn result_file(&self) -> PathBuf {
        self.result_dir().join(RESULT_FILE)
    }

    /// First settings file that exists under the root, if any.
    pub fn default_settings_file(&self) -> Option<PathBuf> {
        SETTINGS_FILE_CANDIDATES
            .iter()
            .map(|name| self.root.join(name))
            .find(|p| p.exists())
    }
}
