/// Configuration management for the remid resolver
///
/// The configuration file is TOML with flat scalar keys plus two nested
/// tables (`[cached]` for the local daemon, `[http_headers]` for extra
/// request headers). Loading is deliberately lenient: a key of the wrong
/// type is logged and replaced by its default so one bad line never takes
/// down every lookup on the host. Every string field always holds a
/// concrete value (possibly empty) after a successful load.
///
/// A `RuntimeConfig` is loaded fresh for each public resolver operation and
/// dropped when the operation returns; nothing is reused across calls.
use crate::error::{ResolveError, ResolveResult};
use std::path::Path;
use tracing::warn;

/// Default location of the resolver configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/remid/remid.conf";

const DEFAULT_API_ENDPOINT: &str = "http://localhost:1104/v1";
const DEFAULT_CACHE_DIR: &str = "/var/cache/remid";

/// Connection and policy descriptor for one resolver operation.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_endpoint: String,
    pub auth_token: String,
    pub user: String,
    pub password: String,
    /// External command that answers queries instead of the network
    pub query_wrapper: String,
    /// Wrapper consulted by SSH key chaining on the host side
    pub chain_ssh_wrapper: String,
    pub http_proxy: String,
    pub cache_dir: String,
    pub tls_cert: String,
    pub tls_key: String,
    pub tls_ca: String,
    /// Extra request headers, in table order
    pub http_headers: Vec<(String, String)>,
    pub uid_shift: i64,
    pub gid_shift: i64,
    /// Maximum redirects to follow; zero means redirects are not followed
    pub http_location: u64,
    pub ssl_verify: bool,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Additional attempts after the first transport failure
    pub request_retry: u32,
    /// Seconds the failure marker suppresses outbound requests
    pub request_locktime: u64,
    /// On-disk response cache toggle
    pub cache: bool,
    pub cache_ttl: u64,
    pub negative_cache_ttl: u64,
    /// Prefer the local caching daemon over the network
    pub cached_enable: bool,
    pub cached_unix_socket: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            auth_token: String::new(),
            user: String::new(),
            password: String::new(),
            query_wrapper: String::new(),
            chain_ssh_wrapper: String::new(),
            http_proxy: String::new(),
            cache_dir: DEFAULT_CACHE_DIR.to_string(),
            tls_cert: String::new(),
            tls_key: String::new(),
            tls_ca: String::new(),
            http_headers: Vec::new(),
            uid_shift: 0,
            gid_shift: 0,
            http_location: 0,
            ssl_verify: true,
            request_timeout: 10,
            request_retry: 3,
            request_locktime: 1000,
            cache: true,
            cache_ttl: 600,
            negative_cache_ttl: 60,
            cached_enable: false,
            cached_unix_socket: String::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from `path`. An unreadable or structurally invalid
    /// file is a configuration error; a single key of the wrong type only
    /// degrades that key to its default.
    pub fn load(path: &Path) -> ResolveResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ResolveError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let table: toml::Table = toml::from_str(&raw).map_err(|e| {
            ResolveError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;

        let mut config = RuntimeConfig::default();
        config.api_endpoint = str_key(&table, "api_endpoint", &config.api_endpoint);
        config.auth_token = str_key(&table, "auth_token", &config.auth_token);
        config.user = str_key(&table, "user", &config.user);
        config.password = str_key(&table, "password", &config.password);
        config.query_wrapper = str_key(&table, "query_wrapper", &config.query_wrapper);
        config.chain_ssh_wrapper = str_key(&table, "chain_ssh_wrapper", &config.chain_ssh_wrapper);
        config.http_proxy = str_key(&table, "http_proxy", &config.http_proxy);
        config.cache_dir = str_key(&table, "cache_dir", &config.cache_dir);
        config.tls_cert = str_key(&table, "tls_cert", &config.tls_cert);
        config.tls_key = str_key(&table, "tls_key", &config.tls_key);
        config.tls_ca = str_key(&table, "tls_ca", &config.tls_ca);
        config.uid_shift = int_key(&table, "uid_shift", config.uid_shift);
        config.gid_shift = int_key(&table, "gid_shift", config.gid_shift);
        config.http_location = uint_key(&table, "http_location", config.http_location);
        config.ssl_verify = flag_key(&table, "ssl_verify", config.ssl_verify);
        config.request_timeout = uint_key(&table, "request_timeout", config.request_timeout);
        config.request_retry = uint_key(&table, "request_retry", u64::from(config.request_retry)) as u32;
        config.request_locktime = uint_key(&table, "request_locktime", config.request_locktime);
        config.cache = flag_key(&table, "cache", config.cache);
        config.cache_ttl = uint_key(&table, "cache_ttl", config.cache_ttl);
        config.negative_cache_ttl =
            uint_key(&table, "negative_cache_ttl", config.negative_cache_ttl);

        if let Some(value) = table.get("cached") {
            match value.as_table() {
                Some(cached) => {
                    config.cached_enable = flag_key(cached, "enable", config.cached_enable);
                    config.cached_unix_socket =
                        str_key(cached, "unix_socket", &config.cached_unix_socket);
                }
                None => warn!("cannot parse config key cached: expected a table"),
            }
        }

        if let Some(value) = table.get("http_headers") {
            match value.as_table() {
                Some(headers) => {
                    for (key, value) in headers {
                        match value.as_str() {
                            Some(value) => {
                                config.http_headers.push((key.clone(), value.to_string()));
                            }
                            None => warn!(
                                "cannot parse config key http_headers.{}: expected string, got {}",
                                key,
                                value.type_str()
                            ),
                        }
                    }
                }
                None => warn!("cannot parse config key http_headers: expected a table"),
            }
        }

        Ok(config)
    }
}

fn str_key(table: &toml::Table, key: &str, default: &str) -> String {
    match table.get(key) {
        None => default.to_string(),
        Some(toml::Value::String(value)) => value.clone(),
        Some(other) => {
            warn!(
                "cannot parse config key {}: expected string, got {}",
                key,
                other.type_str()
            );
            default.to_string()
        }
    }
}

fn int_key(table: &toml::Table, key: &str, default: i64) -> i64 {
    match table.get(key) {
        None => default,
        Some(toml::Value::Integer(value)) => *value,
        Some(other) => {
            warn!(
                "cannot parse config key {}: expected integer, got {}",
                key,
                other.type_str()
            );
            default
        }
    }
}

/// Integer key with non-negative semantics; negative values degrade to the
/// default like any other malformed value.
fn uint_key(table: &toml::Table, key: &str, default: u64) -> u64 {
    match table.get(key) {
        None => default,
        Some(toml::Value::Integer(value)) if *value >= 0 => *value as u64,
        Some(other) => {
            warn!(
                "cannot parse config key {}: expected non-negative integer, got {}",
                key,
                other
            );
            default
        }
    }
}

/// Toggle key: accepts a boolean or an integer (non-zero = on).
fn flag_key(table: &toml::Table, key: &str, default: bool) -> bool {
    match table.get(key) {
        None => default,
        Some(toml::Value::Boolean(value)) => *value,
        Some(toml::Value::Integer(value)) => *value != 0,
        Some(other) => {
            warn!(
                "cannot parse config key {}: expected boolean or integer, got {}",
                key,
                other.type_str()
            );
            default
        }
    }
}
