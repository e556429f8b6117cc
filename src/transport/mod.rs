/// HTTP request execution against the identity service
///
/// Builds the outbound call from the runtime configuration, applies bounded
/// retries, consults the on-disk response cache and the cross-process
/// failure marker, and classifies the response: 404 is authoritative
/// not-found, any other non-2xx or transport fault is unavailable. Bodies
/// are read incrementally against a hard 10 MiB ceiling so a malfunctioning
/// server cannot balloon resolver memory.
pub mod cache;
mod unix;

use crate::config::RuntimeConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::lock;
use cache::{CacheHit, ResponseCache};
use std::io::Read;
use std::time::Duration;
use tracing::{debug, warn};

/// Hard ceiling on response bodies (10 MiB).
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Pause between transport retry attempts.
const RETRY_WAIT: Duration = Duration::from_secs(1);

pub(crate) const USER_AGENT: &str = concat!("remid/", env!("CARGO_PKG_VERSION"));

/// Raw response payload plus its HTTP-style status classification.
/// Exclusively owned by the call that issued the request.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub body: Vec<u8>,
    pub status: u16,
}

/// Execute `query` against the identity service per `config`.
pub fn request(config: &RuntimeConfig, query: &str) -> ResolveResult<RawResponse> {
    // An external wrapper command replaces the network entirely.
    if !config.query_wrapper.is_empty() {
        return exec_wrapper(&config.query_wrapper, query);
    }

    let cache = response_cache(config);
    if let Some(cache) = &cache {
        match cache.lookup(query) {
            Some(CacheHit::Positive(body)) => return Ok(RawResponse { body, status: 200 }),
            Some(CacheHit::Negative) => return Err(ResolveError::NotFound),
            None => {}
        }
    }

    let marker = lock::default_marker_path();
    if !lock::request_available(&marker, Duration::from_secs(config.request_locktime)) {
        debug!("requests suspended by failure marker {}", marker.display());
        return Err(ResolveError::Transport(
            "requests suspended after recent transport failure".to_string(),
        ));
    }

    let result = if config.cached_enable && !config.cached_unix_socket.is_empty() {
        unix::request(config, query)
    } else {
        http_request(config, query)
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            lock::mark_failure(&marker);
            return Err(e);
        }
    };

    if response.status == 404 {
        if let Some(cache) = &cache {
            cache.store_negative(query);
        }
        return Err(ResolveError::NotFound);
    }
    if !(200..300).contains(&response.status) {
        return Err(ResolveError::Transport(format!(
            "identity service returned status {}",
            response.status
        )));
    }

    if let Some(cache) = &cache {
        cache.store(query, &response.body);
    }
    Ok(response)
}

fn response_cache(config: &RuntimeConfig) -> Option<ResponseCache> {
    if config.cache && !config.cache_dir.is_empty() {
        Some(ResponseCache::new(
            &config.cache_dir,
            config.cache_ttl,
            config.negative_cache_ttl,
        ))
    } else {
        None
    }
}

fn http_request(config: &RuntimeConfig, query: &str) -> ResolveResult<RawResponse> {
    let client = build_client(config)?;
    let url = format!("{}/{}", config.api_endpoint.trim_end_matches('/'), query);

    let attempts = config.request_retry + 1;
    let mut last_error = None;
    for attempt in 1..=attempts {
        match send(&client, config, &url) {
            Ok(response) => return Ok(response),
            // An oversized body will not shrink on retry.
            Err(e @ ResolveError::ResponseTooLarge { .. }) => return Err(e),
            Err(e) => {
                warn!("request attempt {}/{} failed: {}", attempt, attempts, e);
                last_error = Some(e);
                if attempt < attempts {
                    std::thread::sleep(RETRY_WAIT);
                }
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| ResolveError::Transport("request failed".to_string())))
}

fn send(
    client: &reqwest::blocking::Client,
    config: &RuntimeConfig,
    url: &str,
) -> ResolveResult<RawResponse> {
    let mut builder = client.get(url);
    if !config.auth_token.is_empty() {
        builder = builder.header(
            reqwest::header::AUTHORIZATION,
            format!("token {}", config.auth_token),
        );
    }
    if !config.user.is_empty() {
        builder = builder.basic_auth(&config.user, Some(&config.password));
    }
    for (key, value) in &config.http_headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    let response = builder
        .send()
        .map_err(|e| ResolveError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let body = read_capped(response, MAX_RESPONSE_SIZE)?;
    Ok(RawResponse { body, status })
}

fn build_client(config: &RuntimeConfig) -> ResolveResult<reqwest::blocking::Client> {
    let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);
    if config.request_timeout > 0 {
        builder = builder.timeout(Duration::from_secs(config.request_timeout));
    }
    // Redirects are opt-in via http_location, which caps how many to follow.
    builder = builder.redirect(if config.http_location > 0 {
        reqwest::redirect::Policy::limited(config.http_location as usize)
    } else {
        reqwest::redirect::Policy::none()
    });
    if !config.http_proxy.is_empty() {
        let proxy = reqwest::Proxy::all(&config.http_proxy)
            .map_err(|e| ResolveError::Config(format!("invalid http_proxy: {}", e)))?;
        builder = builder.proxy(proxy);
    }
    if !config.ssl_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if !config.tls_ca.is_empty() {
        let pem = std::fs::read(&config.tls_ca).map_err(|e| {
            ResolveError::Config(format!("cannot read tls_ca {}: {}", config.tls_ca, e))
        })?;
        let ca = reqwest::Certificate::from_pem(&pem)
            .map_err(|e| ResolveError::Config(format!("invalid tls_ca: {}", e)))?;
        builder = builder.add_root_certificate(ca);
    }
    if !config.tls_cert.is_empty() && !config.tls_key.is_empty() {
        let mut pem = std::fs::read(&config.tls_cert).map_err(|e| {
            ResolveError::Config(format!("cannot read tls_cert {}: {}", config.tls_cert, e))
        })?;
        let key = std::fs::read(&config.tls_key).map_err(|e| {
            ResolveError::Config(format!("cannot read tls_key {}: {}", config.tls_key, e))
        })?;
        pem.extend_from_slice(&key);
        let identity = reqwest::Identity::from_pem(&pem)
            .map_err(|e| ResolveError::Config(format!("invalid client tls material: {}", e)))?;
        builder = builder.identity(identity);
    }

    builder
        .build()
        .map_err(|e| ResolveError::Transport(format!("cannot build http client: {}", e)))
}

/// Delegate `query` to an external wrapper command; its stdout is the
/// response payload.
fn exec_wrapper(command: &str, query: &str) -> ResolveResult<RawResponse> {
    let output = std::process::Command::new(command)
        .arg(query)
        .output()
        .map_err(|e| {
            ResolveError::Transport(format!("query wrapper {} failed to start: {}", command, e))
        })?;
    if !output.status.success() {
        return Err(ResolveError::Transport(format!(
            "query wrapper {} exited with {}",
            command, output.status
        )));
    }
    if output.stdout.len() > MAX_RESPONSE_SIZE {
        return Err(ResolveError::ResponseTooLarge {
            limit: MAX_RESPONSE_SIZE,
        });
    }
    Ok(RawResponse {
        body: output.stdout,
        status: 200,
    })
}

/// Read `source` to the end, failing once the accumulated size would exceed
/// `limit`. Oversize is a hard error, never a silent truncation.
pub(crate) fn read_capped(mut source: impl Read, limit: usize) -> ResolveResult<Vec<u8>> {
    let mut body = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = source
            .read(&mut chunk)
            .map_err(|e| ResolveError::Transport(format!("read error: {}", e)))?;
        if n == 0 {
            return Ok(body);
        }
        if body.len() + n > limit {
            return Err(ResolveError::ResponseTooLarge { limit });
        }
        body.extend_from_slice(&chunk[..n]);
    }
}
