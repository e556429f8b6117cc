/// On-disk response cache with positive and negative TTLs
///
/// One file per query under the configured cache directory, named by the
/// SHA-256 of the query string. A positive entry stores the raw body; a
/// negative entry (`.nf` suffix) records an authoritative not-found so
/// repeated misses stay off the network. Freshness comes from file mtime;
/// expired entries are deleted on read. The cache is best-effort
/// throughout; IO problems degrade to a miss, never to a failed lookup.
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Cache consultation result.
pub enum CacheHit {
    /// Fresh positive entry with the stored response body
    Positive(Vec<u8>),
    /// Fresh negative entry: the service said not-found recently
    Negative,
}

pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
    negative_ttl: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl_secs: u64, negative_ttl_secs: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::from_secs(ttl_secs),
            negative_ttl: Duration::from_secs(negative_ttl_secs),
        }
    }

    fn entry_path(&self, query: &str) -> PathBuf {
        let digest = Sha256::digest(query.as_bytes());
        self.dir.join(hex::encode(digest))
    }

    fn negative_path(&self, query: &str) -> PathBuf {
        let digest = Sha256::digest(query.as_bytes());
        self.dir.join(format!("{}.nf", hex::encode(digest)))
    }

    /// Consult the cache for `query`. Expired entries are deleted on read.
    pub fn lookup(&self, query: &str) -> Option<CacheHit> {
        let positive = self.entry_path(query);
        match entry_age(&positive) {
            Some(age) if age < self.ttl => match fs::read(&positive) {
                Ok(body) => {
                    debug!("cache HIT: {}", query);
                    return Some(CacheHit::Positive(body));
                }
                Err(e) => warn!("cannot read cache entry {}: {}", positive.display(), e),
            },
            Some(_) => remove_entry(&positive),
            None => {}
        }

        let negative = self.negative_path(query);
        match entry_age(&negative) {
            Some(age) if age < self.negative_ttl => {
                debug!("negative cache HIT: {}", query);
                return Some(CacheHit::Negative);
            }
            Some(_) => remove_entry(&negative),
            None => {}
        }

        debug!("cache MISS: {}", query);
        None
    }

    /// Store a successful response body for `query`.
    pub fn store(&self, query: &str, body: &[u8]) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("cannot create cache dir {}: {}", self.dir.display(), e);
            return;
        }
        // A fresh positive answer invalidates any lingering negative entry.
        remove_entry(&self.negative_path(query));
        let path = self.entry_path(query);
        if let Err(e) = fs::write(&path, body) {
            warn!("cannot write cache entry {}: {}", path.display(), e);
        }
    }

    /// Record an authoritative not-found for `query`.
    pub fn store_negative(&self, query: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!("cannot create cache dir {}: {}", self.dir.display(), e);
            return;
        }
        remove_entry(&self.entry_path(query));
        let path = self.negative_path(query);
        if let Err(e) = fs::write(&path, []) {
            warn!("cannot write negative cache entry {}: {}", path.display(), e);
        }
    }
}

fn entry_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    // Clock skew putting mtime in the future counts as brand new.
    Some(
        SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO),
    )
}

fn remove_entry(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("cannot remove cache entry {}: {}", path.display(), e),
    }
}
