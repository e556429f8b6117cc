/// Record decoding: resource kinds, record sets, and single-record lookup
///
/// The identity service answers every query with a JSON array of record
/// objects. Each supported category implements [`ResourceKind`] once
/// (queries, entry accessors, buffer materialization) so lookup and
/// enumeration control flow is written a single time over the trait.
pub mod group;
pub mod shadow;
pub mod user;

pub use group::{GroupEntry, GroupKind, GroupRecord};
pub use shadow::{ShadowKind, ShadowRecord};
pub use user::{UserEntry, UserKind, UserRecord};

use crate::buffer::RecordBuffer;
use crate::config::RuntimeConfig;
use crate::error::{ResolveError, ResolveResult};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Resource categories served by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    User,
    Group,
    Shadow,
}

/// One record category: how to query it, decode its entries, and materialize
/// a record view into a caller-owned buffer.
pub trait ResourceKind {
    const KIND: Kind;
    /// Query returning the full record set for enumeration.
    const LIST_QUERY: &'static str;
    /// Service-side entry shape.
    type Entry: DeserializeOwned + Send + 'static;
    /// Host-facing record view borrowing from the destination buffer.
    type Record<'a>;

    /// By-name lookup query for `name`.
    fn name_query(name: &str) -> String;
    fn entry_name(entry: &Self::Entry) -> &str;
    fn entry_id(entry: &Self::Entry) -> i64;
    /// Write `entry`'s fields into `buf` and return the record view.
    /// Capacity is checked before every field write.
    fn materialize<'a>(
        entry: &Self::Entry,
        config: &RuntimeConfig,
        buf: &mut RecordBuffer<'a>,
    ) -> ResolveResult<Self::Record<'a>>;
}

/// Parse a response payload as a record set. A structurally malformed
/// payload is a contract violation and surfaces as unavailable; individual
/// elements that fail to decode are skipped, matching how the original
/// client steps over null leaves.
pub fn decode_record_set<K: ResourceKind>(payload: &[u8]) -> ResolveResult<Vec<K::Entry>> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(payload).map_err(|e| {
        error!("record set parse error: {}", e);
        ResolveError::Parse(e.to_string())
    })?;

    let mut entries = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<K::Entry>(value) {
            Ok(entry) => entries.push(entry),
            Err(e) => debug!("skipping malformed record: {}", e),
        }
    }
    Ok(entries)
}

/// Decode the first record in `payload` satisfying `predicate` into `buf`.
/// First match wins; no uniqueness is assumed or enforced.
pub fn decode_one<'a, K: ResourceKind>(
    payload: &[u8],
    config: &RuntimeConfig,
    predicate: impl Fn(&K::Entry) -> bool,
    buf: &mut RecordBuffer<'a>,
) -> ResolveResult<K::Record<'a>> {
    let entries = decode_record_set::<K>(payload)?;
    for entry in &entries {
        if predicate(entry) {
            return K::materialize(entry, config, buf);
        }
    }
    Err(ResolveError::NotFound)
}

/// Service fields may be present but empty; the host still expects a value.
pub(crate) fn non_empty<'s>(value: &'s str, default: &'s str) -> &'s str {
    if value.is_empty() {
        default
    } else {
        value
    }
}
