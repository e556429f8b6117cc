/// Shared enumeration cursor: open → next → close over a fetched record set
///
/// One cursor exists per resource kind, owned by the resolver context and
/// guarded by a mutex acquired with the bounded retry policy. `open` fetches
/// the full record set once; `next` hands out one record per call in exactly
/// the service's order; `close` rewinds and releases the set. Records are
/// decoded lazily so the caller's buffer size only matters for the record
/// actually being returned.
use crate::buffer::RecordBuffer;
use crate::config::RuntimeConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::record::{decode_record_set, ResourceKind};
use crate::transport;

/// Cursor state for one resource kind. `entries` is `None` while Closed.
pub struct CursorState<K: ResourceKind> {
    entries: Option<Vec<K::Entry>>,
    index: usize,
}

impl<K: ResourceKind> Default for CursorState<K> {
    fn default() -> Self {
        Self {
            entries: None,
            index: 0,
        }
    }
}

impl<K: ResourceKind> CursorState<K> {
    /// Fetch the full record set, replacing any prior one (last-fetch-wins)
    /// and rewinding the cursor. On failure the cursor is left Closed and
    /// the failure classification propagates.
    pub fn open(&mut self, config: &RuntimeConfig) -> ResolveResult<()> {
        self.entries = None;
        self.index = 0;
        let response = transport::request(config, K::LIST_QUERY)?;
        self.entries = Some(decode_record_set::<K>(&response.body)?);
        Ok(())
    }

    /// Decode the record under the cursor into `buf`. Opens lazily when
    /// Closed. Advances only on success, so a try-again outcome lets the
    /// caller retry the same record with a larger buffer. Once exhausted,
    /// every further call yields not-found without advancing.
    pub fn next<'a>(
        &mut self,
        config: &RuntimeConfig,
        buf: &mut RecordBuffer<'a>,
    ) -> ResolveResult<K::Record<'a>> {
        if self.entries.is_none() {
            self.open(config)?;
        }
        let Some(entries) = self.entries.as_ref() else {
            return Err(ResolveError::NotFound);
        };
        if self.index >= entries.len() {
            return Err(ResolveError::NotFound);
        }

        let record = K::materialize(&entries[self.index], config, buf)?;
        self.index += 1;
        Ok(record)
    }

    /// Rewind and release the record set. A no-op when already Closed.
    pub fn close(&mut self) {
        self.index = 0;
        self.entries = None;
    }

    #[cfg(test)]
    pub(crate) fn with_entries(entries: Vec<K::Entry>) -> Self {
        Self {
            entries: Some(entries),
            index: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_open(&self) -> bool {
        self.entries.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{UserEntry, UserKind};

    fn entry(name: &str, id: i64) -> UserEntry {
        UserEntry {
            id,
            name: name.to_string(),
            password: String::new(),
            group_id: id,
            directory: String::new(),
            shell: String::new(),
            gecos: String::new(),
        }
    }

    fn three_user_cursor() -> CursorState<UserKind> {
        CursorState::with_entries(vec![
            entry("alice", 1000),
            entry("bob", 1001),
            entry("carol", 1002),
        ])
    }

    #[test]
    fn test_next_preserves_service_order() {
        let config = RuntimeConfig::default();
        let mut cursor = three_user_cursor();

        let mut names = Vec::new();
        for _ in 0..3 {
            let mut storage = [0u8; 256];
            let mut buf = RecordBuffer::new(&mut storage);
            names.push(cursor.next(&config, &mut buf).unwrap().name.to_string());
        }
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_exhaustion_is_idempotent() {
        let config = RuntimeConfig::default();
        let mut cursor = CursorState::<UserKind>::with_entries(vec![entry("alice", 1000)]);

        let mut storage = [0u8; 256];
        let mut buf = RecordBuffer::new(&mut storage);
        cursor.next(&config, &mut buf).unwrap();

        for _ in 0..3 {
            let mut storage = [0u8; 256];
            let mut buf = RecordBuffer::new(&mut storage);
            let err = cursor.next(&config, &mut buf).unwrap_err();
            assert!(matches!(err, ResolveError::NotFound));
        }
    }

    #[test]
    fn test_try_again_does_not_advance() {
        let config = RuntimeConfig::default();
        let mut cursor = three_user_cursor();

        let mut tiny = [0u8; 4];
        let mut buf = RecordBuffer::new(&mut tiny);
        let err = cursor.next(&config, &mut buf).unwrap_err();
        assert!(matches!(err, ResolveError::BufferTooSmall { .. }));

        // Same record comes back once the caller brings enough space.
        let mut storage = [0u8; 256];
        let mut buf = RecordBuffer::new(&mut storage);
        assert_eq!(cursor.next(&config, &mut buf).unwrap().name, "alice");
    }

    #[test]
    fn test_close_releases_and_is_idempotent() {
        let mut cursor = three_user_cursor();
        assert!(cursor.is_open());
        cursor.close();
        assert!(!cursor.is_open());
        cursor.close();
        assert!(!cursor.is_open());
    }
}
