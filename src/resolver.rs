/// Resolver context: by-key lookups, enumeration, and range administration
///
/// A `Resolver` carries the state the host shares across calls, one
/// enumeration cursor per resource kind and one range gate per identifier
/// space, behind mutexes acquired with the bounded retry policy. The host
/// is expected to keep a single instance per process. Configuration is
/// loaded fresh at the start of every operation and dropped at its end.
use crate::buffer::RecordBuffer;
use crate::config::{RuntimeConfig, DEFAULT_CONFIG_FILE};
use crate::cursor::CursorState;
use crate::error::{ResolveError, ResolveResult};
use crate::lock::retry_lock;
use crate::range::{Edge, RangeGate};
use crate::record::{
    decode_one, GroupKind, GroupRecord, Kind, ResourceKind, ShadowKind, ShadowRecord, UserKind,
    UserRecord,
};
use crate::transport;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct Resolver {
    config_path: PathBuf,
    user_gate: RangeGate,
    group_gate: RangeGate,
    user_cursor: Mutex<CursorState<UserKind>>,
    group_cursor: Mutex<CursorState<GroupKind>>,
    shadow_cursor: Mutex<CursorState<ShadowKind>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl Resolver {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            user_gate: RangeGate::default(),
            group_gate: RangeGate::default(),
            user_cursor: Mutex::new(CursorState::default()),
            group_cursor: Mutex::new(CursorState::default()),
            shadow_cursor: Mutex::new(CursorState::default()),
        }
    }

    fn config(&self) -> ResolveResult<RuntimeConfig> {
        RuntimeConfig::load(&self.config_path)
    }

    /// Shadow records live in the user identifier space.
    fn gate(&self, kind: Kind) -> &RangeGate {
        match kind {
            Kind::Group => &self.group_gate,
            Kind::User | Kind::Shadow => &self.user_gate,
        }
    }

    /// Configure a range bound for `kind`. Zero removes the bound.
    pub fn set_bound(&self, kind: Kind, edge: Edge, value: i64) -> ResolveResult<()> {
        self.gate(kind).set(edge, value)
    }

    pub fn bound(&self, kind: Kind, edge: Edge) -> ResolveResult<i64> {
        self.gate(kind).get(edge)
    }

    // ---- by-key lookups ----

    pub fn lookup_user_by_name<'a>(
        &self,
        name: &str,
        buf: &'a mut [u8],
    ) -> ResolveResult<UserRecord<'a>> {
        let config = self.config()?;
        self.fetch::<UserKind>(
            &config,
            UserKind::name_query(name),
            |e| e.name == name,
            buf,
        )
    }

    pub fn lookup_user_by_id<'a>(
        &self,
        uid: i64,
        buf: &'a mut [u8],
    ) -> ResolveResult<UserRecord<'a>> {
        let config = self.config()?;
        if !self.user_gate.admits(uid)? {
            return Err(ResolveError::NotFound);
        }
        let shift = config.uid_shift;
        self.fetch::<UserKind>(
            &config,
            format!("user?id={}", uid - shift),
            move |e| e.id + shift == uid,
            buf,
        )
    }

    pub fn lookup_group_by_name<'a>(
        &self,
        name: &str,
        buf: &'a mut [u8],
    ) -> ResolveResult<GroupRecord<'a>> {
        let config = self.config()?;
        self.fetch::<GroupKind>(
            &config,
            GroupKind::name_query(name),
            |e| e.name == name,
            buf,
        )
    }

    pub fn lookup_group_by_id<'a>(
        &self,
        gid: i64,
        buf: &'a mut [u8],
    ) -> ResolveResult<GroupRecord<'a>> {
        let config = self.config()?;
        if !self.group_gate.admits(gid)? {
            return Err(ResolveError::NotFound);
        }
        let shift = config.gid_shift;
        self.fetch::<GroupKind>(
            &config,
            format!("group?id={}", gid - shift),
            move |e| e.id + shift == gid,
            buf,
        )
    }

    pub fn lookup_shadow_by_name<'a>(
        &self,
        name: &str,
        buf: &'a mut [u8],
    ) -> ResolveResult<ShadowRecord<'a>> {
        let config = self.config()?;
        self.fetch::<ShadowKind>(
            &config,
            ShadowKind::name_query(name),
            |e| e.name == name,
            buf,
        )
    }

    fn fetch<'a, K: ResourceKind>(
        &self,
        config: &RuntimeConfig,
        query: String,
        predicate: impl Fn(&K::Entry) -> bool,
        buf: &'a mut [u8],
    ) -> ResolveResult<K::Record<'a>> {
        let response = transport::request(config, &query)?;
        let mut buf = RecordBuffer::new(buf);
        decode_one::<K>(&response.body, config, predicate, &mut buf)
    }

    // ---- enumeration ----

    pub fn begin_users(&self) -> ResolveResult<()> {
        self.begin(&self.user_cursor)
    }

    pub fn next_user<'a>(&self, buf: &'a mut [u8]) -> ResolveResult<UserRecord<'a>> {
        self.next(&self.user_cursor, buf)
    }

    pub fn end_users(&self) -> ResolveResult<()> {
        self.end(&self.user_cursor)
    }

    pub fn begin_groups(&self) -> ResolveResult<()> {
        self.begin(&self.group_cursor)
    }

    pub fn next_group<'a>(&self, buf: &'a mut [u8]) -> ResolveResult<GroupRecord<'a>> {
        self.next(&self.group_cursor, buf)
    }

    pub fn end_groups(&self) -> ResolveResult<()> {
        self.end(&self.group_cursor)
    }

    pub fn begin_shadows(&self) -> ResolveResult<()> {
        self.begin(&self.shadow_cursor)
    }

    pub fn next_shadow<'a>(&self, buf: &'a mut [u8]) -> ResolveResult<ShadowRecord<'a>> {
        self.next(&self.shadow_cursor, buf)
    }

    pub fn end_shadows(&self) -> ResolveResult<()> {
        self.end(&self.shadow_cursor)
    }

    fn begin<K: ResourceKind>(&self, cursor: &Mutex<CursorState<K>>) -> ResolveResult<()> {
        let config = self.config()?;
        let mut cursor = retry_lock(cursor)?;
        cursor.open(&config)
    }

    fn next<'a, K: ResourceKind>(
        &self,
        cursor: &Mutex<CursorState<K>>,
        buf: &'a mut [u8],
    ) -> ResolveResult<K::Record<'a>> {
        let config = self.config()?;
        let mut cursor = retry_lock(cursor)?;
        let mut buf = RecordBuffer::new(buf);
        cursor.next(&config, &mut buf)
    }

    fn end<K: ResourceKind>(&self, cursor: &Mutex<CursorState<K>>) -> ResolveResult<()> {
        let mut cursor = retry_lock(cursor)?;
        cursor.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Network-facing behavior is covered by the integration tests against a
    // mock identity service; these exercise the pieces that must not touch
    // the network at all.

    #[test]
    fn test_denied_id_lookup_is_not_found_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remid.conf");
        // Endpoint that would fail loudly if contacted.
        std::fs::write(
            &path,
            "api_endpoint = \"http://127.0.0.1:1\"\ncache = false\nrequest_retry = 0\nrequest_locktime = 0\n",
        )
        .unwrap();

        let resolver = Resolver::new(&path);
        resolver.set_bound(Kind::User, Edge::Highest, 500).unwrap();

        let mut storage = [0u8; 256];
        let err = resolver.lookup_user_by_id(501, &mut storage).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound));
    }

    #[test]
    fn test_shadow_bounds_share_the_user_gate() {
        let resolver = Resolver::new("/nonexistent/remid.conf");
        resolver
            .set_bound(Kind::Shadow, Edge::Lowest, 1000)
            .unwrap();
        assert_eq!(resolver.bound(Kind::User, Edge::Lowest).unwrap(), 1000);
        assert_eq!(resolver.bound(Kind::Group, Edge::Lowest).unwrap(), 0);
    }

    #[test]
    fn test_missing_config_fails_before_any_state_change() {
        let resolver = Resolver::new("/nonexistent/remid.conf");
        let mut storage = [0u8; 256];
        let err = resolver
            .lookup_user_by_name("alice", &mut storage)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));

        let err = resolver.begin_users().unwrap_err();
        assert!(matches!(err, ResolveError::Config(_)));

        // end never needs configuration.
        assert!(resolver.end_users().is_ok());
    }
}
