/// Shadow-style secret records
///
/// The identity service does not expose a separate shadow set; the user set
/// is re-presented through the secret-record shape. Password ageing fields
/// are not provided by the service and are reported as -1 ("no information")
/// across the board.
use super::{non_empty, Kind, ResourceKind, UserEntry, UserKind};
use crate::buffer::RecordBuffer;
use crate::config::RuntimeConfig;
use crate::error::ResolveResult;

/// Decoded shadow record; strings borrow from the caller's buffer.
#[derive(Debug)]
pub struct ShadowRecord<'a> {
    pub name: &'a str,
    pub password: &'a str,
    pub last_change: i64,
    pub min_days: i64,
    pub max_days: i64,
    pub warn_days: i64,
    pub inactive_days: i64,
    pub expire: i64,
}

pub struct ShadowKind;

impl ResourceKind for ShadowKind {
    const KIND: Kind = Kind::Shadow;
    const LIST_QUERY: &'static str = "users";
    type Entry = UserEntry;
    type Record<'a> = ShadowRecord<'a>;

    fn name_query(name: &str) -> String {
        UserKind::name_query(name)
    }

    fn entry_name(entry: &UserEntry) -> &str {
        &entry.name
    }

    fn entry_id(entry: &UserEntry) -> i64 {
        entry.id
    }

    fn materialize<'a>(
        entry: &UserEntry,
        _config: &RuntimeConfig,
        buf: &mut RecordBuffer<'a>,
    ) -> ResolveResult<ShadowRecord<'a>> {
        let name = buf.write_str(&entry.name)?;
        let password = buf.write_str(non_empty(&entry.password, "!!"))?;

        Ok(ShadowRecord {
            name,
            password,
            last_change: -1,
            min_days: -1,
            max_days: -1,
            warn_days: -1,
            inactive_days: -1,
            expire: -1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_password_locks_the_record() {
        let entry = UserEntry {
            id: 1000,
            name: "alice".to_string(),
            password: String::new(),
            group_id: 1000,
            directory: String::new(),
            shell: String::new(),
            gecos: String::new(),
        };
        let config = RuntimeConfig::default();
        let mut storage = [0u8; 64];
        let mut buf = RecordBuffer::new(&mut storage);
        let record = ShadowKind::materialize(&entry, &config, &mut buf).unwrap();

        assert_eq!(record.name, "alice");
        assert_eq!(record.password, "!!");
        assert_eq!(record.last_change, -1);
        assert_eq!(record.expire, -1);
    }

    #[test]
    fn test_service_password_is_passed_through() {
        let entry = UserEntry {
            id: 1000,
            name: "bob".to_string(),
            password: "$6$salt$hash".to_string(),
            group_id: 1000,
            directory: String::new(),
            shell: String::new(),
            gecos: String::new(),
        };
        let config = RuntimeConfig::default();
        let mut storage = [0u8; 64];
        let mut buf = RecordBuffer::new(&mut storage);
        let record = ShadowKind::materialize(&entry, &config, &mut buf).unwrap();
        assert_eq!(record.password, "$6$salt$hash");
    }
}
