/// Group records
use super::{non_empty, Kind, ResourceKind};
use crate::buffer::RecordBuffer;
use crate::config::RuntimeConfig;
use crate::error::ResolveResult;
use serde::Deserialize;

/// Service-side group entry.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub password: String,
    /// Member user names
    #[serde(default)]
    pub users: Vec<String>,
}

/// Decoded group record; strings borrow from the caller's buffer.
#[derive(Debug)]
pub struct GroupRecord<'a> {
    pub name: &'a str,
    pub password: &'a str,
    pub gid: i64,
    pub members: Vec<&'a str>,
}

pub struct GroupKind;

impl ResourceKind for GroupKind {
    const KIND: Kind = Kind::Group;
    const LIST_QUERY: &'static str = "groups";
    type Entry = GroupEntry;
    type Record<'a> = GroupRecord<'a>;

    fn name_query(name: &str) -> String {
        format!("group?name={}", urlencoding::encode(name))
    }

    fn entry_name(entry: &GroupEntry) -> &str {
        &entry.name
    }

    fn entry_id(entry: &GroupEntry) -> i64 {
        entry.id
    }

    fn materialize<'a>(
        entry: &GroupEntry,
        config: &RuntimeConfig,
        buf: &mut RecordBuffer<'a>,
    ) -> ResolveResult<GroupRecord<'a>> {
        let name = buf.write_str(&entry.name)?;
        let password = buf.write_str(non_empty(&entry.password, "x"))?;
        let mut members = Vec::with_capacity(entry.users.len());
        for member in &entry.users {
            members.push(buf.write_str(member)?);
        }

        Ok(GroupRecord {
            name,
            password,
            gid: entry.id + config.gid_shift,
            members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;

    fn entry() -> GroupEntry {
        GroupEntry {
            id: 500,
            name: "ops".to_string(),
            password: String::new(),
            users: vec!["alice".to_string(), "bob".to_string()],
        }
    }

    #[test]
    fn test_materialize_preserves_member_order() {
        let config = RuntimeConfig::default();
        let mut storage = [0u8; 256];
        let mut buf = RecordBuffer::new(&mut storage);
        let record = GroupKind::materialize(&entry(), &config, &mut buf).unwrap();

        assert_eq!(record.name, "ops");
        assert_eq!(record.password, "x");
        assert_eq!(record.gid, 500);
        assert_eq!(record.members, vec!["alice", "bob"]);
    }

    #[test]
    fn test_materialize_applies_gid_shift() {
        let config = RuntimeConfig {
            gid_shift: 10000,
            ..RuntimeConfig::default()
        };
        let mut storage = [0u8; 256];
        let mut buf = RecordBuffer::new(&mut storage);
        let record = GroupKind::materialize(&entry(), &config, &mut buf).unwrap();
        assert_eq!(record.gid, 10500);
    }

    #[test]
    fn test_member_list_respects_capacity() {
        let config = RuntimeConfig::default();
        // Enough for the name and password but not the member list.
        let mut storage = [0u8; 8];
        let mut buf = RecordBuffer::new(&mut storage);
        let err = GroupKind::materialize(&entry(), &config, &mut buf).unwrap_err();
        assert!(matches!(err, ResolveError::BufferTooSmall { .. }));
    }
}
