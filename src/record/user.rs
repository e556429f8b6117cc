/// User records
use super::{non_empty, Kind, ResourceKind};
use crate::buffer::RecordBuffer;
use crate::config::RuntimeConfig;
use crate::error::ResolveResult;
use serde::Deserialize;

/// Service-side user entry.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub group_id: i64,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub shell: String,
    #[serde(default)]
    pub gecos: String,
}

/// Decoded user record; string fields borrow from the caller's buffer.
#[derive(Debug)]
pub struct UserRecord<'a> {
    pub name: &'a str,
    pub password: &'a str,
    pub uid: i64,
    pub gid: i64,
    pub gecos: &'a str,
    pub directory: &'a str,
    pub shell: &'a str,
}

pub struct UserKind;

impl ResourceKind for UserKind {
    const KIND: Kind = Kind::User;
    const LIST_QUERY: &'static str = "users";
    type Entry = UserEntry;
    type Record<'a> = UserRecord<'a>;

    fn name_query(name: &str) -> String {
        format!("user?name={}", urlencoding::encode(name))
    }

    fn entry_name(entry: &UserEntry) -> &str {
        &entry.name
    }

    fn entry_id(entry: &UserEntry) -> i64 {
        entry.id
    }

    fn materialize<'a>(
        entry: &UserEntry,
        config: &RuntimeConfig,
        buf: &mut RecordBuffer<'a>,
    ) -> ResolveResult<UserRecord<'a>> {
        let fallback_dir = format!("/home/{}", entry.name);

        let name = buf.write_str(&entry.name)?;
        let password = buf.write_str(non_empty(&entry.password, "x"))?;
        let gecos = buf.write_str(&entry.gecos)?;
        let directory = buf.write_str(non_empty(&entry.directory, &fallback_dir))?;
        let shell = buf.write_str(non_empty(&entry.shell, "/bin/bash"))?;

        Ok(UserRecord {
            name,
            password,
            uid: entry.id + config.uid_shift,
            gid: entry.group_id + config.gid_shift,
            gecos,
            directory,
            shell,
        })
    }
}
