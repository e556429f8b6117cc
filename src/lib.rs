//! remid: remote identity resolver client
//!
//! Resolves user, group, and shadow identity records from a remote identity
//! service over HTTP(S) and presents them the way a name-service host
//! consumes a resolver backend: by-key lookups into caller-owned buffers and
//! a begin/next/end enumeration protocol per resource kind.
//!
//! The host keeps one [`Resolver`] per process; it owns the shared cursor
//! and range-bound state. Every operation classifies into the fixed outcome
//! vocabulary of [`LookupStatus`] via [`ResolveError::status`].

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod error;
pub mod lock;
pub mod range;
pub mod record;
pub mod resolver;
pub mod transport;

pub use buffer::RecordBuffer;
pub use config::{RuntimeConfig, DEFAULT_CONFIG_FILE};
pub use error::{LookupStatus, ResolveError, ResolveResult};
pub use range::Edge;
pub use record::{GroupRecord, Kind, ShadowRecord, UserRecord};
pub use resolver::Resolver;
