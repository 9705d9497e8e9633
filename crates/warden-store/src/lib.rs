//! Warden Store - Storage capabilities
//!
//! Capability interfaces and the session persistence layer:
//! - [`KeyValueStore`]: the shared string-keyed store the subsystem runs on
//! - [`MemoryKvStore`]: TTL-honoring in-process implementation
//! - [`SessionStore`]: one record per (user, session), rotation-aware
//! - [`LockoutStore`]: failed-login counters and lock flags
//! - [`UserDirectory`]: external user lookup consumed by login
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_store::{MemoryKvStore, SessionStore};
//!
//! let kv = Arc::new(MemoryKvStore::new());
//! let sessions = SessionStore::new(kv, Duration::from_secs(7 * 24 * 3600), 10);
//! ```

pub mod directory;
pub mod error;
pub mod kv;
pub mod lockout;
pub mod memory;
pub mod model;
pub mod session;

pub use directory::{DirectoryUser, UserDirectory};
pub use error::{StoreError, StoreResult};
pub use kv::KeyValueStore;
pub use lockout::{FailureOutcome, LockoutPolicy, LockoutStore};
pub use memory::MemoryKvStore;
pub use model::SessionRecord;
pub use session::{RotationWrite, SessionStore, StoredSession};
