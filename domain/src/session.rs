//! Durable session records keyed by an opaque, unguessable id.
//!
//! The store's TTL is deliberately independent of the signed token's own
//! expiry: destroying a session revokes stateful verification immediately,
//! while an already-issued token stays cryptographically valid until it
//! lapses. Deployments that need instant revocation verify statefully.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::error::Error;
use crate::Id;

pub type SessionId = String;

/// Persistence policy applied when creating and saving session records.
///
/// `resave: false` skips rewriting unmodified records on every request;
/// `save_uninitialized: false` keeps records with no meaningful value out of
/// the store entirely, preventing empty-session accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub resave: bool,
    pub save_uninitialized: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            resave: false,
            save_uninitialized: false,
        }
    }
}

/// A server-side session linking an opaque id to a principal reference.
/// Only the principal's id is stored, never the full profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub principal_id: Option<Id>,
    pub created_at: DateTime<Utc>,
    modified: bool,
}

impl SessionRecord {
    fn new(principal_id: Option<Id>) -> Self {
        Self {
            session_id: generate_session_id(),
            principal_id,
            created_at: Utc::now(),
            // A principal reference counts as a meaningful value.
            modified: principal_id.is_some(),
        }
    }

    /// Attach a principal reference, marking the record as modified.
    pub fn set_principal(&mut self, principal_id: Id) {
        self.principal_id = Some(principal_id);
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether the record carries any meaningful value worth persisting.
    pub fn is_initialized(&self) -> bool {
        self.principal_id.is_some()
    }
}

/// Pluggable backing store for session records.
///
/// Implementations must expire records independently of token expiry and be
/// safe for concurrent per-request access.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a record referencing `principal_id` and persist it according
    /// to `policy`. Returns the record, whose `session_id` is opaque and
    /// unguessable.
    async fn create(
        &self,
        principal_id: Option<Id>,
        policy: SessionPolicy,
    ) -> Result<SessionRecord, Error>;

    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, Error>;

    /// Write a record back according to `policy`. Returns `true` when a
    /// write actually occurred, `false` when the policy elided it.
    async fn save(&self, record: &SessionRecord, policy: SessionPolicy) -> Result<bool, Error>;

    /// Logout: drop the record. Subsequent `get` calls return `None`.
    async fn destroy(&self, session_id: &str) -> Result<(), Error>;
}

/// Generate a cryptographically random session id (32 bytes, hex).
fn generate_session_id() -> SessionId {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}

struct Entry {
    principal_id: Option<Id>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// In-memory session store with TTL-based expiration.
///
/// Suitable for single-process deployments and tests; networked deployments
/// supply their own [`SessionStore`] implementation.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<SessionId, Entry>>>,
    ttl: Duration,
}

impl MemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Drop expired records. Should be called periodically to bound memory.
    pub fn cleanup_expired(&self) {
        let mut entries = self.entries.lock().unwrap();
        let now = Utc::now();
        entries.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(
        &self,
        principal_id: Option<Id>,
        policy: SessionPolicy,
    ) -> Result<SessionRecord, Error> {
        let record = SessionRecord::new(principal_id);

        if record.is_initialized() || policy.save_uninitialized {
            let mut entries = self.entries.lock().unwrap();
            entries.insert(
                record.session_id.clone(),
                Entry {
                    principal_id: record.principal_id,
                    created_at: record.created_at,
                    expires_at: Utc::now() + self.ttl,
                },
            );
        }

        Ok(record)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, Error> {
        let mut entries = self.entries.lock().unwrap();

        match entries.get(session_id) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(SessionRecord {
                session_id: session_id.to_string(),
                principal_id: entry.principal_id,
                created_at: entry.created_at,
                modified: false,
            })),
            Some(_) => {
                // Lapsed records are reaped on first touch.
                entries.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, record: &SessionRecord, policy: SessionPolicy) -> Result<bool, Error> {
        if !record.is_modified() && !policy.resave {
            return Ok(false);
        }
        if !record.is_initialized() && !policy.save_uninitialized {
            return Ok(false);
        }

        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            record.session_id.clone(),
            Entry {
                principal_id: record.principal_id,
                created_at: record.created_at,
                expires_at: Utc::now() + self.ttl,
            },
        );
        Ok(true)
    }

    async fn destroy(&self, session_id: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(session_id);
        Ok(())
    }
}
