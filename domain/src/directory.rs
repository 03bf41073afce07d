//! User directory contract and the principal serialize/deserialize pair.
//!
//! The directory is an external collaborator: this crate consumes the trait
//! and leaves the storage engine to the deployment. An in-memory
//! implementation ships for single-process use and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{directory_error, DirectoryErrorKind, Error};
use crate::oauth::{ProviderKind, ProviderProfile};
use crate::Id;

/// The authenticated identity recognized by the system. Immutable once
/// issued for a given session; re-derived from the directory on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    #[schema(value_type = String)]
    pub id: Id,
    pub email: String,
    /// The realm (user collection) whose auth policy applies to this login.
    pub realm: String,
    pub display_name: Option<String>,
}

/// External user-record store, specified only at its interface.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Look up the principal previously linked to `(provider, external_id)`.
    async fn find_by_external_id(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<Principal>, Error>;

    /// Create a principal from a provider profile. Fails with
    /// `DirectoryErrorKind::Conflict` when the write is rejected, e.g. the
    /// email already belongs to a principal under a different provider.
    async fn create_from_profile(&self, profile: &ProviderProfile) -> Result<Principal, Error>;

    async fn find_by_id(&self, id: Id) -> Result<Option<Principal>, Error>;
}

/// Reduce a principal to the id stored in a session record. Only the id is
/// persisted, keeping session records small.
pub fn serialize_user(principal: &Principal) -> Id {
    principal.id
}

/// Resolve a stored principal id back to the full principal. Performed
/// lazily, only when a handler needs fresh profile data; fails with
/// `DirectoryErrorKind::NotFound` when the backing record has been deleted,
/// in which case the caller must treat the session as unauthenticated.
pub async fn deserialize_user(directory: &dyn Directory, id: Id) -> Result<Principal, Error> {
    directory
        .find_by_id(id)
        .await?
        .ok_or_else(|| directory_error(DirectoryErrorKind::NotFound, "no user behind session"))
}

#[derive(Default)]
struct Records {
    by_id: HashMap<Id, Principal>,
    by_external_id: HashMap<(ProviderKind, String), Id>,
}

/// In-memory directory for single-process deployments and tests.
#[derive(Clone)]
pub struct InMemoryDirectory {
    records: Arc<Mutex<Records>>,
    realm: String,
}

impl InMemoryDirectory {
    pub fn new(realm: &str) -> Self {
        Self {
            records: Arc::new(Mutex::new(Records::default())),
            realm: realm.to_string(),
        }
    }

    /// Remove a principal, e.g. to simulate account deletion.
    pub fn remove(&self, id: Id) {
        let mut records = self.records.lock().unwrap();
        if records.by_id.remove(&id).is_some() {
            records
                .by_external_id
                .retain(|_, principal_id| *principal_id != id);
        }
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_by_external_id(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<Principal>, Error> {
        let records = self.records.lock().unwrap();
        let principal = records
            .by_external_id
            .get(&(provider, external_id.to_string()))
            .and_then(|id| records.by_id.get(id))
            .cloned();
        Ok(principal)
    }

    async fn create_from_profile(&self, profile: &ProviderProfile) -> Result<Principal, Error> {
        let mut records = self.records.lock().unwrap();

        // The email may already belong to an account linked to a different
        // external identity; that write is rejected, not merged.
        let email_taken = records
            .by_id
            .values()
            .any(|principal| principal.email == profile.email);
        if email_taken {
            return Err(directory_error(
                DirectoryErrorKind::Conflict,
                "email already linked to another account",
            ));
        }

        let principal = Principal {
            id: Id::new_v4(),
            email: profile.email.clone(),
            realm: self.realm.clone(),
            display_name: profile.display_name.clone(),
        };

        records.by_id.insert(principal.id, principal.clone());
        records.by_external_id.insert(
            (profile.provider, profile.external_id.clone()),
            principal.id,
        );

        Ok(principal)
    }

    async fn find_by_id(&self, id: Id) -> Result<Option<Principal>, Error> {
        let records = self.records.lock().unwrap();
        Ok(records.by_id.get(&id).cloned())
    }
}
