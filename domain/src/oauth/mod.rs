//! OAuth 2.0 identity provider integration.
//!
//! Providers plug in behind the [`Provider`] trait so the flow controller
//! never needs to change when a new provider is added.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;

mod state;
pub mod google;

pub use state::StateManager;

/// Known identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
        }
    }
}

/// Claims returned by the identity provider after a successful code
/// exchange. Ephemeral: used once to resolve or create a principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// The provider's unique identifier for this user.
    pub external_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub provider: ProviderKind,
}

/// Strategy interface for OAuth 2.0 identity providers.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Build the provider's authorization URL carrying our client id,
    /// redirect URI, requested scopes, and the anti-forgery `state`.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for the user's profile.
    ///
    /// Codes are single-use at the provider: presenting a consumed code
    /// fails with `OAuthErrorKind::ExchangeFailed` and must not be retried.
    async fn exchange(&self, code: &str) -> Result<ProviderProfile, Error>;
}
