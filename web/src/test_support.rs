//! Shared fixtures for web-layer tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use secrecy::SecretString;

use domain::directory::InMemoryDirectory;
use domain::error::{oauth_error, Error as DomainError, OAuthErrorKind};
use domain::login::{CookiePolicy, LoginFlow, LoginFlowConfig, RealmPolicy, SameSite};
use domain::oauth::{Provider, ProviderKind, ProviderProfile, StateManager};
use domain::session::{MemoryStore, SessionPolicy};
use domain::token::TokenSigner;
use service::config::{Config, VerificationMode};

use crate::AppState;

/// Provider double that accepts any code once and returns a fixed profile.
pub(crate) struct StubProvider;

#[async_trait]
impl Provider for StubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn authorization_url(&self, state: &str) -> String {
        format!("https://provider.test/auth?state={state}")
    }

    async fn exchange(&self, code: &str) -> Result<ProviderProfile, DomainError> {
        if code == "bad-code" {
            return Err(oauth_error(
                OAuthErrorKind::ExchangeFailed,
                "provider rejected the authorization code",
            ));
        }
        Ok(ProviderProfile {
            external_id: "g-42".to_string(),
            email: "user@example.com".to_string(),
            display_name: Some("Some User".to_string()),
            provider: ProviderKind::Google,
        })
    }
}

pub(crate) fn test_app_state(mode: VerificationMode) -> AppState {
    let mut config = Config::default();
    config.verification_mode = mode;

    let directory = Arc::new(InMemoryDirectory::new("users"));
    let sessions = Arc::new(MemoryStore::new(Duration::seconds(86400)));
    let signer = Arc::new(TokenSigner::new(SecretString::new(
        "test-secret".to_string(),
    )));

    let flow = Arc::new(LoginFlow::new(
        Arc::new(StubProvider),
        directory.clone(),
        sessions.clone(),
        signer.clone(),
        StateManager::new(),
        LoginFlowConfig {
            realm: RealmPolicy {
                token_expiry: Duration::seconds(3600),
                cookie: CookiePolicy {
                    prefix: config.cookie_prefix.clone(),
                    secure: false,
                    same_site: SameSite::Lax,
                    domain: None,
                },
            },
            session_policy: SessionPolicy::default(),
            session_ttl: Duration::seconds(86400),
            post_login_redirect: "/".to_string(),
        },
    ));

    AppState::new(flow, directory, sessions, signer, config)
}
