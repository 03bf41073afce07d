//! OAuth2 login flow controller.
//!
//! Orchestrates the authorization-redirect and callback handshake: validate
//! the anti-forgery state, exchange the code with the provider, resolve or
//! create the principal, persist a session record, sign a token, and emit
//! the cookies plus post-login redirect. The callback is a linear pipeline
//! with explicit error short-circuiting so every failure point is auditable.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::directory::{serialize_user, Directory, Principal};
use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::oauth::{Provider, StateManager};
use crate::session::{SessionPolicy, SessionRecord, SessionStore};
use crate::token::{SignedToken, TokenSigner};

/// Cookie `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct SameSiteParseError;

impl FromStr for SameSite {
    type Err = SameSiteParseError;
    fn from_str(value: &str) -> Result<SameSite, Self::Err> {
        match value.to_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            _ => Err(SameSiteParseError),
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Security attributes applied to every cookie this flow issues.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    /// Cookies are named `<prefix>-token` and `<prefix>-session`.
    pub prefix: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub domain: Option<String>,
}

/// Per-realm authentication policy: how long issued tokens live and how
/// their delivery cookies are protected.
#[derive(Debug, Clone)]
pub struct RealmPolicy {
    pub token_expiry: Duration,
    pub cookie: CookiePolicy,
}

/// Delivery wrapper for a value set on the browser. `HttpOnly` always; the
/// remaining attributes follow the realm's [`CookiePolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct CookieDescriptor {
    pub name: String,
    pub value: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub domain: Option<String>,
    pub expires: DateTime<Utc>,
}

impl CookieDescriptor {
    fn issued(name: String, value: String, policy: &CookiePolicy, expires: DateTime<Utc>) -> Self {
        Self {
            name,
            value,
            path: "/".to_string(),
            http_only: true,
            secure: policy.secure,
            same_site: policy.same_site,
            domain: policy.domain.clone(),
            expires,
        }
    }

    /// A removal cookie: empty value, expiry in the past.
    pub fn cleared(name: String, policy: &CookiePolicy) -> Self {
        Self {
            name,
            value: String::new(),
            path: "/".to_string(),
            http_only: true,
            secure: policy.secure,
            same_site: policy.same_site,
            domain: policy.domain.clone(),
            expires: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Everything the flow controller needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct LoginFlowConfig {
    pub realm: RealmPolicy,
    pub session_policy: SessionPolicy,
    /// Store-side session lifetime; intentionally independent of
    /// `realm.token_expiry` so sessions can be revoked while issued tokens
    /// run out on their own clock.
    pub session_ttl: Duration,
    /// Where the browser lands after a completed login.
    pub post_login_redirect: String,
}

/// Outcome of a completed login handshake. Exactly one signed token is
/// issued per handshake; re-authentication produces a new one.
#[derive(Debug)]
pub struct LoginOutcome {
    pub principal: Principal,
    pub session: SessionRecord,
    pub token: SignedToken,
    pub token_cookie: CookieDescriptor,
    pub session_cookie: CookieDescriptor,
    pub redirect_to: String,
}

/// Drives the OAuth2 handshake against one provider.
pub struct LoginFlow {
    provider: Arc<dyn Provider>,
    directory: Arc<dyn Directory>,
    sessions: Arc<dyn SessionStore>,
    signer: Arc<TokenSigner>,
    states: StateManager,
    config: LoginFlowConfig,
}

impl LoginFlow {
    pub fn new(
        provider: Arc<dyn Provider>,
        directory: Arc<dyn Directory>,
        sessions: Arc<dyn SessionStore>,
        signer: Arc<TokenSigner>,
        states: StateManager,
        config: LoginFlowConfig,
    ) -> Self {
        Self {
            provider,
            directory,
            sessions,
            signer,
            states,
            config,
        }
    }

    pub fn token_cookie_name(&self) -> String {
        format!("{}-token", self.config.realm.cookie.prefix)
    }

    pub fn session_cookie_name(&self) -> String {
        format!("{}-session", self.config.realm.cookie.prefix)
    }

    pub fn cookie_policy(&self) -> &CookiePolicy {
        &self.config.realm.cookie
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Build the provider redirect for a fresh login attempt. No side
    /// effects beyond registering the anti-forgery state for this flow.
    pub fn begin_authorization(&self) -> String {
        let state = self.states.issue();
        self.provider.authorization_url(&state)
    }

    /// Complete the handshake from the provider's callback parameters.
    pub async fn handle_callback(
        &self,
        code: &str,
        state: Option<&str>,
    ) -> Result<LoginOutcome, Error> {
        let state =
            state.ok_or_else(|| oauth_error(OAuthErrorKind::StateMismatch, "missing state"))?;
        if !self.states.consume(state) {
            warn!("OAuth callback with unknown or expired state");
            return Err(oauth_error(
                OAuthErrorKind::StateMismatch,
                "state was not issued by this flow or has expired",
            ));
        }

        let profile = self.provider.exchange(code).await?;

        let principal = match self
            .directory
            .find_by_external_id(profile.provider, &profile.external_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                debug!("No principal for {} id, creating", profile.provider.as_str());
                self.directory.create_from_profile(&profile).await?
            }
        };

        let session = self
            .sessions
            .create(Some(serialize_user(&principal)), self.config.session_policy)
            .await?;

        let token = self.signer.sign(
            &principal.email,
            principal.id,
            &principal.realm,
            self.config.realm.token_expiry,
        )?;

        let token_cookie = CookieDescriptor::issued(
            self.token_cookie_name(),
            token.token.clone(),
            &self.config.realm.cookie,
            token.expires_at,
        );
        let session_cookie = CookieDescriptor::issued(
            self.session_cookie_name(),
            session.session_id.clone(),
            &self.config.realm.cookie,
            session.created_at + self.config.session_ttl,
        );

        info!("Completed login for principal {}", principal.id);

        Ok(LoginOutcome {
            principal,
            session,
            token,
            token_cookie,
            session_cookie,
            redirect_to: self.config.post_login_redirect.clone(),
        })
    }

    /// Destroy the session and produce removal cookies for the browser.
    /// Any token already issued for this login stays valid until its own
    /// expiry unless the deployment verifies statefully.
    pub async fn logout(
        &self,
        session_id: &str,
    ) -> Result<(CookieDescriptor, CookieDescriptor), Error> {
        self.sessions.destroy(session_id).await?;
        Ok((
            CookieDescriptor::cleared(self.token_cookie_name(), &self.config.realm.cookie),
            CookieDescriptor::cleared(self.session_cookie_name(), &self.config.realm.cookie),
        ))
    }
}
