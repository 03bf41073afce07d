//! Google OAuth 2.0 provider.

use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{oauth_error, Error, OAuthErrorKind};
use crate::oauth::{Provider, ProviderKind, ProviderProfile};

/// Default request timeout for provider calls. The exchange happens while a
/// browser redirect is pending, so a hung call must not hang the request.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// OAuth token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    expires_in: i64,
    #[allow(dead_code)]
    token_type: String,
}

/// User info from Google
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Request to exchange authorization code for tokens
#[derive(Debug, Serialize)]
struct TokenExchangeRequest {
    code: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    grant_type: String,
}

/// Endpoint URLs, overridable so tests can point at a mock server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

/// Google OAuth client handling the authorization URL and code exchange.
pub struct GoogleProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
}

impl GoogleProvider {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        endpoints: GoogleEndpoints,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            endpoints,
        })
    }

    /// Fetch the user's profile using a freshly exchanged access token.
    async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, Error> {
        let response = self
            .client
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to get Google user info: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::ErrorKind::OAuth(OAuthErrorKind::ExchangeFailed),
                }
            })?;

        if response.status().is_success() {
            let user_info: GoogleUserInfo = response.json().await.map_err(|e| {
                warn!("Failed to parse Google user info: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
                }
            })?;
            Ok(user_info)
        } else {
            warn!("Google user info request failed: {}", response.status());
            Err(oauth_error(
                OAuthErrorKind::ExchangeFailed,
                "Google user info request failed",
            ))
        }
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    /// Generate the OAuth authorization URL for user consent
    fn authorization_url(&self, state: &str) -> String {
        let scopes = ["openid", "email", "profile"].join(" ");

        format!(
            "{}?\
            client_id={}&\
            redirect_uri={}&\
            response_type=code&\
            scope={}&\
            state={}",
            self.endpoints.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes),
            urlencoding::encode(state)
        )
    }

    /// Exchange the authorization code for tokens, then resolve the profile.
    async fn exchange(&self, code: &str) -> Result<ProviderProfile, Error> {
        let request = TokenExchangeRequest {
            code: code.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            grant_type: "authorization_code".to_string(),
        };

        debug!("Exchanging Google OAuth code for tokens");

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to exchange Google OAuth code: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: crate::error::ErrorKind::OAuth(OAuthErrorKind::ExchangeFailed),
                }
            })?;

        if !response.status().is_success() {
            // Covers revoked clients and reused single-use codes alike.
            warn!("Google OAuth exchange rejected: {}", response.status());
            return Err(oauth_error(
                OAuthErrorKind::ExchangeFailed,
                "Google rejected the authorization code",
            ));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Google token response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: crate::error::ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
            }
        })?;
        info!("Successfully exchanged Google OAuth code for tokens");

        let user_info = self.get_user_info(&tokens.access_token).await?;

        Ok(ProviderProfile {
            external_id: user_info.id,
            email: user_info.email,
            display_name: user_info.name,
            provider: ProviderKind::Google,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn provider(server_url: &str) -> GoogleProvider {
        let endpoints = GoogleEndpoints {
            auth_url: format!("{server_url}/auth"),
            token_url: format!("{server_url}/token"),
            userinfo_url: format!("{server_url}/userinfo"),
        };
        GoogleProvider::new(
            "client-id",
            "client-secret",
            "http://localhost:4000/oauth/google/callback",
            endpoints,
        )
        .unwrap()
    }

    #[test]
    fn test_authorization_url_carries_client_and_state() {
        let provider = provider("https://example.com");
        let url = provider.authorization_url("state-123");

        assert!(url.starts_with("https://example.com/auth?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state-123"));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let mut server = mockito::Server::new_async().await;

        let token_mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token": "at-1", "expires_in": 3599, "token_type": "Bearer"}"#,
            )
            .create_async()
            .await;

        let userinfo_mock = server
            .mock("GET", "/userinfo")
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "g-42", "email": "user@example.com", "name": "Some User"}"#)
            .create_async()
            .await;

        let provider = provider(&server.url());
        let profile = provider.exchange("code-1").await.unwrap();

        assert_eq!(profile.external_id, "g-42");
        assert_eq!(profile.email, "user@example.com");
        assert_eq!(profile.display_name, Some("Some User".to_string()));
        assert_eq!(profile.provider, ProviderKind::Google);

        token_mock.assert_async().await;
        userinfo_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_rejected_code() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error": "invalid_grant"}"#)
            .create_async()
            .await;

        let provider = provider(&server.url());
        let err = provider.exchange("already-used").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::ExchangeFailed)
        );
    }

    #[tokio::test]
    async fn test_exchange_malformed_response() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("not json")
            .create_async()
            .await;

        let provider = provider(&server.url());
        let err = provider.exchange("code-1").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::OAuth(OAuthErrorKind::InvalidResponse)
        );
    }
}
