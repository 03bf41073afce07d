//! Controller for the OAuth2 login handshake.
//!
//! Note: these endpoints are driven by browser redirects, so failures are
//! reported by redirecting to the configured login page with an `error`
//! query parameter rather than by returning API status codes.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use log::*;
use serde::Deserialize;

use domain::error::{DirectoryErrorKind, Error as DomainError, ErrorKind, OAuthErrorKind};

use crate::cookies;
use crate::AppState;

/// Query parameters for the OAuth callback
#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: String,
    pub state: Option<String>,
}

/// GET /oauth2/authorize
///
/// Initiates the login flow by redirecting the browser to the provider's
/// authorization endpoint with a freshly issued anti-forgery state.
#[utoipa::path(
    get,
    path = "/oauth2/authorize",
    responses(
        (status = 307, description = "Redirect to the identity provider"),
    )
)]
pub async fn authorize(State(app_state): State<AppState>) -> impl IntoResponse {
    let url = app_state.flow.begin_authorization();
    Redirect::temporary(&url)
}

/// GET /oauth/google/callback
///
/// Completes the handshake: exchanges the authorization code, resolves the
/// principal, persists a session, and delivers the signed token and session
/// id as cookies before redirecting to the post-login destination.
#[utoipa::path(
    get,
    path = "/oauth/google/callback",
    params(
        ("code" = String, Query, description = "Authorization code from the provider"),
        ("state" = Option<String>, Query, description = "Anti-forgery state issued at authorize time"),
    ),
    responses(
        (status = 307, description = "Redirect to the post-login destination with auth cookies set, or to the login page with an error parameter"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<OAuthCallback>,
) -> Response {
    match app_state
        .flow
        .handle_callback(&params.code, params.state.as_deref())
        .await
    {
        Ok(outcome) => {
            let jar = jar
                .add(cookies::issue(&outcome.token_cookie))
                .add(cookies::issue(&outcome.session_cookie));
            (jar, Redirect::temporary(&outcome.redirect_to)).into_response()
        }
        Err(err) => {
            warn!("OAuth callback failed: {err:?}");
            let destination = format!(
                "{}?error={}",
                app_state.config.login_error_redirect_url(),
                error_param(&err)
            );
            Redirect::temporary(&destination).into_response()
        }
    }
}

/// Stable error identifier surfaced to the login page. Never includes
/// provider response bodies or other details from the failure itself.
fn error_param(err: &DomainError) -> &'static str {
    match err.error_kind {
        ErrorKind::OAuth(OAuthErrorKind::StateMismatch) => "state_mismatch",
        ErrorKind::OAuth(OAuthErrorKind::ExchangeFailed)
        | ErrorKind::OAuth(OAuthErrorKind::InvalidResponse) => "provider_exchange",
        ErrorKind::Directory(DirectoryErrorKind::Conflict) => "account_conflict",
        _ => "server_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::error::{directory_error, oauth_error};

    #[test]
    fn test_error_param_is_stable_per_kind() {
        let err = oauth_error(OAuthErrorKind::StateMismatch, "boom");
        assert_eq!(error_param(&err), "state_mismatch");

        let err = oauth_error(OAuthErrorKind::ExchangeFailed, "boom");
        assert_eq!(error_param(&err), "provider_exchange");

        let err = directory_error(DirectoryErrorKind::Conflict, "boom");
        assert_eq!(error_param(&err), "account_conflict");

        let err = directory_error(DirectoryErrorKind::NotFound, "boom");
        assert_eq!(error_param(&err), "server_error");
    }
}
