use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use axum_extra::extract::CookieJar;
use log::*;

use domain::error::{ErrorKind, TokenErrorKind};
use domain::Id;
use service::config::VerificationMode;

use crate::extractors::RejectionType;
use crate::AppState;

/// The current principal reference resolved by the identity middleware.
///
/// In stateless mode the embedded claims fill every field; in stateful mode
/// only the id is known until a handler asks the directory for fresh data.
#[derive(Debug, Clone)]
pub(crate) struct PrincipalRef {
    pub id: Id,
    pub email: Option<String>,
    pub realm: Option<String>,
}

pub(crate) struct AuthenticatedPrincipal(pub PrincipalRef);

/// Resolve the principal reference for a request, or reject it.
///
/// Stateless: verify the signed token from the cookie; no store hit, no
/// revocation before expiry. Stateful: resolve the session cookie against
/// the store; revocable, one lookup per request. Neither path touches the
/// directory.
pub(crate) async fn resolve_principal(
    app_state: &AppState,
    jar: &CookieJar,
) -> Result<PrincipalRef, RejectionType> {
    match app_state.config.verification_mode {
        VerificationMode::Stateless => {
            let cookie = jar
                .get(&app_state.flow.token_cookie_name())
                .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))?;

            let claims = app_state.signer.verify(cookie.value()).map_err(|err| {
                if err.error_kind == ErrorKind::Token(TokenErrorKind::Expired) {
                    trace!("Rejecting request with expired token");
                    (StatusCode::UNAUTHORIZED, "Token expired".to_string())
                } else {
                    trace!("Rejecting request with invalid token");
                    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
                }
            })?;

            Ok(PrincipalRef {
                id: claims.id,
                email: Some(claims.email),
                realm: Some(claims.collection),
            })
        }
        VerificationMode::Stateful => {
            let cookie = jar
                .get(&app_state.flow.session_cookie_name())
                .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))?;

            let record = app_state
                .sessions
                .get(cookie.value())
                .await
                .map_err(|err| {
                    warn!("Session store lookup failed: {err:?}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                })?
                .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))?;

            let principal_id = record
                .principal_id
                .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()))?;

            Ok(PrincipalRef {
                id: principal_id,
                email: None,
                realm: None,
            })
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let principal = resolve_principal(&app_state, &jar).await?;
        Ok(AuthenticatedPrincipal(principal))
    }
}
