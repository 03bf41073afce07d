use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use log::*;
use serde_json::json;

use domain::directory::deserialize_user;
use domain::error::{DirectoryErrorKind, ErrorKind};
use domain::login::CookieDescriptor;

use crate::controller::ApiResponse;
use crate::cookies;
use crate::error::Result as WebResult;
use crate::extractors::AuthenticatedPrincipal;
use crate::AppState;

/// GET the current principal behind the request's credentials.
///
/// The principal is re-read from the directory on demand rather than trusted
/// from stale claims, so profile changes show up immediately. If the backing
/// record has been deleted the session is destroyed and the auth cookies are
/// cleared, the same as a logout.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The authenticated principal", body = domain::directory::Principal),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal Server Error")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn me(
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> WebResult<Response> {
    match deserialize_user(app_state.directory.as_ref(), principal.id).await {
        Ok(principal) => Ok(Json(ApiResponse::new(
            StatusCode::OK.into(),
            json!({
                "id": principal.id,
                "email": principal.email,
                "collection": principal.realm,
                "display_name": principal.display_name,
            }),
        ))
        .into_response()),
        Err(err) if err.error_kind == ErrorKind::Directory(DirectoryErrorKind::NotFound) => {
            // The user record is gone; any surviving session is orphaned.
            debug!("Principal {} no longer exists, clearing session", principal.id);
            clear_credentials(&app_state, &jar, StatusCode::UNAUTHORIZED).await
        }
        Err(err) => {
            error!("Directory lookup failed: {err:?}");
            Err(err.into())
        }
    }
}

/// Logs the principal out by destroying their session and expiring both auth
/// cookies. The signed token itself is not revocable; in stateless mode it
/// stays verifiable until its own expiry.
#[utoipa::path(
    delete,
    path = "/logout",
    responses(
        (status = 200, description = "Successfully logged out"),
        (status = 500, description = "Internal Server Error")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn logout(State(app_state): State<AppState>, jar: CookieJar) -> WebResult<Response> {
    trace!("UserSessionController::logout()");
    clear_credentials(&app_state, &jar, StatusCode::OK).await
}

/// Destroy the session named by the request's session cookie (if any) and
/// respond with removal cookies for both credential cookies.
async fn clear_credentials(
    app_state: &AppState,
    jar: &CookieJar,
    status: StatusCode,
) -> WebResult<Response> {
    let session_id = jar
        .get(&app_state.flow.session_cookie_name())
        .map(|cookie| cookie.value().to_string());

    let (token_cookie, session_cookie) = match session_id {
        Some(session_id) => app_state.flow.logout(&session_id).await?,
        // No session cookie to act on; still expire whatever the browser
        // holds so a stale token cookie doesn't linger.
        None => {
            let policy = app_state.flow.cookie_policy();
            (
                CookieDescriptor::cleared(app_state.flow.token_cookie_name(), policy),
                CookieDescriptor::cleared(app_state.flow.session_cookie_name(), policy),
            )
        }
    };

    let jar = CookieJar::new()
        .add(cookies::issue(&token_cookie))
        .add(cookies::issue(&session_cookie));
    Ok((status, jar).into_response())
}
