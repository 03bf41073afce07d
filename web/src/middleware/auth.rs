use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::extractors::resolve_principal;
use crate::AppState;

/// Authentication middleware that returns 401 Unauthorized for
/// unauthenticated requests. API endpoints get proper status codes, not
/// login redirects; the browser-facing redirects live in the oauth
/// controller.
pub async fn require_auth(
    State(app_state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    match resolve_principal(&app_state, &jar).await {
        Ok(_principal) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::router;
    use crate::test_support::test_app_state;
    use axum::{body::Body, http::Request as HttpRequest, http::StatusCode};
    use chrono::Duration;
    use domain::oauth::{ProviderKind, ProviderProfile};
    use domain::session::SessionPolicy;
    use domain::Id;
    use service::config::VerificationMode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_require_auth_returns_401_with_no_cookie() {
        let app_state = test_app_state(VerificationMode::Stateless);
        let app = router::define_routes(app_state);

        let request = HttpRequest::builder()
            .uri("/me")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_returns_401_with_garbage_token() {
        let app_state = test_app_state(VerificationMode::Stateless);
        let cookie_name = app_state.flow.token_cookie_name();
        let app = router::define_routes(app_state);

        let request = HttpRequest::builder()
            .uri("/me")
            .header("cookie", format!("{cookie_name}=not-a-token"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_accepts_valid_token() {
        let app_state = test_app_state(VerificationMode::Stateless);
        let cookie_name = app_state.flow.token_cookie_name();

        // Seed a principal and mint a token for it directly.
        let principal = app_state
            .directory
            .create_from_profile(&ProviderProfile {
                external_id: "g-42".to_string(),
                email: "user@example.com".to_string(),
                display_name: None,
                provider: ProviderKind::Google,
            })
            .await
            .unwrap();
        let signed = app_state
            .signer
            .sign(
                &principal.email,
                principal.id,
                &principal.realm,
                Duration::seconds(3600),
            )
            .unwrap();

        let app = router::define_routes(app_state);
        let request = HttpRequest::builder()
            .uri("/me")
            .header("cookie", format!("{cookie_name}={}", signed.token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_require_auth_rejects_expired_token() {
        let app_state = test_app_state(VerificationMode::Stateless);
        let cookie_name = app_state.flow.token_cookie_name();
        let signed = app_state
            .signer
            .sign(
                "user@example.com",
                Id::new_v4(),
                "users",
                Duration::seconds(-1),
            )
            .unwrap();

        let app = router::define_routes(app_state);
        let request = HttpRequest::builder()
            .uri("/me")
            .header("cookie", format!("{cookie_name}={}", signed.token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_stateful_mode_honors_session_destruction() {
        let app_state = test_app_state(VerificationMode::Stateful);
        let cookie_name = app_state.flow.session_cookie_name();

        let principal_id = Id::new_v4();
        let record = app_state
            .sessions
            .create(Some(principal_id), SessionPolicy::default())
            .await
            .unwrap();

        let app = router::define_routes(app_state.clone());
        let request = HttpRequest::builder()
            .uri("/me")
            .header("cookie", format!("{cookie_name}={}", record.session_id))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        // Session resolves, but the principal was never put in the
        // directory, so the lazy deserialize treats it as logged out.
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        app_state.sessions.destroy(&record.session_id).await.unwrap();
        let request = HttpRequest::builder()
            .uri("/me")
            .header("cookie", format!("{cookie_name}={}", record.session_id))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
