use crate::{
    controller::{health_check_controller, oauth_controller, user_session_controller},
    middleware::auth::require_auth,
    AppState,
};
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get},
    Router,
};
use log::*;
use tower_http::cors::CorsLayer;

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Authentication Bridge API"
        ),
        paths(
            oauth_controller::authorize,
            oauth_controller::callback,
            user_session_controller::me,
            user_session_controller::logout,
            health_check_controller::health_check,
        ),
        components(
            schemas(
                domain::directory::Principal,
                domain::token::Claims,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "authbridge", description = "OAuth2 authentication bridge API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "authbridge-token",
                    "Signed token returned from a completed login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state);
    Router::new()
        .merge(oauth_routes(app_state.clone()))
        .merge(user_session_routes(app_state.clone()))
        .merge(user_session_protected_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(cors)
}

fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/oauth2/authorize", get(oauth_controller::authorize))
        .route("/oauth/google/callback", get(oauth_controller::callback))
        .with_state(app_state)
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/logout", delete(user_session_controller::logout))
        .with_state(app_state)
}

fn user_session_protected_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/me", get(user_session_controller::me))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route(
        "/health_check",
        get(health_check_controller::health_check),
    )
}

/// Browser credentials ride on cookies, so CORS is restricted to the
/// configured origins and allows credentials.
fn cors_layer(app_state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping unparseable CORS origin: {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
}
