use std::sync::Arc;

use log::*;
use secrecy::SecretString;
use service::{config::Config, logging::Logger};

use domain::directory::InMemoryDirectory;
use domain::login::{CookiePolicy, LoginFlow, LoginFlowConfig, RealmPolicy, SameSite};
use domain::oauth::google::{GoogleEndpoints, GoogleProvider};
use domain::oauth::StateManager;
use domain::session::{MemoryStore, SessionPolicy};
use domain::token::TokenSigner;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    let same_site = match config.cookie_same_site.parse::<SameSite>() {
        Ok(same_site) => same_site,
        Err(_) => {
            warn!(
                "Unrecognized COOKIE_SAME_SITE value '{}', falling back to Lax",
                config.cookie_same_site
            );
            SameSite::Lax
        }
    };

    let endpoints = GoogleEndpoints {
        auth_url: config.oauth_auth_url().to_string(),
        token_url: config.oauth_token_url().to_string(),
        userinfo_url: config.oauth_userinfo_url().to_string(),
    };
    let provider = match GoogleProvider::new(
        config.oauth_client_id(),
        config.oauth_client_secret(),
        config.oauth_redirect_uri(),
        endpoints,
    ) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!("Failed to construct OAuth provider: {e}");
            std::process::exit(1);
        }
    };

    let directory = Arc::new(InMemoryDirectory::new("users"));
    let sessions = Arc::new(MemoryStore::new(chrono::Duration::seconds(
        config.session_expiry_seconds,
    )));
    let signer = Arc::new(TokenSigner::new(SecretString::new(
        config.signing_secret().to_string(),
    )));
    let states = StateManager::with_ttl(chrono::Duration::seconds(config.state_expiry_seconds));

    let flow = Arc::new(LoginFlow::new(
        provider,
        directory.clone(),
        sessions.clone(),
        signer.clone(),
        states,
        LoginFlowConfig {
            realm: RealmPolicy {
                token_expiry: chrono::Duration::seconds(config.token_expiration_seconds),
                cookie: CookiePolicy {
                    prefix: config.cookie_prefix.clone(),
                    secure: config.cookie_secure,
                    same_site,
                    domain: config.cookie_domain.clone(),
                },
            },
            session_policy: SessionPolicy::default(),
            session_ttl: chrono::Duration::seconds(config.session_expiry_seconds),
            post_login_redirect: config.post_login_redirect_url().to_string(),
        },
    ));

    let host = config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = config.port;
    info!(
        "Starting authentication bridge on {host}:{port} in {} mode",
        config.verification_mode
    );

    let app_state = AppState::new(flow, directory, sessions, signer, config);
    let router = web::router::define_routes(app_state);

    let listener = match tokio::net::TcpListener::bind(format!("{host}:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {host}:{port}: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {e}");
        return;
    }
    info!("Shutdown signal received");
}
