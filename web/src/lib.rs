//! HTTP surface for the authentication bridge: router, controllers, and the
//! identity extractor/middleware that gate downstream handlers.

use std::sync::Arc;

use domain::directory::Directory;
use domain::login::LoginFlow;
use domain::session::SessionStore;
use domain::token::TokenSigner;
use service::config::Config;

pub(crate) mod controller;
mod cookies;
pub mod error;
pub(crate) mod extractors;
pub(crate) mod middleware;
pub mod router;
#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};

/// Shared application state injected into every handler.
/// Needs to implement Clone to be able to be passed into Router as State.
#[derive(Clone)]
pub struct AppState {
    pub flow: Arc<LoginFlow>,
    pub directory: Arc<dyn Directory>,
    pub sessions: Arc<dyn SessionStore>,
    pub signer: Arc<TokenSigner>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        flow: Arc<LoginFlow>,
        directory: Arc<dyn Directory>,
        sessions: Arc<dyn SessionStore>,
        signer: Arc<TokenSigner>,
        config: Config,
    ) -> Self {
        Self {
            flow,
            directory,
            sessions,
            signer,
            config,
        }
    }
}
