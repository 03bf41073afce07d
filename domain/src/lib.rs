//! Authentication bridge core.
//!
//! Everything between "the browser hit our authorize endpoint" and "the
//! browser holds a locally trusted credential" lives here: the OAuth2
//! handshake, session persistence, principal resolution, and signed-token
//! issuance. The HTTP surface lives in the `web` crate; configuration and
//! logging live in `service`.

pub mod directory;
pub mod error;
pub mod login;
pub mod oauth;
pub mod session;
pub mod token;

/// A type alias that represents any internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = uuid::Uuid;
