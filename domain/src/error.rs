//! Error types for the `domain` layer.
//!
//! Errors are modeled as a root `Error` struct holding a tree of `error_kind`
//! enums describing what went wrong, plus an optional `source` for chaining.
//! The `web` layer translates these kinds into HTTP status codes or redirects,
//! so no error defined here is fatal to the process.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the domain layer.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in the domain layer.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    OAuth(OAuthErrorKind),
    Token(TokenErrorKind),
    Session(SessionErrorKind),
    Directory(DirectoryErrorKind),
    Http(HttpErrorKind),
    Config,
}

/// Errors from the OAuth login handshake.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// The callback's anti-forgery state was absent, expired, or did not
    /// match one issued by a preceding authorize redirect. Never retried.
    StateMismatch,
    /// The provider rejected the code exchange (network failure, protocol
    /// error, or a reused single-use code). Never retried.
    ExchangeFailed,
    /// The provider responded with a payload we could not understand.
    InvalidResponse,
}

/// Outcomes of signed-token operations. `Expired` and `InvalidSignature`
/// are kept distinct so callers can prompt re-login rather than treating a
/// stale token as tampering.
#[derive(Debug, PartialEq)]
pub enum TokenErrorKind {
    Expired,
    InvalidSignature,
    Encoding,
}

/// Errors from session store operations.
#[derive(Debug, PartialEq)]
pub enum SessionErrorKind {
    Storage,
}

/// Errors from the user directory adapter.
#[derive(Debug, PartialEq)]
pub enum DirectoryErrorKind {
    /// No backing user record exists (e.g. deleted after session creation).
    NotFound,
    /// The directory rejected a write, e.g. the profile's email already
    /// belongs to a principal from a different provider.
    Conflict,
}

/// Errors from outbound HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::OAuth(kind) => write!(f, "OAuth error: {:?}", kind),
            ErrorKind::Token(kind) => write!(f, "Token error: {:?}", kind),
            ErrorKind::Session(kind) => write!(f, "Session error: {:?}", kind),
            ErrorKind::Directory(kind) => write!(f, "Directory error: {:?}", kind),
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind),
            ErrorKind::Config => write!(f, "Configuration error"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind as JwtErrorKind;

        let error_kind = match err.kind() {
            JwtErrorKind::ExpiredSignature => ErrorKind::Token(TokenErrorKind::Expired),
            JwtErrorKind::InvalidSignature
            | JwtErrorKind::InvalidToken
            | JwtErrorKind::InvalidAlgorithm => {
                ErrorKind::Token(TokenErrorKind::InvalidSignature)
            }
            _ => ErrorKind::Token(TokenErrorKind::Encoding),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create token errors.
pub fn token_error(kind: TokenErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Token(kind),
    }
}

/// Helper function to create session storage errors.
pub fn session_error(message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Session(SessionErrorKind::Storage),
    }
}

/// Helper function to create directory errors.
pub fn directory_error(kind: DirectoryErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Directory(kind),
    }
}
