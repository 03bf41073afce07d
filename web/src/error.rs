use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DirectoryErrorKind, Error as DomainError, ErrorKind, HttpErrorKind, OAuthErrorKind,
    SessionErrorKind, TokenErrorKind,
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

impl Error {
    pub fn error_kind(&self) -> &ErrorKind {
        &self.0.error_kind
    }
}

// Maps each domain error kind to the HTTP status an API caller should see.
// Token outcomes are 401s prompting re-authentication, never server errors.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            ErrorKind::OAuth(oauth_error_kind) => match oauth_error_kind {
                OAuthErrorKind::StateMismatch => {
                    (StatusCode::BAD_REQUEST, "BAD REQUEST").into_response()
                }
                OAuthErrorKind::ExchangeFailed | OAuthErrorKind::InvalidResponse => {
                    (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
                }
            },
            ErrorKind::Token(token_error_kind) => match token_error_kind {
                TokenErrorKind::Expired | TokenErrorKind::InvalidSignature => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                }
                TokenErrorKind::Encoding => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            ErrorKind::Session(session_error_kind) => match session_error_kind {
                SessionErrorKind::Storage => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            ErrorKind::Directory(directory_error_kind) => match directory_error_kind {
                DirectoryErrorKind::NotFound => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                }
                DirectoryErrorKind::Conflict => {
                    (StatusCode::CONFLICT, "CONFLICT").into_response()
                }
            },
            ErrorKind::Http(http_error_kind) => match http_error_kind {
                HttpErrorKind::Network | HttpErrorKind::RequestFailed => {
                    (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
                }
                HttpErrorKind::BuilderFailed => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
            ErrorKind::Config => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
