use axum::http::StatusCode;

pub(crate) mod authenticated_principal;

pub(crate) use authenticated_principal::{resolve_principal, AuthenticatedPrincipal};

pub(crate) type RejectionType = (StatusCode, String);
