//! Conversion from domain cookie descriptors to `Set-Cookie` values.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::OffsetDateTime;

use domain::login::{self, CookieDescriptor};

/// Build a response cookie from a descriptor issued by the login flow.
pub(crate) fn issue(descriptor: &CookieDescriptor) -> Cookie<'static> {
    let expires = OffsetDateTime::from_unix_timestamp(descriptor.expires.timestamp())
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);

    let mut builder = Cookie::build((descriptor.name.clone(), descriptor.value.clone()))
        .path(descriptor.path.clone())
        .http_only(descriptor.http_only)
        .secure(descriptor.secure)
        .same_site(same_site(descriptor.same_site))
        .expires(expires);

    if let Some(domain) = &descriptor.domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

fn same_site(value: login::SameSite) -> SameSite {
    match value {
        login::SameSite::Strict => SameSite::Strict,
        login::SameSite::Lax => SameSite::Lax,
        login::SameSite::None => SameSite::None,
    }
}
