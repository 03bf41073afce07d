//! Signed-token issuance and verification.
//!
//! A [`TokenSigner`] turns a principal's identity fields into a compact,
//! self-contained JWT and verifies tokens presented back to us. Verification
//! is a pure function of the token and the clock; it never consults the
//! session store. The signing secret is loaded once at startup and held in a
//! [`SecretString`] so it is redacted from any debug output.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Error;
use crate::Id;

/// Claims embedded in a signed token.
///
/// `collection` names the realm the principal belongs to; the JSON field name
/// matches the wire contract consumed by the rest of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub email: String,
    #[schema(value_type = String)]
    pub id: Id,
    pub collection: String,
    pub iat: usize,
    pub exp: usize,
}

/// A freshly issued token together with its validity window. The cookie's
/// `Expires` attribute is derived from `expires_at` so the browser drops the
/// cookie when the token itself lapses.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Stateless HS256 signer/verifier over [`Claims`].
pub struct TokenSigner {
    secret: SecretString,
}

impl TokenSigner {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Sign the identity fields into a token valid for `expires_in`.
    ///
    /// Deterministic given the same secret, fields, and clock; only the
    /// embedded `iat`/`exp` vary between calls.
    pub fn sign(
        &self,
        email: &str,
        id: Id,
        collection: &str,
        expires_in: Duration,
    ) -> Result<SignedToken, Error> {
        let issued_at = Utc::now();
        let expires_at = issued_at + expires_in;

        let claims = Claims {
            email: email.to_string(),
            id,
            collection: collection.to_string(),
            iat: issued_at.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?;

        Ok(SignedToken {
            token,
            issued_at,
            expires_at,
        })
    }

    /// Verify a token and return its claims.
    ///
    /// Fails with `TokenErrorKind::Expired` strictly after the embedded
    /// expiry (zero leeway) and `TokenErrorKind::InvalidSignature` when the
    /// token has been tampered with or signed under a different secret.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TokenErrorKind};

    fn signer() -> TokenSigner {
        TokenSigner::new(SecretString::new("test-secret".to_string()))
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let signer = signer();
        let id = Id::new_v4();
        let signed = signer
            .sign("user@example.com", id, "users", Duration::seconds(3600))
            .unwrap();

        let claims = signer.verify(&signed.token).unwrap();
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.id, id);
        assert_eq!(claims.collection, "users");
        assert_eq!(claims.exp, signed.expires_at.timestamp() as usize);
    }

    #[test]
    fn test_expiry_derived_from_lifetime() {
        let signer = signer();
        let signed = signer
            .sign("user@example.com", Id::new_v4(), "users", Duration::seconds(3600))
            .unwrap();

        assert_eq!(signed.expires_at - signed.issued_at, Duration::seconds(3600));
    }

    #[test]
    fn test_verify_after_expiry_is_expired() {
        let signer = signer();
        // An already-lapsed validity window stands in for waiting out a real one.
        let signed = signer
            .sign("user@example.com", Id::new_v4(), "users", Duration::seconds(-1))
            .unwrap();

        let err = signer.verify(&signed.token).unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Token(TokenErrorKind::Expired));
    }

    #[test]
    fn test_tampered_signature_is_invalid_not_expired() {
        let signer = signer();
        let signed = signer
            .sign("user@example.com", Id::new_v4(), "users", Duration::seconds(3600))
            .unwrap();

        // Flip the leading character of the signature segment.
        let mut parts: Vec<String> = signed.token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        let sig = &mut parts[2];
        let replacement = if sig.starts_with('A') { "B" } else { "A" };
        sig.replace_range(..1, replacement);
        let tampered = parts.join(".");

        let err = signer.verify(&tampered).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Token(TokenErrorKind::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_rejects_foreign_secret() {
        let signed = signer()
            .sign("user@example.com", Id::new_v4(), "users", Duration::seconds(3600))
            .unwrap();

        let other = TokenSigner::new(SecretString::new("other-secret".to_string()));
        let err = other.verify(&signed.token).unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Token(TokenErrorKind::InvalidSignature)
        );
    }
}
