//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs signed with the configured secret and validated
//! against issuer, expiry, and (when configured) audience. Claims carry the
//! caller's user id in `sub`; membership and role resolution happen in the
//! identity slice, so the kernel only answers "who is calling".

use fhub_domain::config::JwtConfig;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[fhub_derive::fhub_error]
pub enum AuthError {
    #[error("Token rejected{}: {source}", format_context(.context))]
    Token {
        #[source]
        source: jsonwebtoken::errors::Error,
        context: Option<Cow<'static, str>>,
    },
}

/// Registered claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// User id of the caller.
    pub sub: String,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

/// Issues a bearer token for `subject` with the configured TTL.
///
/// # Errors
/// Returns [`AuthError::Token`] if signing fails.
pub fn issue_token(config: &JwtConfig, subject: impl Into<String>) -> Result<String, AuthError> {
    let now = get_current_timestamp();
    let claims = AuthClaims {
        sub: subject.into(),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        iat: now,
        exp: now + config.ttl_seconds,
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(config.secret.as_bytes()))
        .context("Signing bearer token")
}

/// Validates a bearer token and returns its claims.
///
/// Expiry is checked with the configured clock-skew leeway; the issuer must
/// match exactly; the audience is checked only when one is configured.
///
/// # Errors
/// Returns [`AuthError::Token`] for any signature, expiry, issuer, or
/// audience failure.
pub fn verify_token(config: &JwtConfig, token: &str) -> Result<AuthClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = config.clock_skew_seconds;
    if let Some(audience) = &config.audience {
        validation.set_audience(&[audience]);
    }

    let data = decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .context("Validating bearer token")?;

    Ok(data.claims)
}

#[cfg(feature = "server")]
mod extract {
    use super::{AuthClaims, verify_token};
    use crate::server::error::ApiError;
    use axum::extract::{FromRef, FromRequestParts};
    use axum::http::header::AUTHORIZATION;
    use axum::http::request::Parts;
    use fhub_domain::config::ApiConfig;

    /// Authenticated caller, extracted from the `Authorization: Bearer` header.
    ///
    /// Rejection is a 401 [`ApiError::Unauthorized`] with a generic message;
    /// the precise validation failure is not leaked to the client.
    #[derive(Debug, Clone)]
    pub struct AuthUser {
        pub id: String,
        pub claims: AuthClaims,
    }

    impl<S> FromRequestParts<S> for AuthUser
    where
        ApiConfig: FromRef<S>,
        S: Send + Sync,
    {
        type Rejection = ApiError;

        async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
            let config = ApiConfig::from_ref(state);

            let header = parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| ApiError::Unauthorized {
                    message: "Missing bearer token".into(),
                    context: None,
                })?;
            let token = header.strip_prefix("Bearer ").ok_or_else(|| ApiError::Unauthorized {
                message: "Malformed authorization header".into(),
                context: None,
            })?;

            let claims =
                verify_token(&config.security.jwt, token).map_err(|_| ApiError::Unauthorized {
                    message: "Invalid bearer token".into(),
                    context: None,
                })?;

            Ok(Self { id: claims.sub.clone(), claims })
        }
    }
}

#[cfg(feature = "server")]
pub use extract::AuthUser;
