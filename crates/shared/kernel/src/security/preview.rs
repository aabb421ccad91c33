//! Draft preview tokens.
//!
//! Short-lived HS256 JWTs that unlock the draft view of exactly one page.
//! They share the configured secret with bearer tokens but are signed in a
//! separate key domain (secret + suffix), so neither kind ever validates as
//! the other.

use crate::security::auth::{AuthError, AuthErrorExt};
use fhub_domain::config::{JwtConfig, PreviewConfig};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};

const KEY_DOMAIN: &[u8] = b".preview";

/// Claims of a preview token: the page it unlocks and the site it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewClaims {
    /// Page record id.
    pub sub: String,
    /// Site record id the page belongs to.
    pub site: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
}

fn preview_secret(config: &JwtConfig) -> Vec<u8> {
    let mut key = config.secret.as_bytes().to_vec();
    key.extend_from_slice(KEY_DOMAIN);
    key
}

/// Issues a preview token for one page.
///
/// # Errors
/// Returns [`AuthError::Token`] if signing fails.
pub fn issue_preview_token(
    jwt: &JwtConfig,
    preview: &PreviewConfig,
    page_id: impl Into<String>,
    site_id: impl Into<String>,
) -> Result<String, AuthError> {
    let now = get_current_timestamp();
    let claims = PreviewClaims {
        sub: page_id.into(),
        site: site_id.into(),
        iss: jwt.issuer.clone(),
        iat: now,
        exp: now + preview.ttl_seconds,
    };

    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(&preview_secret(jwt)))
        .context("Signing preview token")
}

/// Validates a preview token and returns its claims. Scope checks (does the
/// token actually cover the requested page) are the caller's job.
///
/// # Errors
/// Returns [`AuthError::Token`] for any signature, expiry, or issuer failure.
pub fn verify_preview_token(jwt: &JwtConfig, token: &str) -> Result<PreviewClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&jwt.issuer]);
    validation.leeway = jwt.clock_skew_seconds;

    let data = decode::<PreviewClaims>(
        token,
        &DecodingKey::from_secret(&preview_secret(jwt)),
        &validation,
    )
    .context("Validating preview token")?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::auth;

    #[test]
    fn preview_token_round_trip() {
        let jwt = JwtConfig::default();
        let preview = PreviewConfig::default();

        let token =
            issue_preview_token(&jwt, &preview, "page:p1", "site:acme").expect("issue");
        let claims = verify_preview_token(&jwt, &token).expect("verify");
        assert_eq!(claims.sub, "page:p1");
        assert_eq!(claims.site, "site:acme");
        assert!(claims.exp - claims.iat == preview.ttl_seconds);
    }

    #[test]
    fn preview_and_bearer_tokens_do_not_cross_validate() {
        let jwt = JwtConfig::default();
        let preview = PreviewConfig::default();

        let preview_token =
            issue_preview_token(&jwt, &preview, "page:p1", "site:acme").expect("issue");
        assert!(auth::verify_token(&jwt, &preview_token).is_err());

        let bearer = auth::issue_token(&jwt, "user:alice").expect("issue");
        assert!(verify_preview_token(&jwt, &bearer).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let jwt = JwtConfig::default();
        let token = issue_preview_token(&jwt, &PreviewConfig::default(), "page:p1", "site:acme")
            .expect("issue");

        let other = JwtConfig { secret: "different".to_owned(), ..JwtConfig::default() };
        assert!(verify_preview_token(&other, &token).is_err());
    }
}
