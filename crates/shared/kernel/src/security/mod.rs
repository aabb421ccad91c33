//! Request-time security primitives: bearer tokens, feature/tier/role gates,
//! record-id validation, and shared-secret comparison.

pub mod auth;
pub mod guards;
#[cfg(feature = "server")]
pub mod membership;
pub mod preview;
pub mod resource;
#[cfg(feature = "server")]
pub mod site;

use subtle::ConstantTimeEq;

/// Constant-time byte comparison for shared secrets (webhook signatures,
/// revalidation keys).
#[must_use]
pub fn ct_eq(a: impl AsRef<[u8]>, b: impl AsRef<[u8]>) -> bool {
    a.as_ref().ct_eq(b.as_ref()).into()
}
