//! Axum plumbing shared by every slice router: typed errors, the Arc'd
//! application state with its slice registry, and the system endpoints.

pub mod error;
pub mod health;
pub mod router;
pub mod state;
