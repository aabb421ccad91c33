//! Shared event types for integration tests.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagePublished(pub i64);
