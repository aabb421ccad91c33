//! Wire models for users and site memberships.

use crate::error::IdentityError;
use chrono::{DateTime, Utc};
use fhub_derive::api_model;
use fhub_domain::capabilities::Role;

/// A user mirrored from the auth provider (or created manually).
#[api_model]
#[derive(Clone, PartialEq)]
pub struct User {
    /// Full record id (`user:<key>`).
    pub id: String,
    /// Auth-provider id this record mirrors. Equals the record key for
    /// provider-born users.
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /users`.
#[api_model]
pub struct CreateUser {
    /// Defaults to the generated record key when absent.
    pub external_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Partial update for `PATCH /users/{id}`.
#[api_model]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// One row of a site's member list.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Member {
    pub user: User,
    pub role: Role,
}

/// Payload for `PUT /sites/{id}/members/{userId}`.
#[api_model]
pub struct AssignRole {
    pub role: Role,
}

impl CreateUser {
    /// Rejects obviously malformed input.
    ///
    /// # Errors
    /// Returns [`IdentityError::Validation`] for an unusable email.
    pub fn validate(&self) -> Result<(), IdentityError> {
        validate_email(&self.email)
    }
}

impl UpdateUser {
    /// Same rules as [`CreateUser::validate`], applied to present fields only.
    ///
    /// # Errors
    /// Returns [`IdentityError::Validation`] for an unusable email.
    pub fn validate(&self) -> Result<(), IdentityError> {
        match &self.email {
            Some(email) => validate_email(email),
            None => Ok(()),
        }
    }
}

fn validate_email(email: &str) -> Result<(), IdentityError> {
    // Deliverability is the provider's problem; this only catches junk.
    let ok = email.len() <= 254
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
    if ok {
        Ok(())
    } else {
        Err(IdentityError::Validation {
            message: format!("`{email}` is not a usable email address").into(),
            context: None,
        })
    }
}
