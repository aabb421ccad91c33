use std::borrow::Cow;

/// A specialized [`IdentityError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum IdentityError {
    /// Configuration errors (unusable webhook secret, bad settings).
    #[error("Identity config error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Webhook signature or timestamp rejection. Maps to 401.
    #[error("Webhook rejected{}: {message}", format_context(.context))]
    Unauthorized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The requested user or membership does not exist.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Duplicate external id or email.
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Malformed input rejected before it reaches storage.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A wrapper for underlying `SurrealDB` engine errors.
    #[cfg(feature = "server")]
    #[error("Datastore error{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: fhub_database::surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal identity error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[cfg(feature = "server")]
impl From<IdentityError> for fhub_kernel::server::error::ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthorized { message, context } => {
                Self::Unauthorized { message, context }
            }
            IdentityError::NotFound { message, context } => Self::NotFound { message, context },
            IdentityError::Conflict { message, context } => Self::Conflict { message, context },
            IdentityError::Validation { message, context } => {
                Self::Validation { message, context }
            }
            IdentityError::Surreal { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            }
            IdentityError::Config { message, context }
            | IdentityError::Internal { message, context } => {
                Self::Internal { message, context }
            }
        }
    }
}
