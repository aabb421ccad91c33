use std::borrow::Cow;

/// A specialized [`TenancyError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum TenancyError {
    /// The requested site does not exist.
    #[error("Site not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Slug or host already claimed by another site.
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
    #[error("Internal tenancy error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[cfg(feature = "server")]
impl From<TenancyError> for fhub_kernel::server::error::ApiError {
    fn from(err: TenancyError) -> Self {
        match err {
            TenancyError::NotFound { message, context } => Self::NotFound { message, context },
            TenancyError::Conflict { message, context } => Self::Conflict { message, context },
            TenancyError::Validation { message, context } => {
                Self::Validation { message, context }
            }
            TenancyError::Surreal { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            }
            TenancyError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
