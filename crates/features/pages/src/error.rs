use fhub_domain::blocks::TreeError;
use std::borrow::Cow;

/// A specialized [`PagesError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum PagesError {
    /// The requested page or version does not exist.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Duplicate slug or path within a site.
    #[error("Conflict{}: {message}", format_context(.context))]
    Conflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Malformed input rejected before it reaches storage.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A structurally invalid page tree.
    #[error("Invalid page tree{}: {source}", format_context(.context))]
    Tree {
        #[source]
        source: TreeError,
        context: Option<Cow<'static, str>>,
    },

    /// A wrapper for underlying `SurrealDB` engine errors.
    #[cfg(feature = "server")]
    #[error("Datastore error{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: fhub_database::surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal pages error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[cfg(feature = "server")]
impl From<PagesError> for fhub_kernel::server::error::ApiError {
    fn from(err: PagesError) -> Self {
        match err {
            PagesError::NotFound { message, context } => Self::NotFound { message, context },
            PagesError::Conflict { message, context } => Self::Conflict { message, context },
            PagesError::Validation { message, context } => Self::Validation { message, context },
            PagesError::Tree { source, context } => {
                Self::Validation { message: source.to_string().into(), context }
            }
            PagesError::Surreal { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            }
            PagesError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
