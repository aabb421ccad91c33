use std::borrow::Cow;

/// A specialized [`BillingError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum BillingError {
    /// No payment configuration stored for the requested provider.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Malformed input rejected before it reaches storage.
    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The sealing key cannot be used as configured.
    #[error("Billing configuration error{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Sealing or unsealing a secret failed.
    #[error("Sealing error{}: {message}", format_context(.context))]
    Sealing { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A wrapper for underlying `SurrealDB` engine errors.
    #[cfg(feature = "server")]
    #[error("Datastore error{}: {source}", format_context(.context))]
    Surreal {
        #[source]
        source: fhub_database::surrealdb::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal billing error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[cfg(feature = "server")]
impl From<BillingError> for fhub_kernel::server::error::ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::NotFound { message, context } => Self::NotFound { message, context },
            BillingError::Validation { message, context } => {
                Self::Validation { message, context }
            }
            // Crypto details stay in the logs; clients only learn that the
            // operation failed.
            BillingError::Config { context, .. } | BillingError::Sealing { context, .. } => {
                Self::Internal { message: "Payment secret handling failed".into(), context }
            }
            BillingError::Surreal { source, context } => {
                Self::Internal { message: source.to_string().into(), context }
            }
            BillingError::Internal { message, context } => Self::Internal { message, context },
        }
    }
}
