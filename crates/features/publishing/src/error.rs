use std::borrow::Cow;

/// A specialized [`PublishingError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum PublishingError {
    /// The content-changed queue could not be claimed.
    #[cfg(feature = "server")]
    #[error("Event bus error{}: {source}", format_context(.context))]
    Bus {
        #[source]
        source: fhub_event_bus::EventBusError,
        context: Option<Cow<'static, str>>,
    },

    /// The outbound HTTP client could not be built.
    #[cfg(feature = "server")]
    #[error("HTTP client error{}: {source}", format_context(.context))]
    Http {
        #[source]
        source: reqwest::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal publishing error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
