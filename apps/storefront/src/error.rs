use std::borrow::Cow;

/// A specialized [`StorefrontError`] enum of this crate.
#[fhub_derive::fhub_error]
pub enum StorefrontError {
    /// The platform API answered with a non-success status.
    #[error("API returned {status}{}", format_context(.context))]
    Api { status: u16, context: Option<Cow<'static, str>> },

    /// The platform API could not be reached or the body did not parse.
    #[error("API request failed{}: {source}", format_context(.context))]
    Http {
        #[source]
        source: reqwest::Error,
        context: Option<Cow<'static, str>>,
    },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal storefront error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
