use std::borrow::Cow;

/// Errors that can occur during event bus operations.
#[fhub_derive::fhub_error]
pub enum EventBusError {
    /// An internal dynamic cast failed.
    /// This usually indicates an invariant violation in the channel registry.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A channel exists for this event type but with a different kind
    /// (broadcast vs mpsc).
    #[error("Channel kind mismatch{}: {message}", format_context(.context))]
    ChannelKindMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A bounded channel is full and cannot accept more messages.
    #[error("Channel full{}: {message}", format_context(.context))]
    ChannelFull { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The single MPSC receiver for this event type was already claimed.
    #[error("Receiver taken{}: {message}", format_context(.context))]
    ReceiverTaken { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Capacity must be greater than zero for bounded channels.
    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
