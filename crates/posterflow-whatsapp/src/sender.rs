use async_trait::async_trait;

use crate::error::DeliveryError;

/// Provider acknowledgement for one accepted send request.
///
/// Acceptance is the only guarantee — provider-side delivery failure after
/// acceptance is not observed by this system.
#[derive(Debug, Clone)]
pub struct MessageReceipt {
    /// Provider-assigned message identifier.
    pub message_id: String,
}

/// The boundary the dispatch engine sends through.
///
/// Implementations must be `Send + Sync` so one sender can be shared by the
/// engine across ticks. `send` is `&self` so a connected client can send
/// without a mutable borrow.
#[async_trait]
pub trait MediaSender: Send + Sync {
    /// Deliver one poster image to one phone number.
    ///
    /// Exactly one outbound provider call per invocation — no internal
    /// retry, no internal queuing. Any transport, auth, or provider
    /// rejection surfaces as a [`DeliveryError`].
    async fn send(&self, phone: &str, media_url: &str) -> Result<MessageReceipt, DeliveryError>;
}
