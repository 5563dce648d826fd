//! Delivery channel boundary.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fully rendered message handed to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub from_address: String,
    pub recipients: Vec<String>,
}

/// Rejection reported by a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelError {
    message: String,
}

impl ChannelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ChannelError {}

/// External transport for rendered messages (SMTP relay, mail API, ...).
///
/// Implementations own retries; the dispatcher calls `deliver` once.
pub trait DeliveryChannel {
    /// Sends `message`, returning how many messages the transport accepted.
    ///
    /// `Ok(0)` means the transport neither failed nor accepted anything.
    fn deliver(&self, message: &OutgoingMessage) -> Result<usize, ChannelError>;
}
