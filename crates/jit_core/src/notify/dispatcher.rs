//! Single delivery attempt with outcome logging.
//!
//! # Invariants
//! - Every call that has recipients logs exactly one outcome line with the
//!   sender and the recipient list.
//! - Errors are logged at `error` level and returned as data.

use crate::config::MailConfig;
use crate::logging::sanitize_message;
use crate::notify::channel::{DeliveryChannel, OutgoingMessage};
use crate::render::document::Document;
use log::{error, info, warn};
use std::fmt::{Display, Formatter};

const MAX_ERROR_DETAIL_CHARS: usize = 300;

/// Result of one delivery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Success,
    /// The channel returned without error but accepted nothing.
    UnknownError,
    /// The channel failed; carries the captured detail.
    Error(String),
    /// No recipients, nothing attempted.
    Skipped,
    /// Sending is switched off by configuration.
    Disabled,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::Error(_) => "ERROR",
            Self::Skipped => "SKIPPED",
            Self::Disabled => "DISABLED",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl Display for DeliveryOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error(detail) => write!(f, "ERROR: {detail}"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Sends rendered documents through one channel as one sender.
pub struct Dispatcher<'c> {
    channel: &'c dyn DeliveryChannel,
    from_address: String,
    allow_send: bool,
}

impl<'c> Dispatcher<'c> {
    pub fn new(channel: &'c dyn DeliveryChannel, mail: &MailConfig) -> Self {
        Self {
            channel,
            from_address: mail.from_address.clone(),
            allow_send: mail.allow_send,
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    /// Renders `document` and requests delivery to `recipients`.
    ///
    /// An empty recipient list is a no-op returning [`DeliveryOutcome::Skipped`].
    pub fn dispatch(
        &self,
        subject: &str,
        document: &Document,
        recipients: &[String],
    ) -> DeliveryOutcome {
        if recipients.is_empty() {
            info!(
                "event=mail_delivery module=notify status=skipped reason=no_recipients from={}",
                self.from_address
            );
            return DeliveryOutcome::Skipped;
        }

        let recipient_list = recipients.join(", ");
        if !self.allow_send {
            warn!(
                "event=mail_delivery module=notify status=skipped outcome={} from={} recipients={} detail=delivery disabled",
                DeliveryOutcome::Disabled.as_str(),
                self.from_address,
                recipient_list
            );
            return DeliveryOutcome::Disabled;
        }

        let rendered = document.render();
        let message = OutgoingMessage {
            subject: subject.to_string(),
            html_body: rendered.html,
            text_body: rendered.text,
            from_address: self.from_address.clone(),
            recipients: recipients.to_vec(),
        };

        let outcome = match self.channel.deliver(&message) {
            Ok(0) => DeliveryOutcome::UnknownError,
            Ok(_) => DeliveryOutcome::Success,
            Err(err) => DeliveryOutcome::Error(err.to_string()),
        };

        match &outcome {
            DeliveryOutcome::Error(detail) => error!(
                "event=mail_delivery module=notify status=error outcome={} from={} recipients={} error={}",
                outcome.as_str(),
                self.from_address,
                recipient_list,
                sanitize_message(detail, MAX_ERROR_DETAIL_CHARS)
            ),
            _ => info!(
                "event=mail_delivery module=notify status=ok outcome={} from={} recipients={}",
                outcome.as_str(),
                self.from_address,
                recipient_list
            ),
        }

        outcome
    }
}
