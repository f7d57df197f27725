//! Mailer lifecycle and delivery strategies.
//!
//! A mailer is a single-use, per-send object. Its life runs one way:
//! `build` formats the declarative arguments into a provider payload and
//! applies the interceptor; a delivery call then either dispatches the
//! payload inline, enqueues it for deferred dispatch, or — in offline mode —
//! records it for inspection.
//!
//! # Quick Start
//!
//! ```ignore
//! let ctx = MailContext::new(Config::from_env()?, api, queue);
//!
//! let mut mailer = MessageMailer::new(ctx)
//!     .with_defaults(MailerDefaults::builder().from("support@example.com").build());
//!
//! mailer
//!     .build(
//!         MessageArgs::builder()
//!             .to("user@example.com")
//!             .subject("Welcome!")
//!             .html("<p>Thanks for signing up.</p>")
//!             .build(),
//!     )?
//!     .deliver_now()
//!     .await?;
//! ```
//!
//! Applications typically wrap a mailer per domain concern, the way the
//! strategy types wrap the shared core here: a struct holding its own
//! [`MailerDefaults`] and one method per email it knows how to compose.

mod defaults;
mod job;
mod message;
mod scenarios;
mod template;

pub use defaults::{DefaultsBuilder, MailerDefaults};
pub use job::DeliverMessageJob;
pub use message::MessageMailer;
pub use scenarios::{ScenarioOptions, Scenarios};
pub use template::TemplateMailer;

use std::sync::Arc;

use async_trait::async_trait;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::MessagesApi;
use crate::config::Config;
use crate::error::Error;
use crate::format::{FormattedMessage, Pair};
use crate::offline::DeliveryCapture;
use crate::queue::{JobQueue, MemoryQueue};

/// Whether deliveries reach the provider or the offline recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Live,
    Offline,
}

/// The collaborators every mailer needs: configuration, the provider API,
/// and the job queue. Cheap to clone; clones share the interceptor slot.
#[derive(Clone)]
pub struct MailContext {
    pub config: Config,
    pub api: Arc<dyn MessagesApi>,
    pub queue: Arc<dyn JobQueue>,
    pub mode: DeliveryMode,
}

impl MailContext {
    pub fn new(config: Config, api: Arc<dyn MessagesApi>, queue: Arc<dyn JobQueue>) -> Self {
        Self {
            config,
            api,
            queue,
            mode: DeliveryMode::Live,
        }
    }

    /// A context whose deliveries are recorded on the
    /// [`offline`](crate::offline) capture list instead of being sent.
    pub fn offline(config: Config) -> Self {
        Self {
            config,
            api: Arc::new(UnroutedApi),
            queue: Arc::new(MemoryQueue::new()),
            mode: DeliveryMode::Offline,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.mode == DeliveryMode::Offline
    }
}

/// Placeholder provider for offline contexts. Delivery never reaches it;
/// if something does, that is a wiring bug worth surfacing.
struct UnroutedApi;

#[async_trait]
impl MessagesApi for UnroutedApi {
    async fn create(&self, _message: &FormattedMessage) -> Result<(), Error> {
        Err(Error::Provider("no provider wired in offline mode".to_string()))
    }

    async fn send_template(
        &self,
        _template_name: &str,
        _template_content: &[Pair],
        _message: &FormattedMessage,
        _deferred: bool,
        _send_at: Option<&str>,
    ) -> Result<(), Error> {
        Err(Error::Provider("no provider wired in offline mode".to_string()))
    }
}

/// What a delivery call did.
#[derive(Debug)]
pub enum Delivered {
    /// The provider accepted the payload.
    Sent,
    /// A deferred-dispatch job was enqueued.
    Enqueued { job_id: Uuid },
    /// Offline mode captured the payload instead of sending it.
    Captured(DeliveryCapture),
}

/// The delivery capability set shared by every mailer strategy.
///
/// The default bodies document the contract: a strategy that does not
/// support a capability reports [`Error::NotImplemented`] rather than
/// silently doing nothing.
#[async_trait]
pub trait Delivery {
    /// Deliver the built message with the strategy's preferred semantics.
    async fn deliver(&self) -> Result<Delivered, Error> {
        Err(Error::NotImplemented("deliver"))
    }

    /// Dispatch the built message to the provider inline.
    async fn deliver_now(&self) -> Result<Delivered, Error> {
        Err(Error::NotImplemented("deliver_now"))
    }

    /// Serialize the built message and enqueue it for deferred dispatch.
    async fn deliver_later(&self) -> Result<Delivered, Error> {
        Err(Error::NotImplemented("deliver_later"))
    }
}

const SEND_AT_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Render a scheduling timestamp the way the provider expects:
/// UTC, `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn format_send_at(at: OffsetDateTime) -> Result<String, Error> {
    at.to_offset(time::UtcOffset::UTC)
        .format(SEND_AT_FORMAT)
        .map_err(|e| Error::InvalidSendAt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn send_at_normalizes_to_utc_string() {
        let at = datetime!(2026-01-02 03:04:05 UTC);
        assert_eq!(format_send_at(at).unwrap(), "2026-01-02 03:04:05");

        let offset = datetime!(2026-01-02 05:04:05 +02:00);
        assert_eq!(format_send_at(offset).unwrap(), "2026-01-02 03:04:05");
    }
}
