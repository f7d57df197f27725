//! The provider collaborator interface.
//!
//! Transport, authentication, and retry policy belong to the implementation
//! behind this trait; the mailers only hand over fully formatted payloads
//! and treat the result as succeed-or-fail.

use async_trait::async_trait;

use crate::error::Error;
use crate::format::{FormattedMessage, Pair};

/// The email provider's messages API.
#[async_trait]
pub trait MessagesApi: Send + Sync + 'static {
    /// Send a fully formatted message (the provider's "create message"
    /// operation).
    async fn create(&self, message: &FormattedMessage) -> Result<(), Error>;

    /// Send a message backed by a provider-hosted template.
    async fn send_template(
        &self,
        template_name: &str,
        template_content: &[Pair],
        message: &FormattedMessage,
        deferred: bool,
        send_at: Option<&str>,
    ) -> Result<(), Error>;
}
