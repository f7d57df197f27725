//! The deferred-dispatch job.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Error;
use crate::format::FormattedMessage;
use crate::queue::Job;

use super::{Delivery, MailContext, MessageMailer};

/// The serialized unit of work behind `deliver_later`.
///
/// Carries everything needed to finish a send in another process: the
/// formatted message, the scheduling fields, and the name of the mailer
/// strategy to reconstruct. `perform` assigns the fields directly —
/// bypassing `build`, which already ran on the enqueueing side — and
/// invokes the inline delivery path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverMessageJob {
    pub message: FormattedMessage,
    pub deferred: bool,
    pub send_at: Option<String>,
    pub mailer: String,
}

#[async_trait]
impl Job for DeliverMessageJob {
    const JOB_TYPE: &'static str = "mailer::deliver_message";
    type Context = MailContext;

    async fn perform(self, ctx: &MailContext) -> Result<(), Error> {
        info!(mailer = %self.mailer, "performing deferred delivery");

        match self.mailer.as_str() {
            MessageMailer::NAME => {
                let mut mailer = MessageMailer::new(ctx.clone());
                mailer.message = Some(self.message);
                mailer.deferred = self.deferred;
                mailer.send_at = self.send_at;
                mailer.deliver_now().await?;
                Ok(())
            }
            other => Err(Error::UnknownMailer(other.to_string())),
        }
    }
}
