//! Message-mode delivery: raw HTML/text content supplied inline.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Error;
use crate::format::{self, FormattedMessage, MessageArgs, RecipientEntry};
use crate::offline::{self, DeliveryCapture};
use crate::queue::{enqueue, EnqueueOpts};

use super::{format_send_at, Delivered, Delivery, MailContext, MailerDefaults};

type PrepareHook = Arc<dyn Fn(MessageArgs) -> MessageArgs + Send + Sync>;

/// A single-use mailer that sends raw-content messages.
///
/// `deliver`/`deliver_now` dispatch the formatted message straight to the
/// provider; `deliver_later` serializes it into a
/// [`DeliverMessageJob`](super::DeliverMessageJob) and enqueues it.
pub struct MessageMailer {
    ctx: MailContext,
    defaults: MailerDefaults,
    prepare: Option<PrepareHook>,

    /// The formatted message, populated by [`build`](Self::build).
    pub message: Option<FormattedMessage>,
    /// Ask the provider to process the send in its background pipeline.
    pub deferred: bool,
    /// Scheduling timestamp, normalized to a UTC `YYYY-MM-DD HH:MM:SS`
    /// string.
    pub send_at: Option<String>,
}

impl MessageMailer {
    /// Name carried in deferred-dispatch payloads so the job can
    /// reconstruct the right strategy.
    pub const NAME: &'static str = "MessageMailer";

    pub fn new(ctx: MailContext) -> Self {
        Self {
            ctx,
            defaults: MailerDefaults::base(),
            prepare: None,
            message: None,
            deferred: false,
            send_at: None,
        }
    }

    /// Replace the seed defaults with this mailer's own resolved set.
    pub fn with_defaults(mut self, defaults: MailerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Install an argument-rewrite hook that runs before formatting.
    ///
    /// This is the escape hatch for wrapper mailers that need to massage
    /// every argument set in one place.
    pub fn with_prepare<F>(mut self, hook: F) -> Self
    where
        F: Fn(MessageArgs) -> MessageArgs + Send + Sync + 'static,
    {
        self.prepare = Some(Arc::new(hook));
        self
    }

    pub fn context(&self) -> &MailContext {
        &self.ctx
    }

    pub fn defaults(&self) -> &MailerDefaults {
        &self.defaults
    }

    /// Build the provider payload from a declarative argument set.
    ///
    /// Control options (`deferred`, `send_at`) are pulled out of the
    /// arguments before formatting; the prepare hook then gets a chance to
    /// rewrite what is left; the formatter normalizes the rest against this
    /// mailer's defaults; the configured interceptor runs last.
    ///
    /// Returns `&mut Self` so delivery chains off the same expression.
    /// Calling `build` again on the same instance recomputes the message
    /// from scratch and overwrites the previous one.
    pub fn build(&mut self, args: MessageArgs) -> Result<&mut Self, Error> {
        let mut args = args;
        self.deferred = std::mem::take(&mut args.deferred);
        if let Some(at) = args.send_at.take() {
            self.send_at = Some(format_send_at(at)?);
        }

        let args = match &self.prepare {
            Some(hook) => hook(args),
            None => args,
        };

        let mut message = format::message(args, &self.defaults)?;
        self.ctx.config.apply_interceptor(&mut message)?;
        self.message = Some(message);

        Ok(self)
    }

    /// The resolved sender address of the built message.
    pub fn from_email(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.from_email.as_str())
    }

    /// The normalized recipients of the built message.
    pub fn recipients(&self) -> Option<&[RecipientEntry]> {
        self.message.as_ref().map(|m| m.recipients.as_slice())
    }

    pub fn bcc(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.bcc.as_deref())
    }

    /// Enqueue deferred dispatch with explicit queue options.
    pub async fn deliver_later_with(&self, opts: &EnqueueOpts) -> Result<Delivered, Error> {
        if self.ctx.is_offline() {
            return Ok(Delivered::Captured(offline::record(self.capture())));
        }

        let message = self.message.clone().ok_or(Error::MissingMessage)?;
        let job = super::DeliverMessageJob {
            message,
            deferred: self.deferred,
            send_at: self.send_at.clone(),
            mailer: Self::NAME.to_string(),
        };

        let job_id = enqueue(self.ctx.queue.as_ref(), &job, opts).await?;
        info!(%job_id, queue = %opts.queue, "message delivery enqueued");
        Ok(Delivered::Enqueued { job_id })
    }

    fn capture(&self) -> DeliveryCapture {
        DeliveryCapture {
            template_name: None,
            template_content: None,
            message: self.message.clone(),
            deferred: self.deferred,
            send_at: self.send_at.clone(),
        }
    }
}

#[async_trait]
impl Delivery for MessageMailer {
    async fn deliver(&self) -> Result<Delivered, Error> {
        self.deliver_now().await
    }

    async fn deliver_now(&self) -> Result<Delivered, Error> {
        if self.ctx.is_offline() {
            return Ok(Delivered::Captured(offline::record(self.capture())));
        }

        let message = self.message.as_ref().ok_or(Error::MissingMessage)?;

        debug!("dispatching message to provider");
        self.ctx.api.create(message).await?;
        info!(recipients = message.recipients.len(), "message delivered");
        Ok(Delivered::Sent)
    }

    async fn deliver_later(&self) -> Result<Delivered, Error> {
        let opts = EnqueueOpts::queue(self.ctx.config.deliver_later_queue_name.clone());
        self.deliver_later_with(&opts).await
    }
}
