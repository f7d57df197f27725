//! Template-mode delivery: content lives in a provider-hosted template.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Error;
use crate::format::{self, FormattedMessage, MessageArgs, Pair, RcptValues};
use crate::offline::{self, DeliveryCapture};

use super::{format_send_at, Delivered, Delivery, MailContext, MailerDefaults};

type PrepareHook = Arc<dyn Fn(MessageArgs) -> MessageArgs + Send + Sync>;

/// A single-use mailer that sends template-backed messages.
///
/// Besides the formatted message it carries the template name and the
/// editable-block content pairs the provider requires, plus the global and
/// per-recipient merge variables resolved at build time.
pub struct TemplateMailer {
    ctx: MailContext,
    defaults: MailerDefaults,
    prepare: Option<PrepareHook>,

    /// Name of the provider-hosted template, extracted from the arguments.
    pub template_name: Option<String>,
    /// Editable-block content. The provider rejects requests without this
    /// field, so blank content becomes a single empty `blank` block.
    pub template_content: Vec<Pair>,
    /// Global merge variables: explicit `vars`, else the mailer's default
    /// merge vars.
    pub global_merge_vars: Vec<Pair>,
    /// Per-recipient merge variables from `recipient_vars`.
    pub recipient_metadata: Vec<RcptValues>,

    pub message: Option<FormattedMessage>,
    pub deferred: bool,
    pub send_at: Option<String>,
}

fn placeholder_content() -> Vec<Pair> {
    vec![Pair::new("blank", "")]
}

impl TemplateMailer {
    pub const NAME: &'static str = "TemplateMailer";

    pub fn new(ctx: MailContext) -> Self {
        Self {
            ctx,
            defaults: MailerDefaults::base(),
            prepare: None,
            template_name: None,
            template_content: placeholder_content(),
            global_merge_vars: Vec::new(),
            recipient_metadata: Vec::new(),
            message: None,
            deferred: false,
            send_at: None,
        }
    }

    pub fn with_defaults(mut self, defaults: MailerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

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

    /// Build the provider payload from a declarative argument set.
    ///
    /// Same pipeline as the message-mode builder, with the template fields
    /// peeled off first: `template` becomes [`template_name`] (and is
    /// removed from the arguments, so the formatted message carries no
    /// template identifier of its own), and `template_content` is turned
    /// into content pairs — an absent *or empty* mapping both fall back to
    /// the placeholder block, which is what the provider's API requires.
    pub fn build(&mut self, args: MessageArgs) -> Result<&mut Self, Error> {
        let mut args = args;
        self.deferred = std::mem::take(&mut args.deferred);
        if let Some(at) = args.send_at.take() {
            self.send_at = Some(format_send_at(at)?);
        }

        let mut args = match &self.prepare {
            Some(hook) => hook(args),
            None => args,
        };

        self.template_name = args.template.take();
        self.template_content = match args.template_content.take() {
            Some(content) if !content.is_empty() => format::pairs(&content),
            _ => placeholder_content(),
        };

        self.global_merge_vars = match &args.vars {
            Some(vars) if !vars.is_empty() => format::pairs(vars),
            _ => format::pairs(&self.defaults.merge_vars),
        };
        self.recipient_metadata = args
            .recipient_vars
            .take()
            .map(|items| format::rcpt_metadata(&items))
            .unwrap_or_default();

        let mut message = format::message(args, &self.defaults)?;
        self.ctx.config.apply_interceptor(&mut message)?;
        self.message = Some(message);

        Ok(self)
    }

    /// Default merge-variable pairs for this mailer, before any explicit
    /// `vars` override.
    pub fn default_merge_pairs(&self) -> Vec<Pair> {
        format::pairs(&self.defaults.merge_vars)
    }

    /// A `vars`-shaped view of the global merge pairs, useful for
    /// assertions in tests.
    pub fn global_merge_values(&self) -> Vec<(String, Option<Value>)> {
        self.global_merge_vars
            .iter()
            .map(|pair| (pair.name.clone(), pair.content.clone()))
            .collect()
    }

    fn capture(&self) -> DeliveryCapture {
        DeliveryCapture {
            template_name: self.template_name.clone(),
            template_content: Some(self.template_content.clone()),
            message: self.message.clone(),
            deferred: self.deferred,
            send_at: self.send_at.clone(),
        }
    }
}

#[async_trait]
impl Delivery for TemplateMailer {
    async fn deliver(&self) -> Result<Delivered, Error> {
        self.deliver_now().await
    }

    async fn deliver_now(&self) -> Result<Delivered, Error> {
        if self.ctx.is_offline() {
            return Ok(Delivered::Captured(offline::record(self.capture())));
        }

        let message = self.message.as_ref().ok_or(Error::MissingMessage)?;
        let template_name = self.template_name.as_deref().ok_or(Error::MissingTemplate)?;

        debug!(template = template_name, "dispatching templated message to provider");
        self.ctx
            .api
            .send_template(
                template_name,
                &self.template_content,
                message,
                self.deferred,
                self.send_at.as_deref(),
            )
            .await?;
        info!(
            template = template_name,
            recipients = message.recipients.len(),
            "templated message delivered"
        );
        Ok(Delivered::Sent)
    }

    async fn deliver_later(&self) -> Result<Delivered, Error> {
        if self.ctx.is_offline() {
            return Ok(Delivered::Captured(offline::record(self.capture())));
        }

        // Deferred dispatch only carries message-mode payloads today.
        Err(Error::NotImplemented("deliver_later"))
    }
}
