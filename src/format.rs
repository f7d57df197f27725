//! Argument-to-wire-format translation.
//!
//! [`message`] takes a declarative [`MessageArgs`] set plus a mailer's
//! [`MailerDefaults`](crate::mailer::MailerDefaults) and produces the
//! normalized [`FormattedMessage`] payload the provider expects. Everything
//! here is pure: no I/O, no side effects, deterministic output.
//!
//! The wire shape is sparse by construction — a field that resolves to
//! nothing is absent from the serialized payload rather than null.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::Error;
use crate::mailer::MailerDefaults;

/// Template languages the provider accepts for `merge_language`.
pub const ACCEPTED_MERGE_LANGUAGES: [&str; 2] = ["mailchimp", "handlebars"];

/// The declarative argument set for a single send.
///
/// Constructed fresh per send call and consumed by
/// [`build`](crate::mailer::MessageMailer::build). Unmodeled provider fields
/// can ride along in [`extra`](Self::extra); they are flattened into the
/// formatted payload untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageArgs {
    pub to: Option<ToField>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    pub from: Option<String>,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
    pub template: Option<String>,
    pub template_content: Option<Map<String, Value>>,
    pub vars: Option<Map<String, Value>>,
    pub recipient_vars: Option<Vec<Map<String, Value>>>,
    pub headers: Option<Map<String, Value>>,
    pub attachments: Vec<AttachmentSource>,
    pub images: Vec<AttachmentSource>,
    pub track_opens: Option<bool>,
    pub track_clicks: Option<bool>,
    pub merge_language: Option<String>,
    /// Route through the background queue instead of sending inline.
    pub deferred: bool,
    /// When the provider should send the message.
    pub send_at: Option<OffsetDateTime>,
    /// Raw passthrough for provider fields this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageArgs {
    pub fn builder() -> MessageArgsBuilder {
        MessageArgsBuilder::default()
    }
}

/// Chained construction for [`MessageArgs`].
#[derive(Debug, Default)]
pub struct MessageArgsBuilder {
    args: MessageArgs,
}

impl MessageArgsBuilder {
    pub fn to(mut self, to: impl Into<ToField>) -> Self {
        self.args.to = Some(to.into());
        self
    }

    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.args.cc = Some(address.into());
        self
    }

    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.args.bcc = Some(address.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.args.subject = Some(subject.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.args.html = Some(html.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.args.text = Some(text.into());
        self
    }

    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.args.from = Some(address.into());
        self
    }

    pub fn from_email(mut self, address: impl Into<String>) -> Self {
        self.args.from_email = Some(address.into());
        self
    }

    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.args.from_name = Some(name.into());
        self
    }

    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.args.template = Some(name.into());
        self
    }

    pub fn template_content(mut self, content: Map<String, Value>) -> Self {
        self.args.template_content = Some(content);
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args
            .vars
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn vars(mut self, vars: Map<String, Value>) -> Self {
        self.args.vars = Some(vars);
        self
    }

    pub fn recipient_vars(mut self, vars: Vec<Map<String, Value>>) -> Self {
        self.args.recipient_vars = Some(vars);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args
            .headers
            .get_or_insert_with(Map::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn attachment(mut self, attachment: AttachmentSource) -> Self {
        self.args.attachments.push(attachment);
        self
    }

    pub fn image(mut self, image: AttachmentSource) -> Self {
        self.args.images.push(image);
        self
    }

    pub fn track_opens(mut self, on: bool) -> Self {
        self.args.track_opens = Some(on);
        self
    }

    pub fn track_clicks(mut self, on: bool) -> Self {
        self.args.track_clicks = Some(on);
        self
    }

    pub fn merge_language(mut self, language: impl Into<String>) -> Self {
        self.args.merge_language = Some(language.into());
        self
    }

    pub fn deferred(mut self, deferred: bool) -> Self {
        self.args.deferred = deferred;
        self
    }

    pub fn send_at(mut self, at: OffsetDateTime) -> Self {
        self.args.send_at = Some(at);
        self
    }

    pub fn extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.extra.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> MessageArgs {
        self.args
    }
}

/// The `to` argument: one recipient or many.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToField {
    One(Recipient),
    Many(Vec<Recipient>),
}

/// A single recipient: a bare address token or a structured entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipient {
    Address(String),
    Entry {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl Recipient {
    pub fn entry(email: impl Into<String>, name: impl Into<String>) -> Self {
        Recipient::Entry {
            email: Some(email.into()),
            name: Some(name.into()),
        }
    }
}

impl From<&str> for Recipient {
    fn from(address: &str) -> Self {
        Recipient::Address(address.to_string())
    }
}

impl From<String> for Recipient {
    fn from(address: String) -> Self {
        Recipient::Address(address)
    }
}

impl From<&str> for ToField {
    fn from(address: &str) -> Self {
        ToField::One(address.into())
    }
}

impl From<String> for ToField {
    fn from(address: String) -> Self {
        ToField::One(address.into())
    }
}

impl From<Recipient> for ToField {
    fn from(recipient: Recipient) -> Self {
        ToField::One(recipient)
    }
}

impl From<Vec<Recipient>> for ToField {
    fn from(recipients: Vec<Recipient>) -> Self {
        ToField::Many(recipients)
    }
}

/// A normalized recipient record. Empty sub-fields are absent rather than
/// empty strings, so the provider never sees a blank name or address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecipientEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn recipient_entry(recipient: &Recipient) -> RecipientEntry {
    match recipient {
        Recipient::Address(token) => RecipientEntry {
            email: non_empty(token),
            name: non_empty(token),
        },
        Recipient::Entry { email, name } => RecipientEntry {
            email: email.as_deref().and_then(non_empty),
            name: name.as_deref().and_then(non_empty),
        },
    }
}

/// Normalize the `to` argument into an ordered recipient sequence.
///
/// A bare token expands into `{email: token, name: token}`; a structured
/// entry keeps only its non-empty fields. The result is always a sequence,
/// even for a single recipient.
pub fn recipients(to: &ToField) -> Vec<RecipientEntry> {
    match to {
        ToField::One(recipient) => vec![recipient_entry(recipient)],
        ToField::Many(list) => list.iter().map(recipient_entry).collect(),
    }
}

/// An attachment or inline image as supplied by the caller.
///
/// Both the original key names and their aliases are accepted when
/// deserializing: `mimetype`/`type`, `filename`/`name`, `file`/`content`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentSource {
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, alias = "content", skip_serializing_if = "Option::is_none")]
    pub file: Option<Vec<u8>>,
}

impl AttachmentSource {
    pub fn new(
        mimetype: impl Into<String>,
        filename: impl Into<String>,
        file: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            mimetype: Some(mimetype.into()),
            filename: Some(filename.into()),
            file: Some(file.into()),
        }
    }
}

/// The canonical wire shape of an attachment: exactly three keys, content
/// always base64, empty fields dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodedAttachment {
    #[serde(rename = "Content-Type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "Filename", default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(rename = "content", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl EncodedAttachment {
    pub fn is_empty(&self) -> bool {
        self.content_type.is_none() && self.filename.is_none() && self.content.is_none()
    }
}

/// Normalize attachment records into the canonical encoded shape.
pub fn attachment_args(sources: &[AttachmentSource]) -> Vec<EncodedAttachment> {
    sources
        .iter()
        .map(|source| EncodedAttachment {
            content_type: source.mimetype.as_deref().and_then(non_empty),
            filename: source.filename.as_deref().and_then(non_empty),
            content: source
                .file
                .as_deref()
                .filter(|bytes| !bytes.is_empty())
                .map(|bytes| BASE64.encode(bytes)),
        })
        .collect()
}

/// Normalize inline images: the attachment routine, minus any entries that
/// normalized to nothing.
pub fn image_args(sources: &[AttachmentSource]) -> Vec<EncodedAttachment> {
    attachment_args(sources)
        .into_iter()
        .filter(|attachment| !attachment.is_empty())
        .collect()
}

/// A `{name, content}` pair, the provider's shape for merge variables and
/// template content blocks. Null content is dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pair {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl Pair {
    pub fn new(name: impl Into<String>, content: impl Into<Value>) -> Self {
        let content = match content.into() {
            Value::Null => None,
            value => Some(value),
        };
        Pair {
            name: name.into(),
            content,
        }
    }
}

/// Turn a flat mapping into an ordered `{name, content}` pair sequence.
pub fn pairs(map: &Map<String, Value>) -> Vec<Pair> {
    map.iter()
        .map(|(name, content)| Pair::new(name.clone(), content.clone()))
        .collect()
}

/// Per-recipient merge values: `{rcpt, values}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RcptValues {
    pub rcpt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
}

/// Turn a sequence of single-key mappings (`recipient address -> values`)
/// into `{rcpt, values}` pairs. Entries with no key are skipped.
pub fn rcpt_metadata(items: &[Map<String, Value>]) -> Vec<RcptValues> {
    items
        .iter()
        .filter_map(|item| {
            let (rcpt, values) = item.iter().next()?;
            let values = match values {
                Value::Null => None,
                value => Some(value.clone()),
            };
            Some(RcptValues {
                rcpt: rcpt.clone(),
                values,
            })
        })
        .collect()
}

/// The normalized, provider-ready message payload.
///
/// Serializes to the provider's wire keys (`Mj-TemplateID`, `mj-trackopen`,
/// ...). Every optional field that resolved to nothing is skipped, so the
/// serialized mapping never carries a null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormattedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub from: String,
    pub from_email: String,
    pub from_name: String,
    pub recipients: Vec<RecipientEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
    #[serde(
        rename = "Mj-TemplateID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_id: Option<String>,
    #[serde(
        rename = "Mj-TemplateLanguage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_language: Option<bool>,
    #[serde(rename = "mj-trackopen")]
    pub track_opens: bool,
    #[serde(rename = "mj-trackclick")]
    pub track_clicks: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<EncodedAttachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_attachments: Option<Vec<EncodedAttachment>>,
    /// Unmodeled provider fields carried through from [`MessageArgs::extra`].
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Format a message-mode argument set into the provider wire shape.
///
/// Pure and deterministic. Fails only on an invalid `merge_language` value.
pub fn message(args: MessageArgs, defaults: &MailerDefaults) -> Result<FormattedMessage, Error> {
    if let Some(language) = args.merge_language.as_deref() {
        if !ACCEPTED_MERGE_LANGUAGES.contains(&language) {
            return Err(Error::InvalidMergeLanguage {
                value: language.to_string(),
                allowed: ACCEPTED_MERGE_LANGUAGES.join(", "),
            });
        }
    }

    let from = args.from.clone().unwrap_or_else(|| defaults.from.clone());
    let from_email = args
        .from_email
        .or(args.from)
        .unwrap_or_else(|| defaults.from.clone());
    let from_name = args
        .from_name
        .or_else(|| defaults.from_name.clone())
        .unwrap_or_else(|| defaults.from.clone());

    let recipients = args.to.as_ref().map(recipients).unwrap_or_default();

    let template_language = (!is_blank(args.template.as_deref())).then_some(true);

    let vars = args.vars.filter(|vars| !vars.is_empty()).map(|vars| {
        vars.into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect()
    });

    let attachments = if args.attachments.is_empty() {
        None
    } else {
        Some(attachment_args(&args.attachments))
    };
    let inline_attachments = if args.images.is_empty() {
        None
    } else {
        Some(image_args(&args.images))
    };

    Ok(FormattedMessage {
        html: args.html,
        text: args.text,
        subject: args.subject,
        from,
        from_email,
        from_name,
        recipients,
        cc: args.cc,
        bcc: args.bcc,
        headers: args.headers,
        template_id: args.template,
        template_language,
        track_opens: args.track_opens.unwrap_or(true),
        track_clicks: args.track_clicks.unwrap_or(true),
        vars,
        attachments,
        inline_attachments,
        extra: args.extra,
    })
}
