//! Offline delivery recording for tests.
//!
//! When a [`MailContext`](crate::mailer::MailContext) is built with
//! [`MailContext::offline`](crate::mailer::MailContext::offline), every
//! `deliver*` call records a [`DeliveryCapture`] on a process-wide list
//! instead of touching the provider or the queue. The build/format/intercept
//! pipeline runs unchanged, so captures hold exactly what would have gone
//! over the wire:
//!
//! ```ignore
//! let ctx = MailContext::offline(Config::default());
//! WelcomeMailer::new(ctx).welcome(&user)?.deliver_now().await?;
//!
//! let sent = offline::deliveries();
//! assert_eq!(sent[0].message.as_ref().unwrap().recipients[0].email.as_deref(),
//!            Some("user@example.com"));
//! offline::clear();
//! ```
//!
//! The list is shared across the process; clear it between test cases.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::format::{FormattedMessage, Pair};

/// What a delivery call would have sent.
///
/// Message-mode captures leave the template fields empty; template-mode
/// captures fill all five.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeliveryCapture {
    pub template_name: Option<String>,
    pub template_content: Option<Vec<Pair>>,
    pub message: Option<FormattedMessage>,
    pub deferred: bool,
    pub send_at: Option<String>,
}

static DELIVERIES: Mutex<Vec<DeliveryCapture>> = Mutex::new(Vec::new());

/// Append a capture to the process-wide list and hand it back for
/// inspection.
pub fn record(capture: DeliveryCapture) -> DeliveryCapture {
    DELIVERIES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(capture.clone());
    capture
}

/// Snapshot of everything captured so far, in call order.
pub fn deliveries() -> Vec<DeliveryCapture> {
    DELIVERIES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Empty the capture list. Call between test cases.
pub fn clear() {
    DELIVERIES
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
