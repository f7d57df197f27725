//! Composable transactional mailers for the Mailjet messages API.
//!
//! Application code describes an email with a declarative
//! [`MessageArgs`](format::MessageArgs) set; a mailer normalizes it into
//! the provider wire shape, runs the configured interceptor, and dispatches
//! it — inline through the [`MessagesApi`](api::MessagesApi) collaborator,
//! or deferred through a [`JobQueue`](queue::JobQueue) backend. An offline
//! mode swaps the dispatch step for an in-memory recorder so tests can
//! assert on exactly what would have been sent.
//!
//! See [`mailer`] for the lifecycle and a usage example, [`format`] for the
//! normalization rules, and [`offline`] for the test recorder.

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod mailer;
pub mod offline;
pub mod queue;
pub mod routes;

pub use api::MessagesApi;
pub use config::{Config, UrlOptions};
pub use error::Error;
pub use mailer::{
    Delivered, Delivery, DeliverMessageJob, MailContext, MailerDefaults, MessageMailer,
    ScenarioOptions, Scenarios, TemplateMailer,
};
