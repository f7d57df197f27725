use thiserror::Error;

/// Errors surfaced by mailer building, delivery, and configuration.
///
/// All of these are immediate validation or configuration failures raised
/// synchronously to the caller. Transient transport failures belong to the
/// provider collaborator and reach the caller through [`Error::Provider`]
/// untranslated.
#[derive(Debug, Error)]
pub enum Error {
    /// A mailer scenario was run without a target email option.
    #[error("an `email` option is required (the address to send the test to)")]
    InvalidEmail,

    /// A mailer scenario was run by a name that was never registered.
    #[error("the mailer method `{0}` does not have a scenario registered")]
    InvalidMailerMethod(String),

    /// The configured interceptor hook is unusable at send time.
    #[error("the configured interceptor is unusable: {0}")]
    InvalidInterceptor(String),

    /// A `merge_language` value outside the accepted set.
    #[error("the merge_language value `{value}` is invalid, value must be one of: {allowed}")]
    InvalidMergeLanguage { value: String, allowed: String },

    /// A delivery capability invoked on a mailer that does not provide it.
    #[error("`{0}` is not implemented by this mailer")]
    NotImplemented(&'static str),

    /// Deferred delivery payload referenced a mailer this crate cannot
    /// reconstruct.
    #[error("unknown mailer `{0}` in deferred delivery payload")]
    UnknownMailer(String),

    /// `deliver*` called before `build` populated a message.
    #[error("no message has been built for this mailer")]
    MissingMessage,

    /// Template-mode delivery without a template name.
    #[error("no template name has been set for this mailer")]
    MissingTemplate,

    /// A `send_at` timestamp that could not be rendered.
    #[error("invalid send_at timestamp: {0}")]
    InvalidSendAt(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("provider error: {0}")]
    Provider(String),
}
