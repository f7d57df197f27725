//! Process-wide mailer configuration.
//!
//! A [`Config`] carries the provider credentials, URL defaults for route
//! helpers, the queue name used by `deliver_later`, and the optional message
//! interceptor. Clones share the interceptor slot, so a hook registered on
//! one clone is visible to every mailer built from the same configuration.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;

use crate::error::Error;
use crate::format::FormattedMessage;

/// Host and protocol injected into URL helper resolution.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct UrlOptions {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_protocol() -> String {
    "https".to_string()
}

impl Default for UrlOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            protocol: default_protocol(),
        }
    }
}

fn default_queue_name() -> String {
    "default".to_string()
}

/// A hook allowed to inspect and mutate every message after formatting and
/// before dispatch.
pub type Interceptor = Arc<dyn Fn(&mut FormattedMessage) + Send + Sync>;

type InterceptorSlot = Arc<RwLock<Option<Interceptor>>>;

/// Mailer configuration.
///
/// Loaded from the environment with [`Config::from_env`] or constructed
/// directly. [`Config::default`] is suitable for tests.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Provider API key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Provider secret key.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Defaults injected into URL helper resolution.
    #[serde(default)]
    pub default_url_options: UrlOptions,

    /// Queue name used by `deliver_later` (default: `"default"`).
    #[serde(default = "default_queue_name")]
    pub deliver_later_queue_name: String,

    #[serde(skip)]
    interceptor: InterceptorSlot,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            secret_key: None,
            default_url_options: UrlOptions::default(),
            deliver_later_queue_name: default_queue_name(),
            interceptor: InterceptorSlot::default(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_deref().map(|_| "<redacted>"))
            .field("default_url_options", &self.default_url_options)
            .field("deliver_later_queue_name", &self.deliver_later_queue_name)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from `MAILER_*` environment variables.
    ///
    /// Reads `MAILER_API_KEY`, `MAILER_SECRET_KEY`, and
    /// `MAILER_DELIVER_LATER_QUEUE_NAME`. A `.env` file is loaded first when
    /// present.
    pub fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();

        let c = config::Config::builder()
            .add_source(config::Environment::with_prefix("MAILER"))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        c.try_deserialize().map_err(|e| Error::Config(e.to_string()))
    }

    /// Register the process-wide interceptor hook.
    ///
    /// The hook runs against every built message before dispatch and may
    /// mutate it in place. Registering replaces any previous hook.
    pub fn set_interceptor<F>(&self, hook: F)
    where
        F: Fn(&mut FormattedMessage) + Send + Sync + 'static,
    {
        let mut slot = self
            .interceptor
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(hook));
    }

    /// Remove the interceptor hook.
    pub fn clear_interceptor(&self) {
        let mut slot = self
            .interceptor
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }

    /// Run the configured interceptor against a built message, if any.
    ///
    /// An unusable hook slot (poisoned by a panicking hook elsewhere in the
    /// process) is a configuration error surfaced here, at send time.
    pub fn apply_interceptor(&self, message: &mut FormattedMessage) -> Result<(), Error> {
        let slot = self
            .interceptor
            .read()
            .map_err(|_| Error::InvalidInterceptor("interceptor hook panicked".to_string()))?;

        if let Some(hook) = slot.as_ref() {
            hook(message);
        }
        Ok(())
    }
}
