//! Per-mailer default options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Defaults a mailer falls back to when an argument set leaves a field
/// unset.
///
/// Resolved once when the mailer is constructed and immutable afterwards.
/// [`base`](Self::base) carries the seed fallbacks (`from` =
/// `example@email.com`, empty merge vars); [`extend`](Self::extend) derives
/// a child set from an existing one, so a wrapper mailer inherits its
/// parent's resolved defaults and overrides only what it declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailerDefaults {
    /// Default sender address.
    pub from: String,
    /// Default sender display name.
    pub from_name: Option<String>,
    /// Default template merge variables.
    pub merge_vars: Map<String, Value>,
}

impl MailerDefaults {
    /// The seed defaults every mailer starts from.
    pub fn base() -> Self {
        Self {
            from: "example@email.com".to_string(),
            from_name: None,
            merge_vars: Map::new(),
        }
    }

    /// Start a builder from the seed defaults.
    pub fn builder() -> DefaultsBuilder {
        DefaultsBuilder {
            inner: Self::base(),
        }
    }

    /// Start a builder from this resolved set (inheritance).
    pub fn extend(&self) -> DefaultsBuilder {
        DefaultsBuilder {
            inner: self.clone(),
        }
    }
}

impl Default for MailerDefaults {
    fn default() -> Self {
        Self::base()
    }
}

/// Builder for [`MailerDefaults`]. Later declarations overwrite earlier
/// ones on conflicting keys; untouched keys keep their inherited values.
#[derive(Debug, Clone)]
pub struct DefaultsBuilder {
    inner: MailerDefaults,
}

impl DefaultsBuilder {
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.inner.from = address.into();
        self
    }

    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.inner.from_name = Some(name.into());
        self
    }

    /// Set a single default merge variable.
    pub fn merge_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inner.merge_vars.insert(name.into(), value.into());
        self
    }

    /// Replace the default merge variables wholesale.
    pub fn merge_vars(mut self, vars: Map<String, Value>) -> Self {
        self.inner.merge_vars = vars;
        self
    }

    pub fn build(self) -> MailerDefaults {
        self.inner
    }
}
