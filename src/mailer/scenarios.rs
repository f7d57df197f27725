//! Named test scenarios for mailer methods.
//!
//! A wrapper mailer can register a callback per mailer method so that a
//! test (or an operator poking at staging) can trigger a representative
//! send by name with nothing but a target address:
//!
//! ```ignore
//! let mut scenarios = Scenarios::new(move || InvitationMailer::new(ctx.clone()))
//!     .register("invite", |mut mailer, options| {
//!         let invitation = Invitation::sample(options.email.clone().unwrap());
//!         mailer.invite(&invitation)
//!     });
//!
//! scenarios.run("invite", &ScenarioOptions::for_email("qa@example.com"))?;
//! ```

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::Error;

/// Options passed to a scenario callback. `email` is required to run.
#[derive(Debug, Clone, Default)]
pub struct ScenarioOptions {
    /// The address to send the test to.
    pub email: Option<String>,
    /// Anything else the callback wants.
    pub extra: Map<String, Value>,
}

impl ScenarioOptions {
    pub fn for_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

type ScenarioFn<M, R> = Box<dyn Fn(M, &ScenarioOptions) -> R + Send + Sync>;

/// Registry of named scenarios over a mailer type `M`.
///
/// The factory produces a fresh mailer per run, so scenarios never share
/// per-send state.
pub struct Scenarios<M, R> {
    factory: Box<dyn Fn() -> M + Send + Sync>,
    registered: HashMap<String, ScenarioFn<M, R>>,
}

impl<M, R> Scenarios<M, R> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            registered: HashMap::new(),
        }
    }

    /// Register a scenario under a mailer-method name.
    pub fn register<F>(mut self, name: impl Into<String>, scenario: F) -> Self
    where
        F: Fn(M, &ScenarioOptions) -> R + Send + Sync + 'static,
    {
        self.registered.insert(name.into(), Box::new(scenario));
        self
    }

    /// Run the named scenario against a fresh mailer.
    ///
    /// Fails with [`Error::InvalidEmail`] when no target address was given
    /// and [`Error::InvalidMailerMethod`] when the name was never
    /// registered.
    pub fn run(&self, name: &str, options: &ScenarioOptions) -> Result<R, Error> {
        if options.email.is_none() {
            return Err(Error::InvalidEmail);
        }

        match self.registered.get(name) {
            Some(scenario) => Ok(scenario((self.factory)(), options)),
            None => Err(Error::InvalidMailerMethod(name.to_string())),
        }
    }

    /// Whether a scenario is registered under this name.
    pub fn contains(&self, name: &str) -> bool {
        self.registered.contains_key(name)
    }
}
