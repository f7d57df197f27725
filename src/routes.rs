//! URL resolution for message bodies that reference application routes.
//!
//! Route helpers are a host-framework concern, so resolution is delegated
//! through an injected [`RouteHelper`]. The test stand-in is an explicit
//! [`UrlResolver::Fixed`] variant rather than a duck-typed mock.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;

/// Host-framework routing collaborator.
pub trait RouteHelper: Send + Sync {
    /// Resolve a named route with the given parameters into an absolute URL.
    fn resolve(
        &self,
        name: &str,
        params: &[(String, String)],
        host: &str,
        protocol: &str,
    ) -> Result<String, Error>;
}

/// Where message-building code gets its URLs from.
#[derive(Clone)]
pub enum UrlResolver {
    /// Delegate to the host framework's router, with `host`/`protocol`
    /// injected from [`Config::default_url_options`].
    Routes(Arc<dyn RouteHelper>),
    /// Always return this URL. Used as the stand-in when exercising mailer
    /// methods in tests.
    Fixed { url: String },
}

impl UrlResolver {
    pub fn fixed(url: impl Into<String>) -> Self {
        UrlResolver::Fixed { url: url.into() }
    }

    /// Resolve a named route into a URL string.
    pub fn url_for(
        &self,
        config: &Config,
        name: &str,
        params: &[(String, String)],
    ) -> Result<String, Error> {
        match self {
            UrlResolver::Routes(helper) => helper.resolve(
                name,
                params,
                &config.default_url_options.host,
                &config.default_url_options.protocol,
            ),
            UrlResolver::Fixed { url } => Ok(url.clone()),
        }
    }
}

impl std::fmt::Debug for UrlResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlResolver::Routes(_) => f.write_str("UrlResolver::Routes"),
            UrlResolver::Fixed { url } => f.debug_struct("UrlResolver::Fixed").field("url", url).finish(),
        }
    }
}
