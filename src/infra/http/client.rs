use std::time::Duration;

use reqwest::{Client, redirect};
use url::Url;

use crate::infra::error::InfraError;

/// Shared HTTP context: one client (and cookie jar) per console session,
/// rooted at the server's base URL.
#[derive(Clone, Debug)]
pub struct ConsoleClient {
    client: Client,
    base: Url,
}

impl ConsoleClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InfraError> {
        let base = Url::parse(base_url)?.join("/")?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(InfraError::configuration(format!(
                "unsupported URL scheme `{}`",
                base.scheme()
            )));
        }

        // Redirects stay visible: a 302 from the settings endpoint is the
        // success signal.
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .redirect(redirect::Policy::none())
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("canary-console/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base URL. Absolute URLs are accepted as-is.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    pub fn http(&self) -> &Client {
        &self.client
    }
}
