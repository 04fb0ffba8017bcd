//! HTTP session: the cookie-bearing client shared by every download request.
//!
//! ACRIS hands out session cookies on its bandwidth-policy page and expects
//! them back on subsequent image requests. One [`Session`] is created per
//! run, never cached, and dropped at run end; the cookie jar lives inside
//! the reqwest client.
//!
//! ## Why the warm-up returns a status, not a `Result`
//!
//! The warm-up is an optimisation: a primed jar avoids a redirect dance on
//! the first real request, but nothing breaks without it. Modelling it as a
//! discardable [`WarmUp`] status makes the "caller explicitly ignores
//! failure" contract visible at the call site instead of hiding a swallowed
//! `Err` somewhere.

use crate::config::FetchConfig;
use crate::error::AcrisError;
use std::time::Duration;
use tracing::{debug, warn};

/// Path of the bandwidth-policy page that seeds the cookie jar.
const WARMUP_PATH: &str = "/BandwidthPolicy/ACRIS-BW-POL.html";

/// Outcome of the best-effort warm-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmUp {
    /// The policy page answered 2xx; the jar should now hold session cookies.
    Primed,
    /// The request failed or answered non-2xx; the run continues anyway.
    Skipped(String),
}

/// A cookie-bearing HTTP client for one download run.
pub struct Session {
    client: reqwest::Client,
}

impl Session {
    /// Build a fresh session: cookie store on, browser user agent as the
    /// default header. No request is made yet.
    pub fn new(config: &FetchConfig) -> Result<Self, AcrisError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AcrisError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Hit the bandwidth-policy page to pick up initial cookies.
    ///
    /// Any failure (timeout, connection error, non-2xx) is logged and folded
    /// into [`WarmUp::Skipped`]; it never aborts the pipeline.
    pub async fn warm_up(&self, config: &FetchConfig) -> WarmUp {
        let url = format!("{}{}", config.base_url, WARMUP_PATH);
        debug!("Warming up session via {url}");

        let result = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(config.warmup_timeout_secs))
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                debug!("Session warm-up complete ({})", resp.status());
                WarmUp::Primed
            }
            Ok(resp) => {
                let reason = format!("policy page answered HTTP {}", resp.status());
                warn!("Session warm-up skipped: {reason}");
                WarmUp::Skipped(reason)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Session warm-up skipped: {reason}");
                WarmUp::Skipped(reason)
            }
        }
    }

    /// The underlying client, for the pipeline stages.
    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }
}
