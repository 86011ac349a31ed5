#![deny(missing_docs)]

//! # HTTP Spec Source
//!
//! Blocking `ureq` implementation of the gateway's [`SpecSource`].

use std::time::Duration;

use openswag_core::{FetchError, SpecSource};
use serde_json::Value;
use ureq::Agent;

/// Fetches service documents over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqSource;

impl UreqSource {
    fn agent(timeout: Duration) -> Agent {
        Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into()
    }
}

impl SpecSource for UreqSource {
    fn check_health(&self, url: &str, timeout: Duration) -> bool {
        match Self::agent(timeout).get(url).call() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(%url, error = %e, "health check failed");
                false
            }
        }
    }

    fn fetch(&self, url: &str, timeout: Duration) -> Result<Value, FetchError> {
        let mut resp = Self::agent(timeout)
            .get(url)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let body = resp
            .body_mut()
            .read_to_string()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|_| FetchError::InvalidBody)
    }
}
