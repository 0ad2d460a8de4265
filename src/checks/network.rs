//! URL reachability probe shared by checks
//!
//! A probe is a HEAD request that follows redirects and gives up after the
//! configured `network_timeout`. With `network_enabled = false` no request is
//! made and an Info `network-checks-disabled` message is emitted instead.
//! Failures never propagate: they become `invalid-url` warnings.

use crate::config::Configuration;
use crate::sink::Emitter;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum NetworkProbeError {
    #[error("HTTP Error {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("{0}")]
    Transport(String),
}

/// What a successful probe learned about the URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
}

#[derive(Clone)]
pub struct NetworkProbe {
    agent: Option<ureq::Agent>,
    timeout: Duration,
}

impl std::fmt::Debug for NetworkProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkProbe")
            .field("enabled", &self.is_enabled())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl NetworkProbe {
    pub fn from_config(config: &Configuration) -> Self {
        if config.settings().network_enabled {
            Self::enabled(config.network_timeout())
        } else {
            Self::disabled()
        }
    }

    pub fn enabled(timeout: Duration) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            agent: Some(agent),
            timeout,
        }
    }

    pub fn disabled() -> Self {
        Self {
            agent: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.agent.is_some()
    }

    /// Probe `url` found in header `tag`, reporting problems through `out`
    pub fn check_url(&self, out: &Emitter, tag: &str, url: &str) -> Option<ProbeResponse> {
        let Some(agent) = &self.agent else {
            out.info("network-checks-disabled", vec![url.to_string()]);
            return None;
        };

        debug!("Probing {} (timeout {}s)", url, self.timeout.as_secs());
        match head(agent, url) {
            Ok(response) => {
                debug!("{} answered {}", url, response.status);
                Some(response)
            }
            Err(e) => {
                out.warning(
                    "invalid-url",
                    vec![format!("{}:", tag), url.to_string(), e.to_string()],
                );
                None
            }
        }
    }
}

fn head(agent: &ureq::Agent, url: &str) -> Result<ProbeResponse, NetworkProbeError> {
    let response = agent
        .head(url)
        .header("User-Agent", concat!("rpmlint/", env!("CARGO_PKG_VERSION")))
        .call()
        .map_err(|e| NetworkProbeError::Transport(e.to_string()))?;

    let status = response.status();
    if status.as_u16() >= 400 {
        return Err(NetworkProbeError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    Ok(ProbeResponse {
        status: status.as_u16(),
    })
}
