use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub courtlistener: CourtListenerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourtListenerConfig {
    /// Base URL of the CourtListener REST API, with trailing slash
    /// (e.g. "https://www.courtlistener.com/api/rest/v4/").
    pub api_url: String,
    /// Base URL for building canonical opinion links
    /// (e.g. "https://www.courtlistener.com").
    pub base_url: String,
    pub api_key: String,
    /// Cap on the number of opinions returned per search.
    pub max_results: usize,
    /// Timeout applied to each outbound request.
    #[serde(skip, default = "default_timeout")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            courtlistener: CourtListenerConfig {
                api_url: env::var("COURT_LISTENER_API_URL")
                    .context("COURT_LISTENER_API_URL must be set")?,
                base_url: env::var("COURT_LISTENER_BASE_URL")
                    .context("COURT_LISTENER_BASE_URL must be set")?,
                api_key: env::var("COURT_LISTENER_API_KEY")
                    .context("COURT_LISTENER_API_KEY must be set")?,
                max_results: env::var("COURT_LISTENER_MAX_RESULTS")
                    .context("COURT_LISTENER_MAX_RESULTS must be set")?
                    .parse()
                    .context("COURT_LISTENER_MAX_RESULTS must be a positive integer")?,
                timeout: env::var("COURT_LISTENER_TIMEOUT_SECONDS")
                    .ok()
                    .map(|s| {
                        s.parse::<u64>()
                            .context("COURT_LISTENER_TIMEOUT_SECONDS must be an integer")
                            .map(Duration::from_secs)
                    })
                    .transpose()?
                    .unwrap_or_else(default_timeout),
            },
        })
    }
}
