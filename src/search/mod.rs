//! Search Targets
//!
//! Pluggable connectors to external legal-database search APIs. Each
//! connector takes a structured search statement (produced upstream by
//! the query-extraction step) and returns normalized opinion records,
//! ready to be assembled into completion context.
//!
//! Currently implemented:
//! - CourtListener - published judicial opinions (Free Law Project)

pub mod courtlistener;

pub use courtlistener::CourtListener;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Names of the available search targets, as accepted by [`route_search`].
pub const SEARCH_TARGETS: &[&str] = &["courtlistener"];

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search statement contains prohibited terms: {0}")]
    ProhibitedTerms(String),

    #[error("unknown search target: {0}")]
    UnknownTarget(String),

    #[error("CourtListener API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("CourtListener response missing 'results' field")]
    MissingResults,

    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to parse search response: {0}")]
    Parse(String),
}

impl SearchError {
    /// Whether this failure should be reported to the caller as a client
    /// error (bad or unanswerable query) rather than an internal fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SearchError::ProhibitedTerms(_)
                | SearchError::UnknownTarget(_)
                | SearchError::Api { .. }
                | SearchError::MissingResults
        )
    }
}

/// One retrieved case opinion, normalized to the shape the response
/// serializer and the prompt assembler both consume.
///
/// Every field is always present; fields that could not be populated are
/// empty strings rather than absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpinionRecord {
    pub id: String,
    pub case_name: String,
    pub court: String,
    /// Canonical link: configured base URL + the upstream relative path.
    pub absolute_url: String,
    pub status: String,
    pub date_filed: String,
    /// Full opinion body, converted from HTML to plain text.
    pub text: String,
    /// Citation line used when assembling the completion prompt.
    pub prompt_text: String,
    /// Citation line shown in the UI.
    pub ui_text: String,
    pub ui_url: String,
}

/// A pluggable external legal-database connector.
#[async_trait]
pub trait SearchTarget: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run a search statement and return ranked, normalized opinions.
    /// An empty result list is a successful search, not an error.
    async fn search(&self, statement: &str) -> Result<Vec<OpinionRecord>, SearchError>;
}

/// Dispatch a search statement to the named target.
pub async fn route_search(
    target: &str,
    statement: &str,
    config: &Config,
) -> Result<Vec<OpinionRecord>, SearchError> {
    match target {
        "courtlistener" => {
            CourtListener::new(config.courtlistener.clone())
                .search(statement)
                .await
        }
        other => Err(SearchError::UnknownTarget(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CourtListenerConfig;
    use std::time::Duration;

    fn test_config() -> Config {
        Config {
            courtlistener: CourtListenerConfig {
                api_url: "http://127.0.0.1:9/api/rest/v4/".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
                api_key: "test-key".to_string(),
                max_results: 3,
                timeout: Duration::from_secs(1),
            },
        }
    }

    #[tokio::test]
    async fn test_route_search_unknown_target() {
        let err = route_search("westlaw", "query", &test_config())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::UnknownTarget(ref t) if t == "westlaw"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_classification() {
        assert!(SearchError::ProhibitedTerms("case".into()).is_client_error());
        assert!(SearchError::MissingResults.is_client_error());
        assert!(SearchError::Api { status: 403, body: String::new() }.is_client_error());
        assert!(!SearchError::Parse("bad json".into()).is_client_error());
    }

    #[test]
    fn test_registry_lists_courtlistener() {
        assert!(SEARCH_TARGETS.contains(&"courtlistener"));
    }
}
