//! CourtListener Connector
//!
//! Queries the CourtListener REST API (Free Law Project) for published
//! judicial opinions:
//! - `GET {api_url}search/` - ranked opinion search (primary, plus one
//!   keyword-only fallback when the structured query matches nothing)
//! - `GET {api_url}opinions/` - full opinion body by id, fetched once
//!   per accepted result and converted from HTML to plain text
//!
//! A malformed individual result is skipped and logged, never fatal;
//! the batch only fails when the upstream contract itself is broken
//! (non-200 on the primary search, or a body with no `results` field).

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CourtListenerConfig;
use crate::search::{OpinionRecord, SearchError, SearchTarget};
use crate::utils::html::html_to_text;

/// Generic words that indicate the upstream query-extraction step
/// produced prose instead of a structured filter expression.
const PROHIBITED_TERMS: &[&str] = &[
    "law",
    "laws",
    "case",
    "cases",
    "precedent",
    "precedents",
    "adjudicated",
];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word regex is valid"));

static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"dateFiled:\[([0-9]{4}-[0-9]{2}-[0-9]{2}) TO ([0-9]{4}-[0-9]{2}-[0-9]{2})\]")
        .expect("date range regex is valid")
});

/// CourtListener search target
pub struct CourtListener {
    client: Client,
    config: CourtListenerConfig,
}

/// Envelope of both the search and the opinion-detail endpoints.
///
/// `results` stays optional so that "upstream omitted the field" and
/// "upstream returned zero matches" remain distinguishable.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OpinionDetailResponse {
    results: Option<Vec<OpinionDetail>>,
}

#[derive(Debug, Deserialize)]
struct OpinionDetail {
    #[serde(default)]
    html: Option<String>,
}

/// A search hit that passed required-field validation, before its
/// opinion body has been fetched.
#[derive(Debug)]
struct OpinionCandidate {
    id: String,
    case_name: String,
    court: String,
    relative_url: String,
    status: String,
    date_filed: String,
}

impl CourtListener {
    pub fn new(config: CourtListenerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn search_request(
        &self,
        query: &str,
        dates: Option<&(String, String)>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut params: Vec<(&str, String)> = vec![
            ("type", "o".to_string()),
            ("order", "score desc".to_string()),
            ("q", query.to_string()),
        ];
        if let Some((filed_after, filed_before)) = dates {
            params.push(("filed_after", filed_after.clone()));
            params.push(("filed_before", filed_before.clone()));
        }

        self.client
            .get(format!("{}search/", self.config.api_url))
            .header("Authorization", format!("Token {}", self.config.api_key))
            .timeout(self.config.timeout)
            .query(&params)
            .send()
            .await
    }

    /// Fetch the full opinion body and convert it to plain text.
    ///
    /// Any failure here is a per-record problem: it is logged and the
    /// caller drops just this candidate. A detail body without a
    /// `results` field yields an empty text instead; a present but
    /// empty `results` array drops the candidate.
    async fn fetch_opinion_text(&self, id: &str) -> Option<String> {
        let response = match self
            .client
            .get(format!("{}opinions/", self.config.api_url))
            .header("Authorization", format!("Token {}", self.config.api_key))
            .timeout(self.config.timeout)
            .query(&[("id", id)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(id = %id, error = %e, "opinion fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(id = %id, status = %response.status(), "opinion fetch returned error status");
            return None;
        }

        let detail: OpinionDetailResponse = match response.json().await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(id = %id, error = %e, "opinion response could not be decoded");
                return None;
            }
        };

        match detail.results {
            None => Some(String::new()),
            Some(results) => match results.into_iter().next() {
                Some(opinion) => Some(html_to_text(opinion.html.as_deref().unwrap_or(""))),
                None => {
                    warn!(id = %id, "opinion response contained no entries");
                    None
                }
            },
        }
    }
}

#[async_trait]
impl SearchTarget for CourtListener {
    fn name(&self) -> &'static str {
        "courtlistener"
    }

    async fn search(&self, statement: &str) -> Result<Vec<OpinionRecord>, SearchError> {
        info!(statement = %statement, "starting CourtListener search");

        let offending = prohibited_terms_in(statement);
        if !offending.is_empty() {
            let joined = offending.join(", ");
            warn!(terms = %joined, "rejected search statement");
            return Err(SearchError::ProhibitedTerms(joined));
        }

        let dates = extract_date_range(statement);
        if statement.contains("dateFiled") && dates.is_none() {
            debug!("dateFiled marker present but malformed; searching without date bounds");
        }

        let response = self.search_request(statement, dates.as_ref()).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut raw: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        // One best-effort retry with a keyword-only query. A failed or
        // still-empty retry just means fewer results downstream.
        if raw.results.as_ref().map_or(true, |r| r.is_empty()) {
            let retry_query = fallback_query(statement);
            info!(query = %retry_query, "no results; retrying with keyword-only fallback");

            match self.search_request(&retry_query, dates.as_ref()).await {
                Ok(retry_response) if retry_response.status().is_success() => {
                    match retry_response.json::<SearchResponse>().await {
                        Ok(retry_raw) => {
                            let count = retry_raw.results.as_ref().map_or(0, |r| r.len());
                            info!(count, "fallback search completed");
                            raw = retry_raw;
                        }
                        Err(e) => warn!(error = %e, "fallback response could not be decoded"),
                    }
                }
                Ok(retry_response) => {
                    warn!(status = %retry_response.status(), "fallback search returned error status");
                }
                Err(e) => warn!(error = %e, "fallback search failed"),
            }
        }

        let candidates = raw.results.ok_or(SearchError::MissingResults)?;

        let mut prepared: Vec<OpinionRecord> = Vec::new();
        for (index, value) in candidates.iter().take(self.config.max_results).enumerate() {
            let Some(candidate) = parse_candidate(value) else {
                warn!(index, "skipped result with missing required fields");
                continue;
            };

            let Some(text) = self.fetch_opinion_text(&candidate.id).await else {
                warn!(index, id = %candidate.id, "skipped result without opinion text");
                continue;
            };

            let position = prepared.len() + 1;
            prepared.push(build_record(&self.config.base_url, candidate, text, position));
        }

        info!(count = prepared.len(), "CourtListener search completed");
        Ok(prepared)
    }
}

/// Prohibited terms found in the statement, in stoplist order.
/// Whole-word, case-insensitive: "lawsuit" does not trigger "law".
fn prohibited_terms_in(statement: &str) -> Vec<String> {
    let lowered = statement.to_lowercase();
    let words: HashSet<&str> = WORD_RE.find_iter(&lowered).map(|m| m.as_str()).collect();

    PROHIBITED_TERMS
        .iter()
        .filter(|term| words.contains(**term))
        .map(|term| term.to_string())
        .collect()
}

/// Extract `dateFiled:[YYYY-MM-DD TO YYYY-MM-DD]` bounds, converted to
/// the `/`-separated form the search endpoint expects. Returns None on
/// any malformation, including calendar-invalid dates.
fn extract_date_range(statement: &str) -> Option<(String, String)> {
    let caps = DATE_RANGE_RE.captures(statement)?;
    let filed_after = caps.get(1)?.as_str();
    let filed_before = caps.get(2)?.as_str();

    NaiveDate::parse_from_str(filed_after, "%Y-%m-%d").ok()?;
    NaiveDate::parse_from_str(filed_before, "%Y-%m-%d").ok()?;

    Some((
        filed_after.replace('-', "/"),
        filed_before.replace('-', "/"),
    ))
}

/// Degrade a structured query into bare keywords joined with AND.
fn fallback_query(statement: &str) -> String {
    let keywords: String = statement
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();

    keywords.split_whitespace().collect::<Vec<_>>().join(" AND ")
}

/// Normalize the opinion id, which arrives as `id` or `cluster_id` and
/// as either a JSON number or string depending on the response shape.
fn opinion_id(value: &Value) -> Option<String> {
    for key in ["id", "cluster_id"] {
        match value.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Validate a raw search hit. Returns None when any required field is
/// absent, which the caller treats as a skip.
fn parse_candidate(value: &Value) -> Option<OpinionCandidate> {
    Some(OpinionCandidate {
        id: opinion_id(value)?,
        case_name: value.get("caseName")?.as_str()?.to_string(),
        court: value.get("court")?.as_str()?.to_string(),
        relative_url: value.get("absolute_url")?.as_str()?.to_string(),
        status: value.get("status")?.as_str()?.to_string(),
        date_filed: value.get("dateFiled")?.as_str()?.to_string(),
    })
}

/// Assemble the final record. `position` is 1-based within the accepted
/// output sequence, so citation numbering has no gaps after skips.
fn build_record(
    base_url: &str,
    candidate: OpinionCandidate,
    text: String,
    position: usize,
) -> OpinionRecord {
    let absolute_url = format!("{}{}", base_url, candidate.relative_url);
    let year: String = candidate.date_filed.chars().take(4).collect();

    OpinionRecord {
        prompt_text: format!(
            "[{position}] {} ({year}) {}, as sourced from {absolute_url}:",
            candidate.case_name, candidate.court
        ),
        ui_text: format!(
            "[{position}] {} ({year}), {}",
            candidate.case_name, candidate.court
        ),
        ui_url: absolute_url.clone(),
        id: candidate.id,
        case_name: candidate.case_name,
        court: candidate.court,
        absolute_url,
        status: candidate.status,
        date_filed: candidate.date_filed,
        text,
    }
}
