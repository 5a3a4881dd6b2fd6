//! WHOIS enrichment.
//!
//! The network lookup is an injected capability so the enricher can be
//! driven by a stub in tests and swapped for another transport later. The
//! enricher's one promise: a failed lookup degrades the record to
//! "unfilled". It never corrupts it and never crashes the run.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::types::{DirectoryConfig, EnrichOutcome, WhoisFields};

/// Failure modes of the lookup capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Connection/transport problem or timeout, possibly transient.
    Transport(String),

    /// The registry definitively reported the domain as unknown.
    NotFound,
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::Transport(message) => write!(f, "transport error: {}", message),
            LookupError::NotFound => write!(f, "domain not found in registry"),
        }
    }
}

/// Injected WHOIS lookup capability.
///
/// Implementations perform a single query and return the raw response
/// text. They must honor the timeout; the enricher relies on it to keep
/// the process from hanging.
#[async_trait]
pub trait WhoisLookup: Send + Sync {
    async fn query(&self, domain: &str, timeout: Duration) -> Result<String, LookupError>;
}

/// Default lookup over the system's `whois` command.
///
/// Uses `tokio::process` so the query runs under the async runtime's
/// timeout machinery. A "no match" style response is reported as
/// [`LookupError::NotFound`] rather than text to parse.
#[derive(Debug, Clone, Default)]
pub struct SystemWhoisLookup;

impl SystemWhoisLookup {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WhoisLookup for SystemWhoisLookup {
    async fn query(&self, domain: &str, timeout: Duration) -> Result<String, LookupError> {
        let output = tokio::time::timeout(timeout, Command::new("whois").arg(domain).output())
            .await
            .map_err(|_| LookupError::Transport(format!("WHOIS query timed out after {:?}", timeout)))?
            .map_err(|e| {
                LookupError::Transport(format!(
                    "failed to execute whois command: {}. Make sure 'whois' is installed.",
                    e
                ))
            })?;

        let text = String::from_utf8_lossy(&output.stdout).to_string();

        if is_not_found_response(&text) {
            return Err(LookupError::NotFound);
        }

        if text.trim().is_empty() {
            return Err(LookupError::Transport(format!(
                "whois produced no output (exit status {})",
                output.status
            )));
        }

        Ok(text)
    }
}

/// Patterns registries use for a definitive negative response.
fn is_not_found_response(response: &str) -> bool {
    let lower = response.to_lowercase();
    let not_found_patterns = [
        "no match",
        "not found",
        "no data found",
        "no entries found",
        "domain not found",
        "no object found",
        "no matching record",
        "the queried object does not exist",
        "this domain name has not been registered",
    ];

    not_found_patterns
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Fills empty metadata fields of domain records from WHOIS responses.
pub struct WhoisEnricher<L: WhoisLookup> {
    lookup: L,
    timeout: Duration,
    retries: u32,
}

impl<L: WhoisLookup> WhoisEnricher<L> {
    /// Create an enricher with default settings (5s timeout, one retry).
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            timeout: Duration::from_secs(5),
            retries: 1,
        }
    }

    /// Create an enricher configured from a [`DirectoryConfig`].
    pub fn with_config(lookup: L, config: &DirectoryConfig) -> Self {
        Self {
            lookup,
            timeout: config.whois_timeout,
            retries: config.whois_retries,
        }
    }

    /// Attempt one enrichment lookup for `name`.
    ///
    /// Transient transport failures are retried up to the configured
    /// budget; a definitive registry negative is terminal and never
    /// retried. The returned outcome carries fields only on
    /// `Success`/`PartialFailure`; on `Unavailable`/`NotFound` the caller
    /// must leave the record exactly as it was.
    pub async fn enrich(&self, name: &str) -> EnrichOutcome {
        let mut attempt = 0u32;

        loop {
            match self.lookup.query(name, self.timeout).await {
                Ok(response) => {
                    let fields = parse_whois_fields(&response);
                    let missing = fields.missing();
                    debug!(domain = name, missing = missing.len(), "WHOIS lookup succeeded");
                    return if missing.is_empty() {
                        EnrichOutcome::Success(fields)
                    } else {
                        EnrichOutcome::PartialFailure { fields, missing }
                    };
                }
                Err(LookupError::NotFound) => {
                    debug!(domain = name, "registry reports domain not found");
                    return EnrichOutcome::NotFound;
                }
                Err(LookupError::Transport(message)) => {
                    if attempt >= self.retries {
                        warn!(domain = name, %message, "WHOIS unavailable, giving up");
                        return EnrichOutcome::Unavailable;
                    }
                    attempt += 1;
                    debug!(domain = name, %message, attempt, "retrying WHOIS lookup");
                }
            }
        }
    }

    /// Enrich many domains with a bounded worker pool.
    ///
    /// Lookups are independent per domain, so this is purely a performance
    /// optimization; outcomes arrive in completion order.
    pub async fn enrich_all(
        &self,
        names: Vec<String>,
        concurrency: usize,
    ) -> Vec<(String, EnrichOutcome)> {
        stream::iter(names.into_iter().map(|name| async move {
            let outcome = self.enrich(&name).await;
            (name, outcome)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
    }
}

/// Extract the enrichment fields from a raw WHOIS response.
///
/// Registries disagree on field labels, so each field tries several
/// case-insensitive patterns and keeps the first hit. Fields with no hit
/// stay empty, meaning the response did not carry them.
pub fn parse_whois_fields(response: &str) -> WhoisFields {
    WhoisFields {
        registrar: extract_field(
            response,
            &[
                r"(?i)Registrar:\s*(.+)",
                r"(?i)Registrar Name:\s*(.+)",
                r"(?i)Sponsoring Registrar:\s*(.+)",
            ],
        ),
        created_at: extract_field(
            response,
            &[
                r"(?i)Creation Date:\s*(.+)",
                r"(?i)Created Date:\s*(.+)",
                r"(?i)Created:\s*(.+)",
                r"(?i)Registered On:\s*(.+)",
                r"(?i)Registration Date:\s*(.+)",
                r"(?i)Registration Time:\s*(.+)",
            ],
        ),
        expires_at: extract_field(
            response,
            &[
                r"(?i)Expir(?:y|ation) Date:\s*(.+)",
                r"(?i)Registry Expiry Date:\s*(.+)",
                r"(?i)Expiration Time:\s*(.+)",
                r"(?i)paid-till:\s*(.+)",
            ],
        ),
        registrant: extract_field(
            response,
            &[
                r"(?i)Registrant Name:\s*(.+)",
                r"(?i)Registrant Organization:\s*(.+)",
                r"(?i)Registrant:\s*(.+)",
                r"(?i)Holder:\s*(.+)",
            ],
        ),
    }
}

/// Try multiple regex patterns and return the first match.
fn extract_field(text: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(caps) = re.captures(text) {
                if let Some(m) = caps.get(1) {
                    let value = m.as_str().trim().to_string();
                    if !value.is_empty() {
                        return Some(value);
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// A lookup stub that replays a scripted sequence of responses.
    struct ScriptedLookup {
        responses: Mutex<Vec<Result<String, LookupError>>>,
    }

    impl ScriptedLookup {
        fn new(responses: Vec<Result<String, LookupError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl WhoisLookup for ScriptedLookup {
        async fn query(&self, _domain: &str, _timeout: Duration) -> Result<String, LookupError> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(LookupError::Transport("script exhausted".to_string()))
            } else {
                responses.remove(0)
            }
        }
    }

    const FULL_RESPONSE: &str = "Domain Name: EXAMPLE.COM\n\
        Registrar: Example Registrar Inc.\n\
        Creation Date: 1995-08-14T04:00:00Z\n\
        Registry Expiry Date: 2026-08-13T04:00:00Z\n\
        Registrant Name: Example Holdings\n";

    #[tokio::test]
    async fn test_success_parses_all_fields() {
        let enricher = WhoisEnricher::new(ScriptedLookup::new(vec![Ok(FULL_RESPONSE.to_string())]));
        match enricher.enrich("example.com").await {
            EnrichOutcome::Success(fields) => {
                assert_eq!(fields.registrar.as_deref(), Some("Example Registrar Inc."));
                assert_eq!(fields.created_at.as_deref(), Some("1995-08-14T04:00:00Z"));
                assert_eq!(fields.expires_at.as_deref(), Some("2026-08-13T04:00:00Z"));
                assert_eq!(fields.registrant.as_deref(), Some("Example Holdings"));
            }
            other => panic!("expected Success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_response_reports_missing() {
        let response = "Registrar: ACME\nCreation Date: 2020-01-01\n";
        let enricher = WhoisEnricher::new(ScriptedLookup::new(vec![Ok(response.to_string())]));
        match enricher.enrich("example.com").await {
            EnrichOutcome::PartialFailure { fields, missing } => {
                assert_eq!(fields.registrar.as_deref(), Some("ACME"));
                assert_eq!(missing, vec!["expires_at", "registrant"]);
            }
            other => panic!("expected PartialFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_retried_once_then_unavailable() {
        let lookup = ScriptedLookup::new(vec![
            Err(LookupError::Transport("connection reset".to_string())),
            Err(LookupError::Transport("connection reset".to_string())),
        ]);
        let enricher = WhoisEnricher::new(lookup);
        assert_eq!(enricher.enrich("example.com").await, EnrichOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_on_retry() {
        let lookup = ScriptedLookup::new(vec![
            Err(LookupError::Transport("connection reset".to_string())),
            Ok(FULL_RESPONSE.to_string()),
        ]);
        let enricher = WhoisEnricher::new(lookup);
        assert!(matches!(
            enricher.enrich("example.com").await,
            EnrichOutcome::Success(_)
        ));
    }

    #[tokio::test]
    async fn test_not_found_is_terminal_no_retry() {
        // A transport error scripted after NotFound must never be reached
        let lookup = ScriptedLookup::new(vec![
            Err(LookupError::NotFound),
            Ok(FULL_RESPONSE.to_string()),
        ]);
        let enricher = WhoisEnricher::new(lookup);
        assert_eq!(enricher.enrich("missing.example").await, EnrichOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_enrich_all_returns_every_domain() {
        let lookup = ScriptedLookup::new(vec![
            Ok(FULL_RESPONSE.to_string()),
            Err(LookupError::NotFound),
        ]);
        let enricher = WhoisEnricher::new(lookup);
        let outcomes = enricher
            .enrich_all(vec!["a.com".to_string(), "b.com".to_string()], 1)
            .await;
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_parse_cn_style_response() {
        let response = "Registration Time: 2003-03-17 12:20:05\n\
            Expiration Time: 2026-03-17 12:48:36\n\
            Sponsoring Registrar: Alibaba Cloud Computing\n";
        let fields = parse_whois_fields(response);
        assert_eq!(fields.registrar.as_deref(), Some("Alibaba Cloud Computing"));
        assert!(fields.created_at.is_some());
        assert!(fields.expires_at.is_some());
        assert!(fields.registrant.is_none());
    }

    #[test]
    fn test_parse_ru_style_response() {
        let response = "paid-till: 2025-12-01T00:00:00Z\nCreated: 2000-01-01\n";
        let fields = parse_whois_fields(response);
        assert_eq!(fields.created_at.as_deref(), Some("2000-01-01"));
        assert_eq!(fields.expires_at.as_deref(), Some("2025-12-01T00:00:00Z"));
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_whois_fields("").is_empty());
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found_response("No match for \"FREE-DOMAIN.COM\""));
        assert!(is_not_found_response("Domain not found"));
        assert!(!is_not_found_response(FULL_RESPONSE));
    }

    #[test]
    fn test_extract_field_first_pattern_wins() {
        let text = "Registrar: First\nSponsoring Registrar: Second";
        let result = extract_field(
            text,
            &[r"(?i)Registrar:\s*(.+)", r"(?i)Sponsoring Registrar:\s*(.+)"],
        );
        assert_eq!(result, Some("First".to_string()));
    }
}
