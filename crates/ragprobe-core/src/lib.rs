//! ragprobe Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout ragprobe:
//! - Query drafting types (top-K, draft, immutable query snapshot)
//! - The result returned by the remote RAG endpoint
//! - The interaction state machine variants
//! - User-facing notifications
//! - Common error types
//! - Collaborator traits (transport, notifier)
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, EndpointConfig, LoggingConfig, MockServerConfig, QueryConfig,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Failure text used when a 2xx body cannot be read as a RAG result
pub const MALFORMED_RESPONSE: &str = "malformed response";

/// Core error types for ragprobe operations
#[derive(Error, Debug)]
pub enum RagProbeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A query is already in flight")]
    QueryInFlight,

    #[error("HTTP error {status}")]
    Http { status: u16, detail: Option<String> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RagProbeError {
    /// Message carried by the `Failed` state for this error
    pub fn failure_message(&self) -> String {
        match self {
            Self::Http {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Self::Http {
                status,
                detail: None,
            } => format!("HTTP error {status}"),
            Self::MalformedResponse(_) => MALFORMED_RESPONSE.to_string(),
            Self::Transport(description) => description.clone(),
            Self::Validation(msg) | Self::Config(msg) => msg.clone(),
            Self::QueryInFlight => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RagProbeError>;

// ============================================================================
// Query Drafting
// ============================================================================

/// Number of context snippets requested from the RAG service.
///
/// Always within `[TopK::MIN, TopK::MAX]`; every constructor clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "i64")]
pub struct TopK(u8);

impl TopK {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const DEFAULT: u8 = 3;

    /// Clamp any integer into the valid range
    pub fn new(n: i64) -> Self {
        Self(n.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    /// Parse typed entry from a numeric field.
    ///
    /// Reads the leading integer (optional sign, leading whitespace allowed)
    /// and ignores anything after it. Input without a leading integer, or a
    /// zero, falls back to the minimum.
    pub fn from_input(raw: &str) -> Self {
        let s = raw.trim_start();
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..end];
        if digits.is_empty() {
            return Self(Self::MIN);
        }

        // Out-of-range magnitudes clamp the same way as huge values
        let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
        let n = if negative { -magnitude } else { magnitude };
        if n == 0 {
            Self(Self::MIN)
        } else {
            Self::new(n)
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// One step up, saturating at the maximum
    pub fn increment(self) -> Self {
        Self::new(i64::from(self.0) + 1)
    }

    /// One step down, saturating at the minimum
    pub fn decrement(self) -> Self {
        Self::new(i64::from(self.0) - 1)
    }

    pub fn is_max(self) -> bool {
        self.0 == Self::MAX
    }

    pub fn is_min(self) -> bool {
        self.0 == Self::MIN
    }
}

impl Default for TopK {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<i64> for TopK {
    fn from(n: i64) -> Self {
        Self::new(n)
    }
}

impl From<TopK> for u8 {
    fn from(k: TopK) -> Self {
        k.0
    }
}

impl std::fmt::Display for TopK {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editable question text and top-K, as bound to the input form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Question text exactly as typed
    pub text: String,

    /// Requested number of contexts
    pub top_k: TopK,
}

impl Draft {
    /// Whether the text would pass submit-time validation
    pub fn has_question(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Immutable snapshot of a draft taken at submit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    id: Uuid,
    text: String,
    top_k: TopK,
}

impl Query {
    /// Create a query; the text is trimmed and must not be empty
    pub fn new(text: &str, top_k: TopK) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RagProbeError::Validation(
                "Question cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            top_k,
        })
    }

    /// Snapshot a draft
    pub fn from_draft(draft: &Draft) -> Result<Self> {
        Self::new(&draft.text, draft.top_k)
    }

    /// Correlation id for logs; never sent to the endpoint
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn top_k(&self) -> TopK {
        self.top_k
    }
}

// ============================================================================
// RAG Result
// ============================================================================

/// Answer and supporting contexts returned by the RAG service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagResult {
    /// Generated answer
    pub answer: String,

    /// Retrieved contexts in rank order (index 0 is most relevant)
    #[serde(default)]
    pub contexts: Vec<String>,
}

impl RagResult {
    pub fn new(answer: impl Into<String>, contexts: Vec<String>) -> Self {
        Self {
            answer: answer.into(),
            contexts,
        }
    }

    /// Drop contexts beyond `top_k`, returning how many were removed
    pub fn truncate_contexts(&mut self, top_k: TopK) -> usize {
        let limit = usize::from(top_k.get());
        let dropped = self.contexts.len().saturating_sub(limit);
        self.contexts.truncate(limit);
        dropped
    }
}

// ============================================================================
// Interaction State
// ============================================================================

/// Current phase of the query interaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// A request is in flight
    Submitting(Query),
    /// Last request succeeded
    Success(RagResult),
    /// Last request failed
    Failed(String),
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting(_))
    }

    /// Result of the last successful query, if that is the current state
    pub fn result(&self) -> Option<&RagResult> {
        match self {
            Self::Success(result) => Some(result),
            _ => None,
        }
    }

    /// Failure message, if the current state is `Failed`
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Short lowercase name for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting(_) => "submitting",
            Self::Success(_) => "success",
            Self::Failed(_) => "failed",
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// User-facing message emitted alongside state transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            issued_at: Utc::now(),
        }
    }

    /// Submit was blocked because the question is blank
    pub fn question_required() -> Self {
        Self::new(
            "Question required",
            "Please enter a question to generate an answer.",
            Severity::Error,
        )
    }

    /// Query completed successfully
    pub fn answer_generated() -> Self {
        Self::new(
            "Answer generated",
            "Successfully retrieved contexts and generated answer.",
            Severity::Info,
        )
    }

    /// Query failed with the given message
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::new("Error", message, Severity::Error)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for sending a query to a RAG endpoint
#[async_trait::async_trait]
pub trait RagTransport: Send + Sync {
    /// Send one query and return the parsed result.
    ///
    /// Errors are `Http`, `MalformedResponse` or `Transport`.
    async fn query(&self, query: &Query) -> Result<RagResult>;

    /// Transport name for logging
    fn name(&self) -> &str;
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_top_k_clamps() {
        assert_eq!(TopK::new(-5).get(), 1);
        assert_eq!(TopK::new(0).get(), 1);
        assert_eq!(TopK::new(7).get(), 7);
        assert_eq!(TopK::new(11).get(), 10);
        assert_eq!(TopK::new(i64::MAX).get(), 10);
        assert_eq!(TopK::new(i64::MIN).get(), 1);
    }

    #[test]
    fn test_top_k_default() {
        assert_eq!(TopK::default().get(), 3);
        assert_eq!(Draft::default().top_k, TopK::default());
    }

    #[test]
    fn test_top_k_steps_saturate() {
        let max = TopK::new(10);
        assert_eq!(max.increment(), max);
        assert!(max.is_max());

        let min = TopK::new(1);
        assert_eq!(min.decrement(), min);
        assert!(min.is_min());

        assert_eq!(TopK::new(4).increment().get(), 5);
        assert_eq!(TopK::new(4).decrement().get(), 3);
    }

    #[test]
    fn test_top_k_from_input() {
        assert_eq!(TopK::from_input("5").get(), 5);
        assert_eq!(TopK::from_input("  8").get(), 8);
        assert_eq!(TopK::from_input("4abc").get(), 4);
        assert_eq!(TopK::from_input("2.9").get(), 2);
        assert_eq!(TopK::from_input("+6").get(), 6);
        assert_eq!(TopK::from_input("").get(), 1);
        assert_eq!(TopK::from_input("abc").get(), 1);
        assert_eq!(TopK::from_input("0").get(), 1);
        assert_eq!(TopK::from_input("-3").get(), 1);
        assert_eq!(TopK::from_input("42").get(), 10);
        assert_eq!(TopK::from_input("99999999999999999999999").get(), 10);
    }

    #[test]
    fn test_top_k_serde() {
        assert_eq!(serde_json::to_string(&TopK::new(4)).unwrap(), "4");
        let k: TopK = serde_json::from_str("25").unwrap();
        assert_eq!(k.get(), 10);
    }

    #[test]
    fn test_query_rejects_blank_text() {
        assert!(matches!(
            Query::new("   \n\t", TopK::default()),
            Err(RagProbeError::Validation(_))
        ));
        assert!(Query::new("", TopK::default()).is_err());
    }

    #[test]
    fn test_query_snapshot_trims() {
        let draft = Draft {
            text: "  what is RAG?  ".to_string(),
            top_k: TopK::new(5),
        };
        let query = Query::from_draft(&draft).unwrap();

        assert_eq!(query.text(), "what is RAG?");
        assert_eq!(query.top_k().get(), 5);
        assert_ne!(query.id(), Query::from_draft(&draft).unwrap().id());
    }

    #[test]
    fn test_rag_result_missing_contexts_defaults_empty() {
        let result: RagResult = serde_json::from_str(r#"{"answer":"A"}"#).unwrap();
        assert_eq!(result.answer, "A");
        assert!(result.contexts.is_empty());
    }

    #[test]
    fn test_rag_result_missing_answer_is_error() {
        assert!(serde_json::from_str::<RagResult>("{}").is_err());
    }

    #[test]
    fn test_truncate_contexts() {
        let mut result = RagResult::new(
            "A",
            vec!["c1".into(), "c2".into(), "c3".into(), "c4".into()],
        );
        assert_eq!(result.truncate_contexts(TopK::new(2)), 2);
        assert_eq!(result.contexts, vec!["c1", "c2"]);
        assert_eq!(result.truncate_contexts(TopK::new(5)), 0);
    }

    #[test]
    fn test_failure_messages() {
        let http = RagProbeError::Http {
            status: 503,
            detail: Some("service unavailable".to_string()),
        };
        assert_eq!(http.failure_message(), "service unavailable");

        let bare = RagProbeError::Http {
            status: 404,
            detail: None,
        };
        assert_eq!(bare.failure_message(), "HTTP error 404");

        let malformed = RagProbeError::MalformedResponse("missing field `answer`".to_string());
        assert_eq!(malformed.failure_message(), MALFORMED_RESPONSE);

        let transport = RagProbeError::Transport("connection refused".to_string());
        assert_eq!(transport.failure_message(), "connection refused");
    }

    #[test]
    fn test_interaction_state_accessors() {
        assert!(InteractionState::default().is_idle());

        let success = InteractionState::Success(RagResult::new("A", vec![]));
        assert_eq!(success.result().map(|r| r.answer.as_str()), Some("A"));
        assert_eq!(success.failure(), None);
        assert_eq!(success.label(), "success");

        let failed = InteractionState::Failed("boom".to_string());
        assert_eq!(failed.failure(), Some("boom"));
        assert!(!failed.is_submitting());
    }

    #[test]
    fn test_notification_presets() {
        let required = Notification::question_required();
        assert_eq!(required.title, "Question required");
        assert_eq!(required.severity, Severity::Error);

        let ok = Notification::answer_generated();
        assert_eq!(ok.severity, Severity::Info);

        let failed = Notification::query_failed("service unavailable");
        assert_eq!(failed.title, "Error");
        assert_eq!(failed.description, "service unavailable");
    }

    proptest! {
        #[test]
        fn set_top_k_is_clamped(n in any::<i64>()) {
            let k = TopK::new(n);
            prop_assert_eq!(i64::from(k.get()), n.clamp(1, 10));
        }

        #[test]
        fn from_input_always_in_range(raw in "\\PC{0,12}") {
            let k = TopK::from_input(&raw);
            prop_assert!((TopK::MIN..=TopK::MAX).contains(&k.get()));
        }
    }
}
