//! Query controller
//!
//! Owns the draft (question text, top-K) and the interaction state, and
//! drives one request per accepted submit:
//!
//! ```text
//! Idle ──submit──▶ Submitting ──ok─────▶ Success
//!                      └─────error──▶ Failed
//! Success | Failed ──submit──▶ Submitting
//! ```
//!
//! Both values live in `watch` channels, so any number of readers can
//! observe them while the controller stays the only writer.
//!
//! Author: hephaex@gmail.com

use ragprobe_core::{
    AppConfig, Draft, InteractionState, Notification, Notifier, Query, RagProbeError,
    RagTransport, Result, TopK,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::http::HttpTransport;

/// State machine mediating between user intents and the RAG endpoint
pub struct QueryController {
    /// Outbound request function
    transport: Arc<dyn RagTransport>,

    /// Receives success/failure/validation notifications
    notifier: Arc<dyn Notifier>,

    /// Editable form values
    draft: watch::Sender<Draft>,

    /// Current interaction state, shared with the task running a query
    state: Arc<watch::Sender<InteractionState>>,
}

impl QueryController {
    /// Create a controller in the `Idle` state with an empty draft
    pub fn new(transport: Arc<dyn RagTransport>, notifier: Arc<dyn Notifier>) -> Self {
        let (draft, _) = watch::channel(Draft::default());
        let (state, _) = watch::channel(InteractionState::Idle);
        Self {
            transport,
            notifier,
            draft,
            state: Arc::new(state),
        }
    }

    /// Create a controller talking HTTP to the configured endpoint
    pub fn from_config(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.endpoint)?;
        let controller = Self::new(Arc::new(transport), notifier);
        let top_k = config.query.top_k();
        controller.update_top_k(|_| top_k);
        Ok(controller)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn state(&self) -> InteractionState {
        self.state.borrow().clone()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<InteractionState> {
        self.state.subscribe()
    }

    pub fn draft(&self) -> Draft {
        self.draft.borrow().clone()
    }

    /// Watch draft edits
    pub fn subscribe_draft(&self) -> watch::Receiver<Draft> {
        self.draft.subscribe()
    }

    pub fn question_text(&self) -> String {
        self.draft.borrow().text.clone()
    }

    pub fn top_k(&self) -> TopK {
        self.draft.borrow().top_k
    }

    /// Loading flag
    pub fn is_submitting(&self) -> bool {
        self.state.borrow().is_submitting()
    }

    /// Whether a submit right now would be accepted
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.draft.borrow().has_question()
    }

    // ------------------------------------------------------------------
    // Draft intents
    // ------------------------------------------------------------------

    /// Replace the question text. Never affects a request already in flight.
    pub fn set_question_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.draft.send_if_modified(|draft| {
            if draft.text == text {
                return false;
            }
            draft.text = text;
            true
        });
    }

    /// Set top-K, clamped into range
    pub fn set_top_k(&self, n: i64) -> TopK {
        self.update_top_k(|_| TopK::new(n))
    }

    /// Set top-K from raw text typed into a numeric field
    pub fn set_top_k_input(&self, raw: &str) -> TopK {
        let top_k = TopK::from_input(raw);
        self.update_top_k(|_| top_k)
    }

    pub fn increment_top_k(&self) -> TopK {
        self.update_top_k(TopK::increment)
    }

    pub fn decrement_top_k(&self) -> TopK {
        self.update_top_k(TopK::decrement)
    }

    fn update_top_k(&self, step: impl FnOnce(TopK) -> TopK) -> TopK {
        let mut current = TopK::default();
        self.draft.send_if_modified(|draft| {
            current = step(draft.top_k);
            if current == draft.top_k {
                return false;
            }
            draft.top_k = current;
            true
        });
        current
    }

    // ------------------------------------------------------------------
    // Submit
    // ------------------------------------------------------------------

    /// Submit the current draft.
    ///
    /// Returns `Err(Validation)` for a blank question and
    /// `Err(QueryInFlight)` while another submit is pending; neither
    /// changes the state or touches the network. Otherwise exactly one
    /// request is sent and the final state (`Success` or `Failed`) is
    /// returned.
    ///
    /// Once accepted, the request runs to completion and its outcome is
    /// published even if the returned future is dropped.
    pub async fn submit(&self) -> Result<InteractionState> {
        if self.is_submitting() {
            tracing::debug!("Submit ignored: a query is already in flight");
            return Err(RagProbeError::QueryInFlight);
        }

        let query = match Query::from_draft(&self.draft()) {
            Ok(query) => query,
            Err(err) => {
                tracing::debug!("Submit blocked: {}", err);
                self.notifier.notify(Notification::question_required());
                return Err(err);
            }
        };

        // Check-and-set under the channel lock: only one caller can win
        let accepted = self.state.send_if_modified(|state| {
            if state.is_submitting() {
                return false;
            }
            *state = InteractionState::Submitting(query.clone());
            true
        });
        if !accepted {
            tracing::debug!("Submit ignored: a query is already in flight");
            return Err(RagProbeError::QueryInFlight);
        }

        tracing::info!(
            query_id = %query.id(),
            top_k = query.top_k().get(),
            transport = self.transport.name(),
            "RAG query submitted"
        );

        // Own task: dropping this future must not skip the final transition
        let cycle = tokio::spawn(run_query(
            Arc::clone(&self.transport),
            Arc::clone(&self.notifier),
            Arc::clone(&self.state),
            query,
        ));

        match cycle.await {
            Ok(next) => Ok(next),
            Err(err) => {
                let message = format!("query task failed: {err}");
                tracing::error!(error = %err, "RAG query task did not complete");
                let next = InteractionState::Failed(message.clone());
                self.state.send_replace(next.clone());
                self.notifier.notify(Notification::query_failed(message));
                Ok(next)
            }
        }
    }
}

/// One accepted cycle: send, map the outcome, publish, notify
async fn run_query(
    transport: Arc<dyn RagTransport>,
    notifier: Arc<dyn Notifier>,
    state: Arc<watch::Sender<InteractionState>>,
    query: Query,
) -> InteractionState {
    let start = Instant::now();

    let (next, notification) = match transport.query(&query).await {
        Ok(mut result) => {
            let dropped = result.truncate_contexts(query.top_k());
            if dropped > 0 {
                tracing::warn!(
                    query_id = %query.id(),
                    dropped,
                    "Endpoint returned more contexts than requested"
                );
            }
            tracing::info!(
                query_id = %query.id(),
                contexts = result.contexts.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "RAG query succeeded"
            );
            (
                InteractionState::Success(result),
                Notification::answer_generated(),
            )
        }
        Err(err) => {
            let message = err.failure_message();
            tracing::warn!(
                query_id = %query.id(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %err,
                "RAG query failed"
            );
            (
                InteractionState::Failed(message.clone()),
                Notification::query_failed(message),
            )
        }
    };

    state.send_replace(next.clone());
    notifier.notify(notification);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragprobe_core::RagResult;

    struct NoTransport;

    #[async_trait]
    impl RagTransport for NoTransport {
        async fn query(&self, _query: &Query) -> Result<RagResult> {
            Err(RagProbeError::Transport("offline".to_string()))
        }

        fn name(&self) -> &str {
            "none"
        }
    }

    struct Silent;

    impl Notifier for Silent {
        fn notify(&self, _notification: Notification) {}
    }

    fn controller() -> QueryController {
        QueryController::new(Arc::new(NoTransport), Arc::new(Silent))
    }

    #[test]
    fn test_initial_state() {
        let c = controller();
        assert!(c.state().is_idle());
        assert_eq!(c.top_k().get(), 3);
        assert_eq!(c.question_text(), "");
        assert!(!c.can_submit());
    }

    #[test]
    fn test_set_top_k_clamps() {
        let c = controller();
        assert_eq!(c.set_top_k(0).get(), 1);
        assert_eq!(c.set_top_k(11).get(), 10);
        assert_eq!(c.set_top_k(-100).get(), 1);
        assert_eq!(c.set_top_k(6).get(), 6);
        assert_eq!(c.top_k().get(), 6);
    }

    #[test]
    fn test_increment_decrement_bounds() {
        let c = controller();
        c.set_top_k(10);
        assert_eq!(c.increment_top_k().get(), 10);
        assert_eq!(c.decrement_top_k().get(), 9);

        c.set_top_k(1);
        assert_eq!(c.decrement_top_k().get(), 1);
        assert_eq!(c.increment_top_k().get(), 2);
    }

    #[test]
    fn test_set_top_k_input() {
        let c = controller();
        assert_eq!(c.set_top_k_input("7").get(), 7);
        assert_eq!(c.set_top_k_input("").get(), 1);
        assert_eq!(c.set_top_k_input("12").get(), 10);
    }

    #[test]
    fn test_draft_subscribers_see_edits() {
        let c = controller();
        let mut rx = c.subscribe_draft();
        c.set_question_text("hello");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().text, "hello");

        // Same value is not a change
        c.set_question_text("hello");
        c.set_top_k(3);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_can_submit_follows_text() {
        let c = controller();
        c.set_question_text("   ");
        assert!(!c.can_submit());
        c.set_question_text("why?");
        assert!(c.can_submit());
    }

    #[test]
    fn test_from_config_uses_default_top_k() {
        let mut config = AppConfig::default();
        config.query.default_top_k = 15;
        let c = QueryController::from_config(&config, Arc::new(Silent)).unwrap();
        assert_eq!(c.top_k().get(), 10);
    }

    #[tokio::test]
    async fn test_failed_then_resubmit_is_accepted() {
        let c = controller();
        c.set_question_text("anything");

        let first = c.submit().await.unwrap();
        assert_eq!(first, InteractionState::Failed("offline".to_string()));

        let second = c.submit().await.unwrap();
        assert_eq!(second, InteractionState::Failed("offline".to_string()));
    }
}
