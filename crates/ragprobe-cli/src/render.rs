//! Terminal rendering of controller state

use ragprobe_core::{Draft, InteractionState, Notification, RagResult, Severity, TopK};
use std::io::{self, Write};

/// Render the current interaction state for humans
pub fn render_state(state: &InteractionState, out: &mut impl Write) -> io::Result<()> {
    match state {
        InteractionState::Idle => writeln!(out, "No answer yet. Ask a question to get started."),
        InteractionState::Submitting(query) => {
            writeln!(out, "Generating... (top {} contexts)", query.top_k())
        }
        InteractionState::Success(result) => render_result(result, out),
        InteractionState::Failed(message) => writeln!(out, "Error: {message}"),
    }
}

/// Answer followed by numbered contexts in rank order
pub fn render_result(result: &RagResult, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Generated Answer")?;
    writeln!(out, "{}", result.answer)?;
    writeln!(out)?;
    writeln!(out, "Retrieved Contexts")?;
    if result.contexts.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (index, context) in result.contexts.iter().enumerate() {
        writeln!(out, "  [{}] {}", index + 1, context)?;
    }
    Ok(())
}

/// Machine-readable form: the result object, or `{"error": ...}`
pub fn render_json(state: &InteractionState, out: &mut impl Write) -> io::Result<()> {
    let value = match state {
        InteractionState::Success(result) => serde_json::to_value(result)?,
        InteractionState::Failed(message) => serde_json::json!({ "error": message }),
        other => serde_json::json!({ "state": other.label() }),
    };
    serde_json::to_writer_pretty(&mut *out, &value)?;
    writeln!(out)
}

pub fn render_draft(draft: &Draft, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Question: {}", draft.text)?;
    writeln!(
        out,
        "Top K contexts: {} ({}-{})",
        draft.top_k,
        TopK::MIN,
        TopK::MAX
    )
}

/// Current top-K, flagging when a step in one direction is a no-op
pub fn render_top_k(top_k: TopK, out: &mut impl Write) -> io::Result<()> {
    let bound = if top_k.is_max() {
        " (maximum)"
    } else if top_k.is_min() {
        " (minimum)"
    } else {
        ""
    };
    writeln!(out, "Top K contexts: {top_k}{bound}")
}

pub fn render_notification(notification: &Notification, out: &mut impl Write) -> io::Result<()> {
    let marker = match notification.severity {
        Severity::Info => "ok",
        Severity::Error => "!!",
    };
    writeln!(
        out,
        "[{marker}] {}: {}",
        notification.title, notification.description
    )
}
