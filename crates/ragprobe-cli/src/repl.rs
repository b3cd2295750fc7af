//! Interactive question loop
//!
//! Plain lines are questions. Lines starting with `:` are commands that edit
//! the draft or inspect state.

use crate::render;
use ragprobe_client::QueryController;
use ragprobe_core::{Notification, RagProbeError};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

pub const HELP: &str = "\
Type a question and press Enter to submit it.
Commands:
  :k <n>     set top-K (1-10)
  :+  / :-   raise or lower top-K by one
  :r         resubmit the current question
  :state     show the current question, top-K and last result
  :help      show this help
  :q         quit";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    SetTopK(String),
    Increment,
    Decrement,
    Resubmit,
    ShowState,
    Help,
    Quit,
    Unknown(String),
}

/// Parse a line; blank lines yield `None`
pub fn parse_line(line: &str) -> Option<ReplCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(command) = trimmed.strip_prefix(':') else {
        return Some(ReplCommand::Ask(trimmed.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    Some(match name {
        "k" | "topk" => ReplCommand::SetTopK(arg.to_string()),
        "+" | "up" => ReplCommand::Increment,
        "-" | "down" => ReplCommand::Decrement,
        "r" | "retry" => ReplCommand::Resubmit,
        "state" | "s" => ReplCommand::ShowState,
        "help" | "h" | "?" => ReplCommand::Help,
        "q" | "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Unknown(other.to_string()),
    })
}

/// Run the loop until `:q` or end of input
pub async fn run(
    controller: &QueryController,
    notifications: &mut UnboundedReceiver<Notification>,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "RAG Testing - ask questions and retrieve contextual answers")?;
    writeln!(stdout, "{HELP}")?;
    render::render_draft(&controller.draft(), &mut stdout)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = parse_line(&line) else {
            continue;
        };

        match command {
            ReplCommand::Ask(question) => {
                controller.set_question_text(question);
                submit(controller, notifications, &mut stdout).await?;
            }
            ReplCommand::Resubmit => submit(controller, notifications, &mut stdout).await?,
            ReplCommand::SetTopK(raw) => {
                render::render_top_k(controller.set_top_k_input(&raw), &mut stdout)?;
            }
            ReplCommand::Increment => {
                render::render_top_k(controller.increment_top_k(), &mut stdout)?;
            }
            ReplCommand::Decrement => {
                render::render_top_k(controller.decrement_top_k(), &mut stdout)?;
            }
            ReplCommand::ShowState => {
                render::render_draft(&controller.draft(), &mut stdout)?;
                render::render_state(&controller.state(), &mut stdout)?;
            }
            ReplCommand::Help => writeln!(stdout, "{HELP}")?,
            ReplCommand::Quit => break,
            ReplCommand::Unknown(name) => {
                writeln!(stdout, "Unknown command :{name} (try :help)")?;
            }
        }
    }

    Ok(())
}

async fn submit(
    controller: &QueryController,
    notifications: &mut UnboundedReceiver<Notification>,
    stdout: &mut std::io::Stdout,
) -> anyhow::Result<()> {
    match controller.submit().await {
        Ok(state) => render::render_state(&state, stdout)?,
        Err(RagProbeError::Validation(_)) | Err(RagProbeError::QueryInFlight) => {}
        Err(err) => return Err(err.into()),
    }

    while let Ok(notification) = notifications.try_recv() {
        render::render_notification(&notification, &mut std::io::stderr())?;
    }
    Ok(())
}
