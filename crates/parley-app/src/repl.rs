//! Line-oriented interactive conversation loop.

use std::io::Write;

use parley_chat::{ChatError, Role, Session, TurnController};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Reset the conversation to its greeting.
    Clear,
    /// Dump the conversation log as JSON.
    History,
    Help,
    Quit,
    /// Blank line; nothing to do.
    Empty,
    /// Anything else is sent as a user message.
    Message(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            "" => Self::Empty,
            "/clear" => Self::Clear,
            "/history" => Self::History,
            "/help" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Message(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

const HELP: &str = "Commands: /clear (start over), /history (print the log as JSON), /quit";

/// Run the conversation loop until `/quit` or end of input.
pub async fn run<R, W>(
    controller: &TurnController,
    session: &mut Session,
    input: R,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    for turn in session.turns() {
        writeln!(out, "{}> {}", turn.role, turn.content)?;
    }

    let mut lines = input.lines();
    loop {
        write!(out, "you> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => writeln!(out, "{}", HELP)?,
            ReplCommand::History => {
                writeln!(out, "{}", serde_json::to_string_pretty(session.turns())?)?;
            }
            ReplCommand::Clear => match controller.clear(session) {
                Ok(()) => {
                    writeln!(out, "(conversation cleared)")?;
                    for turn in session.turns() {
                        writeln!(out, "{}> {}", turn.role, turn.content)?;
                    }
                }
                Err(e) => writeln!(out, "(cannot clear: {})", e)?,
            },
            ReplCommand::Message(text) => {
                match controller.submit_text(session, &text).await {
                    Ok(outcome) => {
                        tracing::debug!(?outcome, "Turn finished");
                        print_exchange(session, out)?;
                    }
                    Err(ChatError::EmptyMessage) => continue,
                    Err(e) => writeln!(out, "({})", e)?,
                }
            }
        }
    }

    Ok(())
}

/// Print the analysis of the latest user turn followed by the reply.
fn print_exchange<W: Write>(session: &Session, out: &mut W) -> std::io::Result<()> {
    let turns = session.turns();
    let Some(user_idx) = turns.iter().rposition(|t| t.role == Role::User) else {
        return Ok(());
    };

    if let Some(analysis) = &turns[user_idx].analysis {
        writeln!(out, "  expanded: {}", analysis.expanded_query)?;
        writeln!(out, "  topic: {}", analysis.topic)?;
    }
    for turn in &turns[user_idx + 1..] {
        writeln!(out, "{}> {}", turn.role, turn.content)?;
    }
    Ok(())
}
