//! Interactive chat loop
//!
//! Reads one line per turn, feeds it to the fact finder and prints the reply.
//! Ends on `exit` / `quit`, end of input, or once collection is finished.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::conversation::{ConversationState, FactFinder, Sender};
use crate::extractor::Extractor;
use crate::llm::LanguageModel;
use crate::Result;

const EXIT_COMMANDS: &[&str] = &["exit", "quit"];

pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    EXIT_COMMANDS.iter().any(|cmd| *cmd == input)
}

/// Run the conversation until the user leaves or everything is collected.
///
/// Returns the final state. Any turn error ends the loop and is returned.
pub async fn run_chat_loop<M, E, R, W>(
    finder: &FactFinder<M, E>,
    input: R,
    output: &mut W,
) -> Result<ConversationState>
where
    M: LanguageModel,
    E: Extractor,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(output, "--Starting fact-find chat, please enter your request to get started.--")?;
    writeln!(output, "Type 'exit' or 'quit' to end the conversation.\n")?;

    let mut state = ConversationState::new();
    let mut lines = input.lines();

    loop {
        write!(output, "{}: ", Sender::User.label())?;
        output.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(output)?;
            break;
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if is_exit_command(text) {
            break;
        }

        state.push_user_message(text);
        state = finder.chat_response(&state).await?;

        for message in &state.new_messages {
            writeln!(output, "{}: {}", message.sender().label(), message.text())?;
        }
        state.commit_new_messages();

        if state.finished {
            info!("All required information collected");
            break;
        }
    }

    writeln!(output, "\n--Ending conversation--")?;
    writeln!(output, "\nInformation collected about the user:\n")?;
    writeln!(output, "{}", state.extracted_information)?;

    Ok(state)
}
