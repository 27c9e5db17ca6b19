//! Conversation types
//!
//! Messages, the extracted-information snapshot and the state handed from
//! one turn to the next. The turn logic itself lives in `fact_finder`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::User;

pub mod fact_finder;
pub use fact_finder::{build_prompt, FactFinder, COMPLETION_MESSAGE};

/// Who sent a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    /// Prefix shown in the chat transcript
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Ai => "Gemini",
        }
    }
}

/// A single message in the conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    message_id: Uuid,
    timestamp: DateTime<Utc>,
    text: String,
    sender: Sender,
}

impl Message {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            text: text.into(),
            sender,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Ai)
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }
}

/// Snapshot of what is known about the user after a turn
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedInformation {
    pub user: Option<User>,
}

impl ExtractedInformation {
    pub fn new(user: Option<User>) -> Self {
        Self { user }
    }
}

impl fmt::Display for ExtractedInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(user) = &self.user else {
            return write!(f, "No information collected yet.");
        };

        let or_missing = |value: &Option<String>| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .unwrap_or("not provided")
                .to_string()
        };

        writeln!(
            f,
            "Name: {} {}",
            or_missing(&user.first_name),
            or_missing(&user.last_name)
        )?;
        writeln!(f, "Email: {}", or_missing(&user.email))?;
        match user.date_of_birth {
            Some(dob) => writeln!(f, "DOB: {}", dob)?,
            None => writeln!(f, "DOB: not provided")?,
        }

        if user.goals.is_empty() {
            return write!(f, "Goals: none");
        }

        write!(f, "Goals:")?;
        for goal in &user.goals {
            write!(f, "\n- {}", goal)?;
        }
        Ok(())
    }
}

/// State passed between turns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub finished: bool,
    /// Full ordered history
    pub messages: Vec<Message>,
    /// Messages produced by the most recent turn
    pub new_messages: Vec<Message>,
    pub extracted_information: ExtractedInformation,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Move the latest turn's messages into the history
    pub fn commit_new_messages(&mut self) {
        let new_messages = std::mem::take(&mut self.new_messages);
        self.messages.extend(new_messages);
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn user(&self) -> Option<&User> {
        self.extracted_information.user.as_ref()
    }
}
