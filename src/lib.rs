//! Fact-Find Agent
//!
//! A conversational agent that collects a user's identity and financial
//! goals:
//! - Sends each user message to Gemini with an extraction prompt
//! - Scans the free-text answer for known fields
//! - Merges new fields into the user record (first write wins)
//! - Finishes once name, last name, email and date of birth are known
//!
//! TURN:
//! USER MESSAGE → PROMPT → MODEL → EXTRACT → MERGE → REPLY

pub mod config;
pub mod conversation;
pub mod demo;
pub mod error;
pub mod extractor;
pub mod llm;
pub mod models;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use conversation::{ConversationState, ExtractedInformation, FactFinder, Message, Sender};
pub use error::FactFindError;
