//! Language model boundary
//!
//! The conversation only needs "prompt in, answer out". Gemini is the real
//! backend; `ScriptedModel` replays canned answers for tests and offline runs.

use crate::error::FactFindError;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

pub mod gemini;
pub use gemini::GeminiClient;

/// Trait for text generation (opaque collaborator)
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Model that answers with a fixed script, in order
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| {
                FactFindError::LlmError("Scripted model has no replies left".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_model_replays_in_order() {
        let model = ScriptedModel::new(["first", "second"]);

        let a = tokio_test::block_on(model.generate("p1")).unwrap();
        let b = tokio_test::block_on(model.generate("p2")).unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("first", "second"));
        assert_eq!(model.prompts(), vec!["p1".to_string(), "p2".to_string()]);
        assert_eq!(model.remaining(), 0);

        let exhausted = tokio_test::block_on(model.generate("p3"));
        assert!(matches!(exhausted, Err(FactFindError::LlmError(_))));
    }
}
