use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Canned replies keyed by lower-cased question
#[derive(Debug, Clone, Default)]
pub struct IntentReplies {
    replies: HashMap<String, String>,
}

impl IntentReplies {
    pub fn new(replies: HashMap<String, String>) -> Self {
        let replies = replies
            .into_iter()
            .map(|(question, reply)| (question.trim().to_lowercase(), reply))
            .collect();
        Self { replies }
    }

    /// Load from a JSON object of `{"question": "reply"}`
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let replies = Self::from_json_str(&data)?;
        info!("Loaded {} intent replies from {:?}", replies.len(), path.as_ref());
        Ok(replies)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let replies: HashMap<String, String> = serde_json::from_str(data)?;
        Ok(Self::new(replies))
    }

    pub fn reply(&self, question: &str) -> Result<Option<&str>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("Please enter a query".to_string()));
        }
        Ok(self.replies.get(&question.to_lowercase()).map(String::as_str))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}
