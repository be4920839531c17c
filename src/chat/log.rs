//! Append-only chat log
//!
//! Insertion order is display order. Nothing is ever removed, reordered or
//! deduplicated for the life of the session.

use crate::models::{ChatMessage, Sender};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// `(sender, text)` pairs, handy for assertions and transcripts
    pub fn transcript(&self) -> Vec<(Sender, &str)> {
        self.messages
            .iter()
            .map(|m| (m.sender, m.text.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order_and_duplicates() {
        let mut log = ChatLog::new();
        assert!(log.is_empty());

        log.append(ChatMessage::user("hi"));
        log.append(ChatMessage::bot("hello"));
        log.append(ChatMessage::user("hi"));

        assert_eq!(log.len(), 3);
        assert_eq!(
            log.transcript(),
            vec![(Sender::User, "hi"), (Sender::Bot, "hello"), (Sender::User, "hi")]
        );
        assert_eq!(log.last().unwrap().sender, Sender::User);
    }
}
