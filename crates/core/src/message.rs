//! Append-only chat transcript shared by the roleplay and free-talk screens.

use crate::script::Character;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Ai,
    Learner,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// Creation-ordered, unique within one log.
    pub id: u64,
    pub speaker: Speaker,
    pub text: String,
    /// The AI partner that produced the message, when there is one.
    pub character: Option<Character>,
}

/// Messages are only ever appended, in the order the utterances were
/// produced. The log doubles as the post-session review list.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>, character: Option<Character>) {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            speaker,
            text: text.into(),
            character,
        });
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
}
