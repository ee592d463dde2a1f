//! Freetalk progression engine.
//!
//! Scripted free conversation: the AI walks through each session's lines,
//! pausing for a learner turn after every line except the session closer.
//! Replies are buffered per session, rolled into a run-wide accumulator when
//! the session closes, and persisted exactly once when the final session
//! finishes.

use crate::message::{MessageLog, Speaker};
use crate::script::FreetalkScript;
use crate::{Command, CommandSender};
use anyhow::{Context, Result, ensure};

pub struct FreetalkEngine {
    script: FreetalkScript,
    session_index: usize,
    line_index: usize,
    turn_count: usize,
    session_buffer: Vec<String>,
    accumulated: Vec<String>,
    log: MessageLog,
    awaiting_input: bool,
    completed: bool,
}

impl FreetalkEngine {
    pub fn new(script: FreetalkScript) -> Result<Self> {
        ensure!(!script.sessions.is_empty(), "no freetalk sessions");
        ensure!(
            script.sessions.iter().all(|s| !s.ai_lines.is_empty()),
            "freetalk session with no lines"
        );
        Ok(Self {
            script,
            session_index: 0,
            line_index: 0,
            turn_count: 0,
            session_buffer: Vec::new(),
            accumulated: Vec::new(),
            log: MessageLog::new(),
            awaiting_input: false,
            completed: false,
        })
    }

    pub fn topic(&self) -> &str {
        &self.script.topic
    }

    pub fn session_index(&self) -> usize {
        self.session_index
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn hints(&self) -> &[String] {
        &self.script.hint_phrases
    }

    /// Hints and the mic affordance show together, between AI lines.
    pub fn awaiting_input(&self) -> bool {
        self.awaiting_input
    }

    pub fn messages(&self) -> &[crate::message::ChatMessage] {
        self.log.messages()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub async fn begin(&mut self, tx: &CommandSender) -> Result<()> {
        self.speak_current_line(tx).await
    }

    fn current_lines(&self) -> &[String] {
        &self.script.sessions[self.session_index].ai_lines
    }

    async fn speak_current_line(&mut self, tx: &CommandSender) -> Result<()> {
        let line = self.current_lines()[self.line_index].clone();
        self.log.push(Speaker::Ai, line.clone(), None);
        tx.send(Command::Speak(line))
            .await
            .context("failed to send Speak command")
    }

    pub async fn handle_speech_done(&mut self, tx: &CommandSender) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        let last_line = self.line_index + 1 >= self.current_lines().len();
        if !last_line {
            self.awaiting_input = true;
            return Ok(());
        }

        // Session closer finished: roll this session's replies into the
        // run-wide list before deciding what comes next.
        self.accumulated.append(&mut self.session_buffer);

        if self.session_index + 1 >= self.script.sessions.len() {
            self.completed = true;
            let replies = if self.accumulated.is_empty() {
                self.script.fallback_replies.clone()
            } else {
                self.accumulated.clone()
            };
            tx.send(Command::SaveFreetalkReplies(replies))
                .await
                .context("failed to send SaveFreetalkReplies command")?;
            tx.send(Command::Completed)
                .await
                .context("failed to send Completed command")
        } else {
            self.session_index += 1;
            self.line_index = 0;
            self.turn_count = 0;
            self.speak_current_line(tx).await
        }
    }

    /// A tapped hint stands in for a spoken reply.
    pub async fn handle_hint_tap(&mut self, index: usize, tx: &CommandSender) -> Result<()> {
        let Some(hint) = self.script.hint_phrases.get(index).cloned() else {
            return Ok(());
        };
        self.accept(hint, tx).await
    }

    /// An empty transcript still counts as a turn, substituting the first
    /// hint phrase so the conversation keeps moving.
    pub async fn handle_transcript(&mut self, transcript: &str, tx: &CommandSender) -> Result<()> {
        let trimmed = transcript.trim();
        let reply = if trimmed.is_empty() {
            self.script
                .hint_phrases
                .first()
                .cloned()
                .unwrap_or_default()
        } else {
            trimmed.to_string()
        };
        self.accept(reply, tx).await
    }

    async fn accept(&mut self, reply: String, tx: &CommandSender) -> Result<()> {
        if !self.awaiting_input || self.completed {
            return Ok(());
        }
        self.awaiting_input = false;
        self.log.push(Speaker::Learner, reply.clone(), None);
        self.session_buffer.push(reply);
        self.turn_count += 1;

        self.line_index += 1;
        if self.turn_count >= self.script.turns_per_session {
            // Turn quota reached: skip straight to the session closer.
            self.line_index = self.current_lines().len() - 1;
        }
        self.speak_current_line(tx).await
    }
}
