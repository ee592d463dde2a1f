//! Lecture progression engine.
//!
//! Walks the scripted lecture steps: announce steps play and auto-advance
//! after a short delay, prompt steps play a model line and wait for the
//! learner to repeat it. The placeholder step additionally captures the
//! learner's name from the transcript, once per run.

use crate::script::{LectureStep, StepKind};
use crate::{Command, CommandSender};
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

const ANNOUNCE_ADVANCE_DELAY: Duration = Duration::from_millis(500);
const REPLY_HEARD_DELAY: Duration = Duration::from_millis(800);
const REPLY_EMPTY_DELAY: Duration = Duration::from_millis(500);
const TAP_ONLY_DELAY: Duration = Duration::from_millis(600);

/// Fallback name when nothing usable was heard.
const DEFAULT_NAME: &str = "Friend";

static I_AM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bI\s+am\s+(.+)").expect("valid regex"));
static NAME_IS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:my name is|I'm)\s+(.+)").expect("valid regex"));

/// Pulls a name token out of a recognized self-introduction: "I am <rest>"
/// first, then "my name is <rest>" / "I'm <rest>", then the raw transcript,
/// then the default.
pub fn extract_name(transcript: &str) -> String {
    let t = transcript.trim();
    for re in [&*I_AM, &*NAME_IS] {
        if let Some(caps) = re.captures(t) {
            return caps[1].trim().to_string();
        }
    }
    if t.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        t.to_string()
    }
}

pub struct LectureEngine {
    steps: Vec<LectureStep>,
    step_index: usize,
    captured_name: Option<String>,
    awaiting_input: bool,
    completed: bool,
    next_tag: u64,
    pending: Option<u64>,
}

impl LectureEngine {
    pub fn new(steps: Vec<LectureStep>) -> Self {
        Self {
            steps,
            step_index: 0,
            captured_name: None,
            awaiting_input: false,
            completed: false,
            next_tag: 0,
            pending: None,
        }
    }

    pub fn current_step(&self) -> Option<&LectureStep> {
        self.steps.get(self.step_index)
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn captured_name(&self) -> Option<&str> {
        self.captured_name.as_deref()
    }

    /// Whether the input affordance should be shown.
    pub fn awaiting_input(&self) -> bool {
        self.awaiting_input
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// The text card for the current prompt step, with the placeholder
    /// substituted once a name has been captured.
    pub fn prompt_display(&self) -> Option<String> {
        let step = self.current_step()?;
        if step.kind != StepKind::Prompt {
            return None;
        }
        if step.placeholder {
            return Some(match &self.captured_name {
                Some(name) => format!("I am {name}."),
                None => "I am _______.".to_string(),
            });
        }
        step.display_text.clone()
    }

    pub async fn begin(&mut self, tx: &CommandSender) -> Result<()> {
        self.start_step(tx).await
    }

    async fn start_step(&mut self, tx: &CommandSender) -> Result<()> {
        let Some(step) = self.steps.get(self.step_index) else {
            return self.complete(tx).await;
        };
        self.awaiting_input = false;
        tx.send(Command::Speak(step.utterance.clone()))
            .await
            .context("failed to send Speak command")
    }

    /// Called by the host when the current step's utterance has finished
    /// playing.
    pub async fn handle_speech_done(&mut self, tx: &CommandSender) -> Result<()> {
        let Some(step) = self.steps.get(self.step_index) else {
            return Ok(());
        };
        match step.kind {
            StepKind::Announce => self.schedule_advance(ANNOUNCE_ADVANCE_DELAY, tx).await,
            StepKind::Prompt => {
                if step.placeholder {
                    tx.send(Command::Chime)
                        .await
                        .context("failed to send Chime command")?;
                }
                self.awaiting_input = true;
                Ok(())
            }
        }
    }

    /// Called with the capture result: `Some(transcript)` when recognition
    /// ran (possibly empty), `None` when recognition is unavailable and the
    /// tap alone counts as the response.
    pub async fn handle_learner_input(
        &mut self,
        transcript: Option<&str>,
        tx: &CommandSender,
    ) -> Result<()> {
        if !self.awaiting_input {
            return Ok(());
        }
        self.awaiting_input = false;

        let step_is_placeholder = self
            .current_step()
            .map(|s| s.placeholder)
            .unwrap_or(false);
        if step_is_placeholder && self.captured_name.is_none() {
            let name = transcript.map(extract_name).unwrap_or_else(|| DEFAULT_NAME.to_string());
            tracing::debug!("captured learner name: {name}");
            self.captured_name = Some(name);
        }

        tx.send(Command::Chime)
            .await
            .context("failed to send Chime command")?;
        let delay = match transcript {
            Some(t) if !t.trim().is_empty() => REPLY_HEARD_DELAY,
            Some(_) => REPLY_EMPTY_DELAY,
            None => TAP_ONLY_DELAY,
        };
        self.schedule_advance(delay, tx).await
    }

    /// Called when a scheduled advance fires. A tag that no longer matches
    /// the pending transition belongs to an abandoned step and is ignored.
    pub async fn handle_delay_elapsed(&mut self, tag: u64, tx: &CommandSender) -> Result<()> {
        if self.pending != Some(tag) {
            return Ok(());
        }
        self.pending = None;
        self.step_index += 1;
        self.start_step(tx).await
    }

    async fn schedule_advance(&mut self, delay: Duration, tx: &CommandSender) -> Result<()> {
        let tag = self.next_tag;
        self.next_tag += 1;
        self.pending = Some(tag);
        tx.send(Command::ScheduleAdvance { tag, delay })
            .await
            .context("failed to send ScheduleAdvance command")
    }

    async fn complete(&mut self, tx: &CommandSender) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        self.completed = true;
        tx.send(Command::Completed)
            .await
            .context("failed to send Completed command")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::Receiver<Command>) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    fn script() -> Vec<LectureStep> {
        vec![
            LectureStep {
                kind: StepKind::Announce,
                utterance: "Welcome!".into(),
                subtitle: Some("Welcome!".into()),
                display_text: None,
                placeholder: false,
            },
            LectureStep {
                kind: StepKind::Prompt,
                utterance: "I am".into(),
                subtitle: None,
                display_text: Some("I am _______.".into()),
                placeholder: true,
            },
            LectureStep {
                kind: StepKind::Prompt,
                utterance: "I am happy.".into(),
                subtitle: None,
                display_text: Some("I am happy.".into()),
                placeholder: false,
            },
        ]
    }

    #[test]
    fn name_extraction_prefers_i_am_then_name_phrases() {
        assert_eq!(extract_name("I am Jiho"), "Jiho");
        assert_eq!(extract_name("My name is Jiho"), "Jiho");
        assert_eq!(extract_name("I'm Jiho"), "Jiho");
        assert_eq!(extract_name("  Jiho  "), "Jiho");
        assert_eq!(extract_name(""), "Friend");
    }

    #[tokio::test]
    async fn announce_step_schedules_a_short_advance_after_playback() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut engine = LectureEngine::new(script());

        engine.begin(&tx).await.unwrap();
        assert_eq!(drain(&mut rx), vec![Command::Speak("Welcome!".into())]);

        engine.handle_speech_done(&tx).await.unwrap();
        let commands = drain(&mut rx);
        assert!(matches!(
            commands.as_slice(),
            [Command::ScheduleAdvance { delay, .. }] if *delay == ANNOUNCE_ADVANCE_DELAY
        ));
    }

    #[tokio::test]
    async fn placeholder_step_captures_the_name_once() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut engine = LectureEngine::new(script());

        engine.begin(&tx).await.unwrap();
        engine.handle_speech_done(&tx).await.unwrap();
        let tag = match drain(&mut rx).last() {
            Some(Command::ScheduleAdvance { tag, .. }) => *tag,
            other => panic!("expected ScheduleAdvance, got {other:?}"),
        };
        engine.handle_delay_elapsed(tag, &tx).await.unwrap();
        // Now on the placeholder prompt step.
        drain(&mut rx);
        engine.handle_speech_done(&tx).await.unwrap();
        // Placeholder steps chime before input is revealed.
        assert_eq!(drain(&mut rx), vec![Command::Chime]);
        assert!(engine.awaiting_input());
        assert_eq!(engine.prompt_display().as_deref(), Some("I am _______."));

        engine
            .handle_learner_input(Some("My name is Jiho"), &tx)
            .await
            .unwrap();
        assert_eq!(engine.captured_name(), Some("Jiho"));
        assert_eq!(engine.prompt_display().as_deref(), Some("I am Jiho."));

        let commands = drain(&mut rx);
        assert_eq!(commands[0], Command::Chime);
        assert!(matches!(
            commands[1],
            Command::ScheduleAdvance { delay, .. } if delay == REPLY_HEARD_DELAY
        ));
    }

    #[tokio::test]
    async fn stale_delay_tags_are_ignored() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut engine = LectureEngine::new(script());

        engine.begin(&tx).await.unwrap();
        engine.handle_speech_done(&tx).await.unwrap();
        drain(&mut rx);

        // A tag from a since-abandoned step never advances anything.
        engine.handle_delay_elapsed(999, &tx).await.unwrap();
        assert_eq!(engine.step_index(), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn unsupported_capture_counts_as_a_response_with_defaults() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut engine = LectureEngine::new(script());

        engine.begin(&tx).await.unwrap();
        engine.handle_speech_done(&tx).await.unwrap();
        let tag = match drain(&mut rx).last() {
            Some(Command::ScheduleAdvance { tag, .. }) => *tag,
            other => panic!("expected ScheduleAdvance, got {other:?}"),
        };
        engine.handle_delay_elapsed(tag, &tx).await.unwrap();
        drain(&mut rx);
        engine.handle_speech_done(&tx).await.unwrap();
        drain(&mut rx);

        engine.handle_learner_input(None, &tx).await.unwrap();
        assert_eq!(engine.captured_name(), Some("Friend"));
        let commands = drain(&mut rx);
        assert!(matches!(
            commands[1],
            Command::ScheduleAdvance { delay, .. } if delay == TAP_ONLY_DELAY
        ));
    }

    #[tokio::test]
    async fn completion_fires_exactly_once_after_the_last_step() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut engine = LectureEngine::new(script());
        engine.begin(&tx).await.unwrap();

        // Drive the whole script: finish every utterance, answer every
        // prompt, fire every timer as soon as it is scheduled.
        let mut completions = 0;
        let mut budget = 100;
        loop {
            budget -= 1;
            assert!(budget > 0, "lecture run did not terminate");

            let commands = drain(&mut rx);
            if commands.is_empty() {
                if engine.is_complete() {
                    break;
                }
                if engine.awaiting_input() {
                    engine.handle_learner_input(Some("ok"), &tx).await.unwrap();
                } else {
                    engine.handle_speech_done(&tx).await.unwrap();
                }
                continue;
            }
            for command in commands {
                match command {
                    Command::ScheduleAdvance { tag, .. } => {
                        engine.handle_delay_elapsed(tag, &tx).await.unwrap();
                    }
                    Command::Completed => completions += 1,
                    _ => {}
                }
            }
        }

        assert!(engine.is_complete());
        assert_eq!(completions, 1);

        // Nothing more comes out after completion.
        engine.handle_delay_elapsed(0, &tx).await.unwrap();
        assert!(drain(&mut rx).is_empty());
    }
}
