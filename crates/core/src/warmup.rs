//! Warmup progression engine.
//!
//! Drills the flattened sentence list three times at increasing speed
//! levels. Level 1 exposes each sentence over three sub-steps (spoken
//! English, English only, Korean only), level 2 over two (English, Korean,
//! both with a hint timer), level 3 over one (Korean with a hint timer).
//! This screen never rejects an answer: any response, spoken or tapped,
//! counts.

use crate::script::{FlatSentence, WarmupBlock, flatten_blocks};
use crate::{Command, CommandSender};
use anyhow::{Context, Result};
use std::time::Duration;

const HINT_DELAY: Duration = Duration::from_millis(3_000);
const PRAISE_DELAY: Duration = Duration::from_millis(1_200);

const PRAISE: [&str; 3] = ["Good!", "Great!", "Perfect!"];

fn praise_for(speed: u8) -> &'static str {
    (speed as usize)
        .checked_sub(1)
        .and_then(|i| PRAISE.get(i))
        .copied()
        .unwrap_or("Perfect!")
}

/// Sub-steps available at a speed level.
fn sub_steps_for(speed: u8) -> u8 {
    match speed {
        1 => 3,
        2 => 2,
        _ => 1,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    RevealHint,
    PraiseDone,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    tag: u64,
    kind: PendingKind,
}

pub struct WarmupEngine {
    sentences: Vec<FlatSentence>,
    speed: u8,
    sentence_index: usize,
    sub_step: u8,
    awaiting_input: bool,
    hint_visible: bool,
    praise: Option<&'static str>,
    completed: bool,
    next_tag: u64,
    pending: Option<Pending>,
}

impl WarmupEngine {
    /// Flattens the blocks once; the flattening is permanent for the run.
    pub fn new(blocks: &[WarmupBlock]) -> Self {
        Self {
            sentences: flatten_blocks(blocks),
            speed: 1,
            sentence_index: 0,
            sub_step: 1,
            awaiting_input: false,
            hint_visible: false,
            praise: None,
            completed: false,
            next_tag: 0,
            pending: None,
        }
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn sentence_index(&self) -> usize {
        self.sentence_index
    }

    pub fn sub_step(&self) -> u8 {
        self.sub_step
    }

    pub fn current_sentence(&self) -> Option<&FlatSentence> {
        self.sentences.get(self.sentence_index)
    }

    pub fn awaiting_input(&self) -> bool {
        self.awaiting_input
    }

    pub fn praise(&self) -> Option<&'static str> {
        self.praise
    }

    pub fn hint_visible(&self) -> bool {
        self.hint_visible
    }

    /// The hint text: the first word of the English sentence.
    pub fn hint(&self) -> Option<&str> {
        self.current_sentence()
            .and_then(|s| s.english.split_whitespace().next())
    }

    /// Whether the English text is currently shown.
    pub fn shows_english(&self) -> bool {
        (self.speed == 1 && self.sub_step <= 2) || (self.speed == 2 && self.sub_step == 1)
    }

    /// Whether the Korean text is currently shown.
    pub fn shows_korean(&self) -> bool {
        (self.speed == 1 && self.sub_step == 3)
            || (self.speed == 2 && self.sub_step == 2)
            || self.speed == 3
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub async fn begin(&mut self, tx: &CommandSender) -> Result<()> {
        if self.sentences.is_empty() {
            return self.complete(tx).await;
        }
        self.enter_sub_step(tx).await
    }

    /// Sets up the current (speed, sentence, sub-step) cell: speaks the
    /// English line on the very first exposure, otherwise reveals input
    /// directly, arming the hint timer at the faster levels.
    async fn enter_sub_step(&mut self, tx: &CommandSender) -> Result<()> {
        self.hint_visible = false;
        if self.speed == 1 && self.sub_step == 1 {
            self.awaiting_input = false;
            let english = self
                .current_sentence()
                .map(|s| s.english.clone())
                .unwrap_or_default();
            return tx
                .send(Command::Speak(english))
                .await
                .context("failed to send Speak command");
        }

        self.awaiting_input = true;
        if self.speed >= 2 {
            self.schedule(PendingKind::RevealHint, HINT_DELAY, tx).await?;
        }
        Ok(())
    }

    pub async fn handle_speech_done(&mut self, _tx: &CommandSender) -> Result<()> {
        if self.speed == 1 && self.sub_step == 1 && !self.completed {
            self.awaiting_input = true;
        }
        Ok(())
    }

    /// Accepts the learner's response unconditionally. The transcript is
    /// intentionally not validated against the target sentence.
    pub async fn handle_learner_input(
        &mut self,
        _transcript: Option<&str>,
        tx: &CommandSender,
    ) -> Result<()> {
        if !self.awaiting_input {
            return Ok(());
        }
        self.awaiting_input = false;
        self.hint_visible = false;
        // A response cancels any armed hint timer.
        if matches!(self.pending, Some(p) if p.kind == PendingKind::RevealHint) {
            self.pending = None;
        }

        if self.sub_step < sub_steps_for(self.speed) {
            self.sub_step += 1;
            return self.enter_sub_step(tx).await;
        }

        // Sentence finished at this speed level: praise, then move on.
        self.praise = Some(praise_for(self.speed));
        self.schedule(PendingKind::PraiseDone, PRAISE_DELAY, tx).await
    }

    pub async fn handle_delay_elapsed(&mut self, tag: u64, tx: &CommandSender) -> Result<()> {
        let Some(pending) = self.pending else {
            return Ok(());
        };
        if pending.tag != tag {
            return Ok(());
        }
        self.pending = None;

        match pending.kind {
            PendingKind::RevealHint => {
                if self.awaiting_input {
                    self.hint_visible = true;
                }
                Ok(())
            }
            PendingKind::PraiseDone => {
                self.praise = None;
                if self.sentence_index + 1 < self.sentences.len() {
                    self.sentence_index += 1;
                    self.sub_step = 1;
                    self.enter_sub_step(tx).await
                } else if self.speed < 3 {
                    self.speed += 1;
                    self.sentence_index = 0;
                    self.sub_step = 1;
                    self.enter_sub_step(tx).await
                } else {
                    self.complete(tx).await
                }
            }
        }
    }

    async fn schedule(
        &mut self,
        kind: PendingKind,
        delay: Duration,
        tx: &CommandSender,
    ) -> Result<()> {
        let tag = self.next_tag;
        self.next_tag += 1;
        self.pending = Some(Pending { tag, kind });
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
    use crate::script::WarmupSentence;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::Receiver<Command>) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    fn blocks() -> Vec<WarmupBlock> {
        vec![WarmupBlock {
            title: "패턴".into(),
            sentences: vec![
                WarmupSentence {
                    english: "I am happy.".into(),
                    korean: "나는 행복해요.".into(),
                },
                WarmupSentence {
                    english: "I am sad.".into(),
                    korean: "나는 슬퍼요.".into(),
                },
            ],
        }]
    }

    async fn respond(engine: &mut WarmupEngine, tx: &CommandSender) {
        engine.handle_learner_input(Some(""), tx).await.unwrap();
    }

    fn last_tag(commands: &[Command]) -> u64 {
        match commands.last() {
            Some(Command::ScheduleAdvance { tag, .. }) => *tag,
            other => panic!("expected ScheduleAdvance, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn level_one_runs_three_sub_steps_then_praises_with_good() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut engine = WarmupEngine::new(&blocks());

        engine.begin(&tx).await.unwrap();
        assert_eq!(drain(&mut rx), vec![Command::Speak("I am happy.".into())]);
        engine.handle_speech_done(&tx).await.unwrap();
        assert!(engine.awaiting_input());
        assert!(engine.shows_english());

        respond(&mut engine, &tx).await; // -> sub-step 2
        assert_eq!(engine.sub_step(), 2);
        assert!(engine.shows_english());

        respond(&mut engine, &tx).await; // -> sub-step 3, Korean
        assert_eq!(engine.sub_step(), 3);
        assert!(engine.shows_korean());

        respond(&mut engine, &tx).await; // sentence done
        assert_eq!(engine.praise(), Some("Good!"));
        let commands = drain(&mut rx);
        assert!(matches!(
            commands.as_slice(),
            [Command::ScheduleAdvance { delay, .. }] if *delay == PRAISE_DELAY
        ));

        engine
            .handle_delay_elapsed(last_tag(&commands), &tx)
            .await
            .unwrap();
        assert_eq!(engine.praise(), None);
        assert_eq!(engine.sentence_index(), 1);
        assert_eq!(engine.sub_step(), 1);
    }

    #[tokio::test]
    async fn sentence_index_resets_exactly_when_speed_increments() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut engine = WarmupEngine::new(&blocks());
        engine.begin(&tx).await.unwrap();

        // Run level 1 to the end: 2 sentences x 3 sub-steps.
        for _ in 0..2 {
            engine.handle_speech_done(&tx).await.unwrap();
            for _ in 0..3 {
                respond(&mut engine, &tx).await;
            }
            let tag = last_tag(&drain(&mut rx));
            engine.handle_delay_elapsed(tag, &tx).await.unwrap();
        }

        assert_eq!(engine.speed(), 2);
        assert_eq!(engine.sentence_index(), 0);
        assert_eq!(engine.sub_step(), 1);
    }

    #[tokio::test]
    async fn hint_appears_after_the_delay_and_any_response_cancels_it() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut engine = WarmupEngine::new(&blocks());
        // Jump straight into a hint-armed cell.
        engine.speed = 3;
        engine.begin(&tx).await.unwrap();

        let commands = drain(&mut rx);
        let tag = last_tag(&commands);
        assert!(matches!(
            commands.as_slice(),
            [Command::ScheduleAdvance { delay, .. }] if *delay == HINT_DELAY
        ));
        assert!(!engine.hint_visible());

        engine.handle_delay_elapsed(tag, &tx).await.unwrap();
        assert!(engine.hint_visible());
        assert_eq!(engine.hint(), Some("I"));

        // Respond; the next cell re-arms a fresh timer whose old tag is
        // stale.
        respond(&mut engine, &tx).await;
        assert!(!engine.hint_visible());
        engine.handle_delay_elapsed(tag, &tx).await.unwrap();
        assert!(!engine.hint_visible());
    }

    #[tokio::test]
    async fn response_before_the_hint_fires_cancels_the_pending_timer() {
        let (tx, mut rx) = mpsc::channel(64);
        let mut engine = WarmupEngine::new(&blocks());
        engine.speed = 2;
        engine.begin(&tx).await.unwrap();
        let tag = last_tag(&drain(&mut rx));

        respond(&mut engine, &tx).await;
        // The stale hint timer fires after the sub-step changed: no hint.
        engine.handle_delay_elapsed(tag, &tx).await.unwrap();
        assert!(!engine.hint_visible());
    }

    #[tokio::test]
    async fn completion_fires_after_level_three_last_praise() {
        let (tx, mut rx) = mpsc::channel(256);
        let mut engine = WarmupEngine::new(&blocks());
        engine.begin(&tx).await.unwrap();

        let mut completions = 0;
        let mut budget = 200;
        while !engine.is_complete() {
            budget -= 1;
            assert!(budget > 0, "warmup run did not terminate");

            let commands = drain(&mut rx);
            if commands.is_empty() {
                if engine.awaiting_input() {
                    respond(&mut engine, &tx).await;
                } else if engine.praise().is_none() {
                    engine.handle_speech_done(&tx).await.unwrap();
                }
                continue;
            }
            for command in commands {
                match command {
                    Command::ScheduleAdvance { tag, .. } => {
                        // Only fire praise timers promptly; hint timers are
                        // irrelevant to progression.
                        engine.handle_delay_elapsed(tag, &tx).await.unwrap();
                    }
                    Command::Completed => completions += 1,
                    _ => {}
                }
            }
        }

        assert_eq!(completions + drain(&mut rx)
            .iter()
            .filter(|c| **c == Command::Completed)
            .count(), 1);
        assert_eq!(engine.speed(), 3);
    }

    #[tokio::test]
    async fn praise_falls_back_to_perfect_for_unmapped_levels() {
        assert_eq!(praise_for(1), "Good!");
        assert_eq!(praise_for(2), "Great!");
        assert_eq!(praise_for(3), "Perfect!");
        assert_eq!(praise_for(7), "Perfect!");
    }
}
