//! Roleplay progression engine.
//!
//! Five short scenes with one AI partner, drawn at random when the engine is
//! built and kept for the whole run. Unlike the warmup screen, a spoken
//! reply here must match one of the displayed choices; a miss gets a warning
//! and a model answer instead of advancing.

use crate::matcher::best_choice;
use crate::message::{MessageLog, Speaker};
use crate::script::{Character, RoleplayScenario};
use crate::{Command, CommandSender};
use anyhow::{Context, Result, ensure};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;

const WRONG_WARNING_DELAY: Duration = Duration::from_millis(1_500);
const REVIEW_DELAY: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleplayPhase {
    /// The AI partner's opening line is playing.
    AwaitingAiLine,
    /// Choices and capture are live.
    AwaitingLearner,
    /// The AI reaction line is playing.
    AiReacting,
    /// Terminal read-only rendering of the full message log. Completion is
    /// emitted only when the learner confirms the review.
    Review,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    HideWarning,
    EnterReview,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    tag: u64,
    kind: PendingKind,
}

pub struct RoleplayEngine {
    scenarios: Vec<RoleplayScenario>,
    scenario_index: usize,
    phase: RoleplayPhase,
    character: Character,
    log: MessageLog,
    affordances_visible: bool,
    warning_visible: bool,
    replaying_model: bool,
    completed: bool,
    rng: StdRng,
    next_tag: u64,
    pending: Option<Pending>,
}

impl RoleplayEngine {
    /// Draws the run's character from the roster. The draw happens here,
    /// once, and is never repeated.
    pub fn new(
        scenarios: Vec<RoleplayScenario>,
        roster: &[Character],
        mut rng: StdRng,
    ) -> Result<Self> {
        let character = roster
            .choose(&mut rng)
            .cloned()
            .context("character roster is empty")?;
        ensure!(!scenarios.is_empty(), "no roleplay scenarios");
        ensure!(
            scenarios.iter().all(|s| !s.choices.is_empty()),
            "roleplay scenario with no choices"
        );
        Ok(Self {
            scenarios,
            scenario_index: 0,
            phase: RoleplayPhase::AwaitingAiLine,
            character,
            log: MessageLog::new(),
            affordances_visible: false,
            warning_visible: false,
            replaying_model: false,
            completed: false,
            rng,
            next_tag: 0,
            pending: None,
        })
    }

    pub fn phase(&self) -> RoleplayPhase {
        self.phase
    }

    pub fn scenario_index(&self) -> usize {
        self.scenario_index
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn current_scenario(&self) -> Option<&RoleplayScenario> {
        self.scenarios.get(self.scenario_index)
    }

    pub fn messages(&self) -> &[crate::message::ChatMessage] {
        self.log.messages()
    }

    pub fn affordances_visible(&self) -> bool {
        self.affordances_visible
    }

    pub fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub async fn begin(&mut self, tx: &CommandSender) -> Result<()> {
        self.enter_ai_line(tx).await
    }

    /// The first scenario always uses its fixed opening line. Every later
    /// entry re-draws: half the time the fixed line, otherwise a uniform
    /// pick from the variants when there are any.
    fn pick_opening(&mut self) -> String {
        let scenario = &self.scenarios[self.scenario_index];
        if self.scenario_index > 0
            && !scenario.opening_variants.is_empty()
            && self.rng.random_bool(0.5)
        {
            return scenario
                .opening_variants
                .choose(&mut self.rng)
                .cloned()
                .unwrap_or_else(|| scenario.opening_line.clone());
        }
        scenario.opening_line.clone()
    }

    async fn enter_ai_line(&mut self, tx: &CommandSender) -> Result<()> {
        self.phase = RoleplayPhase::AwaitingAiLine;
        self.affordances_visible = false;
        self.warning_visible = false;
        let text = self.pick_opening();
        self.log
            .push(Speaker::Ai, text.clone(), Some(self.character.clone()));
        tx.send(Command::Speak(text))
            .await
            .context("failed to send Speak command")
    }

    pub async fn handle_speech_done(&mut self, tx: &CommandSender) -> Result<()> {
        match self.phase {
            RoleplayPhase::AwaitingAiLine => {
                self.phase = RoleplayPhase::AwaitingLearner;
                self.affordances_visible = true;
                Ok(())
            }
            RoleplayPhase::AwaitingLearner if self.replaying_model => {
                self.replaying_model = false;
                self.affordances_visible = true;
                Ok(())
            }
            RoleplayPhase::AiReacting => {
                let reaction = self.scenarios[self.scenario_index].reaction_line.clone();
                self.log
                    .push(Speaker::Ai, reaction, Some(self.character.clone()));
                if self.scenario_index + 1 >= self.scenarios.len() {
                    self.schedule(PendingKind::EnterReview, REVIEW_DELAY, tx).await
                } else {
                    self.scenario_index += 1;
                    self.enter_ai_line(tx).await
                }
            }
            _ => Ok(()),
        }
    }

    /// A tapped choice is always accepted verbatim.
    pub async fn handle_choice(&mut self, choice: &str, tx: &CommandSender) -> Result<()> {
        if self.phase != RoleplayPhase::AwaitingLearner || !self.affordances_visible {
            return Ok(());
        }
        self.accept(choice.to_string(), tx).await
    }

    /// A spoken reply is matched against the scenario's choice set. A miss
    /// takes the wrong-answer path without changing phase or scenario.
    pub async fn handle_transcript(&mut self, transcript: &str, tx: &CommandSender) -> Result<()> {
        if self.phase != RoleplayPhase::AwaitingLearner || !self.affordances_visible {
            return Ok(());
        }
        let Some(scenario) = self.current_scenario() else {
            return Ok(());
        };
        match best_choice(transcript, &scenario.choices) {
            Some(matched) => {
                let matched = matched.to_string();
                self.accept(matched, tx).await
            }
            None => {
                self.affordances_visible = false;
                self.warning_visible = true;
                self.schedule(PendingKind::HideWarning, WRONG_WARNING_DELAY, tx)
                    .await
            }
        }
    }

    async fn accept(&mut self, reply: String, tx: &CommandSender) -> Result<()> {
        self.affordances_visible = false;
        self.warning_visible = false;
        self.log.push(Speaker::Learner, reply, None);
        self.phase = RoleplayPhase::AiReacting;
        let reaction = self.scenarios[self.scenario_index].reaction_line.clone();
        tx.send(Command::Speak(reaction))
            .await
            .context("failed to send Speak command")
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
            PendingKind::HideWarning => {
                // Replay the first choice as a model answer, then re-show
                // the affordances when it finishes.
                self.warning_visible = false;
                self.replaying_model = true;
                let model = self.scenarios[self.scenario_index].choices[0].clone();
                tx.send(Command::Speak(model))
                    .await
                    .context("failed to send Speak command")
            }
            PendingKind::EnterReview => {
                self.phase = RoleplayPhase::Review;
                Ok(())
            }
        }
    }

    /// The review screen's confirmation. This is the only place roleplay
    /// completes.
    pub async fn confirm_review(&mut self, tx: &CommandSender) -> Result<()> {
        if self.phase != RoleplayPhase::Review || self.completed {
            return Ok(());
        }
        self.completed = true;
        tx.send(Command::Completed)
            .await
            .context("failed to send Completed command")
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::Receiver<Command>) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(command) = rx.try_recv() {
            commands.push(command);
        }
        commands
    }

    fn scenarios() -> Vec<RoleplayScenario> {
        crate::content::builtin_lesson().roleplay
    }

    fn roster() -> Vec<Character> {
        crate::content::builtin_lesson().characters
    }

    fn engine(seed: u64) -> RoleplayEngine {
        RoleplayEngine::new(scenarios(), &roster(), StdRng::seed_from_u64(seed)).unwrap()
    }

    fn last_tag(commands: &[Command]) -> u64 {
        match commands.last() {
            Some(Command::ScheduleAdvance { tag, .. }) => *tag,
            other => panic!("expected ScheduleAdvance, got {other:?}"),
        }
    }

    #[test]
    fn construction_rejects_a_scenario_without_choices() {
        let mut scripted = scenarios();
        scripted[2].choices.clear();
        let result = RoleplayEngine::new(scripted, &roster(), StdRng::seed_from_u64(0));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn first_scenario_always_opens_with_the_fixed_line() {
        for seed in 0..8 {
            let (tx, mut rx) = mpsc::channel(32);
            let mut e = engine(seed);
            e.begin(&tx).await.unwrap();
            assert_eq!(
                drain(&mut rx),
                vec![Command::Speak("Hi! I am Selena. What is your name?".into())]
            );
        }
    }

    #[tokio::test]
    async fn tapped_choice_is_accepted_verbatim_and_reaction_plays() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut e = engine(1);
        e.begin(&tx).await.unwrap();
        e.handle_speech_done(&tx).await.unwrap();
        assert_eq!(e.phase(), RoleplayPhase::AwaitingLearner);
        assert!(e.affordances_visible());
        drain(&mut rx);

        e.handle_choice("I am Jane", &tx).await.unwrap();
        assert_eq!(e.phase(), RoleplayPhase::AiReacting);
        assert_eq!(
            drain(&mut rx),
            vec![Command::Speak("Nice to meet you! Let's go in.".into())]
        );
        let learner: Vec<_> = e
            .messages()
            .iter()
            .filter(|m| m.speaker == crate::message::Speaker::Learner)
            .collect();
        assert_eq!(learner.len(), 1);
        assert_eq!(learner[0].text, "I am Jane");
    }

    #[tokio::test]
    async fn wrong_transcript_never_advances_phase_or_scenario() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut e = engine(2);
        e.begin(&tx).await.unwrap();
        e.handle_speech_done(&tx).await.unwrap();
        drain(&mut rx);

        e.handle_transcript("purple elephants", &tx).await.unwrap();
        assert_eq!(e.phase(), RoleplayPhase::AwaitingLearner);
        assert_eq!(e.scenario_index(), 0);
        assert!(e.warning_visible());
        assert!(!e.affordances_visible());

        let commands = drain(&mut rx);
        let tag = last_tag(&commands);
        assert!(matches!(
            commands.as_slice(),
            [Command::ScheduleAdvance { delay, .. }] if *delay == WRONG_WARNING_DELAY
        ));

        // Warning clears and the first choice replays as a model answer.
        e.handle_delay_elapsed(tag, &tx).await.unwrap();
        assert!(!e.warning_visible());
        assert_eq!(drain(&mut rx), vec![Command::Speak("I am Minsoo".into())]);

        // Model playback finishing re-shows the affordances, same state.
        e.handle_speech_done(&tx).await.unwrap();
        assert_eq!(e.phase(), RoleplayPhase::AwaitingLearner);
        assert!(e.affordances_visible());
        assert_eq!(e.scenario_index(), 0);
    }

    #[tokio::test]
    async fn spoken_match_is_accepted_as_the_choice_text() {
        let (tx, mut rx) = mpsc::channel(32);
        let mut e = engine(3);
        e.begin(&tx).await.unwrap();
        e.handle_speech_done(&tx).await.unwrap();
        drain(&mut rx);

        e.handle_transcript("i am tom", &tx).await.unwrap();
        assert_eq!(e.phase(), RoleplayPhase::AiReacting);
        let learner_text = &e.messages().last().unwrap().text;
        assert_eq!(learner_text, "I am Tom");
    }

    #[tokio::test]
    async fn later_openings_come_from_the_fixed_line_or_its_variants() {
        // Give the second scenario variants so the re-draw path has
        // something to pick from.
        let mut scripted = scenarios();
        scripted[1].opening_variants =
            vec!["Feeling good today?".to_string(), "How do you feel?".to_string()];
        let mut allowed = vec![scripted[1].opening_line.clone()];
        allowed.extend(scripted[1].opening_variants.clone());

        let mut seen = std::collections::HashSet::new();
        for seed in 0..16 {
            let (tx, mut rx) = mpsc::channel(32);
            let mut e =
                RoleplayEngine::new(scripted.clone(), &roster(), StdRng::seed_from_u64(seed))
                    .unwrap();
            e.begin(&tx).await.unwrap();
            e.handle_speech_done(&tx).await.unwrap();
            drain(&mut rx);
            e.handle_choice("I am Tom", &tx).await.unwrap();
            drain(&mut rx);
            // Reaction done: moves on to scenario 2's opening.
            e.handle_speech_done(&tx).await.unwrap();

            let opening = match drain(&mut rx).pop() {
                Some(Command::Speak(text)) => text,
                other => panic!("expected Speak, got {other:?}"),
            };
            assert!(allowed.contains(&opening), "unexpected opening {opening}");
            seen.insert(opening);
        }
        // Across 16 seeds both the fixed line and a variant show up.
        assert!(seen.len() > 1, "the re-draw never varied");
    }

    #[tokio::test]
    async fn full_run_keeps_one_character_and_completes_only_on_confirm() {
        let (tx, mut rx) = mpsc::channel(256);
        let mut e = engine(4);
        e.begin(&tx).await.unwrap();
        let character = e.character().clone();

        let mut budget = 100;
        while e.phase() != RoleplayPhase::Review {
            budget -= 1;
            assert!(budget > 0, "roleplay run did not terminate");

            let commands = drain(&mut rx);
            if commands.is_empty() {
                if e.affordances_visible() {
                    let first = e.current_scenario().unwrap().choices[0].clone();
                    e.handle_choice(&first, &tx).await.unwrap();
                } else {
                    e.handle_speech_done(&tx).await.unwrap();
                }
                continue;
            }
            for command in commands {
                if let Command::ScheduleAdvance { tag, .. } = command {
                    e.handle_delay_elapsed(tag, &tx).await.unwrap();
                }
            }
        }

        // Review never completes by itself.
        assert!(!e.is_complete());
        assert!(drain(&mut rx).is_empty());

        // Every AI message carries the character drawn at start.
        for message in e.messages() {
            match message.speaker {
                crate::message::Speaker::Ai => {
                    assert_eq!(message.character.as_ref(), Some(&character));
                }
                crate::message::Speaker::Learner => assert!(message.character.is_none()),
            }
        }
        // 5 scenarios: opening + reaction per scenario, plus 5 replies.
        assert_eq!(e.messages().len(), 15);

        e.confirm_review(&tx).await.unwrap();
        assert_eq!(drain(&mut rx), vec![Command::Completed]);
        e.confirm_review(&tx).await.unwrap();
        assert!(drain(&mut rx).is_empty());
    }
}
