//! Per-screen driver loops.
//!
//! Each screen runs the same shape: drain the engine's command queue,
//! execute side effects (playback, chime, timers, persistence), call back
//! into the engine when an effect finishes, and gather learner input
//! whenever the engine is waiting for it. Timers come back through their
//! own channel so a stale tag simply gets ignored by the engine.

use crate::console::LineRecognizer;
use anyhow::{Context, Result};
use selfit_core::freetalk::FreetalkEngine;
use selfit_core::lecture::LectureEngine;
use selfit_core::listen::{ListenOptions, listen};
use selfit_core::message::{ChatMessage, Speaker};
use selfit_core::recap::RecapStore;
use selfit_core::roleplay::{RoleplayEngine, RoleplayPhase};
use selfit_core::script::Lesson;
use selfit_core::speech::SpeechOutput;
use selfit_core::warmup::WarmupEngine;
use selfit_core::{Command, CommandSender};
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Capture ceiling for the drill screens. The lecture screen keeps the
/// longer default window.
const DRILL_LISTEN_MAX: Duration = Duration::from_millis(8_000);

/// Everything a screen needs from the host.
pub struct ScreenPorts {
    pub output: Box<dyn SpeechOutput>,
    pub recognizer: LineRecognizer,
    pub store: Arc<dyn RecapStore>,
    /// Forces the capability-unavailable input paths.
    pub no_stt: bool,
}

impl ScreenPorts {
    fn chime(&self) {
        println!("🔔 ding");
    }

    /// Spawns the timer for a scheduled advance; the tag comes back on the
    /// timer channel when it fires.
    fn arm_timer(&self, tag: u64, delay: Duration, timer_tx: &mpsc::Sender<u64>) {
        let timer_tx = timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if timer_tx.send(tag).await.is_err() {
                tracing::debug!("timer fired after its screen closed (tag {tag})");
            }
        });
    }

    /// One capture window: `None` when recognition is off (the tap alone
    /// counts), `Some(transcript)` otherwise.
    async fn capture(&mut self, options: ListenOptions) -> Option<String> {
        if self.no_stt {
            println!("🎤 (speech input off — press enter to continue)");
            self.recognizer.read_line().await;
            return None;
        }
        Some(listen(&mut self.recognizer, options).await)
    }
}

fn channels() -> (CommandSender, mpsc::Receiver<Command>, mpsc::Sender<u64>, mpsc::Receiver<u64>) {
    let (tx, rx) = mpsc::channel::<Command>(32);
    let (timer_tx, timer_rx) = mpsc::channel::<u64>(16);
    (tx, rx, timer_tx, timer_rx)
}

pub async fn run_lecture(ports: &mut ScreenPorts, lesson: &Lesson) -> Result<()> {
    println!("\n=== Lecture: {} ===", lesson.topic);
    let (tx, mut rx, timer_tx, mut timer_rx) = channels();
    let mut engine = LectureEngine::new(lesson.lecture.clone());
    engine.begin(&tx).await?;

    let mut done = false;
    loop {
        while let Ok(command) = rx.try_recv() {
            match command {
                Command::Speak(text) => {
                    if let Some(card) = engine.prompt_display() {
                        println!("📋 {card}");
                    }
                    if let Some(subtitle) = engine.current_step().and_then(|s| s.subtitle.clone()) {
                        println!("   ({subtitle})");
                    }
                    ports.output.speak(&text, None).await;
                    engine.handle_speech_done(&tx).await?;
                }
                Command::Chime => ports.chime(),
                Command::ScheduleAdvance { tag, delay } => ports.arm_timer(tag, delay, &timer_tx),
                Command::Completed => done = true,
                other => tracing::warn!("unexpected lecture command: {other:?}"),
            }
        }
        if done {
            break;
        }
        if engine.awaiting_input() {
            let transcript = ports.capture(ListenOptions::default()).await;
            engine.handle_learner_input(transcript.as_deref(), &tx).await?;
            continue;
        }
        tokio::select! {
            Some(tag) = timer_rx.recv() => engine.handle_delay_elapsed(tag, &tx).await?,
            Some(command) = rx.recv() => {
                // Put it back through the drain on the next pass.
                execute_deferred(command, &tx).await?;
            }
        }
    }
    tracing::info!("lecture complete (learner name: {:?})", engine.captured_name());
    Ok(())
}

/// A command that arrived while blocked in select is re-queued so the
/// single drain loop stays the only place effects run.
async fn execute_deferred(command: Command, tx: &CommandSender) -> Result<()> {
    tx.send(command).await.context("failed to requeue command")
}

pub async fn run_warmup(ports: &mut ScreenPorts, lesson: &Lesson) -> Result<()> {
    println!("\n=== Warmup ===");
    let (tx, mut rx, timer_tx, mut timer_rx) = channels();
    let mut engine = WarmupEngine::new(&lesson.warmup);
    engine.begin(&tx).await?;

    let mut done = false;
    loop {
        while let Ok(command) = rx.try_recv() {
            match command {
                Command::Speak(text) => {
                    ports.output.speak(&text, None).await;
                    engine.handle_speech_done(&tx).await?;
                }
                Command::ScheduleAdvance { tag, delay } => ports.arm_timer(tag, delay, &timer_tx),
                Command::Completed => done = true,
                other => tracing::warn!("unexpected warmup command: {other:?}"),
            }
        }
        if done {
            break;
        }
        if let Some(praise) = engine.praise() {
            println!("⭐ {praise}");
        }
        if engine.awaiting_input() {
            print_warmup_card(&engine);
            let options = ListenOptions {
                max_duration: DRILL_LISTEN_MAX,
                ..ListenOptions::default()
            };
            let transcript = ports.capture(options).await;
            engine.handle_learner_input(transcript.as_deref(), &tx).await?;
            continue;
        }
        tokio::select! {
            Some(tag) = timer_rx.recv() => engine.handle_delay_elapsed(tag, &tx).await?,
            Some(command) = rx.recv() => execute_deferred(command, &tx).await?,
        }
    }
    Ok(())
}

fn print_warmup_card(engine: &WarmupEngine) {
    let Some(sentence) = engine.current_sentence() else {
        return;
    };
    println!("-- speed {} --", engine.speed());
    if engine.shows_english() {
        println!("📋 {}", sentence.english);
    }
    if engine.shows_korean() {
        println!("📋 {}", sentence.korean);
    }
    if engine.hint_visible() {
        if let Some(hint) = engine.hint() {
            println!("💡 starts with: {hint}");
        }
    }
}

pub async fn run_roleplay(ports: &mut ScreenPorts, lesson: &Lesson, rng: StdRng) -> Result<()> {
    println!("\n=== Roleplay ===");
    let (tx, mut rx, timer_tx, mut timer_rx) = channels();
    let mut engine = RoleplayEngine::new(lesson.roleplay.clone(), &lesson.characters, rng)?;
    println!(
        "Your partner today: {} {}",
        engine.character().avatar,
        engine.character().name
    );
    engine.begin(&tx).await?;

    let mut done = false;
    loop {
        while let Ok(command) = rx.try_recv() {
            match command {
                Command::Speak(text) => {
                    ports.output.speak(&text, None).await;
                    engine.handle_speech_done(&tx).await?;
                }
                Command::ScheduleAdvance { tag, delay } => ports.arm_timer(tag, delay, &timer_tx),
                Command::Completed => done = true,
                other => tracing::warn!("unexpected roleplay command: {other:?}"),
            }
        }
        if done {
            break;
        }
        if engine.warning_visible() {
            println!("⚠️  Try one of the answers below!");
        }
        if engine.phase() == RoleplayPhase::Review {
            print_transcript(engine.messages());
            println!("(press enter to finish the roleplay)");
            ports.recognizer.read_line().await;
            engine.confirm_review(&tx).await?;
            continue;
        }
        if engine.phase() == RoleplayPhase::AwaitingLearner && engine.affordances_visible() {
            roleplay_turn(ports, &mut engine, &tx).await?;
            continue;
        }
        tokio::select! {
            Some(tag) = timer_rx.recv() => engine.handle_delay_elapsed(tag, &tx).await?,
            Some(command) = rx.recv() => execute_deferred(command, &tx).await?,
        }
    }
    Ok(())
}

/// One learner turn: a number picks a choice, anything else is treated as
/// a transcript (when speech input is on).
async fn roleplay_turn(
    ports: &mut ScreenPorts,
    engine: &mut RoleplayEngine,
    tx: &CommandSender,
) -> Result<()> {
    let Some(scenario) = engine.current_scenario() else {
        return Ok(());
    };
    println!("장면: {}", scenario.scene);
    let choices = scenario.choices.clone();
    for (i, choice) in choices.iter().enumerate() {
        println!("  {}. {choice}", i + 1);
    }
    println!("(type a number to tap, or say it out loud)");

    let Some(line) = ports.recognizer.read_line().await else {
        return Ok(());
    };
    let line = line.trim().to_string();
    if let Ok(n) = line.parse::<usize>() {
        if let Some(choice) = choices.get(n.saturating_sub(1)) {
            return engine.handle_choice(choice, tx).await;
        }
    }
    if ports.no_stt || line.is_empty() {
        // Taps are the only affordance without recognition.
        let first = &choices[0];
        return engine.handle_choice(first, tx).await;
    }
    engine.handle_transcript(&line, tx).await
}

fn print_transcript(messages: &[ChatMessage]) {
    println!("--- 대화 다시보기 ---");
    for message in messages {
        match (&message.speaker, &message.character) {
            (Speaker::Ai, Some(character)) => {
                println!("{} {}: {}", character.avatar, character.name, message.text)
            }
            (Speaker::Ai, None) => println!("🤖 {}", message.text),
            (Speaker::Learner, _) => println!("🙂 you: {}", message.text),
        }
    }
}

pub async fn run_freetalk(ports: &mut ScreenPorts, lesson: &Lesson) -> Result<()> {
    println!("\n=== Freetalk: {} ===", lesson.freetalk.topic);
    let (tx, mut rx, _timer_tx, _timer_rx) = channels();
    let mut engine = FreetalkEngine::new(lesson.freetalk.clone())?;
    engine.begin(&tx).await?;

    let mut done = false;
    while !done {
        while let Ok(command) = rx.try_recv() {
            match command {
                Command::Speak(text) => {
                    ports.output.speak(&text, None).await;
                    engine.handle_speech_done(&tx).await?;
                }
                Command::SaveFreetalkReplies(replies) => {
                    ports
                        .store
                        .append_freetalk_messages(&replies)
                        .context("failed to persist freetalk replies")?;
                    tracing::info!("saved {} freetalk replies", replies.len());
                }
                Command::Completed => done = true,
                other => tracing::warn!("unexpected freetalk command: {other:?}"),
            }
        }
        if done {
            break;
        }
        if engine.awaiting_input() {
            freetalk_turn(ports, &mut engine, &tx).await?;
        }
    }
    Ok(())
}

/// One learner turn: a number taps a hint, anything else is a transcript.
async fn freetalk_turn(
    ports: &mut ScreenPorts,
    engine: &mut FreetalkEngine,
    tx: &CommandSender,
) -> Result<()> {
    for (i, hint) in engine.hints().iter().enumerate() {
        println!("  {}. 💡 {hint}", i + 1);
    }
    if engine.hints().is_empty() {
        let line = ports.recognizer.read_line().await.unwrap_or_default();
        return engine.handle_transcript(&line, tx).await;
    }
    if ports.no_stt {
        println!("(speech input off — type a hint number)");
        let line = ports.recognizer.read_line().await.unwrap_or_default();
        let index = line.trim().parse::<usize>().unwrap_or(1).saturating_sub(1);
        return engine.handle_hint_tap(index, tx).await;
    }

    println!("(type a hint number, or your own answer)");
    let Some(line) = ports.recognizer.read_line().await else {
        return engine.handle_transcript("", tx).await;
    };
    let trimmed = line.trim();
    if let Ok(n) = trimmed.parse::<usize>() {
        if n >= 1 && n <= engine.hints().len() {
            return engine.handle_hint_tap(n - 1, tx).await;
        }
    }
    engine.handle_transcript(trimmed, tx).await
}

/// The recap screen: one read of the stored record, rendered as a summary.
pub fn print_recap(store: &Arc<dyn RecapStore>) -> Result<()> {
    let recap = store.load().context("failed to load recap data")?;

    println!("\n=== Recap ===");
    println!("오늘의 표현:");
    for expression in &recap.target_expression_count {
        println!("  \"{}\" × {}", expression.phrase, expression.count);
    }
    println!("포인트: {}  주제 집중도: {}/100", recap.total_points, recap.topic_focus_score);
    if !recap.grammar_tips.is_empty() {
        println!("문법 팁:");
        for tip in &recap.grammar_tips {
            println!("  {} → {}  ({})", tip.before, tip.after, tip.explanation);
        }
    }
    if !recap.freetalk_messages.is_empty() {
        println!("프리토킹에서 한 말:");
        for message in &recap.freetalk_messages {
            println!("  🙂 {message}");
        }
    }
    Ok(())
}
