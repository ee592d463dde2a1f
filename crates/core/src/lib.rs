pub mod content;
pub mod freetalk;
pub mod lecture;
pub mod listen;
pub mod matcher;
pub mod message;
pub mod recap;
pub mod roleplay;
pub mod script;
pub mod speech;
pub mod voices;
pub mod warmup;

use std::time::Duration;

/// Commands the progression engines issue to the host runtime.
///
/// This enum is the primary API for decoupling an engine's decision-making
/// from the runtime's execution of side effects (speaking, timers,
/// persistence). The host executes a command and calls back into the engine
/// (`handle_speech_done`, `handle_delay_elapsed`) when the effect finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Play the given utterance through the speech output port, then call
    /// `handle_speech_done`. Language is auto-detected by the port.
    Speak(String),
    /// Play the short confirmation chime.
    Chime,
    /// Start a timer and call `handle_delay_elapsed(tag)` when it fires.
    /// The engine ignores tags that no longer match its pending transition,
    /// so a stale timer firing after a step change is harmless.
    ScheduleAdvance { tag: u64, delay: Duration },
    /// Append the learner's free-talk replies to the recap store.
    SaveFreetalkReplies(Vec<String>),
    /// The screen's flow is finished. Emitted exactly once per engine run.
    Completed,
}

pub type CommandSender = tokio::sync::mpsc::Sender<Command>;
