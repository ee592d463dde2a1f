//! Lesson script data model.
//!
//! The script content is static configuration: a fixed daily lesson is built
//! into [`crate::content`], and the tutor can load a JSON override with the
//! same shape. Everything here is immutable once a screen's engine has been
//! constructed.

use serde::{Deserialize, Serialize};

/// One step of the scripted lecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LectureStep {
    pub kind: StepKind,
    /// What the teacher voice says for this step.
    pub utterance: String,
    /// Subtitle shown while an announce step is playing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Text card shown on prompt steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,
    /// Marks the "I am _______." step where the learner's name is captured.
    #[serde(default)]
    pub placeholder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Teacher talks, then the flow auto-advances.
    Announce,
    /// Teacher models a line, then waits for the learner to repeat it.
    Prompt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupSentence {
    pub english: String,
    pub korean: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupBlock {
    pub title: String,
    pub sentences: Vec<WarmupSentence>,
}

/// A warmup sentence tagged with the block it came from. The flattening is
/// done once per session and never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSentence {
    pub block: usize,
    pub english: String,
    pub korean: String,
}

/// Flattens the blocks into one ordered sequence, preserving block order.
pub fn flatten_blocks(blocks: &[WarmupBlock]) -> Vec<FlatSentence> {
    let mut flat = Vec::new();
    for (block_idx, block) in blocks.iter().enumerate() {
        for sentence in &block.sentences {
            flat.push(FlatSentence {
                block: block_idx,
                english: sentence.english.clone(),
                korean: sentence.korean.clone(),
            });
        }
    }
    flat
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleplayScenario {
    pub id: u32,
    /// Scene label, e.g. the place where the exchange happens.
    pub scene: String,
    pub opening_line: String,
    /// Alternate openings used when a scenario is entered after the first.
    #[serde(default)]
    pub opening_variants: Vec<String>,
    /// Candidate replies, in display order. The first one doubles as the
    /// model answer on the wrong-answer path.
    pub choices: Vec<String>,
    pub reaction_line: String,
}

/// An AI conversation partner. One is drawn per roleplay run and kept for
/// every scenario in that run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub avatar: String,
}

/// One free-talk session: the AI line for turn `n` is `ai_lines[n]`, and the
/// last line closes the session without soliciting a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreetalkSession {
    pub ai_lines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreetalkScript {
    pub topic: String,
    pub sessions: Vec<FreetalkSession>,
    pub hint_phrases: Vec<String>,
    /// Persisted instead of the accumulator when the learner never produced
    /// a usable reply.
    pub fallback_replies: Vec<String>,
    /// Learner turns per session.
    pub turns_per_session: usize,
}

/// The whole daily lesson, loadable from a single JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub course: String,
    pub topic: String,
    pub lecture: Vec<LectureStep>,
    pub warmup: Vec<WarmupBlock>,
    pub roleplay: Vec<RoleplayScenario>,
    pub characters: Vec<Character>,
    pub freetalk: FreetalkScript,
}
