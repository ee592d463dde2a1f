//! Recap record and its store.
//!
//! The recap screen reads a single namespaced record with read-merge-write
//! semantics: a save only overwrites the fields it provides, everything else
//! keeps its prior stored value, and the first read is seeded with defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Storage namespace for the one persisted record.
pub const STORAGE_KEY: &str = "selfit_recap_data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionCount {
    pub phrase: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarTip {
    pub before: String,
    pub after: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecapData {
    pub target_expression_count: Vec<ExpressionCount>,
    pub total_points: u32,
    /// 0–100.
    pub topic_focus_score: u8,
    pub grammar_tips: Vec<GrammarTip>,
    pub freetalk_messages: Vec<String>,
}

impl RecapData {
    /// The record handed out before anything has been saved.
    pub fn seeded() -> Self {
        Self {
            target_expression_count: vec![
                ExpressionCount {
                    phrase: "I am".to_string(),
                    count: 12,
                },
                ExpressionCount {
                    phrase: "Nice to meet you".to_string(),
                    count: 3,
                },
            ],
            total_points: 150,
            topic_focus_score: 80,
            grammar_tips: vec![
                GrammarTip {
                    before: "I am happy today.".to_string(),
                    after: "I am happy today!".to_string(),
                    explanation: "감정을 강하게 말할 땐 느낌표를 써요.".to_string(),
                },
                GrammarTip {
                    before: "She am a student.".to_string(),
                    after: "She is a student.".to_string(),
                    explanation: "'She' 뒤에는 'is'를 써요.".to_string(),
                },
            ],
            freetalk_messages: Vec::new(),
        }
    }

    /// Field-wise merge: every `Some` in the patch replaces the stored
    /// value, every `None` keeps it.
    pub fn merged(mut self, patch: RecapPatch) -> Self {
        if let Some(v) = patch.target_expression_count {
            self.target_expression_count = v;
        }
        if let Some(v) = patch.total_points {
            self.total_points = v;
        }
        if let Some(v) = patch.topic_focus_score {
            self.topic_focus_score = v;
        }
        if let Some(v) = patch.grammar_tips {
            self.grammar_tips = v;
        }
        if let Some(v) = patch.freetalk_messages {
            self.freetalk_messages = v;
        }
        self
    }
}

/// A partial record for read-merge-write saves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecapPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_expression_count: Option<Vec<ExpressionCount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_focus_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grammar_tips: Option<Vec<GrammarTip>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freetalk_messages: Option<Vec<String>>,
}

pub trait RecapStore: Send + Sync {
    /// The current record, or the seeded defaults when nothing has been
    /// saved yet. Loading twice without an intervening save returns equal
    /// records.
    fn load(&self) -> Result<RecapData>;

    /// Read-merge-write with [`RecapData::merged`] semantics.
    fn save(&self, patch: RecapPatch) -> Result<()>;

    /// Appends to the stored free-talk message list.
    fn append_freetalk_messages(&self, messages: &[String]) -> Result<()> {
        let mut all = self.load()?.freetalk_messages;
        all.extend_from_slice(messages);
        self.save(RecapPatch {
            freetalk_messages: Some(all),
            ..RecapPatch::default()
        })
    }
}

/// In-memory store used by tests and capability-less hosts.
#[derive(Debug, Default)]
pub struct MemoryRecapStore {
    record: Mutex<Option<RecapData>>,
}

impl MemoryRecapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecapStore for MemoryRecapStore {
    fn load(&self) -> Result<RecapData> {
        let record = self.record.lock().expect("recap store poisoned");
        Ok(record.clone().unwrap_or_else(RecapData::seeded))
    }

    fn save(&self, patch: RecapPatch) -> Result<()> {
        let mut record = self.record.lock().expect("recap store poisoned");
        let current = record.clone().unwrap_or_else(RecapData::seeded);
        *record = Some(current.merged(patch));
        Ok(())
    }
}
