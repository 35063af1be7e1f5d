//! Persisted study records and their defaults.
//!
//! Records deserialize with container-level `#[serde(default)]`, so a stored
//! value missing some fields reads back fully populated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily study goal applied when the learner has not chosen one.
pub const DEFAULT_DAILY_GOAL_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// Learner preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub audio_enabled: bool,
    pub gamification_enabled: bool,
    pub difficulty: Difficulty,
    /// Minutes per day.
    pub daily_goal: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            gamification_enabled: true,
            difficulty: Difficulty::Beginner,
            daily_goal: DEFAULT_DAILY_GOAL_MINUTES,
        }
    }
}

/// One finished practice session. Never edited after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub user_id: String,
    pub lesson_id: String,
    pub completed_at: DateTime<Utc>,
    /// Scale is chosen by the caller (fraction or percentage).
    pub accuracy: f64,
    /// Seconds.
    pub time_spent: u64,
    #[serde(default)]
    pub mistakes: Vec<String>,
}

/// Cumulative learning record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progress {
    pub completed_lessons: Vec<String>,
    pub flashcard_progress: BTreeMap<String, u32>,
    pub study_sessions: Vec<StudySession>,
    pub achievements: Vec<String>,
}

impl Progress {
    pub fn is_lesson_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.iter().any(|id| id == lesson_id)
    }

    pub fn flashcard_score(&self, card_id: &str) -> Option<u32> {
        self.flashcard_progress.get(card_id).copied()
    }

    pub fn has_achievement(&self, achievement_id: &str) -> bool {
        self.achievements.iter().any(|id| id == achievement_id)
    }
}

/// Spaced-repetition bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyData {
    pub review_queue: Vec<String>,
    pub mastered_cards: Vec<String>,
    pub difficult_cards: Vec<String>,
}

impl StudyData {
    /// Front of the review queue.
    pub fn next_review(&self) -> Option<&str> {
        self.review_queue.first().map(String::as_str)
    }

    pub fn is_mastered(&self, card_id: &str) -> bool {
        self.mastered_cards.iter().any(|id| id == card_id)
    }

    pub fn is_difficult(&self, card_id: &str) -> bool {
        self.difficult_cards.iter().any(|id| id == card_id)
    }
}

/// Appends `id` unless already present. Returns whether the list changed.
pub(crate) fn insert_unique(list: &mut Vec<String>, id: &str) -> bool {
    if list.iter().any(|existing| existing == id) {
        return false;
    }
    list.push(id.to_string());
    true
}

/// Drops every occurrence of `id`. Returns whether the list changed.
pub(crate) fn remove_all(list: &mut Vec<String>, id: &str) -> bool {
    let before = list.len();
    list.retain(|existing| existing != id);
    list.len() != before
}
