//! Partial updates and the pure shallow merge applied by every `set_*` call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::models::{Difficulty, Progress, Settings, StudyData, StudySession};

/// Shallow merge: fields present in the patch replace the current value
/// wholesale, absent fields are kept.
pub trait Merge {
    type Patch;

    fn merge(&self, patch: &Self::Patch) -> Self;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamification_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_goal: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_lessons: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flashcard_progress: Option<BTreeMap<String, u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_sessions: Option<Vec<StudySession>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyDataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_queue: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastered_cards: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficult_cards: Option<Vec<String>>,
}

/// A single typed settings field, for `StudyStore::update_setting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingUpdate {
    AudioEnabled(bool),
    GamificationEnabled(bool),
    Difficulty(Difficulty),
    DailyGoal(u32),
}

impl SettingUpdate {
    pub fn field_name(&self) -> &'static str {
        match self {
            SettingUpdate::AudioEnabled(_) => "audioEnabled",
            SettingUpdate::GamificationEnabled(_) => "gamificationEnabled",
            SettingUpdate::Difficulty(_) => "difficulty",
            SettingUpdate::DailyGoal(_) => "dailyGoal",
        }
    }
}

impl From<SettingUpdate> for SettingsPatch {
    fn from(update: SettingUpdate) -> Self {
        let mut patch = SettingsPatch::default();
        match update {
            SettingUpdate::AudioEnabled(value) => patch.audio_enabled = Some(value),
            SettingUpdate::GamificationEnabled(value) => patch.gamification_enabled = Some(value),
            SettingUpdate::Difficulty(value) => patch.difficulty = Some(value),
            SettingUpdate::DailyGoal(value) => patch.daily_goal = Some(value),
        }
        patch
    }
}

impl Merge for Settings {
    type Patch = SettingsPatch;

    fn merge(&self, patch: &SettingsPatch) -> Self {
        Self {
            audio_enabled: patch.audio_enabled.unwrap_or(self.audio_enabled),
            gamification_enabled: patch
                .gamification_enabled
                .unwrap_or(self.gamification_enabled),
            difficulty: patch.difficulty.unwrap_or(self.difficulty),
            daily_goal: patch.daily_goal.unwrap_or(self.daily_goal),
        }
    }
}

impl Merge for Progress {
    type Patch = ProgressPatch;

    fn merge(&self, patch: &ProgressPatch) -> Self {
        Self {
            completed_lessons: pick(&patch.completed_lessons, &self.completed_lessons),
            flashcard_progress: pick(&patch.flashcard_progress, &self.flashcard_progress),
            study_sessions: pick(&patch.study_sessions, &self.study_sessions),
            achievements: pick(&patch.achievements, &self.achievements),
        }
    }
}

impl Merge for StudyData {
    type Patch = StudyDataPatch;

    fn merge(&self, patch: &StudyDataPatch) -> Self {
        Self {
            review_queue: pick(&patch.review_queue, &self.review_queue),
            mastered_cards: pick(&patch.mastered_cards, &self.mastered_cards),
            difficult_cards: pick(&patch.difficult_cards, &self.difficult_cards),
        }
    }
}

fn pick<T: Clone>(patched: &Option<T>, current: &T) -> T {
    patched.as_ref().unwrap_or(current).clone()
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            audio_enabled: Some(settings.audio_enabled),
            gamification_enabled: Some(settings.gamification_enabled),
            difficulty: Some(settings.difficulty),
            daily_goal: Some(settings.daily_goal),
        }
    }
}

impl From<Progress> for ProgressPatch {
    fn from(progress: Progress) -> Self {
        Self {
            completed_lessons: Some(progress.completed_lessons),
            flashcard_progress: Some(progress.flashcard_progress),
            study_sessions: Some(progress.study_sessions),
            achievements: Some(progress.achievements),
        }
    }
}

impl From<StudyData> for StudyDataPatch {
    fn from(data: StudyData) -> Self {
        Self {
            review_queue: Some(data.review_queue),
            mastered_cards: Some(data.mastered_cards),
            difficult_cards: Some(data.difficult_cards),
        }
    }
}
