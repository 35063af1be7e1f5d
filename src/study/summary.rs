use chrono::NaiveDate;
use serde::Serialize;

use super::models::{Progress, Settings, StudyData, StudySession};

/// Dashboard view over the three study records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub lessons_completed: usize,
    pub sessions_recorded: usize,
    pub total_time_spent_secs: u64,
    /// Mean over recorded sessions, on whatever scale callers record.
    pub average_accuracy: Option<f64>,
    pub achievements_earned: usize,
    pub cards_scored: usize,
    pub cards_mastered: usize,
    pub cards_difficult: usize,
    pub cards_in_review: usize,
    pub day: NaiveDate,
    pub minutes_on_day: u64,
    pub daily_goal_minutes: u32,
    pub daily_goal_met: bool,
}

impl ProgressSummary {
    /// `day` is compared against session completion times in UTC.
    pub fn build(
        settings: &Settings,
        progress: &Progress,
        study: &StudyData,
        day: NaiveDate,
    ) -> Self {
        let sessions = &progress.study_sessions;
        let total_time_spent_secs = saturating_seconds(sessions.iter());
        let average_accuracy = if sessions.is_empty() {
            None
        } else {
            Some(sessions.iter().map(|s| s.accuracy).sum::<f64>() / sessions.len() as f64)
        };

        let seconds_on_day =
            saturating_seconds(sessions.iter().filter(|s| s.completed_at.date_naive() == day));
        let minutes_on_day = seconds_on_day / 60;

        Self {
            lessons_completed: progress.completed_lessons.len(),
            sessions_recorded: sessions.len(),
            total_time_spent_secs,
            average_accuracy,
            achievements_earned: progress.achievements.len(),
            cards_scored: progress.flashcard_progress.len(),
            cards_mastered: study.mastered_cards.len(),
            cards_difficult: study.difficult_cards.len(),
            cards_in_review: study.review_queue.len(),
            day,
            minutes_on_day,
            daily_goal_minutes: settings.daily_goal,
            daily_goal_met: minutes_on_day >= u64::from(settings.daily_goal),
        }
    }
}

/// Session durations come from stored or imported records and are clamped
/// at `u64::MAX` rather than wrapping.
fn saturating_seconds<'a, I>(sessions: I) -> u64
where
    I: Iterator<Item = &'a StudySession>,
{
    sessions.fold(0u64, |total, session| total.saturating_add(session.time_spent))
}
