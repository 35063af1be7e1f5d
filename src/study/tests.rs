use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::Value;

use super::*;
use crate::storage::{
    FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult, UnavailableStore,
};

fn sample_session(id: &str) -> StudySession {
    StudySession {
        id: id.into(),
        user_id: "learner-1".into(),
        lesson_id: "greetings".into(),
        completed_at: Utc.with_ymd_and_hms(2024, 3, 14, 18, 45, 12).unwrap(),
        accuracy: 87.5,
        time_spent: 300,
        mistakes: vec!["kumusta".into(), "salamat".into()],
    }
}

fn store_with_backend() -> (StudyStore, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    (StudyStore::new(backend.clone()), backend)
}

fn populated_store() -> StudyStore {
    let store = StudyStore::in_memory();
    store
        .set_settings(&SettingsPatch {
            audio_enabled: Some(false),
            difficulty: Some(Difficulty::Intermediate),
            daily_goal: Some(25),
            ..SettingsPatch::default()
        })
        .expect("settings");
    store.add_completed_lesson("alphabet").expect("lesson");
    store.add_completed_lesson("greetings").expect("lesson");
    store.update_flashcard_progress("card-1", 80).expect("score");
    store.update_flashcard_progress("card-2", 40).expect("score");
    store.add_study_session(sample_session("s-1")).expect("session");
    store.add_achievement("first-lesson").expect("achievement");
    store.add_to_review_queue("card-2").expect("queue");
    store.mark_card_as_mastered("card-1").expect("mastered");
    store.mark_card_as_difficult("card-2").expect("difficult");
    store
}

#[test]
fn fresh_store_reads_defaults() {
    let store = StudyStore::in_memory();
    assert_eq!(store.settings(), Settings::default());
    assert_eq!(store.progress(), Progress::default());
    assert_eq!(store.study_data(), StudyData::default());
}

#[test]
fn set_settings_overwrites_only_patched_fields() {
    let store = StudyStore::in_memory();
    store
        .set_settings(&SettingsPatch {
            difficulty: Some(Difficulty::Advanced),
            ..SettingsPatch::default()
        })
        .expect("first patch");
    let before = store.settings();

    let returned = store
        .set_settings(&SettingsPatch {
            daily_goal: Some(40),
            gamification_enabled: Some(false),
            ..SettingsPatch::default()
        })
        .expect("second patch");

    let after = store.settings();
    assert_eq!(returned, after);
    assert_eq!(after.daily_goal, 40);
    assert!(!after.gamification_enabled);
    assert_eq!(after.difficulty, Difficulty::Advanced);
    assert_eq!(after.audio_enabled, before.audio_enabled);
}

#[test]
fn update_setting_changes_a_single_field() {
    let store = StudyStore::in_memory();
    store
        .update_setting(SettingUpdate::AudioEnabled(false))
        .expect("update");
    let settings = store.settings();
    assert!(!settings.audio_enabled);
    assert_eq!(
        Settings {
            audio_enabled: true,
            ..settings
        },
        Settings::default()
    );
}

#[test]
fn stored_record_missing_fields_reads_fully_populated() {
    let (store, backend) = store_with_backend();
    backend
        .set_item(SETTINGS_KEY, r#"{"dailyGoal": 5}"#)
        .expect("seed");

    let settings = store.settings();
    assert_eq!(settings.daily_goal, 5);
    assert!(settings.audio_enabled);
    assert_eq!(settings.difficulty, Difficulty::Beginner);
}

#[test]
fn corrupt_record_reads_as_defaults_but_strict_load_reports_it() {
    let (store, backend) = store_with_backend();
    backend
        .set_item(PROGRESS_KEY, "{not json")
        .expect("seed corrupt record");

    assert_eq!(store.progress(), Progress::default());
    assert!(matches!(
        store.load_progress(),
        Err(StorageError::Serialization { .. })
    ));
}

#[test]
fn completed_lessons_are_unique() {
    let store = StudyStore::in_memory();
    assert!(store.add_completed_lesson("numbers").expect("first"));
    assert!(!store.add_completed_lesson("numbers").expect("second"));

    let progress = store.progress();
    assert_eq!(progress.completed_lessons, vec!["numbers".to_string()]);
    assert!(progress.is_lesson_completed("numbers"));
}

/// Counts writes reaching the backend.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl KeyValueStore for CountingStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.inner.remove_item(key)
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}

#[test]
fn idempotent_operations_skip_the_write() {
    let backend = Arc::new(CountingStore::default());
    let store = StudyStore::new(backend.clone());

    store.add_completed_lesson("colors").expect("first");
    store.add_achievement("streak-3").expect("first");
    store.add_to_review_queue("card-1").expect("first");
    store.mark_card_as_mastered("card-2").expect("first");
    store.mark_card_as_difficult("card-3").expect("first");
    assert_eq!(backend.writes.load(Ordering::SeqCst), 5);

    assert!(!store.add_completed_lesson("colors").expect("repeat"));
    assert!(!store.add_achievement("streak-3").expect("repeat"));
    assert!(!store.add_to_review_queue("card-1").expect("repeat"));
    assert!(!store.mark_card_as_mastered("card-2").expect("repeat"));
    assert!(!store.mark_card_as_difficult("card-3").expect("repeat"));
    assert!(!store.remove_from_review_queue("missing").expect("absent"));
    assert_eq!(backend.writes.load(Ordering::SeqCst), 5);
}

#[test]
fn flashcard_score_is_last_write_wins() {
    let store = StudyStore::in_memory();
    store.update_flashcard_progress("card-1", 80).expect("first");
    store.update_flashcard_progress("card-1", 95).expect("second");
    assert_eq!(store.progress().flashcard_score("card-1"), Some(95));
    assert_eq!(store.progress().flashcard_score("card-9"), None);
}

#[test]
fn study_sessions_append_without_deduplication() {
    let store = StudyStore::in_memory();
    store.add_study_session(sample_session("s-1")).expect("first");
    store.add_study_session(sample_session("s-1")).expect("second");
    store.add_study_session(sample_session("s-2")).expect("third");

    let ids: Vec<String> = store
        .progress()
        .study_sessions
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["s-1", "s-1", "s-2"]);
}

#[test]
fn session_accuracy_reads_back_bit_for_bit() {
    let accuracies = [0.9254501330892357_f64, 0.1 + 0.2, 2.0_f64.sqrt() / 2.0];
    let store = StudyStore::in_memory();
    for (i, accuracy) in accuracies.iter().enumerate() {
        let mut session = sample_session(&format!("s-{i}"));
        session.accuracy = *accuracy;
        store.add_study_session(session).expect("session");
    }

    let stored: Vec<u64> = store
        .progress()
        .study_sessions
        .iter()
        .map(|s| s.accuracy.to_bits())
        .collect();
    let expected: Vec<u64> = accuracies.iter().map(|a| a.to_bits()).collect();
    assert_eq!(stored, expected);
}

#[test]
fn achievements_are_unique() {
    let store = StudyStore::in_memory();
    assert!(store.add_achievement("streak-7").expect("first"));
    assert!(!store.add_achievement("streak-7").expect("second"));
    assert!(store.add_achievement("perfect-quiz").expect("third"));
    assert_eq!(store.progress().achievements.len(), 2);
    assert!(store.progress().has_achievement("perfect-quiz"));
}

#[test]
fn review_queue_scenario() {
    let store = StudyStore::in_memory();

    assert!(store.add_to_review_queue("card-42").expect("add"));
    assert_eq!(store.study_data().review_queue, vec!["card-42".to_string()]);

    assert!(!store.add_to_review_queue("card-42").expect("re-add"));
    assert_eq!(store.study_data().review_queue, vec!["card-42".to_string()]);

    assert!(store.remove_from_review_queue("card-42").expect("remove"));
    assert!(store.study_data().review_queue.is_empty());
    assert!(!store.remove_from_review_queue("card-42").expect("absent"));
}

#[test]
fn remove_from_review_queue_drops_every_occurrence() {
    let store = StudyStore::in_memory();
    store
        .set_study_data(&StudyDataPatch {
            review_queue: Some(vec!["a".into(), "b".into(), "a".into()]),
            ..StudyDataPatch::default()
        })
        .expect("seed");

    store.remove_from_review_queue("a").expect("remove");
    let data = store.study_data();
    assert_eq!(data.review_queue, vec!["b".to_string()]);
    assert_eq!(data.next_review(), Some("b"));
}

#[test]
fn mastering_a_card_removes_it_from_difficult() {
    let store = StudyStore::in_memory();
    store.mark_card_as_difficult("card-7").expect("difficult");
    assert!(store.mark_card_as_mastered("card-7").expect("mastered"));

    let data = store.study_data();
    assert!(data.is_mastered("card-7"));
    assert!(!data.is_difficult("card-7"));
}

#[test]
fn mastering_twice_is_a_no_op() {
    let store = StudyStore::in_memory();
    assert!(store.mark_card_as_mastered("card-3").expect("first"));
    assert!(!store.mark_card_as_mastered("card-3").expect("second"));
    assert_eq!(store.study_data().mastered_cards, vec!["card-3".to_string()]);
}

// markCardAsDifficult intentionally keeps the card in the mastered set.
// Changing this is a product decision; update this test when it is made.
#[test]
fn marking_difficult_keeps_card_mastered() {
    let store = StudyStore::in_memory();
    store.mark_card_as_mastered("card-5").expect("mastered");
    assert!(store.mark_card_as_difficult("card-5").expect("difficult"));
    assert!(!store.mark_card_as_difficult("card-5").expect("repeat"));

    let data = store.study_data();
    assert!(data.is_mastered("card-5"));
    assert!(data.is_difficult("card-5"));
}

#[test]
fn clear_all_data_reverts_to_defaults() {
    let (store, backend) = store_with_backend();
    store.add_completed_lesson("alphabet").expect("lesson");
    store.add_to_review_queue("card-1").expect("queue");
    store
        .update_setting(SettingUpdate::DailyGoal(60))
        .expect("setting");

    store.clear_all_data().expect("clear");
    assert!(backend.is_empty());
    assert_eq!(store.settings(), Settings::default());
    assert_eq!(store.progress(), Progress::default());
    assert_eq!(store.study_data(), StudyData::default());
}

#[test]
fn export_contains_all_sections_and_timestamp() {
    let store = populated_store();
    let exported_at = Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap();
    let exported = store.export_data_at(exported_at).expect("export");

    assert!(exported.contains('\n'), "export is pretty printed");
    let value: Value = serde_json::from_str(&exported).expect("valid json");
    assert_eq!(value["exportDate"], "2024-04-02T10:00:00.000Z");
    assert_eq!(value["settings"]["dailyGoal"], 25);
    assert_eq!(value["progress"]["completedLessons"][1], "greetings");
    assert_eq!(value["studyData"]["masteredCards"][0], "card-1");
}

#[test]
fn export_clear_import_restores_everything() {
    let store = populated_store();
    let settings = store.settings();
    let progress = store.progress();
    let study = store.study_data();

    let exported = store.export_data().expect("export");
    store.clear_all_data().expect("clear");
    assert_eq!(store.progress(), Progress::default());

    assert!(store.import_data(&exported));
    assert_eq!(store.settings(), settings);
    assert_eq!(store.progress(), progress);
    assert_eq!(store.study_data(), study);
}

#[test]
fn invalid_import_leaves_records_unchanged() {
    let store = populated_store();
    let settings = store.settings();
    let progress = store.progress();
    let study = store.study_data();

    assert!(!store.import_data("not valid data"));
    assert!(!store.import_data(r#"{"settings": {"dailyGoal": 10}, "progress": 7}"#));

    assert_eq!(store.settings(), settings);
    assert_eq!(store.progress(), progress);
    assert_eq!(store.study_data(), study);
}

#[test]
fn partial_import_touches_only_present_sections() {
    let store = populated_store();
    let progress = store.progress();
    let study = store.study_data();

    assert!(store.import_data(r#"{"settings": {"audioEnabled": true}}"#));

    let settings = store.settings();
    assert!(settings.audio_enabled);
    assert_eq!(settings.daily_goal, 25, "unlisted fields keep their value");
    assert_eq!(store.progress(), progress);
    assert_eq!(store.study_data(), study);
}

#[test]
fn unavailable_storage_is_fail_soft() {
    let store = StudyStore::new(Arc::new(UnavailableStore));

    assert_eq!(store.settings(), Settings::default());
    assert!(matches!(
        store.add_completed_lesson("alphabet"),
        Err(StorageError::Unavailable)
    ));
    assert_eq!(store.progress(), Progress::default());
    assert!(store.clear_all_data().is_err());
    assert!(store.import_data(r#"{"settings": {"dailyGoal": 1}}"#));
    assert_eq!(store.backend_name(), "unavailable");
}

#[test]
fn quota_exhaustion_drops_the_write_and_keeps_prior_state() {
    let backend = Arc::new(MemoryStore::with_quota(160));
    let store = StudyStore::new(backend);
    store.add_completed_lesson("a").expect("fits");
    let before = store.progress();

    let long_id = "x".repeat(200);
    let err = store
        .add_completed_lesson(&long_id)
        .expect_err("quota exceeded");
    assert!(matches!(err, StorageError::QuotaExceeded { .. }));
    assert_eq!(store.progress(), before);
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    {
        let store = StudyStore::new(Arc::new(FileStore::open(dir.path()).expect("open")));
        store.add_achievement("first-lesson").expect("achievement");
        store.mark_card_as_mastered("card-9").expect("mastered");
    }

    let reopened = StudyStore::new(Arc::new(FileStore::open(dir.path()).expect("reopen")));
    assert!(reopened.progress().has_achievement("first-lesson"));
    assert!(reopened.study_data().is_mastered("card-9"));
    assert_eq!(reopened.backend_name(), "file");
}

#[test]
fn summary_reflects_stored_records() {
    let store = populated_store();
    let summary = store.summary(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());

    assert_eq!(summary.lessons_completed, 2);
    assert_eq!(summary.sessions_recorded, 1);
    assert_eq!(summary.cards_scored, 2);
    assert_eq!(summary.cards_mastered, 1);
    assert_eq!(summary.cards_difficult, 1);
    assert_eq!(summary.cards_in_review, 1);
    assert_eq!(summary.minutes_on_day, 5);
    assert_eq!(summary.daily_goal_minutes, 25);
    assert!(!summary.daily_goal_met);
}
