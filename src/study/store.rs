use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
use crate::telemetry::events::{record_import_outcome, record_storage_fault};

use super::merge::{Merge, ProgressPatch, SettingUpdate, SettingsPatch, StudyDataPatch};
use super::models::{insert_unique, remove_all, Progress, Settings, StudyData, StudySession};
use super::summary::ProgressSummary;
use super::transfer::{parse_import, ExportBundle};

pub const SETTINGS_KEY: &str = "settings";
pub const PROGRESS_KEY: &str = "progress";
pub const STUDY_DATA_KEY: &str = "study-data";

const TARGET: &str = "study_store";

/// Sole writer of the persisted study records.
///
/// Reads never fail: a missing, corrupt or unreachable record reads as its
/// defaults. Writes return a [`StorageResult`] and also log any fault, so a
/// caller that ignores the result still gets fail-soft behaviour. Each
/// mutation is a full read-modify-write of one record.
#[derive(Clone)]
pub struct StudyStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for StudyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyStore")
            .field("backend", &self.store.backend_name())
            .finish()
    }
}

impl StudyStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    // ---- settings ----

    pub fn settings(&self) -> Settings {
        self.read_or_default(SETTINGS_KEY)
    }

    pub fn load_settings(&self) -> StorageResult<Settings> {
        self.load_record(SETTINGS_KEY)
    }

    /// Shallow-merges `patch` onto the current settings and persists them.
    pub fn set_settings(&self, patch: &SettingsPatch) -> StorageResult<Settings> {
        let merged = self.settings().merge(patch);
        self.save_record(SETTINGS_KEY, &merged)?;
        Ok(merged)
    }

    pub fn update_setting(&self, update: SettingUpdate) -> StorageResult<Settings> {
        debug!(target: TARGET, field = update.field_name(), "updating setting");
        self.set_settings(&update.into())
    }

    // ---- progress ----

    pub fn progress(&self) -> Progress {
        self.read_or_default(PROGRESS_KEY)
    }

    pub fn load_progress(&self) -> StorageResult<Progress> {
        self.load_record(PROGRESS_KEY)
    }

    pub fn set_progress(&self, patch: &ProgressPatch) -> StorageResult<Progress> {
        let merged = self.progress().merge(patch);
        self.save_record(PROGRESS_KEY, &merged)?;
        Ok(merged)
    }

    /// Returns `Ok(false)` without writing when the lesson is already recorded.
    pub fn add_completed_lesson(&self, lesson_id: &str) -> StorageResult<bool> {
        self.update_record(PROGRESS_KEY, |progress: &mut Progress| {
            insert_unique(&mut progress.completed_lessons, lesson_id)
        })
    }

    /// Last write wins.
    pub fn update_flashcard_progress(&self, card_id: &str, score: u32) -> StorageResult<()> {
        self.update_record(PROGRESS_KEY, |progress: &mut Progress| {
            progress
                .flashcard_progress
                .insert(card_id.to_string(), score);
            true
        })
        .map(|_| ())
    }

    /// Sessions are appended as given; identity is the caller's concern.
    pub fn add_study_session(&self, session: StudySession) -> StorageResult<()> {
        info!(
            target: TARGET,
            session_id = %session.id,
            lesson_id = %session.lesson_id,
            time_spent = session.time_spent,
            "recording study session"
        );
        self.update_record(PROGRESS_KEY, move |progress: &mut Progress| {
            progress.study_sessions.push(session);
            true
        })
        .map(|_| ())
    }

    pub fn add_achievement(&self, achievement_id: &str) -> StorageResult<bool> {
        self.update_record(PROGRESS_KEY, |progress: &mut Progress| {
            insert_unique(&mut progress.achievements, achievement_id)
        })
    }

    // ---- study data ----

    pub fn study_data(&self) -> StudyData {
        self.read_or_default(STUDY_DATA_KEY)
    }

    pub fn load_study_data(&self) -> StorageResult<StudyData> {
        self.load_record(STUDY_DATA_KEY)
    }

    pub fn set_study_data(&self, patch: &StudyDataPatch) -> StorageResult<StudyData> {
        let merged = self.study_data().merge(patch);
        self.save_record(STUDY_DATA_KEY, &merged)?;
        Ok(merged)
    }

    pub fn add_to_review_queue(&self, card_id: &str) -> StorageResult<bool> {
        self.update_record(STUDY_DATA_KEY, |data: &mut StudyData| {
            insert_unique(&mut data.review_queue, card_id)
        })
    }

    /// Removes every occurrence of `card_id`.
    pub fn remove_from_review_queue(&self, card_id: &str) -> StorageResult<bool> {
        self.update_record(STUDY_DATA_KEY, |data: &mut StudyData| {
            remove_all(&mut data.review_queue, card_id)
        })
    }

    /// Marks the card mastered and drops it from the difficult set in the
    /// same write. Already-mastered cards are left untouched.
    pub fn mark_card_as_mastered(&self, card_id: &str) -> StorageResult<bool> {
        self.update_record(STUDY_DATA_KEY, |data: &mut StudyData| {
            if !insert_unique(&mut data.mastered_cards, card_id) {
                return false;
            }
            remove_all(&mut data.difficult_cards, card_id);
            true
        })
    }

    /// Does not remove the card from the mastered set.
    pub fn mark_card_as_difficult(&self, card_id: &str) -> StorageResult<bool> {
        self.update_record(STUDY_DATA_KEY, |data: &mut StudyData| {
            insert_unique(&mut data.difficult_cards, card_id)
        })
    }

    // ---- whole-store operations ----

    /// Deletes all three records. Every removal is attempted; the first
    /// failure is returned.
    pub fn clear_all_data(&self) -> StorageResult<()> {
        let mut first_error = None;
        for key in [SETTINGS_KEY, PROGRESS_KEY, STUDY_DATA_KEY] {
            if let Err(err) = self.store.remove_item(key) {
                record_storage_fault(key, "remove", self.backend_name(), &err);
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!(target: TARGET, backend = self.backend_name(), "cleared all study data");
                Ok(())
            }
        }
    }

    /// Pretty JSON snapshot of all records, stamped with the current time.
    pub fn export_data(&self) -> StorageResult<String> {
        self.export_data_at(Utc::now())
    }

    pub fn export_data_at(&self, exported_at: DateTime<Utc>) -> StorageResult<String> {
        let bundle = ExportBundle {
            settings: self.settings(),
            progress: self.progress(),
            study_data: self.study_data(),
            export_date: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        serde_json::to_string_pretty(&bundle)
            .map_err(|err| StorageError::serialization("export", err))
    }

    /// Returns `false` and leaves every record untouched when the payload
    /// cannot be parsed. Otherwise merges each present section and returns
    /// `true`; write faults after a successful parse are logged only.
    pub fn import_data(&self, payload: &str) -> bool {
        let bundle = match parse_import(payload) {
            Ok(bundle) => bundle,
            Err(err) => {
                record_import_outcome(false, &[], None, Some(err.to_string()));
                return false;
            }
        };

        let mut sections = Vec::new();
        if let Some(patch) = &bundle.settings {
            let _ = self.set_settings(patch);
            sections.push(SETTINGS_KEY);
        }
        if let Some(patch) = &bundle.progress {
            let _ = self.set_progress(patch);
            sections.push(PROGRESS_KEY);
        }
        if let Some(patch) = &bundle.study_data {
            let _ = self.set_study_data(patch);
            sections.push(STUDY_DATA_KEY);
        }

        record_import_outcome(true, &sections, bundle.export_date.as_deref(), None);
        true
    }

    pub fn summary(&self, day: NaiveDate) -> ProgressSummary {
        ProgressSummary::build(&self.settings(), &self.progress(), &self.study_data(), day)
    }

    // ---- record plumbing ----

    fn load_record<T: DeserializeOwned + Default>(&self, key: &str) -> StorageResult<T> {
        match self.store.get_item(key)? {
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|err| StorageError::serialization(key, err))
            }
            None => Ok(T::default()),
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load_record(key).unwrap_or_else(|err| {
            record_storage_fault(key, "read", self.backend_name(), &err);
            T::default()
        })
    }

    fn save_record<T: Serialize>(&self, key: &str, record: &T) -> StorageResult<()> {
        let result = serde_json::to_string(record)
            .map_err(|err| StorageError::serialization(key, err))
            .and_then(|encoded| self.store.set_item(key, &encoded));

        if let Err(err) = &result {
            record_storage_fault(key, "write", self.backend_name(), err);
        }
        result
    }

    /// `mutate` reports whether it changed the record; unchanged records are
    /// not written back.
    fn update_record<T, F>(&self, key: &str, mutate: F) -> StorageResult<bool>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> bool,
    {
        let mut record: T = self.read_or_default(key);
        if !mutate(&mut record) {
            return Ok(false);
        }
        self.save_record(key, &record)?;
        Ok(true)
    }
}
