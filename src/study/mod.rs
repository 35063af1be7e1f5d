//! Study state: learner settings, cumulative progress and spaced-repetition
//! bookkeeping, persisted through a [`KeyValueStore`](crate::storage::KeyValueStore).

pub mod merge;
pub mod models;
mod store;
pub mod summary;
pub mod transfer;

pub use merge::{Merge, ProgressPatch, SettingUpdate, SettingsPatch, StudyDataPatch};
pub use models::{Difficulty, Progress, Settings, StudyData, StudySession};
pub use store::{StudyStore, PROGRESS_KEY, SETTINGS_KEY, STUDY_DATA_KEY};
pub use summary::ProgressSummary;
pub use transfer::{parse_import, ImportBundle, TransferError};

#[cfg(test)]
mod tests;
