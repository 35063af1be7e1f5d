//! Backup format shared by `StudyStore::export_data` and `import_data`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::merge::{ProgressPatch, SettingsPatch, StudyDataPatch};
use super::models::{Progress, Settings, StudyData};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExportBundle {
    pub settings: Settings,
    pub progress: Progress,
    pub study_data: StudyData,
    pub export_date: String,
}

/// A parsed import payload. Each section is optional and applied as a patch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportBundle {
    pub settings: Option<SettingsPatch>,
    pub progress: Option<ProgressPatch>,
    pub study_data: Option<StudyDataPatch>,
    pub export_date: Option<String>,
}

impl ImportBundle {
    pub fn is_empty(&self) -> bool {
        self.settings.is_none() && self.progress.is_none() && self.study_data.is_none()
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("import payload is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("import payload must be a JSON object")]
    NotAnObject,
    #[error("import payload has a malformed section: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Validates the whole payload before anything is applied.
pub fn parse_import(payload: &str) -> Result<ImportBundle, TransferError> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(TransferError::Parse)?;
    if !value.is_object() {
        return Err(TransferError::NotAnObject);
    }
    serde_json::from_value(value).map_err(TransferError::Malformed)
}
