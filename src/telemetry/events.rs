use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::PlaybackError;
use crate::storage::StorageError;

pub(crate) const TARGET: &str = "telemetry::study";
pub(crate) const EVENT_STORAGE_FAULT: &str = "storage_fault";
pub(crate) const EVENT_IMPORT_OUTCOME: &str = "import_outcome";
pub(crate) const EVENT_PLAYBACK_FAILURE: &str = "playback_failure";

#[derive(Debug, Serialize)]
pub struct StorageFaultEvent<'a> {
    pub key: &'a str,
    pub operation: &'static str,
    pub backend: &'static str,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ImportOutcomeEvent<'a> {
    pub accepted: bool,
    pub sections: &'a [&'static str],
    /// `exportDate` carried by the imported backup, as written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaybackFailureEvent<'a> {
    pub clip: &'a str,
    pub position: usize,
    pub sequence_len: usize,
    pub code: &'static str,
    pub message: String,
}

/// Storage faults are contained by the caller; this only reports them.
/// A missing backend is expected outside a real host and logs at debug.
pub fn record_storage_fault(
    key: &str,
    operation: &'static str,
    backend: &'static str,
    err: &StorageError,
) {
    let event = StorageFaultEvent {
        key,
        operation,
        backend,
        code: err.code(),
        message: err.to_string(),
    };

    let payload = match serde_json::to_string(&event) {
        Ok(payload) => payload,
        Err(encode_err) => {
            warn!(
                target: TARGET,
                event = EVENT_STORAGE_FAULT,
                %encode_err,
                "failed to encode storage fault event"
            );
            return;
        }
    };

    if matches!(err, StorageError::Unavailable) {
        debug!(
            target: TARGET,
            event = EVENT_STORAGE_FAULT,
            key,
            operation,
            payload = %payload
        );
    } else {
        warn!(
            target: TARGET,
            event = EVENT_STORAGE_FAULT,
            key,
            operation,
            backend,
            code = event.code,
            payload = %payload
        );
    }
}

pub fn record_import_outcome(
    accepted: bool,
    sections: &[&'static str],
    export_date: Option<&str>,
    error: Option<String>,
) {
    let event = ImportOutcomeEvent {
        accepted,
        sections,
        export_date,
        error,
    };

    match serde_json::to_string(&event) {
        Ok(payload) if accepted => info!(
            target: TARGET,
            event = EVENT_IMPORT_OUTCOME,
            accepted,
            section_count = sections.len(),
            export_date = export_date.unwrap_or("unknown"),
            payload = %payload
        ),
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_IMPORT_OUTCOME,
            accepted,
            payload = %payload
        ),
        Err(err) => warn!(
            target: TARGET,
            event = EVENT_IMPORT_OUTCOME,
            %err,
            "failed to encode import outcome event"
        ),
    }
}

pub fn record_playback_failure(
    clip: &str,
    position: usize,
    sequence_len: usize,
    err: &PlaybackError,
) {
    let event = PlaybackFailureEvent {
        clip,
        position,
        sequence_len,
        code: err.code(),
        message: err.to_string(),
    };

    match serde_json::to_string(&event) {
        Ok(payload) => warn!(
            target: TARGET,
            event = EVENT_PLAYBACK_FAILURE,
            clip,
            position,
            code = event.code,
            payload = %payload
        ),
        Err(encode_err) => warn!(
            target: TARGET,
            event = EVENT_PLAYBACK_FAILURE,
            %encode_err,
            "failed to encode playback failure event"
        ),
    }
}
