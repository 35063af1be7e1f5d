//! Tagalog Learning Core
//!
//! Persistence of a learner's settings, progress and review state, plus the
//! sequencer that plays pronunciation clips one at a time.

pub mod audio;
pub mod config;
pub mod dirs_compat;
pub mod storage;
pub mod study;
pub mod telemetry;
