//! Pronunciation clip playback.

mod error;
mod sequencer;
mod traits;

pub use error::PlaybackError;
pub use sequencer::{
    AudioSequencer, PlaybackHandle, PlaybackState, SequencerConfig, DEFAULT_INTER_CLIP_DELAY,
};
pub use traits::{ClipRef, MediaBackend};
