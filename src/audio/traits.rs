use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::PlaybackError;

/// Opaque locator for a pronunciation clip, usually a URL. Resolved by the
/// media backend only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipRef(String);

impl ClipRef {
    pub fn new<S: Into<String>>(locator: S) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipRef {
    fn from(locator: &str) -> Self {
        Self::new(locator)
    }
}

impl From<String> for ClipRef {
    fn from(locator: String) -> Self {
        Self(locator)
    }
}

/// Host media primitive driven by [`AudioSequencer`](super::AudioSequencer).
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Resolves once the clip has played to the end.
    async fn play_clip(&self, clip: &ClipRef) -> Result<(), PlaybackError>;

    /// Stops any output and rewinds to the start.
    fn halt(&self);

    /// Re-activates a suspended audio context. Platforms with autoplay
    /// restrictions only allow this from a user gesture.
    async fn resume_context(&self) -> Result<(), PlaybackError>;
}
