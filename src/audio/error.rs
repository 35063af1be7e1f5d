use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("clip resource unavailable: {clip}")]
    ResourceUnavailable { clip: String },
    #[error("clip {clip} could not be decoded: {message}")]
    Decode { clip: String, message: String },
    #[error("playback blocked until the user interacts with the page")]
    AutoplayBlocked,
    #[error("media backend failure: {message}")]
    Backend { message: String },
}

impl PlaybackError {
    pub fn unavailable<S: Into<String>>(clip: S) -> Self {
        Self::ResourceUnavailable { clip: clip.into() }
    }

    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PlaybackError::ResourceUnavailable { .. } => "resource_unavailable",
            PlaybackError::Decode { .. } => "decode",
            PlaybackError::AutoplayBlocked => "autoplay_blocked",
            PlaybackError::Backend { .. } => "backend",
        }
    }
}
