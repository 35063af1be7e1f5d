use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::telemetry::events::record_playback_failure;

use super::error::PlaybackError;
use super::traits::{ClipRef, MediaBackend};

const TARGET: &str = "audio_sequencer";

pub const DEFAULT_INTER_CLIP_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Pause between the end of one clip and the start of the next.
    pub inter_clip_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            inter_clip_delay: DEFAULT_INTER_CLIP_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Failed,
}

/// Completion signal for one `play`/`play_sequence` call.
#[derive(Debug)]
pub struct PlaybackHandle {
    rx: oneshot::Receiver<Result<(), PlaybackError>>,
}

impl PlaybackHandle {
    /// `Some(Ok(()))` when every clip finished, `Some(Err(_))` on the first
    /// failing clip, `None` when a later call preempted this one.
    pub async fn wait(self) -> Option<Result<(), PlaybackError>> {
        self.rx.await.ok()
    }
}

struct Slot {
    generation: u64,
    state: PlaybackState,
    task: Option<JoinHandle<()>>,
}

/// Plays one clip, or one sequence of clips, at a time.
///
/// Every new `play`/`play_sequence` preempts whatever is in progress and
/// `stop` cancels it; a preempted call never reports an outcome. Requires a
/// running tokio runtime.
pub struct AudioSequencer {
    backend: Arc<dyn MediaBackend>,
    config: SequencerConfig,
    slot: Arc<Mutex<Slot>>,
    context_unlocked: AtomicBool,
}

impl std::fmt::Debug for AudioSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSequencer")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl AudioSequencer {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self::with_config(backend, SequencerConfig::default())
    }

    pub fn with_config(backend: Arc<dyn MediaBackend>, config: SequencerConfig) -> Self {
        Self {
            backend,
            config,
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                state: PlaybackState::Idle,
                task: None,
            })),
            context_unlocked: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> PlaybackState {
        lock_slot(&self.slot).state
    }

    pub fn play<C: Into<ClipRef>>(&self, clip: C) -> PlaybackHandle {
        self.start(vec![clip.into()])
    }

    pub fn play_sequence<I, C>(&self, clips: I) -> PlaybackHandle
    where
        I: IntoIterator<Item = C>,
        C: Into<ClipRef>,
    {
        self.start(clips.into_iter().map(Into::into).collect())
    }

    /// Halts and rewinds the current clip. No-op when nothing is playing.
    pub fn stop(&self) {
        let mut slot = lock_slot(&self.slot);
        if slot.state != PlaybackState::Playing {
            return;
        }
        self.preempt(&mut slot);
        slot.generation += 1;
        slot.state = PlaybackState::Idle;
        info!(target: TARGET, generation = slot.generation, "playback stopped");
    }

    pub async fn resume_audio_context(&self) -> Result<(), PlaybackError> {
        match self.backend.resume_context().await {
            Ok(()) => {
                debug!(target: TARGET, "audio context resumed");
                Ok(())
            }
            Err(err) => {
                warn!(target: TARGET, %err, "failed to resume audio context");
                Err(err)
            }
        }
    }

    /// First-interaction hook: resumes the audio context once and is a no-op
    /// afterwards. A failed resume re-arms the hook. Returns whether a resume
    /// was attempted and succeeded.
    pub async fn unlock_on_first_interaction(&self) -> Result<bool, PlaybackError> {
        if self.context_unlocked.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        match self.resume_audio_context().await {
            Ok(()) => Ok(true),
            Err(err) => {
                self.context_unlocked.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    fn start(&self, clips: Vec<ClipRef>) -> PlaybackHandle {
        let (tx, rx) = oneshot::channel();
        let mut slot = lock_slot(&self.slot);
        self.preempt(&mut slot);

        slot.generation += 1;
        slot.state = PlaybackState::Playing;
        let generation = slot.generation;
        debug!(target: TARGET, generation, clips = clips.len(), "starting playback");

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.slot);
        let delay = self.config.inter_clip_delay;

        slot.task = Some(tokio::spawn(async move {
            let outcome = play_clips(backend.as_ref(), &clips, delay).await;

            let mut current = lock_slot(&shared);
            if current.generation != generation {
                // Superseded after the last clip ended; dropping `tx` abandons
                // the handle.
                return;
            }
            current.state = if outcome.is_ok() {
                PlaybackState::Idle
            } else {
                PlaybackState::Failed
            };
            current.task = None;
            drop(current);

            let _ = tx.send(outcome);
        }));

        PlaybackHandle { rx }
    }

    /// Aborts the in-flight task, which drops its completion sender.
    fn preempt(&self, slot: &mut Slot) {
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        if slot.state == PlaybackState::Playing {
            self.backend.halt();
        }
    }
}

impl Drop for AudioSequencer {
    fn drop(&mut self) {
        if let Some(task) = lock_slot(&self.slot).task.take() {
            task.abort();
        }
    }
}

async fn play_clips(
    backend: &dyn MediaBackend,
    clips: &[ClipRef],
    delay: Duration,
) -> Result<(), PlaybackError> {
    for (position, clip) in clips.iter().enumerate() {
        if position > 0 && !delay.is_zero() {
            sleep(delay).await;
        }

        debug!(target: TARGET, clip = %clip, position, "playing clip");
        if let Err(err) = backend.play_clip(clip).await {
            record_playback_failure(clip.as_str(), position, clips.len(), &err);
            return Err(err);
        }
    }
    Ok(())
}

fn lock_slot(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
