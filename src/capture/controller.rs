use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use uuid::Uuid;

use super::backend::{CaptureBackend, NullCaptureBackend};
use super::types::{CaptureMode, CaptureOutcome, CaptureStatus, OutcomeSource};
use crate::config::CaptureConfig;
use crate::timing::{RecordingClock, MAX_RECORDING_DURATION, TICK_INTERVAL};
use crate::types::{CameraPosition, RecordedVideo, RecordingState};

const COMPLETION_CAPACITY: usize = 16;

/// Output locations planned for the two channels of one recording
#[derive(Debug, Clone)]
struct ChannelOutputs {
    front: PathBuf,
    back: PathBuf,
}

impl ChannelOutputs {
    fn path(&self, position: CameraPosition) -> &Path {
        match position {
            CameraPosition::Front => &self.front,
            CameraPosition::Back => &self.back,
        }
    }
}

/// Everything `finalize` needs once the session lock is released
struct PendingStop {
    generation: u64,
    elapsed_secs: f64,
    created_at: DateTime<Utc>,
    outputs: Option<ChannelOutputs>,
}

struct Session<B> {
    backend: B,
    state: RecordingState,
    clock: RecordingClock,
    generation: u64,
    outputs: Option<ChannelOutputs>,
    active: Vec<CameraPosition>,
    started_at: Option<DateTime<Utc>>,
    ticker: Option<JoinHandle<()>>,
}

impl<B: CaptureBackend> Session<B> {
    fn status(&self) -> CaptureStatus {
        CaptureStatus {
            state: self.state,
            elapsed: self.clock.elapsed(),
            remaining: self.clock.remaining(),
            progress: self.clock.progress(),
        }
    }

    /// Start every available channel; failures only leave the channel out
    fn open_channels(&mut self, config: &CaptureConfig) {
        if let Err(e) = std::fs::create_dir_all(&config.output_directory) {
            log::warn!(
                "Failed to create output directory {:?}: {}",
                config.output_directory,
                e
            );
        }

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let tag = Uuid::new_v4().simple().to_string();
        let outputs = ChannelOutputs {
            front: config.output_directory.join(format!(
                "{}-{}-front.{}",
                stamp,
                &tag[..8],
                config.file_extension
            )),
            back: config.output_directory.join(format!(
                "{}-{}-back.{}",
                stamp,
                &tag[..8],
                config.file_extension
            )),
        };

        self.active.clear();
        for position in CameraPosition::ALL {
            if !self.backend.is_channel_available(position) {
                log::warn!("{} camera unavailable, recording without it", position);
                continue;
            }
            match self.backend.start_channel(position, outputs.path(position)) {
                Ok(()) => {
                    log::debug!("{} channel writing to {:?}", position, outputs.path(position));
                    self.active.push(position);
                }
                Err(e) => log::warn!("Failed to start {} channel: {}", position, e),
            }
        }
        self.outputs = Some(outputs);
    }

    fn begin_stop(&mut self) -> PendingStop {
        self.state = RecordingState::Stopping;
        for position in self.active.drain(..) {
            if let Err(e) = self.backend.stop_channel(position) {
                log::warn!("Failed to stop {} channel: {}", position, e);
            }
        }
        PendingStop {
            generation: self.generation,
            elapsed_secs: self.clock.elapsed().as_secs_f64(),
            created_at: self.started_at.take().unwrap_or_else(Utc::now),
            outputs: self.outputs.take(),
        }
    }
}

struct Shared<B> {
    session: Mutex<Session<B>>,
    status: watch::Sender<CaptureStatus>,
    completions: broadcast::Sender<CaptureOutcome>,
    config: CaptureConfig,
    mode: CaptureMode,
}

impl<B: CaptureBackend> Shared<B> {
    fn publish(&self, session: &Session<B>) {
        self.status.send_replace(session.status());
    }

    async fn finalize(&self, pending: PendingStop) -> CaptureOutcome {
        let outcome = match pending.outputs {
            None => CaptureOutcome {
                video: self.placeholder(pending.elapsed_secs, pending.created_at),
                source: OutcomeSource::Simulated,
            },
            Some(outputs) => {
                tokio::time::sleep(self.config.finalize_grace()).await;

                let missing: Vec<CameraPosition> = CameraPosition::ALL
                    .into_iter()
                    .filter(|position| !outputs.path(*position).exists())
                    .collect();

                let video = RecordedVideo::new(outputs.front, outputs.back, pending.elapsed_secs)
                    .with_created_at(pending.created_at);

                if missing.is_empty() {
                    CaptureOutcome {
                        video,
                        source: OutcomeSource::Captured,
                    }
                } else {
                    log::warn!(
                        "Recording {} finalized without output for {:?}",
                        video.id,
                        missing
                    );
                    CaptureOutcome {
                        video,
                        source: OutcomeSource::Fallback { missing },
                    }
                }
            }
        };

        {
            let mut session = self.session.lock().await;
            if session.generation == pending.generation && session.state == RecordingState::Stopping {
                session.state = RecordingState::Idle;
                self.publish(&session);
            }
        }

        log::info!(
            "Recording {} finished: {:.1}s ({:?})",
            outcome.video.id,
            outcome.video.duration_secs,
            outcome.source
        );
        let _ = self.completions.send(outcome.clone());
        outcome
    }

    fn placeholder(&self, elapsed_secs: f64, created_at: DateTime<Utc>) -> RecordedVideo {
        let id = Uuid::new_v4();
        let dir = &self.config.output_directory;
        let ext = &self.config.file_extension;
        RecordedVideo {
            id,
            front_path: dir.join(format!("simulated-{}-front.{}", id, ext)),
            back_path: dir.join(format!("simulated-{}-back.{}", id, ext)),
            combined_path: None,
            created_at,
            duration_secs: elapsed_secs,
            thumbnail: None,
        }
    }
}

fn select_mode<B: CaptureBackend>(backend: &B, config: &CaptureConfig) -> CaptureMode {
    if config.simulated {
        log::info!("Simulated capture forced by configuration");
        return CaptureMode::Simulated;
    }

    let permission = backend.capture_permission();
    if !permission.status.is_granted() {
        log::warn!(
            "Camera permission {} ({}), using simulated capture",
            permission.status,
            permission.message
        );
        return CaptureMode::Simulated;
    }

    if !CameraPosition::ALL
        .into_iter()
        .any(|position| backend.is_channel_available(position))
    {
        log::warn!("No camera channels available, using simulated capture");
        return CaptureMode::Simulated;
    }

    CaptureMode::Real
}

fn spawn_ticker<B: CaptureBackend>(shared: Arc<Shared<B>>, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
        loop {
            interval.tick().await;

            let pending = {
                let mut session = shared.session.lock().await;
                if session.generation != generation || session.state != RecordingState::Recording {
                    return;
                }

                let elapsed = session.clock.advance();
                if !session.clock.is_exhausted() {
                    shared.publish(&session);
                    continue;
                }

                log::info!("Recording reached the {:?} ceiling, stopping", elapsed);
                // Detach: this task finishes the stop itself.
                session.ticker.take();
                let pending = session.begin_stop();
                shared.publish(&session);
                pending
            };

            shared.finalize(pending).await;
            return;
        }
    })
}

/// Dual-channel recording session with a fixed 15 s ceiling
///
/// `Idle --start--> Recording --stop/ceiling--> Stopping --finalize--> Idle`.
/// Nothing here returns an error: unavailable channels are skipped, and a
/// recording always ends in exactly one [`CaptureOutcome`].
pub struct CaptureSessionController<B: CaptureBackend> {
    shared: Arc<Shared<B>>,
}

impl CaptureSessionController<NullCaptureBackend> {
    /// Controller that only ever produces placeholder results
    pub fn simulated(config: CaptureConfig) -> Self {
        Self::new(NullCaptureBackend, config)
    }
}

impl<B: CaptureBackend> CaptureSessionController<B> {
    pub fn new(backend: B, config: CaptureConfig) -> Self {
        let mode = select_mode(&backend, &config);
        let (status, _) = watch::channel(CaptureStatus::idle(MAX_RECORDING_DURATION));
        let (completions, _) = broadcast::channel(COMPLETION_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                session: Mutex::new(Session {
                    backend,
                    state: RecordingState::Idle,
                    clock: RecordingClock::new(),
                    generation: 0,
                    outputs: None,
                    active: Vec::new(),
                    started_at: None,
                    ticker: None,
                }),
                status,
                completions,
                config,
                mode,
            }),
        }
    }

    pub fn mode(&self) -> CaptureMode {
        self.shared.mode
    }

    /// Latest published status
    pub fn status(&self) -> CaptureStatus {
        *self.shared.status.borrow()
    }

    pub fn state(&self) -> RecordingState {
        self.status().state
    }

    pub fn is_recording(&self) -> bool {
        self.state() == RecordingState::Recording
    }

    /// Receive every status change, including each recording tick
    pub fn subscribe(&self) -> watch::Receiver<CaptureStatus> {
        self.shared.status.subscribe()
    }

    /// Receive the outcome of every recording, manual or auto-stopped
    pub fn subscribe_completions(&self) -> broadcast::Receiver<CaptureOutcome> {
        self.shared.completions.subscribe()
    }

    /// Begin recording. Returns `false` without effect unless idle.
    pub async fn start(&self) -> bool {
        let mut session = self.shared.session.lock().await;
        if session.state != RecordingState::Idle {
            log::debug!("Start ignored while {:?}", session.state);
            return false;
        }

        session.generation = session.generation.wrapping_add(1);
        session.clock.reset();
        session.started_at = Some(Utc::now());
        if self.shared.mode == CaptureMode::Real {
            session.open_channels(&self.shared.config);
        }
        session.state = RecordingState::Recording;
        self.shared.publish(&session);

        let ticker = spawn_ticker(self.shared.clone(), session.generation);
        session.ticker = Some(ticker);

        log::info!(
            "Recording started ({:?}, {} channel(s))",
            self.shared.mode,
            session.active.len()
        );
        true
    }

    /// Stop recording and wait for the outcome
    ///
    /// Returns `None` when idle. A stop issued while a previous stop is still
    /// finalizing collapses the state straight to idle; the earlier stop still
    /// delivers its outcome.
    pub async fn stop(&self) -> Option<CaptureOutcome> {
        let pending = {
            let mut session = self.shared.session.lock().await;
            match session.state {
                RecordingState::Idle => {
                    log::debug!("Stop ignored while idle");
                    return None;
                }
                RecordingState::Stopping => {
                    log::info!("Stop requested while finalizing, returning to idle");
                    session.state = RecordingState::Idle;
                    self.shared.publish(&session);
                    return None;
                }
                RecordingState::Recording => {
                    if let Some(ticker) = session.ticker.take() {
                        ticker.abort();
                    }
                    let pending = session.begin_stop();
                    self.shared.publish(&session);
                    pending
                }
            }
        };

        // Finalize on its own task so a cancelled caller cannot strand the
        // session in Stopping.
        let shared = self.shared.clone();
        let finalizing = tokio::spawn(async move { shared.finalize(pending).await });
        match finalizing.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                log::error!("Finalize task failed: {}", e);
                None
            }
        }
    }
}

impl<B: CaptureBackend> Drop for CaptureSessionController<B> {
    fn drop(&mut self) {
        if let Ok(mut session) = self.shared.session.try_lock() {
            if let Some(ticker) = session.ticker.take() {
                ticker.abort();
            }
            if session.state == RecordingState::Recording {
                let pending = session.begin_stop();
                log::warn!(
                    "Controller dropped while recording, discarding {:.1}s session",
                    pending.elapsed_secs
                );
            }
        }
    }
}
