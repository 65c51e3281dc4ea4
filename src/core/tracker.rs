//! Position tracker: consumes a [`PositionSource`] for one user and feeds every
//! sample through the presence state machine.

use crate::core::presence::PresenceStateMachine;
use crate::core::source::PositionSource;
use crate::core::zones::ZoneRegistry;
use crate::errors::{AppError, AppResult};
use crate::models::position::{PositionError, PositionSample, PositionUpdate};
use crate::models::presence::PresenceEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long `stop()` waits for the consumer to wind down before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(2);
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerState {
    #[default]
    Idle,
    Tracking,
    Stopped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerStatus {
    pub state: TrackerState,
    pub current_position: Option<PositionSample>,
    pub last_error: Option<PositionError>,
    pub samples_processed: u64,
    pub duplicates_dropped: u64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// State shared between the tracker handle and its consumer task.
#[derive(Clone)]
struct Consumer {
    user_id: String,
    registry: Arc<ZoneRegistry>,
    presence: Arc<Mutex<PresenceStateMachine>>,
    status: Arc<Mutex<TrackerStatus>>,
    events: broadcast::Sender<PresenceEvent>,
}

impl Consumer {
    async fn run(self, mut rx: mpsc::Receiver<PositionUpdate>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(user_id = %self.user_id, "position consumer cancelled");
                    break;
                }
                update = rx.recv() => match update {
                    Some(Ok(sample)) => self.on_sample(sample),
                    Some(Err(e)) => self.on_error(e),
                    None => {
                        tracing::info!(user_id = %self.user_id, "position source closed");
                        break;
                    }
                }
            }
        }
        // dropping rx here releases the subscription
    }

    fn on_sample(&self, sample: PositionSample) {
        {
            let mut status = lock(&self.status);
            if status
                .current_position
                .is_some_and(|p| p.captured_at == sample.captured_at)
            {
                status.duplicates_dropped += 1;
                tracing::debug!(
                    user_id = %self.user_id,
                    at = %sample.captured_at,
                    "dropping duplicate sample"
                );
                return;
            }
            status.current_position = Some(sample);
            status.samples_processed += 1;
        }

        let zones = self.registry.list_active();
        let emitted = lock(&self.presence).evaluate_all(&self.user_id, &sample, &zones);

        for ev in emitted {
            let _ = self.events.send(ev);
        }
    }

    fn on_error(&self, error: PositionError) {
        tracing::warn!(user_id = %self.user_id, %error, "position source reported a failure");
        lock(&self.status).last_error = Some(error);
    }
}

/// `Idle → Tracking → Stopped` consumer of one user's position stream.
///
/// `start` must be called from within a tokio runtime.
pub struct PositionTracker<S: PositionSource> {
    source: S,
    consumer: Consumer,
    worker: Option<Worker>,
}

impl<S: PositionSource> PositionTracker<S> {
    pub fn new(
        user_id: impl Into<String>,
        source: S,
        registry: Arc<ZoneRegistry>,
        presence: Arc<Mutex<PresenceStateMachine>>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            source,
            consumer: Consumer {
                user_id: user_id.into(),
                registry,
                presence,
                status: Arc::new(Mutex::new(TrackerStatus::default())),
                events,
            },
            worker: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        lock(&self.consumer.status).state
    }

    pub fn status(&self) -> TrackerStatus {
        lock(&self.consumer.status).clone()
    }

    pub fn current_position(&self) -> Option<PositionSample> {
        lock(&self.consumer.status).current_position
    }

    /// `Err(PositionUnavailable)` while the last thing the source reported was a failure.
    pub fn check(&self) -> AppResult<()> {
        match lock(&self.consumer.status).last_error {
            Some(e) => Err(AppError::PositionUnavailable(e)),
            None => Ok(()),
        }
    }

    /// Presence events produced by this tracker's samples.
    pub fn subscribe_events(&self) -> broadcast::Receiver<PresenceEvent> {
        self.consumer.events.subscribe()
    }

    /// True while a consumer task is attached to a live subscription.
    pub fn is_consuming(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Begin consuming the source. A no-op while already consuming; after the
    /// source ended or failed this resubscribes, which is how callers retry.
    pub fn start(&mut self) {
        if self.state() == TrackerState::Tracking && self.is_consuming() {
            tracing::debug!(user_id = %self.consumer.user_id, "tracker already running");
            return;
        }

        let rx = self.source.subscribe();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(self.consumer.clone().run(rx, cancel.clone()));

        {
            let mut status = lock(&self.consumer.status);
            status.state = TrackerState::Tracking;
            status.last_error = None;
        }
        self.worker = Some(Worker { cancel, handle });

        tracing::info!(user_id = %self.consumer.user_id, "position tracking started");
    }

    /// Stop consuming and release the subscription. Returns within a bounded
    /// time even if the source never produces another sample.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.cancel.cancel();
        let mut handle = worker.handle;
        if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
            tracing::warn!(
                user_id = %self.consumer.user_id,
                "consumer did not stop in time, aborting"
            );
            handle.abort();
        }

        lock(&self.consumer.status).state = TrackerState::Stopped;
        tracing::info!(user_id = %self.consumer.user_id, "position tracking stopped");
    }

    /// Wait for the source to run dry, then stop. Meant for finite sources
    /// such as a replayed log.
    pub async fn drain(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        if let Err(e) = worker.handle.await {
            tracing::warn!(user_id = %self.consumer.user_id, error = %e, "consumer task failed");
        }
        lock(&self.consumer.status).state = TrackerState::Stopped;
        tracing::info!(user_id = %self.consumer.user_id, "position source drained");
    }
}

impl<S: PositionSource> Drop for PositionTracker<S> {
    fn drop(&mut self) {
        if let Some(w) = &self.worker {
            w.cancel.cancel();
        }
    }
}
