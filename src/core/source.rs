//! Position sources: the asynchronous producers a [`PositionTracker`] consumes.
//!
//! A source hands out an `mpsc` receiver per subscription. Dropping the
//! receiver is the unsubscribe signal; producers stop as soon as a send fails.
//!
//! [`PositionTracker`]: crate::core::tracker::PositionTracker

use crate::errors::{AppError, AppResult};
use crate::models::position::{PositionError, PositionSample, PositionUpdate};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

const SUBSCRIPTION_BUFFER: usize = 64;

pub trait PositionSource: Send + Sync + 'static {
    /// Open a new subscription. Must be called from within a tokio runtime.
    fn subscribe(&self) -> mpsc::Receiver<PositionUpdate>;
}

impl<T: PositionSource> PositionSource for Arc<T> {
    fn subscribe(&self) -> mpsc::Receiver<PositionUpdate> {
        (**self).subscribe()
    }
}

// ---------------------------------------------------------------------------
// ChannelSource
// ---------------------------------------------------------------------------

/// In-process source: whatever is published is fanned out to every live
/// subscription. Useful for embedding hosts that receive fixes elsewhere.
#[derive(Debug, Default)]
pub struct ChannelSource {
    subscribers: Mutex<Vec<mpsc::Sender<PositionUpdate>>>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `update` to all open subscriptions; returns how many received it.
    pub async fn publish(&self, update: PositionUpdate) -> usize {
        let senders: Vec<_> = {
            let mut subs = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subs.retain(|s| !s.is_closed());
            subs.clone()
        };

        let mut delivered = 0;
        for s in senders {
            if s.send(update).await.is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }
}

impl PositionSource for ChannelSource {
    fn subscribe(&self) -> mpsc::Receiver<PositionUpdate> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

// ---------------------------------------------------------------------------
// JsonLinesSource
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceLine {
    Failure { error: PositionError },
    Sample(PositionSample),
}

/// Parse one line of a recorded position log.
///
/// Blank lines and `#` comments yield `None`. A line is either a sample
/// (`{"latitude":..,"longitude":..,"accuracy":..,"captured_at":"2025-09-02T08:15:00"}`)
/// or a reported failure (`{"error":"permission_denied"}`).
pub fn parse_line(line: &str) -> AppResult<Option<PositionUpdate>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    match serde_json::from_str::<SourceLine>(line) {
        Ok(SourceLine::Sample(s)) => Ok(Some(Ok(s))),
        Ok(SourceLine::Failure { error }) => Ok(Some(Err(error))),
        Err(e) => Err(AppError::InvalidSample(format!("{e}: {line}"))),
    }
}

/// Replays a JSON-lines file of recorded fixes, one subscription per replay.
#[derive(Debug, Clone)]
pub struct JsonLinesSource {
    path: PathBuf,
    pace: Option<Duration>,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pace: None,
        }
    }

    /// Wait `pace` between lines, to mimic a live device.
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = Some(pace);
        self
    }
}

impl PositionSource for JsonLinesSource {
    fn subscribe(&self) -> mpsc::Receiver<PositionUpdate> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let path = self.path.clone();
        let pace = self.pace;

        tokio::spawn(async move {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot read position log");
                    let _ = tx.send(Err(PositionError::Unavailable)).await;
                    return;
                }
            };

            for (n, line) in content.lines().enumerate() {
                let update = match parse_line(line) {
                    Ok(Some(u)) => u,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!(
                            line = n + 1,
                            error = %e,
                            "skipping malformed position line"
                        );
                        continue;
                    }
                };

                if tx.send(update).await.is_err() {
                    tracing::debug!("position log replay unsubscribed");
                    return;
                }
                if let Some(p) = pace {
                    tokio::time::sleep(p).await;
                }
            }
        });

        rx
    }
}
