//! Periodic rotation driver
//!
//! The scheduler ticks immediately on start and then once per interval.
//! Regeneration runs as detached tasks so a slow generation service never
//! delays the next tick.

use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::rotation::RotationHandle;
use crate::slots::{SlotIndex, SlotOffset};

/// Something that can refill one half of the rotation.
///
/// The returned future is spawned and never awaited by the scheduler; it
/// must handle its own failures.
pub trait Regenerate: Send + Sync + 'static {
    fn regenerate(&self, offset: SlotOffset) -> BoxFuture<'static, ()>;
}

/// Rotation scheduler
pub struct Scheduler<R> {
    rotation: RotationHandle,
    regenerator: Arc<R>,
    tick_interval: Duration,
}

impl<R: Regenerate> Scheduler<R> {
    pub fn new(rotation: RotationHandle, regenerator: Arc<R>, tick_interval: Duration) -> Self {
        Self {
            rotation,
            regenerator,
            tick_interval,
        }
    }

    /// Advance once and dispatch regeneration if this step calls for it
    pub fn tick(&self) -> SlotIndex {
        let (index, refresh) = self.rotation.advance();
        tracing::debug!("Rotation advanced to slot {}", index);

        if let Some(offset) = refresh {
            tracing::info!("Slot {} reached, regenerating slots from offset {}", index, offset);
            tokio::spawn(self.regenerator.regenerate(offset));
        }

        index
    }

    /// Tick until `shutdown` turns true or its sender is dropped
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Rotation scheduler started, period {:?}", self.tick_interval);

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }

        tracing::info!("Rotation scheduler stopped after {} ticks", self.rotation.ticks());
    }

    /// Run on the current runtime
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, task }
    }
}

/// Owner of a running scheduler. Dropping it also stops the scheduler.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop ticking and wait for the loop to exit.
    ///
    /// In-flight regeneration tasks are left to finish on their own.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Rotation scheduler task ended abnormally: {}", e);
        }
    }
}
