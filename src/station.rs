//! Station assembly
//!
//! Builds the slot store, generation client, presence and web server from a
//! [`StationConfig`], then runs the rotation alongside the server until
//! shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{SlotBackend, StationConfig};
use crate::generation::GenerationClient;
use crate::presence::Presence;
use crate::rotation::{RotationHandle, Scheduler};
use crate::slots::{DiskSlotStore, MemorySlotStore, SharedSlotStore};
use crate::web::{AppState, WebServer};
use crate::Result;

/// A configured station with its HTTP listener bound
pub struct Station {
    server: WebServer,
    listener: TcpListener,
    scheduler: Scheduler<GenerationClient>,
}

impl Station {
    pub async fn bind(config: StationConfig) -> Result<Self> {
        config.validate()?;

        let store: SharedSlotStore = match config.slots.backend {
            SlotBackend::Disk => {
                tracing::info!("Serving slots from {}", config.slots.dir.display());
                Arc::new(DiskSlotStore::new(config.slots.dir.clone()))
            }
            SlotBackend::Memory => Arc::new(MemorySlotStore::new()),
        };

        let generation = GenerationClient::new(&config.generation, store.clone())?;
        match generation.endpoint() {
            Some(endpoint) => tracing::info!("Generation service: {}", endpoint),
            None => tracing::warn!("No generation endpoint configured, serving cached audio only"),
        }

        let rotation = RotationHandle::new();
        let state = Arc::new(AppState {
            rotation: rotation.clone(),
            store,
            presence: Arc::new(Presence::new(config.presence.identity)),
            generation: generation.clone(),
        });

        let server = WebServer::new(config.server.clone(), state);
        let listener = server.bind().await?;
        let scheduler =
            Scheduler::new(rotation, Arc::new(generation), config.rotation.tick_interval());

        Ok(Self {
            server,
            listener,
            scheduler,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Rotate and serve until `shutdown` resolves, then stop the rotation
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let scheduler = self.scheduler.spawn();
        let served = self.server.run(self.listener, shutdown).await;
        scheduler.shutdown().await;
        served?;

        tracing::info!("Station stopped");
        Ok(())
    }
}
