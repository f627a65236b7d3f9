//! Generation client
//!
//! The socket work is blocking `tungstenite` on a `spawn_blocking` thread.
//! The attempt as a whole runs under `tokio::time::timeout`; on expiry the
//! socket is shut down, which unblocks the thread, and nothing more is
//! written to the slot store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tungstenite::error::ProtocolError;
use tungstenite::handshake::HandshakeError;
use tungstenite::Message;

use crate::config::{CommitMode, GenerationConfig};
use crate::constants::{BATCH_SIZE, GENERATE_REQUEST};
use crate::error::GenerationError;
use crate::generation::Endpoint;
use crate::rotation::Regenerate;
use crate::slots::{SharedSlotStore, SlotIndex, SlotOffset, SlotStore};

/// Per-attempt limits and commit discipline
#[derive(Debug, Clone, Copy)]
pub struct ClientSettings {
    /// Bound on a whole attempt, connect to close
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub commit: CommitMode,
}

impl From<&GenerationConfig> for ClientSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            commit: config.commit,
        }
    }
}

/// Result of an attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No endpoint configured, nothing was done
    Disabled,
    /// All payloads were written
    Completed { offset: SlotOffset, written: usize },
}

/// Running totals since startup
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationStats {
    pub batches_completed: u64,
    pub batches_failed: u64,
    /// Payloads written by completed batches
    pub payloads_written: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Client for the generation service
#[derive(Clone)]
pub struct GenerationClient {
    endpoint: Option<Arc<Endpoint>>,
    store: SharedSlotStore,
    settings: ClientSettings,
    stats: Arc<Mutex<GenerationStats>>,
}

impl GenerationClient {
    /// Build from configuration. An empty endpoint disables generation.
    pub fn new(config: &GenerationConfig, store: SharedSlotStore) -> Result<Self, GenerationError> {
        Self::with_settings(&config.endpoint, store, ClientSettings::from(config))
    }

    pub fn with_settings(
        endpoint: &str,
        store: SharedSlotStore,
        settings: ClientSettings,
    ) -> Result<Self, GenerationError> {
        let endpoint = match endpoint.trim() {
            "" => None,
            raw => Some(Arc::new(Endpoint::parse(raw)?)),
        };

        Ok(Self {
            endpoint,
            store,
            settings,
            stats: Arc::new(Mutex::new(GenerationStats::default())),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_deref()
    }

    pub fn stats(&self) -> GenerationStats {
        self.stats.lock().clone()
    }

    /// Run one attempt and report how it went
    pub async fn try_generate(&self, offset: SlotOffset) -> Result<BatchOutcome, GenerationError> {
        let Some(endpoint) = self.endpoint.clone() else {
            return Ok(BatchOutcome::Disabled);
        };
        let store = self.store.clone();
        let settings = self.settings;
        let abort = Arc::new(AttemptAbort::default());

        let task = tokio::task::spawn_blocking({
            let abort = abort.clone();
            move || fetch_batch(&endpoint, offset, store.as_ref(), &settings, &abort)
        });

        let written = match tokio::time::timeout(settings.timeout, task).await {
            Ok(joined) => joined.map_err(|e| GenerationError::TaskFailed(e.to_string()))??,
            Err(_) => {
                abort.expire();
                return Err(GenerationError::Timeout);
            }
        };

        Ok(BatchOutcome::Completed { offset, written })
    }

    /// Run one attempt, absorbing any failure.
    ///
    /// On failure the slots keep whatever they held, so cached audio is
    /// recycled until the next trigger.
    pub async fn generate(&self, offset: SlotOffset) {
        tracing::info!("Generating new audio for slots from offset {}", offset);

        match self.try_generate(offset).await {
            Ok(BatchOutcome::Disabled) => {
                tracing::debug!("Generation disabled, keeping cached audio");
            }
            Ok(BatchOutcome::Completed { written, .. }) => {
                let mut stats = self.stats.lock();
                stats.batches_completed += 1;
                stats.payloads_written += written as u64;
                stats.last_success = Some(Utc::now());
                tracing::info!(
                    "Audio generated, {} slots refreshed from offset {}",
                    written,
                    offset
                );
            }
            Err(e) => {
                let mut stats = self.stats.lock();
                stats.batches_failed += 1;
                stats.last_error = Some(e.to_string());
                tracing::warn!(
                    "Generation service potentially unreachable ({}), \
                     recycling cached audio for now",
                    e
                );
            }
        }
    }
}

impl Regenerate for GenerationClient {
    fn regenerate(&self, offset: SlotOffset) -> BoxFuture<'static, ()> {
        let client = self.clone();
        Box::pin(async move { client.generate(offset).await })
    }
}

/// Lets the async side cut a blocking attempt short
#[derive(Default)]
struct AttemptAbort {
    expired: AtomicBool,
    stream: Mutex<Option<TcpStream>>,
}

impl AttemptAbort {
    /// Keep a handle on the connection so `expire` can shut it down
    fn attach(&self, stream: &TcpStream) -> Result<(), GenerationError> {
        let handle = stream
            .try_clone()
            .map_err(|e| GenerationError::ConnectionFailed(e.to_string()))?;
        let mut slot = self.stream.lock();
        self.check()?;
        *slot = Some(handle);
        Ok(())
    }

    fn check(&self) -> Result<(), GenerationError> {
        if self.expired.load(Ordering::SeqCst) {
            Err(GenerationError::Timeout)
        } else {
            Ok(())
        }
    }

    fn expire(&self) {
        let mut slot = self.stream.lock();
        self.expired.store(true, Ordering::SeqCst);
        if let Some(stream) = slot.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

fn remaining(deadline: Instant) -> Result<Duration, GenerationError> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|d| !d.is_zero())
        .ok_or(GenerationError::Timeout)
}

fn connect(
    endpoint: &Endpoint,
    settings: &ClientSettings,
    deadline: Instant,
) -> Result<TcpStream, GenerationError> {
    let addrs = (endpoint.host(), endpoint.port())
        .to_socket_addrs()
        .map_err(|e| GenerationError::ConnectionFailed(format!("{}: {}", endpoint.host(), e)))?;

    let mut last_error = None;
    for addr in addrs {
        let budget = settings.connect_timeout.min(remaining(deadline)?);
        match TcpStream::connect_timeout(&addr, budget) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(format!("{}: {}", addr, e)),
        }
    }

    Err(GenerationError::ConnectionFailed(
        last_error.unwrap_or_else(|| format!("{}: no addresses resolved", endpoint.host())),
    ))
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Blocking body of one attempt. Returns the number of payloads written.
fn fetch_batch(
    endpoint: &Endpoint,
    offset: SlotOffset,
    store: &dyn SlotStore,
    settings: &ClientSettings,
    abort: &AttemptAbort,
) -> Result<usize, GenerationError> {
    let deadline = Instant::now() + settings.timeout;
    let expected = BATCH_SIZE as usize;

    let stream = connect(endpoint, settings, deadline)?;
    abort.attach(&stream)?;
    let io_setup = |e: std::io::Error| GenerationError::ConnectionFailed(e.to_string());
    stream.set_read_timeout(Some(remaining(deadline)?)).map_err(io_setup)?;
    stream.set_write_timeout(Some(remaining(deadline)?)).map_err(io_setup)?;
    stream.set_nodelay(true).map_err(io_setup)?;

    let (mut socket, _response) =
        tungstenite::client(endpoint.uri(), stream).map_err(|e| match e {
            // a blocking stream only reports "interrupted" when the read timed out
            HandshakeError::Interrupted(_) => GenerationError::Timeout,
            HandshakeError::Failure(tungstenite::Error::Io(ref io)) if is_timeout(io) => {
                GenerationError::Timeout
            }
            HandshakeError::Failure(_) if abort.check().is_err() => GenerationError::Timeout,
            HandshakeError::Failure(e) => GenerationError::Handshake(e.to_string()),
        })?;

    tracing::debug!("Connected to generation service at {}", endpoint);

    socket
        .send(Message::text(GENERATE_REQUEST))
        .map_err(|e| GenerationError::SendFailed(e.to_string()))?;

    let mut buffered: Vec<(SlotIndex, Bytes)> = Vec::with_capacity(expected);
    let mut received = 0;

    while let Some(slot) = offset.slot(received) {
        socket
            .get_ref()
            .set_read_timeout(Some(remaining(deadline)?))
            .map_err(|e| GenerationError::ReceiveFailed(e.to_string()))?;

        let message = socket.read();
        abort.check()?;

        match message {
            Ok(Message::Binary(payload)) => {
                tracing::debug!(
                    "Received payload {} ({} bytes) for slot {}",
                    received,
                    payload.len(),
                    slot
                );
                match settings.commit {
                    CommitMode::Streaming => store.write(slot, payload)?,
                    CommitMode::Buffered => buffered.push((slot, payload)),
                }
                received += 1;
            }
            Ok(Message::Close(_))
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed)
            | Err(tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)) => {
                return Err(GenerationError::IncompleteBatch { received, expected });
            }
            // text, ping and pong are noise
            Ok(_) => {}
            Err(tungstenite::Error::Io(ref e)) if is_timeout(e) => {
                return Err(GenerationError::Timeout);
            }
            Err(e) => return Err(GenerationError::ReceiveFailed(e.to_string())),
        }
    }

    abort.check()?;
    for (slot, payload) in buffered {
        store.write(slot, payload)?;
    }

    if let Err(e) = socket.close(None).and_then(|_| socket.flush()) {
        tracing::debug!("Closing generation connection: {}", e);
    }

    Ok(received)
}
