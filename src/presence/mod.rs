//! Listener presence
//!
//! Tracks which listeners are playing and pushes the count to every open
//! listener connection whenever it changes.

pub mod broadcaster;
pub mod registry;

pub use broadcaster::{ListenerSession, ListenerSignal, Presence};
pub use registry::{ConnectionId, ConnectionRegistry};
