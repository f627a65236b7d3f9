//! Client for the external generation service
//!
//! One attempt connects over WebSocket, sends `generate`, collects five
//! binary payloads and writes them into one half of the slot store. Every
//! failure is absorbed here: the old slot contents keep being served.

pub mod client;
pub mod endpoint;

pub use client::{BatchOutcome, ClientSettings, GenerationClient, GenerationStats};
pub use endpoint::Endpoint;
