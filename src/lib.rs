//! # Rotating Station
//!
//! A single shared radio station built from ten pre-rendered audio slots.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                              STATION PROCESS                              │
//! │                                                                           │
//! │  ┌──────────────────────┐   tick (60s)   ┌──────────────────────────┐    │
//! │  │ Scheduler            │───────────────▶│ Rotation                 │    │
//! │  │ (rotation::scheduler)│                │ current index 0..9       │    │
//! │  └──────────┬───────────┘                └────────────┬─────────────┘    │
//! │             │ index 0 → refresh 5..9                  │ current_index()  │
//! │             │ index 5 → refresh 0..4                  ▼                  │
//! │             ▼ (detached task)            ┌──────────────────────────┐    │
//! │  ┌──────────────────────┐   5 payloads   │ GET /current.mp3         │    │
//! │  │ GenerationClient     │──────┐         │ (web::handlers)          │    │
//! │  │ (generation::client) │      │         └────────────┬─────────────┘    │
//! │  └──────────┬───────────┘      ▼                      │                  │
//! │             │          ┌──────────────────────────────▼─────────────┐    │
//! │             │          │ SlotStore  [0][1][2][3][4][5][6][7][8][9]  │    │
//! │             │          └────────────────────────────────────────────┘    │
//! │             │ ws "generate"                                               │
//! │  ┌──────────┼───────────────────────────────────────────────────────┐    │
//! │  │ GET /ws  │  Presence (presence::broadcaster)                      │    │
//! │  │          │  active set ──count──▶ ConnectionRegistry ──▶ all ws   │    │
//! │  └──────────┼───────────────────────────────────────────────────────┘    │
//! └─────────────┼────────────────────────────────────────────────────────────┘
//!               ▼
//!      external generation service
//! ```

pub mod config;
pub mod error;
pub mod generation;
pub mod presence;
pub mod rotation;
pub mod slots;
pub mod station;
pub mod web;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Number of slots in the rotation
    pub const SLOT_COUNT: u8 = 10;

    /// Number of payloads produced by one generation batch
    pub const BATCH_SIZE: u8 = 5;

    /// Default rotation period in seconds
    pub const DEFAULT_TICK_SECS: u64 = 60;

    /// Default generation service endpoint
    pub const DEFAULT_GENERATION_ENDPOINT: &str = "ws://localhost:8001";

    /// Environment variable overriding the generation endpoint
    pub const GENERATION_ENDPOINT_ENV: &str = "INFERENCE_SERVER_WS_URL";

    /// Default bound on a whole generation attempt in seconds
    pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

    /// Default TCP connect timeout towards the generation service
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8000;

    /// Request text sent to the generation service
    pub const GENERATE_REQUEST: &str = "generate";
}
