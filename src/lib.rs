//! # JACK Capture Source
//!
//! Exposes JACK audio server input ports as an audio source inside a host
//! media-capture application.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                          HOST APPLICATION                              │
//! │   get_name / create / update / destroy / get_defaults / get_properties │
//! └───────────────┬───────────────────────────────────────┬───────────────┘
//!                 │ UI / settings thread                  │ drains frames
//!                 ▼                                       │
//! ┌───────────────────────────────────────┐               │
//! │         JackInput (source)            │               │
//! │  Mutex<Session>                       │               │
//! │   ├─ device name                      │               │
//! │   ├─ channel count (1..8)             │               │
//! │   ├─ start-server flag                │               │
//! │   ├─ port lists [ch 1 .. ch 8]        │               │
//! │   └─ Option<client handle> ───────────┼──┐            │
//! └───────────────────────────────────────┘  │            │
//!                                            ▼            │
//! ┌───────────────────────────────────────────────────────┼───────────────┐
//! │                  JACK client (server::jack)           │               │
//! │  system:capture_1 ──► in_1 ┐                          │               │
//! │  system:capture_2 ──► in_2 ├─► process thread ──► RingBuffer          │
//! │         ...            ... ┘   (interleave)                           │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod channels;
pub mod config;
pub mod error;
pub mod host;
pub mod locale;
pub mod properties;
pub mod server;
pub mod settings;
pub mod source;

pub use error::{Error, Result};
pub use host::{CaptureSource, SourceContext, SourceInfo, SourceInstance};
pub use source::JackInput;

/// Application-wide constants
pub mod constants {
    /// Maximum number of channels (and JACK input ports) per source
    pub const MAX_CHANNELS: usize = 8;

    /// Default channel count (stereo)
    pub const DEFAULT_CHANNELS: i64 = 2;

    /// Default for starting a JACK server when none is running
    pub const DEFAULT_START_SERVER: bool = false;

    /// Settings key for the channel count
    pub const CHANNELS_KEY: &str = "channels";

    /// Settings key for the start-server flag
    pub const START_SERVER_KEY: &str = "startjack";

    /// Short name prefix of the registered input ports (`in_1`, `in_2`, ...)
    pub const DEFAULT_PORT_PREFIX: &str = "in_";

    /// Lock-free ring buffer capacity (in frames)
    pub const RING_BUFFER_CAPACITY: usize = 256;
}
