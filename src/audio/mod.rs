//! Audio hand-off between the JACK process thread and the host

pub mod buffer;

pub use buffer::{create_shared_buffer, AudioFrame, RingBuffer, SharedRingBuffer};
