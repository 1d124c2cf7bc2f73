//! Lock-free ring buffer for captured audio
//!
//! The JACK process thread is the single producer and the host's audio
//! consumer the single consumer. Neither side ever blocks.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::channels::SpeakerLayout;

/// One process cycle worth of interleaved samples
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Interleaved audio samples (f32)
    pub samples: Vec<f32>,
    /// Number of channels
    pub channels: u16,
    /// Speaker arrangement for `channels`
    pub layout: SpeakerLayout,
    /// Server sample rate in Hz
    pub sample_rate: u32,
    /// Timestamp in microseconds since the client was activated
    pub timestamp: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl AudioFrame {
    /// Interleave per-channel slices into a single frame
    pub fn interleave(
        planes: &[&[f32]],
        sample_rate: u32,
        timestamp: u64,
        sequence: u32,
    ) -> Self {
        let channels = planes.len();
        let frames = planes.iter().map(|p| p.len()).min().unwrap_or(0);
        let mut samples = vec![0.0f32; frames * channels];

        for (channel, plane) in planes.iter().enumerate() {
            for (frame, &sample) in plane.iter().enumerate().take(frames) {
                samples[frame * channels + channel] = sample;
            }
        }

        Self {
            samples,
            channels: channels as u16,
            layout: SpeakerLayout::from_channels(channels),
            sample_rate,
            timestamp,
            sequence,
        }
    }

    /// Get number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Get frame duration in microseconds
    pub fn duration_us(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples_per_channel() as u64 * 1_000_000) / self.sample_rate as u64
    }
}

/// Lock-free ring buffer for audio frames
pub struct RingBuffer {
    queue: ArrayQueue<AudioFrame>,
    overflow_count: AtomicUsize,
}

impl RingBuffer {
    /// Create a new ring buffer with the specified capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity.max(1)),
            overflow_count: AtomicUsize::new(0),
        }
    }

    /// Push a frame into the buffer.
    /// Returns false if buffer is full (overflow), dropping the frame.
    pub fn push(&self, frame: AudioFrame) -> bool {
        match self.queue.push(frame) {
            Ok(()) => true,
            Err(_) => {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Pop the oldest frame
    pub fn pop(&self) -> Option<AudioFrame> {
        self.queue.pop()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get current buffer length
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Get overflow count
    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }
}

/// Thread-safe handle to a ring buffer
pub type SharedRingBuffer = Arc<RingBuffer>;

/// Create a new shared ring buffer
pub fn create_shared_buffer(capacity: usize) -> SharedRingBuffer {
    Arc::new(RingBuffer::new(capacity))
}
