//! Channel count, per-channel settings keys and speaker layouts

use std::fmt;
use std::sync::OnceLock;

use crate::constants::MAX_CHANNELS;

/// Number of captured channels, always within `1..=MAX_CHANNELS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelCount(u8);

impl ChannelCount {
    pub const MIN: ChannelCount = ChannelCount(1);
    pub const MAX: ChannelCount = ChannelCount(MAX_CHANNELS as u8);

    /// Returns `None` when `count` is outside `1..=MAX_CHANNELS`
    pub fn new(count: usize) -> Option<Self> {
        (1..=MAX_CHANNELS)
            .contains(&count)
            .then_some(ChannelCount(count as u8))
    }

    /// Clamp a raw settings value into range
    pub fn from_setting(value: i64) -> Self {
        ChannelCount(value.clamp(1, MAX_CHANNELS as i64) as u8)
    }

    /// Whether `value` had to be clamped
    pub fn is_clamped(value: i64) -> bool {
        Self::from_setting(value).get() as i64 != value
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Whether the channel at `index` (zero based) is in use
    pub fn includes(self, index: usize) -> bool {
        index < self.get()
    }

    pub fn layout(self) -> SpeakerLayout {
        SpeakerLayout::from_channels(self.get())
    }
}

impl fmt::Display for ChannelCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Settings key holding the ports connected to channel `index` (zero based).
///
/// Keys read `"ports connected to channel 1"` through
/// `"ports connected to channel 8"`. Returns `None` past the last channel.
pub fn port_list_key(index: usize) -> Option<&'static str> {
    port_list_keys().get(index).map(String::as_str)
}

/// All per-channel port list keys, indexed by channel
pub fn port_list_keys() -> &'static [String; MAX_CHANNELS] {
    static KEYS: OnceLock<[String; MAX_CHANNELS]> = OnceLock::new();
    KEYS.get_or_init(|| std::array::from_fn(|i| format!("ports connected to channel {}", i + 1)))
}

/// Speaker arrangement the host should assume for a channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerLayout {
    Unknown,
    Mono,
    Stereo,
    TwoPointOne,
    FourPointZero,
    FourPointOne,
    FivePointOne,
    SevenPointOne,
}

impl SpeakerLayout {
    pub fn from_channels(channels: usize) -> Self {
        match channels {
            1 => SpeakerLayout::Mono,
            2 => SpeakerLayout::Stereo,
            3 => SpeakerLayout::TwoPointOne,
            4 => SpeakerLayout::FourPointZero,
            5 => SpeakerLayout::FourPointOne,
            6 => SpeakerLayout::FivePointOne,
            8 => SpeakerLayout::SevenPointOne,
            _ => SpeakerLayout::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_count_bounds() {
        assert!(ChannelCount::new(0).is_none());
        assert!(ChannelCount::new(9).is_none());
        assert_eq!(ChannelCount::new(8), Some(ChannelCount::MAX));
        assert_eq!(ChannelCount::from_setting(-3), ChannelCount::MIN);
        assert_eq!(ChannelCount::from_setting(42), ChannelCount::MAX);
        assert_eq!(ChannelCount::from_setting(5).get(), 5);
        assert!(ChannelCount::is_clamped(0));
        assert!(ChannelCount::is_clamped(9));
        assert!(!ChannelCount::is_clamped(8));
    }

    #[test]
    fn test_port_list_keys() {
        assert_eq!(port_list_key(0), Some("ports connected to channel 1"));
        assert_eq!(port_list_key(7), Some("ports connected to channel 8"));
        assert_eq!(port_list_key(8), None);

        let keys = port_list_keys();
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_speaker_layout() {
        assert_eq!(SpeakerLayout::from_channels(1), SpeakerLayout::Mono);
        assert_eq!(SpeakerLayout::from_channels(6), SpeakerLayout::FivePointOne);
        assert_eq!(SpeakerLayout::from_channels(7), SpeakerLayout::Unknown);
        assert_eq!(ChannelCount::MAX.layout(), SpeakerLayout::SevenPointOne);
    }
}
