//! Audio server seam
//!
//! [`AudioServer::open`] brings a client up with its ports registered,
//! activated and connected; [`ClientHandle::close`] tears it down again.
//! The source only ever talks to the server through these two traits.

#[cfg(feature = "jack-backend")]
pub mod jack_client;

#[cfg(feature = "jack-backend")]
pub use jack_client::{list_source_ports, JackClient, JackServer};

use crate::audio::SharedRingBuffer;
use crate::channels::ChannelCount;
use crate::error::ServerError;

/// Everything needed to bring a client up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Client name, taken from the source name
    pub client_name: String,
    pub channels: ChannelCount,
    /// Start a server if none is running
    pub start_server: bool,
    /// Source ports to connect, one list per channel
    pub port_lists: Vec<Vec<String>>,
}

/// Short name of the input port for `channel` (zero based), e.g. `in_1`
pub fn port_short_name(prefix: &str, channel: usize) -> String {
    format!("{}{}", prefix, channel + 1)
}

/// Server-wide port name, `client:port`
pub fn full_port_name(client: &str, short_name: &str) -> String {
    format!("{}:{}", client, short_name)
}

/// Connection changes that turn one channel's current sources into the
/// wanted ones. Each port appears at most once across all three lists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewirePlan {
    /// Already connected and still wanted
    pub keep: Vec<String>,
    pub connect: Vec<String>,
    pub disconnect: Vec<String>,
}

impl RewirePlan {
    pub fn new(current: &[String], wanted: &[String]) -> Self {
        let mut plan = RewirePlan::default();

        for source in wanted {
            if plan.keep.contains(source) || plan.connect.contains(source) {
                continue;
            }
            if current.contains(source) {
                plan.keep.push(source.clone());
            } else {
                plan.connect.push(source.clone());
            }
        }

        for source in current {
            if !wanted.contains(source) && !plan.disconnect.contains(source) {
                plan.disconnect.push(source.clone());
            }
        }

        plan
    }

    /// Sources connected once the plan succeeded in full
    pub fn result(&self) -> Vec<String> {
        self.keep.iter().chain(&self.connect).cloned().collect()
    }
}

/// Opens clients on an audio server
pub trait AudioServer: Send + Sync {
    type Client: ClientHandle;

    /// Open, register ports, activate and connect.
    ///
    /// Fails only if no active client could be obtained. Individual port
    /// connection failures are logged and leave the channel unconnected.
    fn open(&self, request: &ConnectRequest) -> Result<Self::Client, ServerError>;
}

/// A live, activated client
pub trait ClientHandle: Send {
    /// Name the server gave the client
    fn name(&self) -> &str;

    fn channels(&self) -> ChannelCount;

    fn sample_rate(&self) -> u32;

    /// Replace the source ports feeding `channel` (zero based)
    fn connect_channel(&mut self, channel: usize, sources: &[String]) -> Result<(), ServerError>;

    /// Frames captured by the process thread
    fn audio(&self) -> SharedRingBuffer;

    /// Deactivate and close
    fn close(self)
    where
        Self: Sized;
}
