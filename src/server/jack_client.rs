//! JACK client for a capture source
//!
//! One client per source, named after it. The client registers an input
//! port per channel, connects the user's source ports to them and pushes
//! every process cycle into a ring buffer as one interleaved frame.

use jack::{AsyncClient, AudioIn, Client, ClientOptions, Control, Port, PortFlags, ProcessScope};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::audio::{create_shared_buffer, AudioFrame, SharedRingBuffer};
use crate::channels::ChannelCount;
use crate::config::ClientConfig;
use crate::error::ServerError;
use crate::server::{
    full_port_name, port_short_name, AudioServer, ClientHandle, ConnectRequest, RewirePlan,
};

/// Port type string of 32 bit float audio ports
const AUDIO_PORT_TYPE: &str = "32 bit float mono audio";

/// Opens JACK clients
#[derive(Debug, Clone, Default)]
pub struct JackServer {
    config: ClientConfig,
}

impl JackServer {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

fn client_options(start_server: bool) -> ClientOptions {
    if start_server {
        ClientOptions::empty()
    } else {
        ClientOptions::NO_START_SERVER
    }
}

impl AudioServer for JackServer {
    type Client = JackClient;

    fn open(&self, request: &ConnectRequest) -> Result<JackClient, ServerError> {
        let (client, status) = Client::new(&request.client_name, client_options(request.start_server))
            .map_err(|e| ServerError::ClientOpen {
                client: request.client_name.clone(),
                reason: e.to_string(),
            })?;

        let name = client.name().to_string();
        let sample_rate = client.sample_rate() as u32;
        debug!(client = %name, ?status, sample_rate, "JACK client opened");

        let mut ports = Vec::with_capacity(request.channels.get());
        let mut port_names = Vec::with_capacity(request.channels.get());
        for channel in 0..request.channels.get() {
            let short_name = port_short_name(&self.config.port_prefix, channel);
            let port = client
                .register_port(&short_name, AudioIn::default())
                .map_err(|e| ServerError::PortRegister {
                    port: short_name.clone(),
                    reason: e.to_string(),
                })?;
            port_names.push(full_port_name(&name, &short_name));
            ports.push(port);
        }

        let buffer = create_shared_buffer(self.config.ring_buffer_capacity);
        let handler = CaptureHandler {
            ports,
            buffer: buffer.clone(),
            sample_rate,
            sequence: 0,
            started: Instant::now(),
        };

        let active = client
            .activate_async((), handler)
            .map_err(|e| ServerError::Activate(e.to_string()))?;

        info!(
            client = %name,
            channels = request.channels.get(),
            sample_rate,
            "JACK client activated"
        );

        let mut jack_client = JackClient {
            active: Some(active),
            name,
            port_names,
            connections: vec![Vec::new(); request.channels.get()],
            channels: request.channels,
            sample_rate,
            buffer,
        };

        for (channel, sources) in request.port_lists.iter().enumerate().take(request.channels.get()) {
            jack_client.connect_channel(channel, sources)?;
        }

        Ok(jack_client)
    }
}

/// Process thread state: reads every input port once per cycle
struct CaptureHandler {
    ports: Vec<Port<AudioIn>>,
    buffer: SharedRingBuffer,
    sample_rate: u32,
    sequence: u32,
    started: Instant,
}

impl jack::ProcessHandler for CaptureHandler {
    fn process(&mut self, _: &Client, ps: &ProcessScope) -> Control {
        let planes: Vec<&[f32]> = self.ports.iter().map(|p| p.as_slice(ps)).collect();
        let timestamp = self.started.elapsed().as_micros() as u64;

        let frame = AudioFrame::interleave(&planes, self.sample_rate, timestamp, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);

        // A full buffer drops the cycle; the overflow counter records it
        self.buffer.push(frame);

        Control::Continue
    }
}

/// An activated JACK client with one input port per channel
pub struct JackClient {
    active: Option<AsyncClient<(), CaptureHandler>>,
    name: String,
    /// Full names of our input ports, indexed by channel
    port_names: Vec<String>,
    /// Source ports currently connected, indexed by channel
    connections: Vec<Vec<String>>,
    channels: ChannelCount,
    sample_rate: u32,
    buffer: SharedRingBuffer,
}

impl JackClient {
    fn deactivate(&mut self) {
        if let Some(active) = self.active.take() {
            match active.deactivate() {
                Ok((client, _, _)) => {
                    drop(client);
                    info!(client = %self.name, "JACK client closed");
                }
                Err(e) => warn!(client = %self.name, "Failed to deactivate JACK client: {}", e),
            }
        }
    }
}

impl ClientHandle for JackClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> ChannelCount {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn connect_channel(&mut self, channel: usize, sources: &[String]) -> Result<(), ServerError> {
        let destination = self
            .port_names
            .get(channel)
            .ok_or(ServerError::InvalidChannel(channel))?;
        let client = self.active.as_ref().ok_or(ServerError::NotActive)?.as_client();
        let plan = RewirePlan::new(&self.connections[channel], sources);

        for source in &plan.disconnect {
            match client.disconnect_ports_by_name(source, destination) {
                Ok(()) => debug!("Disconnected {} -> {}", source, destination),
                Err(e) => debug!("Failed to disconnect {} -> {}: {}", source, destination, e),
            }
        }

        let mut connected = plan.keep;
        for source in plan.connect {
            match client.connect_ports_by_name(&source, destination) {
                Ok(()) => {
                    debug!("Connected {} -> {}", source, destination);
                    connected.push(source);
                }
                Err(e) => {
                    let err = ServerError::PortConnect {
                        from: source,
                        to: destination.clone(),
                        reason: e.to_string(),
                    };
                    warn!("{}", err);
                }
            }
        }

        self.connections[channel] = connected;
        Ok(())
    }

    fn audio(&self) -> SharedRingBuffer {
        self.buffer.clone()
    }

    fn close(mut self) {
        self.deactivate();
    }
}

impl Drop for JackClient {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// Audio output ports on the server that can feed a channel
pub fn list_source_ports(start_server: bool) -> Result<Vec<String>, ServerError> {
    let client_name = "jack-capture-query";
    let (client, _) = Client::new(client_name, client_options(start_server)).map_err(|e| {
        ServerError::ClientOpen {
            client: client_name.to_string(),
            reason: e.to_string(),
        }
    })?;

    Ok(client.ports(None, Some(AUDIO_PORT_TYPE), PortFlags::IS_OUTPUT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_options_follow_start_server() {
        assert_eq!(client_options(false), ClientOptions::NO_START_SERVER);
        assert!(client_options(true).is_empty());
    }
}
