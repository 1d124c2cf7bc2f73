//! JACK input capture source
//!
//! Owns the mutex-guarded session: device name, channel count, start-server
//! flag, per-channel port lists and the live client. Any change of device
//! name, channel count or start-server flag tears the client down and
//! brings a new one up. Port list edits alone are applied to the live
//! client in place.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::SharedRingBuffer;
use crate::channels::{port_list_keys, ChannelCount};
use crate::constants::{
    CHANNELS_KEY, DEFAULT_CHANNELS, DEFAULT_START_SERVER, MAX_CHANNELS, START_SERVER_KEY,
};
use crate::error::ServerError;
use crate::host::{CaptureSource, SourceContext, SourceInfo, SourceType};
use crate::locale;
use crate::properties::Properties;
use crate::server::{AudioServer, ClientHandle, ConnectRequest};
use crate::settings::Settings;

/// Whether a source currently holds a live client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// State shared between the host's UI thread callers
struct Session<C> {
    device: Option<String>,
    /// `None` until the first update applied a count
    channels: Option<ChannelCount>,
    start_server: bool,
    /// Source ports per channel, always `MAX_CHANNELS` entries
    port_lists: Vec<Vec<String>>,
    client: Option<C>,
}

impl<C: ClientHandle> Session<C> {
    fn new() -> Self {
        Self {
            device: None,
            channels: None,
            start_server: DEFAULT_START_SERVER,
            port_lists: vec![Vec::new(); MAX_CHANNELS],
            client: None,
        }
    }

    fn channel_count(&self) -> ChannelCount {
        self.channels
            .unwrap_or_else(|| ChannelCount::from_setting(DEFAULT_CHANNELS))
    }

    fn activate<S>(&mut self, server: &S) -> Result<(), ServerError>
    where
        S: AudioServer<Client = C>,
    {
        let channels = self.channel_count();
        let request = ConnectRequest {
            client_name: self.device.clone().unwrap_or_default(),
            channels,
            start_server: self.start_server,
            port_lists: self.port_lists[..channels.get()].to_vec(),
        };
        self.client = Some(server.open(&request)?);
        Ok(())
    }

    fn deactivate(&mut self) {
        if let Some(client) = self.client.take() {
            client.close();
        }
    }
}

/// Capture source exposing JACK input ports to the host
pub struct JackInput<S: AudioServer> {
    id: Uuid,
    server: S,
    context: Arc<SourceContext>,
    session: Mutex<Session<S::Client>>,
}

impl<S: AudioServer> JackInput<S> {
    fn new(context: Arc<SourceContext>, server: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            server,
            context,
            session: Mutex::new(Session::new()),
        }
    }

    /// Instance id used in log fields
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> ConnectionStatus {
        if self.session.lock().client.is_some() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }

    pub fn is_active(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// Channel count applied by the last update
    pub fn channels(&self) -> Option<ChannelCount> {
        self.session.lock().channels
    }

    /// Name the JACK client was opened with
    pub fn device(&self) -> Option<String> {
        self.session.lock().device.clone()
    }

    /// Source ports configured for `channel` (zero based)
    pub fn port_list(&self, channel: usize) -> Vec<String> {
        self.session
            .lock()
            .port_lists
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    /// Captured frames of the live client
    pub fn audio(&self) -> Option<SharedRingBuffer> {
        self.session.lock().client.as_ref().map(ClientHandle::audio)
    }

    /// Sample rate of the live client
    pub fn sample_rate(&self) -> Option<u32> {
        self.session.lock().client.as_ref().map(ClientHandle::sample_rate)
    }
}

/// Show the port lists of channels in use, hide the rest
pub fn channel_count_changed(props: &mut Properties, settings: &Settings) -> bool {
    let channels = ChannelCount::from_setting(settings.get_int(CHANNELS_KEY));

    for (index, key) in port_list_keys().iter().enumerate() {
        if let Some(property) = props.get_mut(key) {
            property.set_visible(channels.includes(index));
        }
        props.property_modified(key, settings);
    }

    true
}

impl<S: AudioServer> CaptureSource for JackInput<S> {
    type Server = S;

    const INFO: SourceInfo = SourceInfo {
        id: "jack_output_capture",
        source_type: SourceType::Input,
        audio: true,
        video: false,
    };

    fn name() -> &'static str {
        locale::text("JACKInput")
    }

    fn create(settings: &Settings, context: Arc<SourceContext>, server: S) -> Option<Self> {
        let source = Self::new(context, server);
        source.update(settings);

        if !source.is_active() {
            source.destroy();
            return None;
        }
        Some(source)
    }

    fn destroy(self) {
        debug!(source = %self.id, "destroying source");
        // Drop deactivates
    }

    fn update(&self, settings: &Settings) {
        let start_server = settings.get_bool(START_SERVER_KEY);
        let raw_channels = settings.get_int(CHANNELS_KEY);
        let channels = ChannelCount::from_setting(raw_channels);
        let port_lists: Vec<Vec<String>> = port_list_keys()
            .iter()
            .map(|key| settings.get_string_list(key))
            .collect();
        let device = self.context.name();

        let mut guard = self.session.lock();
        let session = &mut *guard;
        let mut changed = false;

        if start_server != session.start_server {
            session.start_server = start_server;
            changed = true;
        }

        // The old count stays until the old client is gone
        if session.channels != Some(channels) {
            if ChannelCount::is_clamped(raw_channels) {
                warn!(
                    source = %self.id,
                    value = raw_channels,
                    clamped = channels.get(),
                    "channel count out of range, clamping"
                );
            }
            changed = true;
        }

        if session.device.as_deref() != Some(device.as_str()) {
            session.device = Some(device);
            changed = true;
        }

        if changed {
            debug!(
                source = %self.id,
                device = ?session.device,
                channels = channels.get(),
                start_server,
                "settings changed, reconnecting"
            );
            session.deactivate();
            session.channels = Some(channels);
            session.port_lists = port_lists;

            match session.activate(&self.server) {
                Ok(()) => info!(source = %self.id, channels = channels.get(), "JACK source connected"),
                Err(e) => {
                    warn!(source = %self.id, "JACK source disconnected: {}", e);
                    session.deactivate();
                }
            }
            return;
        }

        let rewired: Vec<usize> = (0..MAX_CHANNELS)
            .filter(|&channel| session.port_lists[channel] != port_lists[channel])
            .collect();
        session.port_lists = port_lists;

        if let Some(client) = session.client.as_mut() {
            for channel in rewired.into_iter().filter(|&c| channels.includes(c)) {
                debug!(source = %self.id, channel, "rewiring channel");
                if let Err(e) = client.connect_channel(channel, &session.port_lists[channel]) {
                    warn!(source = %self.id, channel, "Failed to rewire channel: {}", e);
                }
            }
        }
    }

    fn get_defaults(settings: &mut Settings) {
        settings.set_default_int(CHANNELS_KEY, DEFAULT_CHANNELS);
        settings.set_default_bool(START_SERVER_KEY, DEFAULT_START_SERVER);
    }

    fn get_properties(&self) -> Properties {
        let mut props = Properties::new();

        props
            .add_int(CHANNELS_KEY, locale::text("Channels"), 1, MAX_CHANNELS as i64, 1)
            .set_modified_callback(channel_count_changed);
        props.add_bool(START_SERVER_KEY, locale::text("StartJACKServer"));

        let channels = self.session.lock().channel_count();
        for (index, key) in port_list_keys().iter().enumerate() {
            props
                .add_string_list(key, key)
                .set_visible(channels.includes(index));
        }

        props
    }
}

impl<S: AudioServer> Drop for JackInput<S> {
    fn drop(&mut self) {
        self.session.get_mut().deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::port_list_key;
    use crate::host::SourceInstance;
    use crate::server::fake::FakeServer;
    use proptest::prelude::*;

    fn settings(channels: i64, start_server: bool) -> Settings {
        let mut settings = Settings::new();
        JackInput::<FakeServer>::get_defaults(&mut settings);
        settings.set_int(CHANNELS_KEY, channels);
        settings.set_bool(START_SERVER_KEY, start_server);
        settings
    }

    fn create(server: &FakeServer, settings: &Settings) -> Option<JackInput<FakeServer>> {
        JackInput::create(settings, SourceContext::new("JACK Input"), server.clone())
    }

    fn visible_lists(props: &Properties) -> Vec<bool> {
        port_list_keys()
            .iter()
            .map(|key| props.get(key).map(|p| p.is_visible()).unwrap_or(false))
            .collect()
    }

    fn expected_visible(channels: usize) -> Vec<bool> {
        (0..MAX_CHANNELS).map(|i| i < channels).collect()
    }

    #[test]
    fn test_create_with_unreachable_server() {
        let server = FakeServer::unreachable();
        assert!(create(&server, &settings(2, false)).is_none());
        assert_eq!(server.stats.opens(), 0);
    }

    #[test]
    fn test_create_opens_client_named_after_source() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        assert_eq!(source.status(), ConnectionStatus::Connected);
        assert_eq!(source.device().as_deref(), Some("JACK Input"));
        assert_eq!(source.sample_rate(), Some(48000));
        assert!(source.audio().is_some());

        let request = server.stats.last_request().unwrap();
        assert_eq!(request.client_name, "JACK Input");
        assert_eq!(request.channels.get(), 2);
        assert!(!request.start_server);
        assert_eq!(request.port_lists.len(), 2);
    }

    #[test]
    fn test_defaults() {
        let mut settings = Settings::new();
        JackInput::<FakeServer>::get_defaults(&mut settings);
        assert_eq!(settings.get_int(CHANNELS_KEY), 2);
        assert!(!settings.get_bool(START_SERVER_KEY));
        assert!(settings
            .get_string_list(port_list_key(0).unwrap())
            .is_empty());
    }

    #[test]
    fn test_unchanged_settings_keep_client() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        source.update(&settings(2, false));
        source.update(&settings(2, false));

        assert_eq!(server.stats.opens(), 1);
        assert_eq!(server.stats.closes(), 0);
    }

    #[test]
    fn test_start_server_toggle_is_one_cycle() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        source.update(&settings(2, true));

        assert_eq!(server.stats.closes(), 1);
        assert_eq!(server.stats.opens(), 2);
        assert!(server.stats.last_request().unwrap().start_server);
        assert!(source.is_active());
    }

    #[test]
    fn test_channel_change_reconnects_with_new_count() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        source.update(&settings(5, false));

        assert_eq!(server.stats.closes(), 1);
        assert_eq!(server.stats.opens(), 2);
        assert_eq!(source.channels().map(ChannelCount::get), Some(5));
        assert_eq!(server.stats.last_request().unwrap().port_lists.len(), 5);
    }

    #[test]
    fn test_out_of_range_channels_are_clamped() {
        let server = FakeServer::new();
        let source = create(&server, &settings(12, false)).unwrap();
        assert_eq!(source.channels(), Some(ChannelCount::MAX));

        source.update(&settings(0, false));
        assert_eq!(source.channels(), Some(ChannelCount::MIN));
    }

    #[test]
    fn test_rename_reconnects() {
        let server = FakeServer::new();
        let context = SourceContext::new("Mic");
        let source = JackInput::create(&settings(2, false), context.clone(), server.clone()).unwrap();

        context.rename("Synth");
        source.update(&settings(2, false));

        assert_eq!(server.stats.opens(), 2);
        assert_eq!(server.stats.last_request().unwrap().client_name, "Synth");
        assert_eq!(source.device().as_deref(), Some("Synth"));
    }

    #[test]
    fn test_failed_reinit_leaves_source_disconnected() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        server.set_reachable(false);
        source.update(&settings(4, false));

        assert_eq!(source.status(), ConnectionStatus::Disconnected);
        assert!(source.audio().is_none());
        assert_eq!(server.stats.closes(), 1);

        // no retry until settings change again
        server.set_reachable(true);
        source.update(&settings(4, false));
        assert_eq!(source.status(), ConnectionStatus::Disconnected);

        source.update(&settings(3, false));
        assert_eq!(source.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_port_list_edit_rewires_in_place() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        let mut edited = settings(2, false);
        edited.set_string_list(port_list_key(1).unwrap(), ["system:capture_2"]);
        // channel 4 is not in use, nothing to rewire
        edited.set_string_list(port_list_key(3).unwrap(), ["system:capture_4"]);
        source.update(&edited);

        assert_eq!(server.stats.opens(), 1);
        assert_eq!(server.stats.closes(), 0);
        assert_eq!(server.stats.rewires(), 1);
        assert_eq!(source.port_list(1), vec!["system:capture_2"]);
        assert_eq!(source.port_list(3), vec!["system:capture_4"]);

        // the stored list feeds the next reconnect
        source.update(&{
            let mut more = edited.clone();
            more.set_int(CHANNELS_KEY, 4);
            more
        });
        let request = server.stats.last_request().unwrap();
        assert_eq!(request.port_lists[1], vec!["system:capture_2"]);
        assert_eq!(request.port_lists[3], vec!["system:capture_4"]);
    }

    #[test]
    fn test_duplicate_port_entries_connect_once() {
        let server = FakeServer::new();
        let mut initial = settings(2, false);
        initial.set_string_list(port_list_key(0).unwrap(), ["system:capture_1", "system:capture_1"]);
        let source = create(&server, &initial).unwrap();

        let mut edited = initial.clone();
        edited.set_string_list(
            port_list_key(0).unwrap(),
            ["system:capture_1", "synth:out_l", "synth:out_l"],
        );
        source.update(&edited);

        assert_eq!(server.stats.opens(), 1);
        assert_eq!(server.stats.rewires(), 1);
        assert_eq!(
            server.stats.connected(0),
            vec!["system:capture_1", "synth:out_l"]
        );
    }

    #[test]
    fn test_destroy_closes_client() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        source.destroy();
        assert_eq!(server.stats.closes(), 1);
    }

    #[test]
    fn test_destroy_failed_instance_is_noop() {
        let server = FakeServer::unreachable();
        let instance: SourceInstance<JackInput<FakeServer>> =
            SourceInstance::create(Settings::new(), SourceContext::new("JACK Input"), server.clone());

        assert!(!instance.is_created());
        assert!(instance.properties().is_none());
        instance.destroy();
        assert_eq!(server.stats.closes(), 0);
    }

    #[test]
    fn test_instance_forwards_updates() {
        let server = FakeServer::new();
        let mut instance: SourceInstance<JackInput<FakeServer>> =
            SourceInstance::create(Settings::new(), SourceContext::new("JACK Input"), server.clone());
        assert!(instance.is_created());
        assert_eq!(instance.settings().get_int(CHANNELS_KEY), 2);

        let mut settings = Settings::new();
        settings.set_int(CHANNELS_KEY, 6);
        instance.update(settings);

        assert_eq!(
            instance.get().and_then(JackInput::channels).map(ChannelCount::get),
            Some(6)
        );
        instance.destroy();
        assert_eq!(server.stats.closes(), 2);
    }

    #[test]
    fn test_properties_layout() {
        let server = FakeServer::new();
        let source = create(&server, &settings(3, false)).unwrap();
        let props = source.get_properties();

        assert_eq!(props.len(), 2 + MAX_CHANNELS);
        assert!(props.get(CHANNELS_KEY).is_some());
        assert!(props.get(START_SERVER_KEY).is_some());
        assert_eq!(visible_lists(&props), expected_visible(3));
        assert_eq!(JackInput::<FakeServer>::name(), "JACK Input Client");
        assert_eq!(JackInput::<FakeServer>::INFO.id, "jack_output_capture");
    }

    #[test]
    fn test_channel_round_trip_visibility() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        for channels in [5, 2] {
            let settings = settings(channels, false);
            source.update(&settings);
            let mut props = source.get_properties();
            assert!(props.property_modified(CHANNELS_KEY, &settings));
            assert_eq!(visible_lists(&props), expected_visible(channels as usize));
        }
        assert_eq!(source.channels().map(ChannelCount::get), Some(2));
    }

    #[test]
    fn test_concurrent_updates_and_queries() {
        let server = FakeServer::new();
        let source = create(&server, &settings(2, false)).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..4i64 {
                let source = &source;
                scope.spawn(move || {
                    for i in 0..50 {
                        source.update(&settings(1 + (worker + i) % 8, false));
                        let props = source.get_properties();
                        assert_eq!(props.len(), 2 + MAX_CHANNELS);
                    }
                });
            }
        });

        assert!(source.is_active());
        assert_eq!(server.stats.opens(), server.stats.closes() + 1);
    }

    proptest! {
        #[test]
        fn prop_visible_lists_follow_channel_count(channels in 1i64..=8) {
            let server = FakeServer::new();
            let source = create(&server, &settings(2, false)).unwrap();
            let mut props = source.get_properties();

            let edited = settings(channels, false);
            prop_assert!(props.property_modified(CHANNELS_KEY, &edited));
            prop_assert_eq!(visible_lists(&props), expected_visible(channels as usize));
        }
    }
}
