//! Host capture-source framework glue
//!
//! The host drives every source through the same fixed set of lifecycle
//! hooks. [`CaptureSource`] is that set; [`SourceInstance`] is the slot the
//! host keeps per source, which stays empty when creation failed.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::properties::Properties;
use crate::settings::Settings;

/// Kind of source as the host classifies it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Input,
}

/// Static description the host registers a source kind under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: &'static str,
    pub source_type: SourceType,
    pub audio: bool,
    pub video: bool,
}

/// The host-side object a source is attached to.
///
/// The user can rename a source at any time; sources read the name on
/// every update.
#[derive(Debug)]
pub struct SourceContext {
    name: RwLock<String>,
}

impl SourceContext {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: RwLock::new(name.into()),
        })
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn rename(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }
}

/// Lifecycle hooks a source implements for the host
pub trait CaptureSource: Sized {
    /// Audio server the source opens clients on
    type Server;

    const INFO: SourceInfo;

    /// Display name of the source kind
    fn name() -> &'static str;

    /// Build a source. `None` makes the host reject the source.
    fn create(settings: &Settings, context: Arc<SourceContext>, server: Self::Server) -> Option<Self>;

    /// Tear down and free
    fn destroy(self);

    /// Apply changed settings
    fn update(&self, settings: &Settings);

    /// Fill in default values
    fn get_defaults(settings: &mut Settings);

    /// Describe the property panel
    fn get_properties(&self) -> Properties;
}

/// Host-held slot for one source; empty when `create` failed
pub struct SourceInstance<S: CaptureSource> {
    source: Option<S>,
    settings: Settings,
}

impl<S: CaptureSource> SourceInstance<S> {
    /// Apply defaults under `settings` and create the source
    pub fn create(mut settings: Settings, context: Arc<SourceContext>, server: S::Server) -> Self {
        S::get_defaults(&mut settings);
        let source = S::create(&settings, context, server);
        if source.is_none() {
            tracing::warn!(id = S::INFO.id, "source creation failed");
        }
        Self { source, settings }
    }

    pub fn get(&self) -> Option<&S> {
        self.source.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.source.is_some()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings and forward them to the source
    pub fn update(&mut self, settings: Settings) {
        self.settings = settings;
        S::get_defaults(&mut self.settings);
        if let Some(source) = &self.source {
            source.update(&self.settings);
        }
    }

    pub fn properties(&self) -> Option<Properties> {
        self.source.as_ref().map(S::get_properties)
    }

    /// Destroy the source; a no-op for a slot whose `create` failed
    pub fn destroy(mut self) {
        if let Some(source) = self.source.take() {
            source.destroy();
        }
    }
}
