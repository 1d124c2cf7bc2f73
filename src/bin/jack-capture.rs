//! JACK Capture Host
//!
//! Minimal stand-in for the host application: creates one JACK input source
//! from a settings file, drains its captured audio and reports throughput.
//!
//! Usage: `jack-capture [settings.json] [--config path] [--name source-name]`

use anyhow::{bail, Context, Result};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jack_capture_source::{
    audio::RingBuffer,
    channels::port_list_key,
    config::SourceConfig,
    constants::*,
    properties::PropertyKind,
    server::{list_source_ports, JackServer},
    settings::Settings,
    CaptureSource, JackInput, SourceContext, SourceInstance,
};

struct Args {
    settings: Option<PathBuf>,
    config: Option<PathBuf>,
    name: String,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        settings: None,
        config: None,
        name: "JACK Input".to_string(),
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--name" => args.name = iter.next().context("--name needs a value")?,
            _ if args.settings.is_none() => args.settings = Some(arg.into()),
            _ => bail!("Unexpected argument: {}", arg),
        }
    }

    Ok(args)
}

/// Running totals of drained audio
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct CaptureStats {
    frames: u64,
    samples: u64,
    peak: f32,
}

impl CaptureStats {
    /// Pop every queued frame from `audio`
    fn drain(&mut self, audio: &RingBuffer) {
        while let Some(frame) = audio.pop() {
            self.frames += 1;
            self.samples += frame.samples.len() as u64;
            self.peak = frame.samples.iter().fold(self.peak, |p, s| p.max(s.abs()));
        }
    }
}

/// Drain `audio` and log throughput until `shutdown` resolves
async fn capture_until<F: Future>(audio: &RingBuffer, shutdown: F) -> CaptureStats {
    let mut stats = CaptureStats::default();
    let mut stats_interval = tokio::time::interval(Duration::from_secs(5));
    let mut drain_interval = tokio::time::interval(Duration::from_millis(10));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = drain_interval.tick() => stats.drain(audio),
            _ = stats_interval.tick() => {
                tracing::info!(
                    "Stats: {} frames, {} samples, peak {:.3}, {} overflows",
                    stats.frames,
                    stats.samples,
                    stats.peak,
                    audio.overflow_count()
                );
                stats.peak = 0.0;
            }
        }
    }

    stats.drain(audio);
    stats
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    let config = SourceConfig::load(args.config.as_deref()).context("Failed to load config")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting {}", JackInput::<JackServer>::name());

    let settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::new(),
    };

    // List ports that can feed a channel
    println!("\n=== Available JACK Source Ports ===");
    match list_source_ports(settings.get_bool(START_SERVER_KEY)) {
        Ok(ports) => {
            for port in &ports {
                println!("  {}", port);
            }
        }
        Err(e) => println!("  (unavailable: {})", e),
    }
    println!();

    let context = SourceContext::new(args.name);
    let instance: SourceInstance<JackInput<JackServer>> =
        SourceInstance::create(settings, context, JackServer::new(config.client.clone()));

    let Some(source) = instance.get() else {
        bail!("Could not connect to the JACK server");
    };

    if let Some(props) = instance.properties() {
        for property in props.iter().filter(|p| p.is_visible()) {
            if *property.kind() == PropertyKind::StringList {
                let channel = (0..MAX_CHANNELS)
                    .find(|&i| port_list_key(i) == Some(property.name()))
                    .unwrap_or(0);
                println!("  {}: {:?}", property.description(), source.port_list(channel));
            }
        }
    }

    let Some(audio) = source.audio() else {
        bail!("Source has no active client");
    };

    tracing::info!(
        "Capturing {} channels at {}Hz - press Ctrl+C to stop",
        source.channels().map(|c| c.get()).unwrap_or(0),
        source.sample_rate().unwrap_or(0)
    );

    let stats = capture_until(&audio, tokio::signal::ctrl_c()).await;
    tracing::info!(
        "Captured {} frames, {} samples, {} overflows",
        stats.frames,
        stats.samples,
        audio.overflow_count()
    );

    tracing::info!("Shutting down");
    instance.destroy();
    Ok(())
}
