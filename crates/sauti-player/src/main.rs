//! Sauti - streaming TTS playback for the terminal

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use sauti_core::{driver, AudioBackend, Error, SimBackend, SimClock, StreamConfig, StreamSession};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod client;
mod output;
mod settings;
mod ui;

use client::{TtsClient, TtsRequest};
use output::CpalBackend;
use settings::Settings;
use ui::{PlayerMode, Presenter};

/// Command-line arguments for sauti
#[derive(Parser, Debug)]
#[command(name = "sauti")]
#[command(about = "Streaming TTS player")]
#[command(version)]
struct Args {
    /// Text to speak
    #[arg(required_unless_present = "init_config")]
    text: Option<String>,

    /// Server base URL
    #[arg(short, long, env = "SAUTI_SERVER_URL")]
    server: Option<String>,

    /// Predefined voice name
    #[arg(short, long)]
    voice: Option<String>,

    /// Reference audio filename for voice cloning
    #[arg(long, conflicts_with = "voice")]
    reference: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Emotion exaggeration factor
    #[arg(long)]
    exaggeration: Option<f32>,

    /// Classifier-free guidance weight
    #[arg(long)]
    cfg_weight: Option<f32>,

    /// Playback speed factor
    #[arg(long)]
    speed: Option<f32>,

    /// Generation seed, 0 for random
    #[arg(long)]
    seed: Option<u32>,

    /// Language code
    #[arg(long)]
    language: Option<String>,

    /// Characters per chunk when the service splits long text
    #[arg(long)]
    chunk_size: Option<u32>,

    /// Send the text as one piece instead of splitting
    #[arg(long)]
    no_split: bool,

    /// Fetch the complete file instead of streaming
    #[arg(long)]
    batch: bool,

    /// Run without an audio device
    #[arg(long)]
    no_audio: bool,

    /// Disable the live level meter
    #[arg(long)]
    no_meter: bool,

    /// Write the finished audio to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sauti=info,sauti_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if args.init_config {
        let path =
            Settings::config_path().context("No config directory available on this platform")?;
        Settings::write_default(&path)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let settings = Settings::load().unwrap_or_else(|e| {
        warn!("Falling back to default settings: {}", e);
        Settings::default()
    });

    let server_url = args
        .server
        .clone()
        .unwrap_or_else(|| settings.server_url.clone());
    let request = build_request(&args, &settings);
    let client = TtsClient::new(&server_url);
    let presenter = Presenter::new(if args.batch {
        PlayerMode::Finalized
    } else {
        PlayerMode::Live
    });

    let backend: Box<dyn AudioBackend> = if args.no_audio {
        Box::new(SimBackend::new(SimClock::monotonic()))
    } else {
        Box::new(CpalBackend::default_device()?)
    };
    let mut session = StreamSession::new(StreamConfig::default(), backend);

    // Ctrl-C cancels the stream even while a transport read is stalled.
    let cancel_handle = session.handle();

    if presenter.is_live() && settings.meter && !args.no_meter {
        let meter = presenter.clone();
        tokio::spawn(
            session
                .visualizer()
                .run(move |window| meter.render_meter(window)),
        );
    }

    let result = if args.batch {
        let spinner = presenter.waiting_spinner();
        let generated = tokio::select! {
            generated = client.generate(request) => generated,
            _ = signal::ctrl_c() => {
                info!("Interrupt received, cancelling request");
                cancel_handle.cancel();
                Err(Error::Cancelled)
            }
        };
        spinner.finish_and_clear();
        match generated {
            // The complete file runs through the same pipeline as a
            // stream of one chunk.
            Ok(bytes) => driver::pump(&mut session, futures::stream::iter(vec![Ok(bytes)])).await,
            Err(e) => Err(e),
        }
    } else {
        let spinner = presenter.waiting_spinner();
        let on_first = spinner.clone();
        let stream = client.stream(request).inspect(move |_| {
            if !on_first.is_finished() {
                on_first.finish_and_clear();
            }
        });
        tokio::pin!(stream);
        let result = tokio::select! {
            result = driver::pump(&mut session, stream) => result,
            _ = signal::ctrl_c() => {
                info!("Interrupt received, cancelling stream");
                cancel_handle.cancel();
                Err(Error::Cancelled)
            }
        };
        if !spinner.is_finished() {
            spinner.finish_and_clear();
        }
        result
    };

    match result {
        Ok(artifact) => {
            tokio::select! {
                _ = driver::drain(&session) => {}
                _ = signal::ctrl_c() => info!("Playback interrupted"),
            }
            session.stop_playback();
            presenter.clear_meter();
            presenter.summary(&artifact);
            if let Some(path) = &args.output {
                fs::write(path, &artifact.bytes)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Saved audio to {}", path.display());
            }
            Ok(())
        }
        Err(Error::Cancelled) => {
            session.abort();
            presenter.clear_meter();
            info!("Stream cancelled");
            Ok(())
        }
        Err(e) => {
            presenter.clear_meter();
            Err(e.into())
        }
    }
}

/// Merge command-line overrides over file settings into a request.
fn build_request(args: &Args, settings: &Settings) -> TtsRequest {
    let voice_mode = if args.reference.is_some() {
        "clone".to_string()
    } else if args.voice.is_some() {
        "predefined".to_string()
    } else {
        settings.voice_mode.clone()
    };
    // The service expects exactly one voice field, matching the mode.
    let (predefined_voice, reference_audio_filename) = if voice_mode == "clone" {
        (
            None,
            args.reference
                .clone()
                .or_else(|| settings.reference_audio.clone()),
        )
    } else {
        (
            args.voice.clone().or_else(|| settings.predefined_voice.clone()),
            None,
        )
    };
    TtsRequest {
        text: args.text.clone().unwrap_or_default(),
        voice_mode,
        predefined_voice,
        reference_audio_filename,
        output_format: settings.output_format.clone(),
        split_text: if args.no_split { false } else { settings.split_text },
        chunk_size: args.chunk_size.unwrap_or(settings.chunk_size),
        temperature: args.temperature.unwrap_or(settings.temperature),
        exaggeration: args.exaggeration.unwrap_or(settings.exaggeration),
        cfg_weight: args.cfg_weight.unwrap_or(settings.cfg_weight),
        speed_factor: args.speed.unwrap_or(settings.speed_factor),
        seed: args.seed.unwrap_or(settings.seed),
        language: args.language.clone().unwrap_or_else(|| settings.language.clone()),
    }
}
