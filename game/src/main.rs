use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

mod app;
mod audio;
mod clock;
mod error;
mod input;
mod judge;
mod session;

use lanefall_charter::audio::AudioData;
use lanefall_charter::beatmap::Beatmap;
use lanefall_charter::spectrum::SpectrumAnalyzer;
use lanefall_charter::{Generator, GeneratorConfig};

use app::LanefallApp;
use audio::AudioPlayer;
use judge::JudgeConfig;
use session::GameSession;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lanefall - four-lane rhythm game", long_about = None)]
struct Args {
    /// Path to the audio file (WAV)
    #[arg(short, long)]
    audio: PathBuf,

    /// Pre-generated beatmap to play; generated from the audio if omitted
    #[arg(short, long)]
    beatmap: Option<PathBuf>,

    /// Save the generated beatmap here for later replay
    #[arg(long)]
    save_beatmap: Option<PathBuf>,

    /// Audio latency correction in seconds (positive if hits feel late)
    #[arg(long, default_value = "0.0")]
    latency_offset: f32,

    /// Run without audio output (clock-only playback)
    #[arg(long)]
    mute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_default_env()
        .filter_level(level.parse()?)
        .init();

    // Everything that can fail happens here, before the frame loop starts.
    let audio_data = AudioData::load(&args.audio)
        .with_context(|| format!("cannot load {}", args.audio.display()))?;

    let beatmap = match &args.beatmap {
        Some(path) => {
            log::info!("loading beatmap from {}", path.display());
            Beatmap::load(path).with_context(|| format!("cannot load {}", path.display()))?
        }
        None => {
            log::info!("generating beatmap from {}", args.audio.display());
            let generator = Generator::new(GeneratorConfig::default());
            generator.generate_from_audio(&audio_data, &args.audio.to_string_lossy())?
        }
    };
    log::info!(
        "playing {} notes over {:.1}s",
        beatmap.notes.len(),
        beatmap.duration
    );

    if let Some(path) = &args.save_beatmap {
        beatmap.save(path)?;
        log::info!("saved beatmap to {}", path.display());
    }

    let spectrum = SpectrumAnalyzer::new(audio_data.to_mono(), audio_data.sample_rate);

    let player = if args.mute {
        None
    } else {
        let player = AudioPlayer::new()?;
        player.load_file(&args.audio)?;
        Some(player)
    };

    let session = GameSession::new(beatmap, JudgeConfig::default(), args.latency_offset);
    let game = LanefallApp::new(session, spectrum, player);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([app::WINDOW_WIDTH, app::WINDOW_HEIGHT])
            .with_resizable(false),
        ..Default::default()
    };

    // eframe owns the window and input backend; if it fails the loop has
    // already exited and the last score was logged on close
    eframe::run_native("Lanefall", options, Box::new(|_cc| Box::new(game)))
        .map_err(|e| error::GameError::InputDevice(e.to_string()))?;

    Ok(())
}
