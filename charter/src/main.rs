use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use lanefall_charter::beatmap::BuilderConfig;
use lanefall_charter::onset::OnsetConfig;
use lanefall_charter::{Generator, GeneratorConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Beatmap generator for Lanefall", long_about = None)]
struct Args {
    /// Path to audio file (WAV)
    #[arg(short, long)]
    audio: PathBuf,

    /// Output beatmap path (defaults to the audio path with .json extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of lanes
    #[arg(long, default_value = "4")]
    lanes: u8,

    /// Minimum spacing between notes in the same lane, in seconds
    #[arg(long, default_value = "0.15")]
    min_spacing: f32,

    /// Maximum simultaneous notes across lanes
    #[arg(long, default_value = "1")]
    max_chord: usize,

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

    log::info!("generating beatmap for {}", args.audio.display());

    let config = GeneratorConfig {
        onset: OnsetConfig::default(),
        builder: BuilderConfig {
            lanes: args.lanes,
            min_note_spacing: args.min_spacing,
            global_spacing: args.min_spacing,
            max_chord: args.max_chord,
        },
    };

    let generator = Generator::new(config);
    let map = generator.generate(&args.audio)?;

    let output = args
        .output
        .unwrap_or_else(|| args.audio.with_extension("json"));
    map.save(&output)?;
    log::info!("saved beatmap to {}", output.display());

    println!("\n=== Beatmap Summary ===");
    println!("audio:    {}", map.audio_ref);
    println!("duration: {:.1}s", map.duration);
    println!("lanes:    {}", map.lanes);
    println!("notes:    {}", map.notes.len());
    println!("=======================\n");

    Ok(())
}
