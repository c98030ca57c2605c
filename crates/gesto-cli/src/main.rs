//! Gesto CLI - drive the gesto synthesizer engine from the command line.

mod demo;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gesto")]
#[command(author, version, about = "Gesto synthesizer engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a demo performance to a WAV file
    Render(RenderArgs),

    /// Play a demo performance through the default audio device
    Play(PlayArgs),

    /// List factory presets
    Presets(PresetsArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Factory preset name or path to a preset TOML file
    #[arg(short, long, default_value = "glass_lead")]
    preset: String,

    /// Output WAV path
    #[arg(short, long, default_value = "gesto.wav")]
    out: PathBuf,

    /// Length of the rendered performance in seconds
    #[arg(short, long, default_value_t = 4.0)]
    seconds: f32,
}

#[derive(clap::Args)]
struct PlayArgs {
    /// Factory preset name or path to a preset TOML file
    #[arg(short, long, default_value = "glass_lead")]
    preset: String,

    /// How long to play, in seconds
    #[arg(short, long, default_value_t = 4.0)]
    seconds: f32,
}

#[derive(clap::Args)]
struct PresetsArgs {
    /// Print the full TOML of one preset instead of the list
    #[arg(long)]
    show: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => render(args),
        Commands::Play(args) => play(args),
        Commands::Presets(args) => presets(args),
    }
}

/// Resolve a preset argument: factory name first, then a filesystem path.
fn resolve_preset(arg: &str) -> anyhow::Result<gesto_engine::Preset> {
    match gesto_engine::factory_preset(arg) {
        Ok(preset) => Ok(preset),
        Err(gesto_engine::PresetError::PresetNotFound(_)) => {
            gesto_engine::load_preset(arg).with_context(|| format!("loading preset '{arg}'"))
        }
        Err(e) => Err(e.into()),
    }
}

fn render(args: RenderArgs) -> anyhow::Result<()> {
    let preset = resolve_preset(&args.preset)?;
    tracing::info!(preset = %preset.name, out = %args.out.display(), "rendering");

    let sample_rate = 48000;
    let samples = demo::render_performance(&preset.settings, sample_rate as f32, args.seconds);

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&args.out, spec)
        .with_context(|| format!("creating '{}'", args.out.display()))?;
    for s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)?;
    }
    writer.finalize()?;

    println!("wrote {}", args.out.display());
    Ok(())
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    let preset = resolve_preset(&args.preset)?;
    demo::play_performance(&preset.settings, args.seconds)
}

fn presets(args: PresetsArgs) -> anyhow::Result<()> {
    if let Some(name) = args.show {
        let preset = gesto_engine::factory_preset(&name)?;
        print!("{}", gesto_engine::preset_to_toml(&preset)?);
        return Ok(());
    }

    for (name, preset) in gesto_engine::FACTORY_PRESET_NAMES
        .iter()
        .zip(gesto_engine::factory_presets())
    {
        println!("{name:<18} {}", preset.description);
    }
    Ok(())
}
