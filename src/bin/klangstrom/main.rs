//! klangstrom - play a preset graph on the system audio output.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};

use klangstrom::device::{CpalDevice, PlaybackConfig};
use klangstrom::nodes::{MonoSink, StereoSink};
use klangstrom::{presets, Engine, DEFAULT_BLOCK_SIZE};

#[derive(Parser)]
#[command(name = "klangstrom")]
#[command(author, version, about = "Pull-based audio graph player", long_about = None)]
struct Cli {
    /// Graph to play
    #[arg(short, long, value_enum, default_value_t = Preset::Organ)]
    preset: Preset,

    /// Stop after this many seconds (plays until the graph runs dry otherwise)
    #[arg(short, long)]
    seconds: Option<f32>,

    /// Raw int16 LE mono file for the `file` preset
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output device (substring of its name, case-insensitive)
    #[arg(short, long)]
    device: Option<String>,

    /// Output latency in milliseconds
    #[arg(long, default_value_t = 500)]
    latency_ms: u32,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Preset {
    /// Nine detuned partials with vibrato
    Organ,
    /// 1 kHz sine
    Beep,
    /// Filtered noise, delayed left, chopped right
    StereoNoise,
    /// Play `--file`
    File,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if cli.list_devices {
        for name in CpalDevice::list_outputs() {
            println!("{name}");
        }
        return Ok(());
    }

    let config = PlaybackConfig::default()
        .with_sample_rate(cli.sample_rate)
        .with_latency_us(cli.latency_ms.saturating_mul(1000));
    let mut engine = Engine::new(cli.sample_rate);

    match cli.preset {
        Preset::Organ | Preset::Beep | Preset::File => {
            let output = match cli.preset {
                Preset::Organ => presets::organ(engine.graph_mut())?,
                Preset::Beep => presets::beep(engine.graph_mut()),
                _ => {
                    let Some(path) = cli.file.as_ref() else {
                        bail!("the file preset needs --file");
                    };
                    presets::pcm_file(engine.graph_mut(), path)
                        .with_context(|| format!("opening {}", path.display()))?
                }
            };
            let device = CpalDevice::open_named(cli.device.as_deref(), config.with_channels(1))?;
            engine.add_sink(MonoSink::new(output, device)?);
        }
        Preset::StereoNoise => {
            let (left, right) = presets::stereo_noise(engine.graph_mut());
            let device = CpalDevice::open_named(cli.device.as_deref(), config.with_channels(2))?;
            engine.add_sink(StereoSink::new(left, right, device)?);
        }
    }

    info!(preset = ?cli.preset, nodes = engine.graph().len(), "graph built");

    match cli.seconds {
        Some(seconds) => {
            let blocks =
                (seconds.max(0.0) * cli.sample_rate as f32 / DEFAULT_BLOCK_SIZE as f32).ceil();
            engine.run_blocks(blocks as u64);
        }
        None => {
            let never = std::sync::atomic::AtomicBool::new(false);
            engine.run_until(&never);
        }
    }

    engine.finish()?;
    Ok(())
}
