//! roomrir - room impulse responses with the image-source method

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};

use roomrir::io::scene_json::{SceneFile, SceneSetup, load_scene, to_scene_string};
use roomrir::sim::acoustics::auralization::wav::{read_wav, wav_sample_rate, write_wav};
use roomrir::sim::acoustics::metrics::RirMetrics;
use roomrir::sim::acoustics::impulse_response::normalize_peak;
use roomrir::sim::scene::RirSet;

/// Room impulse response simulator for rectangular rooms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute impulse responses and write one WAV per speaker (one channel per microphone)
    Simulate {
        /// Path to the scene JSON file
        #[arg(short, long)]
        scene: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Scale each file so its loudest sample is at full range
        #[arg(long)]
        normalize: bool,
    },
    /// Convolve a dry recording with every speaker's impulse responses
    Auralize {
        /// Path to the scene JSON file
        #[arg(short, long)]
        scene: PathBuf,

        /// Dry WAV file (down-mixed to mono), at the scene's sample rate
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,
    },
    /// Print an example scene file
    ExampleScene {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match args.command {
        Command::Simulate {
            scene,
            out_dir,
            normalize,
        } => simulate(&scene, &out_dir, normalize),
        Command::Auralize {
            scene,
            input,
            out_dir,
        } => auralize(&scene, &input, &out_dir),
        Command::ExampleScene { output } => example_scene(output.as_deref()),
    }
}

fn load(scene_path: &Path) -> Result<(SceneSetup, RirSet)> {
    info!("Loading scene from {:?}", scene_path);
    let setup = load_scene(scene_path)
        .with_context(|| format!("Failed to load scene: {:?}", scene_path))?;
    let rirs = setup
        .compute()
        .context("Failed to compute impulse responses")?;
    Ok((setup, rirs))
}

fn simulate(scene_path: &Path, out_dir: &Path, normalize: bool) -> Result<()> {
    let (setup, rirs) = load(scene_path)?;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    for (s, speaker) in setup.scene.speakers().iter().enumerate() {
        for (m, mic) in setup.scene.microphones().iter().enumerate() {
            let Some(ir) = rirs.get(s, m) else {
                continue;
            };
            let metrics = RirMetrics::from_ir(ir);
            info!(
                "  {} -> {}: RT60 {}, EDT {}, DRR {}",
                speaker.name,
                mic.name,
                fmt_opt(metrics.rt60, "s"),
                fmt_opt(metrics.edt, "s"),
                fmt_opt(metrics.drr, "dB")
            );
            if ir.peak().is_none_or(|(_, v)| v == 0.0) {
                warn!(
                    "Impulse response {} -> {} is silent (window too short?)",
                    speaker.name, mic.name
                );
            }
        }

        let path = out_dir.join(format!("{speaker}.wav"));
        rirs.write_wav(s, &path, normalize)
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote {:?}", path);
    }
    Ok(())
}

fn auralize(scene_path: &Path, input: &Path, out_dir: &Path) -> Result<()> {
    let (setup, rirs) = load(scene_path)?;
    let (dry, dry_rate) =
        read_wav(input).with_context(|| format!("Failed to read dry audio: {:?}", input))?;
    let sample_rate = wav_sample_rate(setup.field.sample_rate)?;
    if dry_rate != sample_rate {
        bail!(
            "{:?} is sampled at {} Hz but the scene uses {} Hz",
            input,
            dry_rate,
            sample_rate
        );
    }
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    for (s, speaker) in setup.scene.speakers().iter().enumerate() {
        let mut wet = rirs.convolve(s, &dry)?;
        normalize_peak(&mut wet);
        let path = out_dir.join(format!("{speaker}_wet.wav"));
        write_wav(&path, &wet, sample_rate)
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote {:?} ({} samples)", path, wet.first().map_or(0, Vec::len));
    }
    Ok(())
}

fn example_scene(output: Option<&Path>) -> Result<()> {
    let json = to_scene_string(&SceneFile::example())?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote example scene to {:?}", path);
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.2} {unit}"),
        None => "n/a".to_string(),
    }
}
