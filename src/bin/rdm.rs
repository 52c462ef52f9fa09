use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use plotters::prelude::*;
use rdm_lib::{
    datacube::DataCube,
    rdm::{CubeKind, Diagnostics, MapPeak, Scenario},
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rdm", about = "Simulate the range-Doppler map of a pulse-Doppler radar")]
struct Cli {
    /// Scenario file (JSON). Overrides --example.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Built-in scenario to run when no file is given
    #[arg(long, value_enum, default_value_t = Example::Skin)]
    example: Example,
    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
    /// Number of pulses in the CPI, instead of the radar's dwell time
    #[arg(long)]
    num_pulses: Option<usize>,
    /// Render the magnitude of the chosen map to a PNG file
    #[arg(long)]
    png: Option<PathBuf>,
    /// Map to summarize and plot. The injected and matched snapshots are
    /// taken before Doppler processing.
    #[arg(long, value_enum, default_value_t = Cube::Total)]
    cube: Cube,
    /// Dynamic range of the heat map, dB below the peak
    #[arg(long, default_value_t = 60.)]
    dynamic_range: f64,
    /// Print the resolved scenario as JSON and exit
    #[arg(long)]
    dump_scenario: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Example {
    Skin,
    Memory,
}

impl Example {
    fn scenario(self) -> Scenario {
        match self {
            Example::Skin => Scenario::skin_example(),
            Example::Memory => Scenario::memory_example(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Cube {
    Total,
    Signal,
    Noise,
    Injected,
    Matched,
}

impl From<Cube> for CubeKind {
    fn from(cube: Cube) -> Self {
        match cube {
            Cube::Total => CubeKind::Total,
            Cube::Signal => CubeKind::Signal,
            Cube::Noise => CubeKind::Noise,
            Cube::Injected => CubeKind::Injected,
            Cube::Matched => CubeKind::MatchedFiltered,
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    cube: CubeKind,
    shape: (usize, usize),
    peak: Option<MapPeak>,
    diagnostics: &'a Diagnostics,
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut scenario = match &cli.scenario {
        Some(path) => load_scenario(path)?,
        None => cli.example.scenario(),
    };
    if cli.seed.is_some() {
        scenario.seed = cli.seed;
    }
    if cli.num_pulses.is_some() {
        scenario.num_pulses = cli.num_pulses;
    }
    let kind = CubeKind::from(cli.cube);
    if !kind.is_doppler_processed() {
        scenario.options.record_steps = true;
    }

    if cli.dump_scenario {
        println!("{}", serde_json::to_string_pretty(&scenario)?);
        return Ok(());
    }

    let rdm = scenario.run().context("generating range-Doppler map")?;
    let cube = rdm
        .cube(kind)
        .ok_or_else(|| anyhow!("{:?} cube was not recorded", kind))?;

    if let Some(path) = &cli.png {
        render_heat_map(cube, cli.dynamic_range, path)?;
        info!(path = %path.display(), "wrote heat map");
    }

    let summary = Summary {
        cube: kind,
        shape: cube.shape(),
        peak: rdm.peak(kind),
        diagnostics: &rdm.diagnostics,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

// Blue at the floor of the dynamic range through to red at the peak.
fn colormap(value: f64, floor: f64, dynamic_range: f64) -> HSLColor {
    let t = if value.is_finite() {
        ((value - floor) / dynamic_range).clamp(0., 1.)
    } else {
        0.
    };
    HSLColor(0.66 * (1. - t), 1., 0.15 + 0.35 * t)
}

// Range increases up the image, Doppler bins (or pulses) run left to right.
fn render_heat_map(cube: &DataCube, dynamic_range: f64, path: &Path) -> Result<()> {
    let db = cube.magnitude_db();
    let (bins, pulses) = db.dim();
    if bins == 0 || pulses == 0 {
        return Err(anyhow!("nothing to plot, map is {}x{}", bins, pulses));
    }
    let dynamic_range = dynamic_range.abs().max(1.);

    let peak = db
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = peak - dynamic_range;

    let cell_w = (1200 / pulses).clamp(1, 8) as u32;
    let cell_h = (600 / bins).clamp(1, 8) as u32;
    let size = (pulses as u32 * cell_w, bins as u32 * cell_h);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&BLACK).map_err(|e| anyhow!("{:?}", e))?;

    for ((range_bin, pulse), &value) in db.indexed_iter() {
        let x = (pulse as u32 * cell_w) as i32;
        let y = ((bins - 1 - range_bin) as u32 * cell_h) as i32;
        root.draw(&Rectangle::new(
            [(x, y), (x + cell_w as i32, y + cell_h as i32)],
            colormap(value, floor, dynamic_range).filled(),
        ))
        .map_err(|e| anyhow!("{:?}", e))?;
    }

    root.present().map_err(|e| anyhow!("{:?}", e))?;

    Ok(())
}
