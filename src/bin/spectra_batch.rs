//! # spectra-batch
//!
//! Runs the workbench's processing without the viewer.
//!
//! ```bash
//! # Apply the filters of a pipeline file
//! spectra-batch process raw.json corrected.json --config pipeline.toml
//!
//! # Train the configured detectors on a reference set and check a batch
//! spectra-batch detect batch.json --config pipeline.toml --train reference.json
//!
//! # Merge 3-way data, summing X layers into one value per (y, z) cell
//! spectra-batch collapse a.csv b.csv -o merged.csv --statistic median
//!
//! # Per-spectrum amplitude statistics
//! spectra-batch stats batch.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use spectra_workbench::config::PipelineConfig;
use spectra_workbench::data::loader;
use spectra_workbench::data::model::Spectrum;
use spectra_workbench::outlier::{detect_all, OutlierDetector};
use spectra_workbench::processing::stats::SpectrumStatistics;
use spectra_workbench::processing::{SpectrumFilter, Statistic};

/// spectra-batch - command-line spectral processing
#[derive(Parser)]
#[command(name = "spectra-batch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train and apply the configured filters
    Process {
        /// Input spectra (.parquet, .json, .csv, .sspec)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output spectra (.json, .csv, .sspec)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Pipeline configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Train the filters on these spectra instead of the input
        #[arg(short, long)]
        train: Option<PathBuf>,
    },

    /// Report outliers among the input spectra
    Detect {
        /// Input spectra
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Pipeline configuration (TOML); filters run before detection
        #[arg(short, long)]
        config: PathBuf,

        /// Train filters and detectors on these spectra instead of the input
        #[arg(short, long)]
        train: Option<PathBuf>,
    },

    /// Merge 3-way data files (.eem or x,y,z,value CSV)
    Collapse {
        /// Input files
        #[arg(value_name = "INPUT", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// mean, median or stdev; overrides the configuration
        #[arg(short, long)]
        statistic: Option<Statistic>,

        /// Pipeline configuration (TOML) with [collapse] and [value_range]
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print per-spectrum amplitude statistics
    Stats {
        /// Input spectra
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Also write the spectra with the statistics added to their reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            train,
        } => run_process(&input, &output, &config, train.as_deref()),
        Commands::Detect {
            input,
            config,
            train,
        } => run_detect(&input, &config, train.as_deref()),
        Commands::Collapse {
            inputs,
            output,
            statistic,
            config,
        } => run_collapse(&inputs, &output, statistic, config.as_deref()),
        Commands::Stats { input, output } => run_stats(&input, output.as_deref()),
    }
}

/// Training set: the given file, or the input itself.
fn training_set(train: Option<&Path>, input: &[Spectrum]) -> Result<Vec<Spectrum>> {
    match train {
        Some(path) => loader::read_spectra(path),
        None => Ok(input.to_vec()),
    }
}

/// Train `filter` on `training` if it needs it.
fn train(filter: &mut dyn SpectrumFilter, training: &[Spectrum]) -> Result<()> {
    if filter.requires_training() {
        filter
            .train(training)
            .with_context(|| format!("training {}", filter.name()))?;
    }
    Ok(())
}

fn apply(filter: &dyn SpectrumFilter, spectra: &[Spectrum]) -> Result<Vec<Spectrum>> {
    spectra
        .iter()
        .map(|sp| {
            filter
                .filter(sp)
                .with_context(|| format!("filtering spectrum '{}'", sp.id))
        })
        .collect()
}

fn run_process(input: &Path, output: &Path, config: &Path, train_path: Option<&Path>) -> Result<()> {
    let config = PipelineConfig::from_file(config)?;
    let mut chain = config.build_filters().context("invalid filter configuration")?;
    if chain.is_empty() {
        warn!("no filters configured, spectra are copied unchanged");
    }

    let spectra = loader::read_spectra(input)?;
    train(&mut chain, &training_set(train_path, &spectra)?)?;
    let processed = apply(&chain, &spectra)?;

    loader::save_file(output, &processed)?;
    info!("processed {} spectra with {} filters", processed.len(), chain.len());
    Ok(())
}

fn run_detect(input: &Path, config: &Path, train_path: Option<&Path>) -> Result<()> {
    let config = PipelineConfig::from_file(config)?;
    let mut detectors: Vec<Box<dyn OutlierDetector>> = config.build_detectors();
    if detectors.is_empty() {
        bail!("no detectors configured");
    }

    let spectra = loader::read_spectra(input)?;
    let training = training_set(train_path, &spectra)?;

    // Detection sees the same preprocessing as training.
    let mut chain = config.build_filters().context("invalid filter configuration")?;
    train(&mut chain, &training)?;
    let training = apply(&chain, &training)?;
    let spectra = apply(&chain, &spectra)?;

    for detector in detectors.iter_mut().filter(|d| d.requires_training()) {
        detector
            .train(&training)
            .with_context(|| format!("training {}", detector.name()))?;
    }

    let mut flagged = 0;
    for sp in &spectra {
        let violations = detect_all(&detectors, sp)?;
        if !violations.is_empty() {
            flagged += 1;
            for v in violations {
                println!("{}\t{v}", sp.id);
            }
        }
    }
    info!("{flagged} of {} spectra flagged", spectra.len());
    Ok(())
}

fn run_collapse(
    inputs: &[PathBuf],
    output: &Path,
    statistic: Option<Statistic>,
    config: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let mut collapse = config.collapse();
    if let Some(statistic) = statistic {
        collapse.statistic = statistic;
    }

    let data = inputs
        .iter()
        .map(|p| loader::read_three_way(p))
        .collect::<Result<Vec<_>>>()?;
    let merged = collapse.merge(&data)?;
    info!(
        "collapsed {} inputs into {} cells using {}",
        data.len(),
        merged.point_count(),
        collapse.statistic
    );

    let range = config.value_range();
    for v in range.detect_three_way(&merged) {
        warn!("{}: {v}", range.name());
    }

    loader::save_three_way(output, &merged)
}

fn run_stats(input: &Path, output: Option<&Path>) -> Result<()> {
    let mut spectra = loader::read_spectra(input)?;

    println!("id\tpoints\tmin\tmax\tmean\tmedian\tstdev");
    for sp in &mut spectra {
        let stats = SpectrumStatistics::compute(sp);
        println!(
            "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
            sp.id, stats.count, stats.min, stats.max, stats.mean, stats.median, stats.stdev
        );
        sp.report.merge(&stats.to_report());
    }

    if let Some(output) = output {
        loader::save_file(output, &spectra)?;
    }
    Ok(())
}
