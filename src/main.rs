use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use muller::config::{parse_frequency_breakpoints, AnalysisConfig};
use muller::format_io::{read_trajectory_table, OutputFiles, TableFormat};
use muller::run_analysis;

/// muller - Group mutation trajectories into genotypes and infer their lineage
///
/// Reads a table of mutation frequencies over time and writes the genotype
/// table, lineage edges and ggmuller population tables.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Trajectory table (tab separated, or comma separated for .csv)
    #[clap(short = 'i', long = "input")]
    input: PathBuf,

    /// Output folder (defaults to the folder containing the input table)
    #[clap(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Frequency above which a trajectory counts as fixed
    #[clap(long = "fixed", default_value = "0.97")]
    fixed: f64,

    /// Frequency above which a trajectory counts as detected
    #[clap(long = "detected", default_value = "0.03")]
    detected: f64,

    /// Frequency at which a genotype is significantly above zero
    #[clap(short = 's', long = "significant", default_value = "0.15")]
    significant: f64,

    /// Use the legacy MATLAB thresholds and breakpoints, ignoring the threshold flags
    #[clap(long = "matlab")]
    matlab: bool,

    /// Sorting breakpoints: a step ("0.15") or a comma separated list ("1,0.5,0")
    #[clap(short = 'f', long = "frequencies", default_value = "0.15")]
    frequencies: String,

    /// p-value at or above which two trajectories join the same genotype
    #[clap(short = 'r', long = "similarity-cutoff", default_value = "0.05")]
    similarity_cutoff: f64,

    /// p-value above which two genotypes are treated as the same lineage
    #[clap(short = 'l', long = "difference-cutoff", default_value = "0.10")]
    difference_cutoff: f64,

    /// Output table format: tsv or csv (defaults to the input's format)
    #[clap(long = "format")]
    format: Option<TableFormat>,

    /// Number of threads for the pairwise comparisons
    #[clap(short = 't', long = "threads", default_value = "8")]
    threads: usize,

    /// Quiet mode (warnings and errors only)
    #[clap(long = "quiet")]
    quiet: bool,
}

fn build_config(args: &Args) -> Result<AnalysisConfig> {
    if args.matlab {
        return Ok(AnalysisConfig::matlab());
    }
    let frequency_breakpoints = parse_frequency_breakpoints(&args.frequencies)
        .with_context(|| format!("Invalid --frequencies value '{}'", args.frequencies))?;
    let config = AnalysisConfig {
        detection_breakpoint: args.detected,
        fixed_breakpoint: args.fixed,
        significant_breakpoint: args.significant,
        similarity_cutoff: args.similarity_cutoff,
        difference_cutoff: args.difference_cutoff,
        ..AnalysisConfig::default()
    };
    Ok(config.with_frequency_breakpoints(frequency_breakpoints))
}

fn output_name(input: &Path) -> String {
    input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("muller")
        .to_string()
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()?;

    let config = build_config(&args)?;
    config.validate().context("Invalid analysis thresholds")?;

    let trajectories = read_trajectory_table(&args.input)
        .with_context(|| format!("Failed to read trajectory table {}", args.input.display()))?;
    info!(
        "Read {} trajectories from {}",
        trajectories.len(),
        args.input.display()
    );

    let result = run_analysis(&trajectories, &config).context("Analysis failed")?;

    let folder = match &args.output {
        Some(folder) => folder.clone(),
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let format = args
        .format
        .unwrap_or_else(|| TableFormat::from_path(&args.input));
    let files = OutputFiles::create(&folder, &output_name(&args.input), format)
        .with_context(|| format!("Failed to create output folder {}", folder.display()))?;
    files
        .write_all(&trajectories, &result)
        .context("Failed to write result tables")?;

    info!(
        "Found {} genotypes; {} trajectories rejected",
        result.genotypes().len(),
        result.genotypes().rejected().len()
    );
    Ok(())
}
