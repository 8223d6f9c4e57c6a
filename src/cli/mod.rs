//! Command-line parsing for the line-flux tools.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting and photometry code. Most numeric options can also be supplied as
//! `LINEFLUX_*` environment variables (a `.env` file is loaded at startup).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::BackgroundStat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lineflux", version, about = "Emission-line flux fitting and aperture photometry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a Gaussian line to one or more spectra and print `flux +/- error`.
    Fit(FitArgs),
    /// Write a synthetic Gaussian-line spectrum (useful for checking the fitter).
    Synth(SynthArgs),
    /// Measure a target star against a reference star in an image.
    Photometry(PhotometryArgs),
}

/// Options for fitting spectra.
#[derive(Debug, Parser, Clone)]
#[command(allow_negative_numbers = true)]
pub struct FitArgs {
    /// Spectrum files: comma-separated `wavelength,intensity`, no header.
    #[arg(required = true, value_name = "SPECTRUM")]
    pub inputs: Vec<PathBuf>,

    /// Redshift of the source.
    #[arg(short = 'z', long, env = "LINEFLUX_REDSHIFT", default_value_t = 0.0)]
    pub redshift: f64,

    /// Rest-frame wavelength of the line (default: H-alpha).
    #[arg(long, env = "LINEFLUX_LAMBDA_REST", default_value_t = 6563.0)]
    pub lambda_rest: f64,

    /// Initial line centre (default: observed wavelength of the line).
    #[arg(long)]
    pub mu: Option<f64>,

    /// Initial line width (default: 0.5).
    #[arg(long, env = "LINEFLUX_SIGMA")]
    pub sigma: Option<f64>,

    /// Initial baseline (default: 0.1).
    #[arg(long)]
    pub baseline: Option<f64>,

    /// Initial area scale (default: 5).
    #[arg(long)]
    pub scale: Option<f64>,

    /// Solver iteration cap (default: 200 * (params + 1)).
    #[arg(long, env = "LINEFLUX_MAX_ITERATIONS")]
    pub max_iterations: Option<usize>,

    /// Print fit diagnostics before the result lines.
    #[arg(short, long)]
    pub verbose: bool,

    /// Export fit reports to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export per-sample normalized data, model and residuals to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,
}

/// Options for generating a synthetic spectrum.
#[derive(Debug, Parser, Clone)]
#[command(allow_negative_numbers = true)]
pub struct SynthArgs {
    /// First wavelength.
    #[arg(long)]
    pub start: f64,

    /// Last wavelength.
    #[arg(long)]
    pub end: f64,

    /// Number of evenly spaced samples.
    #[arg(short = 'n', long, default_value_t = 50)]
    pub samples: usize,

    /// Redshift used to place the line when `--mu` is not given.
    #[arg(short = 'z', long, env = "LINEFLUX_REDSHIFT", default_value_t = 0.0)]
    pub redshift: f64,

    /// Rest-frame wavelength used to place the line when `--mu` is not given.
    #[arg(long, env = "LINEFLUX_LAMBDA_REST", default_value_t = 6563.0)]
    pub lambda_rest: f64,

    /// Line centre (default: observed wavelength).
    #[arg(long)]
    pub mu: Option<f64>,

    #[arg(long, default_value_t = 0.5)]
    pub sigma: f64,

    #[arg(long, default_value_t = 0.1)]
    pub baseline: f64,

    #[arg(long, default_value_t = 5.0)]
    pub scale: f64,

    /// Standard deviation of additive Gaussian noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output file (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Options for aperture photometry.
#[derive(Debug, Parser, Clone)]
pub struct PhotometryArgs {
    /// Image as a comma-separated pixel grid (one image row per line).
    #[arg(long, value_name = "CSV")]
    pub image: PathBuf,

    /// Frame description (WCS, gain, MJD, star positions) as JSON.
    #[arg(long, value_name = "JSON")]
    pub frame: PathBuf,

    /// Background statistic subtracted from the apertures.
    #[arg(long, value_enum, default_value_t = BackgroundStat::Median)]
    pub background: BackgroundStat,

    /// Export the measurement to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_accepts_several_inputs_and_negative_scale() {
        let cli = Cli::try_parse_from([
            "lineflux", "fit", "a.txt", "b.txt", "-z", "0.28", "--scale", "-5",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.redshift, 0.28);
        assert_eq!(args.scale, Some(-5.0));
        assert_eq!(args.lambda_rest, 6563.0);
    }

    #[test]
    fn fit_requires_an_input() {
        assert!(Cli::try_parse_from(["lineflux", "fit"]).is_err());
    }

    #[test]
    fn photometry_background_choice() {
        let cli = Cli::try_parse_from([
            "lineflux", "photometry", "--image", "img.csv", "--frame", "f.json", "--background", "mean",
        ])
        .unwrap();
        let Command::Photometry(args) = cli.command else {
            panic!("expected photometry");
        };
        assert_eq!(args.background, BackgroundStat::Mean);
    }
}
