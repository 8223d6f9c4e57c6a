//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` defaults and initializes logging
//! - parses CLI arguments
//! - runs fits / synthetic generation / photometry
//! - prints reports and writes optional exports

use std::fs::File;
use std::io::Write;

use clap::Parser;

use crate::cli::{Command, FitArgs, PhotometryArgs, SynthArgs};
use crate::domain::{FitConfig, GaussianParams, GuessOverrides, SynthConfig};
use crate::error::AppError;
use crate::fit::observed_wavelength;

pub mod pipeline;

/// Entry point for the `lineflux` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
        Command::Photometry(args) => handle_photometry(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let reports = pipeline::run_fit(&config)?;

    if args.verbose {
        for report in &reports {
            println!("{}", crate::report::format_fit_summary(report));
        }
    }
    print!("{}", crate::report::format_flux_lines(&reports));

    // Optional exports.
    if let Some(path) = &config.export_json {
        crate::io::write_fit_json(path, &reports)?;
        log::info!("Wrote fit JSON to {}", path.display());
    }
    if let Some(path) = &config.export_csv {
        crate::io::write_samples_csv_file(path, &reports)?;
        log::info!("Wrote sample CSV to {}", path.display());
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = synth_config_from_args(&args);
    let table = crate::data::generate_spectrum(&config)?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| AppError::data_load(format!("Failed to create '{}': {e}", path.display())))?;
            crate::io::write_spectrum(file, &table)?;
            log::info!("Wrote {} samples to {}", table.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            crate::io::write_spectrum(&mut lock, &table)?;
            lock.flush()
                .map_err(|e| AppError::data_load(format!("Failed to flush stdout: {e}")))?;
        }
    }
    Ok(())
}

fn handle_photometry(args: PhotometryArgs) -> Result<(), AppError> {
    let frame = crate::io::load_frame(&args.frame)?;
    let image = crate::io::load_image(&args.image)?;
    let report = crate::photometry::measure(&image, &frame, args.background)?;

    print!("{}", crate::report::format_photometry(&report));

    if let Some(path) = &args.export {
        let file = File::create(path)
            .map_err(|e| AppError::data_load(format!("Failed to create '{}': {e}", path.display())))?;
        serde_json::to_writer_pretty(file, &report)
            .map_err(|e| AppError::data_load(format!("Failed to write photometry JSON: {e}")))?;
    }
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        inputs: args.inputs.clone(),
        redshift: args.redshift,
        lambda_rest: args.lambda_rest,
        guess: GuessOverrides {
            mu: args.mu,
            sigma: args.sigma,
            b: args.baseline,
            sc: args.scale,
        },
        max_iterations: args.max_iterations,
        export_json: args.export.clone(),
        export_csv: args.export_csv.clone(),
    }
}

pub fn synth_config_from_args(args: &SynthArgs) -> SynthConfig {
    let mu = args
        .mu
        .unwrap_or_else(|| observed_wavelength(args.lambda_rest, args.redshift));
    SynthConfig {
        start: args.start,
        end: args.end,
        samples: args.samples,
        params: GaussianParams::new(mu, args.sigma, args.baseline, args.scale),
        noise: args.noise,
        seed: args.seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn fit_args_map_to_guess_overrides() {
        let cli = Cli::try_parse_from(["lineflux", "fit", "a.txt", "--sigma", "0.8", "--baseline", "0"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = fit_config_from_args(&args);
        assert_eq!(config.guess.sigma, Some(0.8));
        assert_eq!(config.guess.b, Some(0.0));
        assert_eq!(config.guess.mu, None);
    }

    #[test]
    fn synth_places_line_at_observed_wavelength() {
        let cli = Cli::try_parse_from([
            "lineflux", "synth", "--start", "8390", "--end", "8410", "-z", "0.28",
        ])
        .unwrap();
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        let config = synth_config_from_args(&args);
        assert_eq!(config.params.mu, 6563.0 * 1.28);
        assert_eq!(config.samples, 50);
    }
}
