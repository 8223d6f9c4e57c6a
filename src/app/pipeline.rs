//! Shared "fit pipeline" logic.
//!
//! load spectrum -> normalize -> fit -> report, once per input file. Files are
//! independent, so they are processed in parallel; results keep input order and
//! the first failing file (in input order) aborts the run.

use rayon::prelude::*;

use crate::domain::{FitConfig, FitReport, SpectrumTable};
use crate::error::AppError;
use crate::fit::estimate_flux_report;
use crate::io::load_spectrum;
use crate::math::SolverOptions;

/// Execute the fit for every configured input.
pub fn run_fit(config: &FitConfig) -> Result<Vec<FitReport>, AppError> {
    if config.inputs.is_empty() {
        return Err(AppError::data_load("No spectrum files given."));
    }

    let results: Vec<Result<FitReport, AppError>> = config
        .inputs
        .par_iter()
        .map(|path| {
            let source = path.display().to_string();
            let table = load_spectrum(path)?;
            fit_table(&source, &table, config).map_err(|e| e.context(&source))
        })
        .collect();

    results.into_iter().collect()
}

/// Fit a single in-memory table with the run's settings.
pub fn fit_table(source: &str, table: &SpectrumTable, config: &FitConfig) -> Result<FitReport, AppError> {
    let opts = SolverOptions {
        max_iterations: config.max_iterations,
        ..SolverOptions::default()
    };
    estimate_flux_report(source, table, config.redshift, config.lambda_rest, &config.guess, &opts)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::data::generate_spectrum;
    use crate::domain::{GaussianParams, GuessOverrides, SynthConfig};
    use crate::error::ErrorKind;

    fn config(inputs: Vec<PathBuf>) -> FitConfig {
        FitConfig {
            inputs,
            redshift: 0.28,
            lambda_rest: 6563.0,
            guess: GuessOverrides::default(),
            max_iterations: None,
            export_json: None,
            export_csv: None,
        }
    }

    #[test]
    fn fit_table_uses_run_settings() {
        let wl = 6563.0 * 1.28;
        let table = generate_spectrum(&SynthConfig {
            start: wl - 13.0,
            end: wl + 13.0,
            samples: 50,
            params: GaussianParams::new(wl, 0.5, 0.1, 5.0),
            noise: 0.0,
            seed: 0,
        })
        .unwrap();
        let report = fit_table("mem", &table, &config(Vec::new())).unwrap();
        assert_eq!(report.source, "mem");
        assert!((report.params.mu - wl).abs() < 1e-6);
    }

    #[test]
    fn missing_file_fails_the_run() {
        let err = run_fit(&config(vec![PathBuf::from("/nonexistent/a.txt")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
    }

    #[test]
    fn empty_input_list_is_rejected() {
        assert!(run_fit(&config(Vec::new())).is_err());
    }
}
