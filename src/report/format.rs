//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{FitReport, FluxMeasurement, PARAM_NAMES, PhotometryReport};

/// The canonical result line: `<flux> +/- <error>` with two decimals.
pub fn format_flux(m: &FluxMeasurement) -> String {
    format!("{:4.2} +/- {:4.2}", m.flux, m.error)
}

/// One result line per report; prefixed by the source when there are several.
pub fn format_flux_lines(reports: &[FitReport]) -> String {
    let multi = reports.len() > 1;
    let mut out = String::new();
    for r in reports {
        if multi {
            out.push_str(&format!("{}: ", r.source));
        }
        out.push_str(&format_flux(&r.measurement));
        out.push('\n');
    }
    out
}

/// Verbose diagnostics for one fit.
pub fn format_fit_summary(report: &FitReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", report.source));
    out.push_str(&format!(
        "Samples: n={} | raw min={:.4} range={:.4}\n",
        report.samples, report.normalization.raw_min, report.normalization.raw_range
    ));
    out.push_str(&format!(
        "Line: rest={:.3} z={:.4} -> observed={:.3}\n",
        report.lambda_rest, report.redshift, report.observed_wavelength
    ));
    out.push_str(&format!(
        "Solver: iterations={} SSE={:.3e} dof={}\n",
        report.iterations, report.sse, report.dof
    ));

    out.push_str(&format!("{:<6} {:>14} {:>14} {:>14}\n", "param", "guess", "value", "std_err"));
    out.push_str(&format!("{:-<6} {:-<14} {:-<14} {:-<14}\n", "", "", "", ""));
    let rows = [
        (report.initial_guess.mu, report.params.mu, report.std_errors.mu),
        (report.initial_guess.sigma, report.params.sigma, report.std_errors.sigma),
        (report.initial_guess.b, report.params.b, report.std_errors.b),
        (report.initial_guess.sc, report.params.sc, report.std_errors.sc),
    ];
    for (name, (guess, value, err)) in PARAM_NAMES.iter().zip(rows) {
        out.push_str(&format!("{name:<6} {guess:>14.6} {value:>14.6} {err:>14.6}\n"));
    }

    out.push_str(&format!("Flux: {}\n", format_flux(&report.measurement)));
    out
}

pub fn format_photometry(report: &PhotometryReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Background ({:?}): mean={:.3} median={:.3}\n",
        report.background_stat, report.background.mean, report.background.median
    ));
    out.push_str(&format!(
        "For target {:8.2} +/- {:6.2} electrons on MJD:{:9.3}\n",
        report.target.electrons, report.target.error, report.mjd
    ));
    out.push_str(&format!(
        "For reference {:8.2} +/- {:6.2} electrons on MJD:{:9.3}\n",
        report.reference.electrons, report.reference.error, report.mjd
    ));
    out.push_str(&format!(
        "Magnitude of the target star is {:5.5} +/- {:5.5}\n",
        report.magnitude.magnitude, report.magnitude.error
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ApertureCount, BackgroundLevel, BackgroundStat, GaussianParams, NormalizationInfo, PixelPosition,
        RelativeMagnitude,
    };

    fn report(source: &str, flux: f64, error: f64) -> FitReport {
        let p = GaussianParams::new(8400.64, 0.5, 0.0, flux);
        FitReport {
            source: source.to_string(),
            samples: 50,
            redshift: 0.28,
            lambda_rest: 6563.0,
            observed_wavelength: 8400.64,
            normalization: NormalizationInfo {
                raw_min: 0.1,
                raw_range: 3.5,
            },
            initial_guess: GaussianParams::new(8400.64, 0.5, 0.1, 5.0),
            params: p,
            std_errors: GaussianParams::new(0.001, 0.001, 0.001, error),
            covariance: vec![vec![0.0; 4]; 4],
            iterations: 7,
            sse: 1e-4,
            dof: 46,
            measurement: FluxMeasurement { flux, error },
            samples_detail: Vec::new(),
        }
    }

    #[test]
    fn flux_line_uses_two_decimals() {
        let line = format_flux(&FluxMeasurement { flux: 5.0, error: 0.004 });
        assert_eq!(line, "5.00 +/- 0.00");
        let line = format_flux(&FluxMeasurement { flux: 12.346, error: 1.2 });
        assert_eq!(line, "12.35 +/- 1.20");
    }

    #[test]
    fn multiple_reports_are_prefixed() {
        let single = format_flux_lines(&[report("a.txt", 1.0, 0.1)]);
        assert_eq!(single, "1.00 +/- 0.10\n");

        let multi = format_flux_lines(&[report("a.txt", 1.0, 0.1), report("b.txt", 2.0, 0.2)]);
        assert_eq!(multi, "a.txt: 1.00 +/- 0.10\nb.txt: 2.00 +/- 0.20\n");
    }

    #[test]
    fn summary_lists_every_parameter() {
        let text = format_fit_summary(&report("a.txt", 1.25, 0.01));
        for name in PARAM_NAMES {
            assert!(text.lines().any(|l| l.starts_with(name)), "missing {name}:\n{text}");
        }
        assert!(text.contains("Flux: 1.25 +/- 0.01"));
    }

    #[test]
    fn photometry_lines() {
        let report = PhotometryReport {
            mjd: 57000.25,
            target_pixel: PixelPosition { x: 1, y: 2 },
            reference_pixel: PixelPosition { x: 3, y: 4 },
            background: BackgroundLevel { mean: 101.0, median: 100.0 },
            background_stat: BackgroundStat::Median,
            target: ApertureCount { electrons: 11520.0, error: 107.33 },
            reference: ApertureCount { electrons: 46080.0, error: 214.66 },
            magnitude: RelativeMagnitude { magnitude: 15.00515, error: 0.011 },
        };
        let text = format_photometry(&report);
        assert!(text.contains("For target 11520.00 +/- 107.33 electrons"));
        assert!(text.contains("on MJD:57000.250"));
        assert!(text.contains("Magnitude of the target star is 15.00515 +/- 0.01100"));
    }
}
