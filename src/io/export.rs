//! Export fit results.
//!
//! - JSON bundle: run metadata plus one report per spectrum (parameters,
//!   standard errors, covariance, flux)
//! - CSV: per-sample normalized intensity, fitted model and residual, meant to
//!   be easy to consume in spreadsheets or plotting scripts

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{FitBundle, FitReport, SpectrumTable};
use crate::error::AppError;

/// Write all reports to a JSON file.
pub fn write_fit_json(path: &Path, reports: &[FitReport]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::data_load(format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    let bundle = FitBundle {
        tool: "lineflux".to_string(),
        generated_at: chrono::Utc::now(),
        fits: reports.to_vec(),
    };

    serde_json::to_writer_pretty(file, &bundle)
        .map_err(|e| AppError::data_load(format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Write the per-sample comparison for every report to one CSV file.
pub fn write_samples_csv<W: Write>(writer: W, reports: &[FitReport]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["source", "wavelength", "normalized", "model", "residual"])
        .map_err(|e| AppError::data_load(format!("Failed to write export CSV header: {e}")))?;

    for report in reports {
        for s in &report.samples_detail {
            wtr.write_record([
                report.source.clone(),
                format!("{:.6}", s.wavelength),
                format!("{:.10}", s.normalized),
                format!("{:.10}", s.model),
                format!("{:.10}", s.residual),
            ])
            .map_err(|e| AppError::data_load(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    wtr.flush()
        .map_err(|e| AppError::data_load(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

pub fn write_samples_csv_file(path: &Path, reports: &[FitReport]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::data_load(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_samples_csv(file, reports)
}

/// Write a spectrum in the same headerless two-column layout the ingest reads.
pub fn write_spectrum<W: Write>(writer: W, table: &SpectrumTable) -> Result<(), AppError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for p in &table.points {
        wtr.write_record([format!("{}", p.wavelength), format!("{}", p.intensity)])
            .map_err(|e| AppError::data_load(format!("Failed to write spectrum row: {e}")))?;
    }
    wtr.flush()
        .map_err(|e| AppError::data_load(format!("Failed to flush spectrum: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FluxMeasurement, GaussianParams, NormalizationInfo, SampleFit, SpectrumPoint};
    use crate::io::ingest::read_spectrum;

    fn report() -> FitReport {
        let p = GaussianParams::new(8400.64, 0.5, 0.0, 1.25);
        FitReport {
            source: "a.txt".to_string(),
            samples: 2,
            redshift: 0.28,
            lambda_rest: 6563.0,
            observed_wavelength: 8400.64,
            normalization: NormalizationInfo {
                raw_min: 0.1,
                raw_range: 4.0,
            },
            initial_guess: p,
            params: p,
            std_errors: GaussianParams::new(0.0, 0.0, 0.0, 0.0),
            covariance: vec![vec![0.0; 4]; 4],
            iterations: 5,
            sse: 0.0,
            dof: 0,
            measurement: FluxMeasurement { flux: 1.25, error: 0.0 },
            samples_detail: vec![
                SampleFit {
                    wavelength: 8400.0,
                    normalized: 0.5,
                    model: 0.5,
                    residual: 0.0,
                },
                SampleFit {
                    wavelength: 8401.0,
                    normalized: 0.25,
                    model: 0.2,
                    residual: 0.05,
                },
            ],
        }
    }

    #[test]
    fn samples_csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_samples_csv(&mut buf, &[report()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "source,wavelength,normalized,model,residual");
        assert!(lines[2].starts_with("a.txt,8401.000000,0.2500000000"));
    }

    #[test]
    fn report_json_skips_sample_detail() {
        let value = serde_json::to_value(report()).unwrap();
        assert!(value.get("samples_detail").is_none());
        assert_eq!(value["measurement"]["flux"], 1.25);
        assert_eq!(value["params"]["sigma"], 0.5);
    }

    #[test]
    fn written_spectrum_reads_back() {
        let table = SpectrumTable::new(vec![
            SpectrumPoint { wavelength: 6550.0, intensity: 0.1 },
            SpectrumPoint { wavelength: 6550.5, intensity: -2.5e-3 },
        ]);
        let mut buf = Vec::new();
        write_spectrum(&mut buf, &table).unwrap();
        assert_eq!(read_spectrum(buf.as_slice()).unwrap(), table);
    }
}
