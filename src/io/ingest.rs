//! Delimited-text ingest.
//!
//! Two inputs are read here:
//!
//! - spectra: one `wavelength,intensity` pair per line, no header
//! - images: one image row per line, comma-separated pixel values
//!
//! Blank lines and lines starting with `#` are ignored. Any malformed value is a
//! hard error naming the offending line; nothing is silently turned into NaN.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use nalgebra::DMatrix;

use crate::domain::{PhotometryFrame, SpectrumPoint, SpectrumTable};
use crate::error::AppError;

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'));
    builder
}

fn open(path: &Path, what: &str) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::data_load(format!("Failed to open {what} '{}': {e}", path.display())))
}

/// Read a two-column spectrum table.
///
/// Extra columns are ignored (some exports append an error column).
pub fn read_spectrum<R: Read>(reader: R) -> Result<SpectrumTable, AppError> {
    let mut rdr = reader_builder().from_reader(reader);
    let mut points = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| AppError::data_load(format!("CSV parse error: {e}")))?;
        let line = line_of(&record);
        if record.len() < 2 {
            return Err(AppError::data_load(format!(
                "Line {line}: expected `wavelength,intensity`, found {} column(s).",
                record.len()
            )));
        }
        let wavelength = parse_field(&record, 0, line, "wavelength")?;
        let intensity = parse_field(&record, 1, line, "intensity")?;
        points.push(SpectrumPoint { wavelength, intensity });
    }

    if points.is_empty() {
        return Err(AppError::data_load("Spectrum contains no samples."));
    }
    Ok(SpectrumTable::new(points))
}

pub fn load_spectrum(path: &Path) -> Result<SpectrumTable, AppError> {
    let file = open(path, "spectrum")?;
    let table = read_spectrum(file).map_err(|e| e.context(path.display()))?;
    log::debug!("Loaded {} samples from {}", table.len(), path.display());
    Ok(table)
}

/// Read a rectangular pixel grid. Row `r` of the file becomes image row `r`.
pub fn read_image<R: Read>(reader: R) -> Result<DMatrix<f64>, AppError> {
    let mut rdr = reader_builder().from_reader(reader);
    let mut data = Vec::new();
    let mut ncols = None;
    let mut nrows = 0usize;

    for result in rdr.records() {
        let record = result.map_err(|e| AppError::data_load(format!("CSV parse error: {e}")))?;
        let line = line_of(&record);
        match ncols {
            None => ncols = Some(record.len()),
            Some(n) if n != record.len() => {
                return Err(AppError::data_load(format!(
                    "Line {line}: image row has {} values, expected {n}.",
                    record.len()
                )));
            }
            Some(_) => {}
        }
        for idx in 0..record.len() {
            data.push(parse_field(&record, idx, line, "pixel")?);
        }
        nrows += 1;
    }

    let ncols = ncols.unwrap_or(0);
    if nrows == 0 || ncols == 0 {
        return Err(AppError::data_load("Image contains no pixels."));
    }
    Ok(DMatrix::from_row_slice(nrows, ncols, &data))
}

pub fn load_image(path: &Path) -> Result<DMatrix<f64>, AppError> {
    let file = open(path, "image")?;
    let image = read_image(file).map_err(|e| e.context(path.display()))?;
    log::debug!("Loaded {}x{} image from {}", image.ncols(), image.nrows(), path.display());
    Ok(image)
}

/// Read a photometry frame description (JSON).
pub fn load_frame(path: &Path) -> Result<PhotometryFrame, AppError> {
    let file = open(path, "frame JSON")?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::data_load(format!("Invalid frame JSON '{}': {e}", path.display())))
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn parse_field(record: &StringRecord, idx: usize, line: u64, name: &str) -> Result<f64, AppError> {
    let raw = record.get(idx).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AppError::data_load(format!("Line {line}: invalid {name} value '{raw}'."))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn reads_pairs_and_skips_comments() {
        let text = "# DEIMOS export\n6550.0, 0.12\n6550.5,0.20\n\n6551.0,0.18,0.01\n";
        let table = read_spectrum(text.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.points[1], SpectrumPoint { wavelength: 6550.5, intensity: 0.20 });
        assert_eq!(table.points[2].intensity, 0.18);
    }

    #[test]
    fn malformed_value_names_the_line() {
        let text = "6550.0,0.1\n6550.5,abc\n";
        let err = read_spectrum(text.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
        assert!(err.to_string().contains("Line 2"), "{err}");
    }

    #[test]
    fn non_finite_value_is_rejected() {
        let err = read_spectrum("6550.0,nan\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Line 1"), "{err}");
    }

    #[test]
    fn single_column_is_rejected() {
        let err = read_spectrum("6550.0\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
    }

    #[test]
    fn empty_spectrum_is_rejected() {
        assert!(read_spectrum("# nothing\n".as_bytes()).is_err());
    }

    #[test]
    fn image_rows_map_to_matrix_rows() {
        let image = read_image("1,2,3\n4,5,6\n".as_bytes()).unwrap();
        assert_eq!(image.shape(), (2, 3));
        assert_eq!(image[(0, 2)], 3.0);
        assert_eq!(image[(1, 0)], 4.0);
    }

    #[test]
    fn ragged_image_is_rejected() {
        let err = read_image("1,2,3\n4,5\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected 3"), "{err}");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_spectrum(Path::new("/nonexistent/spectrum.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataLoad);
    }
}
