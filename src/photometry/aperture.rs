//! Box-aperture photometry.
//!
//! Apertures are square pixel windows `[c - h, c + h)` on both axes. The sky
//! level comes from a same-sized window offset diagonally from the target and is
//! subtracted per pixel before summing. Counts are converted to electrons with
//! the detector gain and carry Poisson errors (`σ = √N`).

use nalgebra::{DMatrix, DMatrixView};

use crate::domain::{
    ApertureCount, BackgroundLevel, BackgroundStat, PhotometryFrame, PhotometryReport, PixelPosition,
    RelativeMagnitude,
};
use crate::error::AppError;
use crate::math::{mean, median_mut};

/// Square window of side `2 * half_width` starting at `center - half_width`.
pub fn box_region(
    image: &DMatrix<f64>,
    center: PixelPosition,
    half_width: usize,
) -> Result<DMatrixView<'_, f64>, AppError> {
    if half_width == 0 {
        return Err(AppError::photometry("Aperture half-width must be > 0."));
    }
    let (nrows, ncols) = (image.nrows() as i64, image.ncols() as i64);
    let inside = i64::try_from(half_width)
        .ok()
        .and_then(|h| window_bounds(center, h))
        .filter(|&(r0, c0, r1, c1)| r0 >= 0 && c0 >= 0 && r1 <= nrows && c1 <= ncols);
    let Some((r0, c0, _, _)) = inside else {
        return Err(AppError::photometry(format!(
            "Aperture at (x={}, y={}) with half-width {half_width} falls outside the {ncols}x{nrows} image.",
            center.x, center.y
        )));
    };
    let side = 2 * half_width;
    Ok(image.view((r0 as usize, c0 as usize), (side, side)))
}

/// `(row_start, col_start, row_end, col_end)`, or `None` if any edge overflows.
fn window_bounds(center: PixelPosition, h: i64) -> Option<(i64, i64, i64, i64)> {
    Some((
        center.y.checked_sub(h)?,
        center.x.checked_sub(h)?,
        center.y.checked_add(h)?,
        center.x.checked_add(h)?,
    ))
}

/// Mean and median of a background window.
pub fn background_level(region: &DMatrixView<'_, f64>) -> Result<BackgroundLevel, AppError> {
    let mut values: Vec<f64> = region.iter().copied().collect();
    let mean = mean(&values).ok_or_else(|| AppError::photometry("Background window is empty."))?;
    let median = median_mut(&mut values).ok_or_else(|| AppError::photometry("Background window is empty."))?;
    Ok(BackgroundLevel { mean, median })
}

/// Background-subtracted electrons in `region`.
pub fn aperture_electrons(
    region: &DMatrixView<'_, f64>,
    background: f64,
    gain: f64,
) -> Result<ApertureCount, AppError> {
    let counts: f64 = region.iter().map(|v| v - background).sum();
    let electrons = counts * gain;
    if !(electrons.is_finite() && electrons > 0.0) {
        return Err(AppError::photometry(format!(
            "Aperture holds {electrons:.2} electrons after background subtraction; need a positive count."
        )));
    }
    Ok(ApertureCount {
        electrons,
        error: electrons.sqrt(),
    })
}

/// Magnitude of `target` relative to a reference of known magnitude.
///
/// `dm` is the first-order propagation of both relative count errors:
/// `2.5 / ln 10 · √((σ_t/N_t)² + (σ_r/N_r)²)`.
pub fn relative_magnitude(target: &ApertureCount, reference: &ApertureCount, reference_mag: f64) -> RelativeMagnitude {
    let magnitude = -2.5 * (target.electrons / reference.electrons).log10() + reference_mag;
    let rel_t = target.error / target.electrons;
    let rel_r = reference.error / reference.electrons;
    let error = 2.5 / std::f64::consts::LN_10 * (rel_t * rel_t + rel_r * rel_r).sqrt();
    RelativeMagnitude { magnitude, error }
}

/// Run the full target-vs-reference measurement on one frame.
pub fn measure(image: &DMatrix<f64>, frame: &PhotometryFrame, stat: BackgroundStat) -> Result<PhotometryReport, AppError> {
    if !(frame.gain.is_finite() && frame.gain > 0.0) {
        return Err(AppError::photometry(format!("Gain must be > 0, got {}.", frame.gain)));
    }

    let target_pixel = frame.wcs.sky_to_pixel(frame.target)?;
    let reference_pixel = frame.wcs.sky_to_pixel(frame.reference)?;
    let offset = |v: i64| {
        v.checked_add(frame.background_offset).ok_or_else(|| {
            AppError::photometry(format!(
                "Background offset {} from the target pixel overflows.",
                frame.background_offset
            ))
        })
    };
    let background_pixel = PixelPosition {
        x: offset(target_pixel.x)?,
        y: offset(target_pixel.y)?,
    };
    log::debug!(
        "Target at {target_pixel:?}, reference at {reference_pixel:?}, background at {background_pixel:?}"
    );

    let bg_region = box_region(image, background_pixel, frame.half_width).map_err(|e| e.context("background"))?;
    let background = background_level(&bg_region)?;
    let level = background.select(stat);
    log::info!(
        "Background mean={:.3} median={:.3}; subtracting {stat:?}",
        background.mean,
        background.median
    );

    let target_region = box_region(image, target_pixel, frame.half_width).map_err(|e| e.context("target"))?;
    let target = aperture_electrons(&target_region, level, frame.gain).map_err(|e| e.context("target"))?;

    let reference_region =
        box_region(image, reference_pixel, frame.half_width).map_err(|e| e.context("reference"))?;
    let reference =
        aperture_electrons(&reference_region, level, frame.gain).map_err(|e| e.context("reference"))?;

    let magnitude = relative_magnitude(&target, &reference, frame.reference_mag);

    Ok(PhotometryReport {
        mjd: frame.mjd,
        target_pixel,
        reference_pixel,
        background,
        background_stat: stat,
        target,
        reference,
        magnitude,
    })
}
