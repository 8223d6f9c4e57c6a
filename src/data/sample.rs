//! Synthetic line spectra.
//!
//! Samples are evenly spaced on `[start, end]`, intensities come straight from
//! the Gaussian-plus-offset model, and optional additive noise is drawn from a
//! seeded `StdRng` so runs are reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{SpectrumPoint, SpectrumTable, SynthConfig};
use crate::error::AppError;
use crate::models::gaussian;

/// Evenly spaced grid of `n` points on `[start, end]` (both ends included).
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n as f64 - 1.0);
    (0..n).map(|i| start + i as f64 * step).collect()
}

pub fn generate_spectrum(config: &SynthConfig) -> Result<SpectrumTable, AppError> {
    if config.samples < 2 {
        return Err(AppError::data_load("Synthetic spectrum needs at least 2 samples."));
    }
    if !(config.start.is_finite() && config.end.is_finite() && config.end > config.start) {
        return Err(AppError::data_load(format!(
            "Invalid wavelength range [{}, {}].",
            config.start, config.end
        )));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::data_load("Noise level must be a finite value >= 0."));
    }
    if !(config.params.is_finite() && config.params.sigma != 0.0) {
        return Err(AppError::data_load("Line parameters must be finite with sigma != 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise.max(f64::MIN_POSITIVE))
        .map_err(|e| AppError::data_load(format!("Noise distribution error: {e}")))?;

    let points = linspace(config.start, config.end, config.samples)
        .into_iter()
        .map(|wavelength| {
            let mut intensity = gaussian(wavelength, &config.params);
            if config.noise > 0.0 {
                intensity += normal.sample(&mut rng);
            }
            SpectrumPoint { wavelength, intensity }
        })
        .collect();

    Ok(SpectrumTable::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GaussianParams;

    fn config(noise: f64, seed: u64) -> SynthConfig {
        SynthConfig {
            start: 6550.0,
            end: 6576.0,
            samples: 50,
            params: GaussianParams::new(6563.0, 0.5, 0.1, 5.0),
            noise,
            seed,
        }
    }

    #[test]
    fn linspace_includes_both_ends() {
        let g = linspace(6550.0, 6576.0, 50);
        assert_eq!(g.len(), 50);
        assert_eq!(g[0], 6550.0);
        assert!((g[49] - 6576.0).abs() < 1e-9);
    }

    #[test]
    fn noiseless_spectrum_follows_model() {
        let table = generate_spectrum(&config(0.0, 1)).unwrap();
        assert_eq!(table.len(), 50);
        for p in &table.points {
            assert_eq!(p.intensity, gaussian(p.wavelength, &config(0.0, 1).params));
        }
    }

    #[test]
    fn noise_is_reproducible_per_seed() {
        let a = generate_spectrum(&config(0.05, 7)).unwrap();
        let b = generate_spectrum(&config(0.05, 7)).unwrap();
        let c = generate_spectrum(&config(0.05, 8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_bad_settings() {
        let mut cfg = config(0.0, 1);
        cfg.samples = 1;
        assert!(generate_spectrum(&cfg).is_err());

        let mut cfg = config(0.0, 1);
        cfg.end = cfg.start;
        assert!(generate_spectrum(&cfg).is_err());

        let cfg = config(-1.0, 1);
        assert!(generate_spectrum(&cfg).is_err());
    }
}
