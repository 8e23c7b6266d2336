//! Per-frame spectral and temporal descriptors.

use crate::error::AudioError;

/// Energy-weighted mean frequency, `Σ(f·m) / Σm`.
///
/// # Errors
/// Returns `InvalidAudio` for a silent spectrum (Σm = 0).
///
/// # Example
/// ```
/// use vx_audio::features::spectral_centroid;
/// let c = spectral_centroid(&[100.0, 200.0], &[1.0, 1.0]).unwrap();
/// assert!((c - 150.0).abs() < 1e-6);
/// ```
pub fn spectral_centroid(frequencies: &[f32], magnitudes: &[f32]) -> Result<f32, AudioError> {
    let total: f32 = magnitudes.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(AudioError::InvalidAudio(
            "frame silencieuse : centroïde indéfini".into(),
        ));
    }
    let weighted: f32 = frequencies
        .iter()
        .zip(magnitudes)
        .map(|(&f, &m)| f * m)
        .sum();
    Ok(weighted / total)
}

/// Frequency below which `fraction` of the spectral energy lies.
///
/// The cumulative energy is normalized to its own maximum and the first bin
/// closest to `fraction` wins.
///
/// # Errors
/// Returns `InvalidAudio` for a silent spectrum or empty input.
///
/// # Example
/// ```
/// use vx_audio::features::spectral_rolloff;
/// let f = [0.0, 10.0, 20.0, 30.0];
/// let m = [1.0, 1.0, 1.0, 1.0];
/// assert_eq!(spectral_rolloff(&m, &f, 0.5).unwrap(), 10.0);
/// ```
pub fn spectral_rolloff(
    magnitudes: &[f32],
    frequencies: &[f32],
    fraction: f32,
) -> Result<f32, AudioError> {
    let mut cumulative = Vec::with_capacity(magnitudes.len());
    let mut acc = 0.0f64;
    for &m in magnitudes {
        acc += f64::from(m) * f64::from(m);
        cumulative.push(acc);
    }
    if acc <= 0.0 || !acc.is_finite() {
        return Err(AudioError::InvalidAudio(
            "frame silencieuse : roll-off indéfini".into(),
        ));
    }

    let target = f64::from(fraction);
    let mut best = 0usize;
    let mut best_diff = f64::INFINITY;
    for (i, &c) in cumulative.iter().enumerate() {
        let diff = (c / acc - target).abs();
        if diff < best_diff {
            best_diff = diff;
            best = i;
        }
    }

    frequencies
        .get(best)
        .copied()
        .ok_or_else(|| AudioError::InvalidAudio("axe fréquentiel trop court".into()))
}

/// Norm of the difference between consecutive magnitude spectra, per bin.
///
/// For the first frame of a recording `previous` is all zeros.
///
/// # Example
/// ```
/// use vx_audio::features::spectral_flux;
/// let flux = spectral_flux(&[0.0, 0.0], &[3.0, 4.0]);
/// assert!((flux - 2.5).abs() < 1e-6);
/// ```
#[must_use]
pub fn spectral_flux(previous: &[f32], current: &[f32]) -> f32 {
    debug_assert_eq!(previous.len(), current.len(), "spectrum length changed");
    if current.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = previous
        .iter()
        .zip(current)
        .map(|(&p, &c)| (c - p) * (c - p))
        .sum();
    sum_sq.sqrt() / current.len() as f32
}

/// Fraction of adjacent sample pairs whose sign differs. Zero counts as positive.
///
/// # Example
/// ```
/// use vx_audio::features::zero_crossing_rate;
/// assert_eq!(zero_crossing_rate(&[1.0, -1.0, 1.0, -1.0]), 0.75);
/// ```
#[must_use]
pub fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();
    crossings as f32 / frame.len() as f32
}
