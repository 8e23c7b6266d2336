//! Analysis window functions.

use std::f64::consts::PI;

/// Kaiser window of length `size` with shape parameter `beta` (symmetric).
///
/// # Example
/// ```
/// use vx_audio::window::kaiser;
/// let w = kaiser(65, 14.0);
/// assert!((w[32] - 1.0).abs() < 1e-6);
/// assert!(w[0] < 1e-4);
/// ```
#[must_use]
pub fn kaiser(size: usize, beta: f32) -> Vec<f32> {
    if size <= 1 {
        return vec![1.0; size];
    }
    let beta = f64::from(beta);
    let denom = bessel_i0(beta);
    let m = (size - 1) as f64;
    (0..size)
        .map(|n| {
            let r = 2.0 * n as f64 / m - 1.0;
            let arg = beta * (1.0 - r * r).max(0.0).sqrt();
            (bessel_i0(arg) / denom) as f32
        })
        .collect()
}

/// Periodic Hann window (DFT-even), as used for STFT frames.
#[must_use]
pub fn hann_periodic(size: usize) -> Vec<f32> {
    let n = size as f64;
    (0..size)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos()) as f32)
        .collect()
}

/// Zeroth-order modified Bessel function of the first kind, power series.
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..500 {
        let f = half / f64::from(k);
        term *= f * f;
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bessel_reference_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-12);
        // I0(1) = 1.2660658777520082
        assert!((bessel_i0(1.0) - 1.266_065_877_752_008).abs() < 1e-12);
    }

    #[test]
    fn kaiser_is_symmetric() {
        let w = kaiser(64, 8.6);
        for i in 0..32 {
            assert!((w[i] - w[63 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn kaiser_beta_zero_is_rectangular() {
        assert!(kaiser(16, 0.0).iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn hann_periodic_endpoints() {
        let w = hann_periodic(8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }
}
