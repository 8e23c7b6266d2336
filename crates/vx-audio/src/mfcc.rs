//! Mel-Frequency Cepstral Coefficients (MFCC) extraction.
//!
//! One centered analysis frame per audio frame: reflect padding, periodic Hann
//! window, power spectrum, Slaney mel filterbank, log power in dB clipped to
//! `top_db`, orthonormal DCT-II.

use std::f64::consts::PI;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::AudioError;
use crate::window::hann_periodic;

/// Floor applied to mel power before the log.
const AMIN: f32 = 1e-10;

/// Mel filterbank + DCT for MFCC extraction.
///
/// Filter weights and the DCT basis are computed once; buffers are reused.
///
/// # Example
/// ```
/// use vx_audio::mfcc::MelFilterbank;
/// let mut mfcc = MelFilterbank::new(16000, 512, 40, 13, 80.0);
/// let coeffs = mfcc.compute(&vec![0.1; 4096]).unwrap();
/// assert_eq!(coeffs.len(), 13);
/// ```
pub struct MelFilterbank {
    n_fft: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    /// Per filter: first bin index and the weights from that bin on.
    filters: Vec<(usize, Vec<f32>)>,
    /// `dct[k][n]`, orthonormal DCT-II rows for the kept coefficients.
    dct: Vec<Vec<f32>>,
    top_db: f32,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    power: Vec<f32>,
    log_mel: Vec<f32>,
}

impl MelFilterbank {
    /// Create a filterbank of `n_mels` filters over 0 Hz .. Nyquist.
    ///
    /// # Panics
    /// Panics if `n_fft` is 0 or `n_mfcc > n_mels`.
    #[must_use]
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, n_mfcc: usize, top_db: f32) -> Self {
        assert!(n_fft > 0, "FFT size must be > 0");
        assert!(n_mfcc <= n_mels, "cannot keep more coefficients than mel bands");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(n_fft);
        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        Self {
            n_fft,
            filters: slaney_filters(sample_rate, n_fft, n_mels),
            dct: dct_ortho(n_mfcc, n_mels),
            window: hann_periodic(n_fft),
            top_db,
            power: vec![0.0; n_fft / 2 + 1],
            log_mel: vec![0.0; n_mels],
            plan,
            input_buf,
            spectrum_buf,
            scratch,
        }
    }

    /// Compute the cepstral coefficients of the analysis frame centered on the
    /// first sample of `frame`.
    ///
    /// # Errors
    /// Returns `InvalidAudio` if `frame` is empty or the FFT fails.
    pub fn compute(&mut self, frame: &[f32]) -> Result<Vec<f32>, AudioError> {
        if frame.is_empty() {
            return Err(AudioError::InvalidAudio("frame MFCC vide".into()));
        }

        let pad = self.n_fft / 2;
        for (j, (slot, &w)) in self.input_buf.iter_mut().zip(&self.window).enumerate() {
            let idx = reflect_index(j as isize - pad as isize, frame.len());
            *slot = frame[idx] * w;
        }

        self.plan
            .process_with_scratch(
                &mut self.input_buf,
                &mut self.spectrum_buf,
                &mut self.scratch,
            )
            .map_err(|e| AudioError::InvalidAudio(format!("FFT MFCC : {e}")))?;

        for (p, c) in self.power.iter_mut().zip(&self.spectrum_buf) {
            *p = c.norm_sqr();
        }

        // Log-mel in dB
        let mut peak = f32::NEG_INFINITY;
        for ((start, weights), out) in self.filters.iter().zip(self.log_mel.iter_mut()) {
            let energy: f32 = self.power[*start..]
                .iter()
                .zip(weights)
                .map(|(&p, &w)| p * w)
                .sum();
            *out = 10.0 * energy.max(AMIN).log10();
            peak = peak.max(*out);
        }
        let floor = peak - self.top_db;
        for v in &mut self.log_mel {
            *v = v.max(floor);
        }

        Ok(self
            .dct
            .iter()
            .map(|row| row.iter().zip(&self.log_mel).map(|(&c, &x)| c * x).sum())
            .collect())
    }
}

/// Mirror an out-of-range index back into `0..len` without repeating the edge sample.
fn reflect_index(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    loop {
        if i < 0 {
            i = -i;
        } else if i > last {
            i = 2 * last - i;
        } else {
            return i as usize;
        }
    }
}

/// Hz to Mel, Slaney scale (linear below 1 kHz, logarithmic above).
#[inline]
fn hz_to_mel(hz: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    let min_log_mel = MIN_LOG_HZ / F_SP;
    let logstep = 6.4f64.ln() / 27.0;
    if hz >= MIN_LOG_HZ {
        min_log_mel + (hz / MIN_LOG_HZ).ln() / logstep
    } else {
        hz / F_SP
    }
}

/// Mel to Hz, Slaney scale.
#[inline]
fn mel_to_hz(mel: f64) -> f64 {
    const F_SP: f64 = 200.0 / 3.0;
    const MIN_LOG_HZ: f64 = 1000.0;
    let min_log_mel = MIN_LOG_HZ / F_SP;
    let logstep = 6.4f64.ln() / 27.0;
    if mel >= min_log_mel {
        MIN_LOG_HZ * (logstep * (mel - min_log_mel)).exp()
    } else {
        mel * F_SP
    }
}

/// Triangular, area-normalized filters stored as (first bin, weights).
fn slaney_filters(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<(usize, Vec<f32>)> {
    let n_bins = n_fft / 2 + 1;
    let nyquist = f64::from(sample_rate) / 2.0;
    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| f64::from(sample_rate) * k as f64 / n_fft as f64)
        .collect();

    let mel_max = hz_to_mel(nyquist);
    let mel_f: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (lo, center, hi) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
            let enorm = 2.0 / (hi - lo);
            let dense: Vec<f32> = fft_freqs
                .iter()
                .map(|&f| {
                    let lower = (f - lo) / (center - lo);
                    let upper = (hi - f) / (hi - center);
                    (lower.min(upper).max(0.0) * enorm) as f32
                })
                .collect();
            let start = dense.iter().position(|&w| w > 0.0).unwrap_or(n_bins);
            let end = dense.iter().rposition(|&w| w > 0.0).map_or(start, |e| e + 1);
            (start, dense[start..end].to_vec())
        })
        .collect()
}

/// Orthonormal DCT-II basis, first `n_out` rows for an input of `n_in` values.
fn dct_ortho(n_out: usize, n_in: usize) -> Vec<Vec<f32>> {
    let n = n_in as f64;
    (0..n_out)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            (0..n_in)
                .map(|i| (scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()) as f32)
                .collect()
        })
        .collect()
}
