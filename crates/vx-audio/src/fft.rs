use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::AudioError;

/// Single-sided magnitude spectrum of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spectrum {
    /// Bin frequencies in Hz, `sample_rate * k / N` for `k in 0..N/2`.
    pub frequencies: Vec<f32>,
    /// Bin magnitudes, scaled by 1/N, non-DC bins doubled.
    pub magnitudes: Vec<f32>,
}

/// Windowed real FFT pipeline.
///
/// Pre-allocates the FFT plan, the window and scratch buffers; the frequency
/// axis is computed once since it only depends on N and the sample rate.
///
/// # Example
/// ```
/// use vx_audio::fft::SpectrumAnalyzer;
/// let fft = SpectrumAnalyzer::new(vec![1.0; 256], 16000);
/// assert_eq!(fft.frequencies().len(), 128);
/// ```
pub struct SpectrumAnalyzer {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    plan: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    frequencies: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer whose FFT size is the window length.
    ///
    /// # Panics
    /// Panics if `window` is empty.
    #[must_use]
    pub fn new(window: Vec<f32>, sample_rate: u32) -> Self {
        let size = window.len();
        assert!(size > 0, "FFT size must be > 0");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        let frequencies = (0..size / 2)
            .map(|k| (f64::from(sample_rate) * k as f64 / size as f64) as f32)
            .collect();

        Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
            frequencies,
        }
    }

    /// Window the frame, take the N-point FFT and keep the first N/2 bins.
    ///
    /// # Errors
    /// Returns `InvalidAudio` if `frame` is not exactly N samples long.
    pub fn windowed_spectrum(&mut self, frame: &[f32]) -> Result<Spectrum, AudioError> {
        if frame.len() != self.fft_size {
            return Err(AudioError::InvalidAudio(format!(
                "frame de {} échantillons, {} attendus",
                frame.len(),
                self.fft_size
            )));
        }

        for ((slot, &s), &w) in self.input_buf.iter_mut().zip(frame).zip(&self.window) {
            *slot = s * w;
        }

        self.plan
            .process_with_scratch(
                &mut self.input_buf,
                &mut self.spectrum_buf,
                &mut self.scratch,
            )
            .map_err(|e| AudioError::InvalidAudio(format!("FFT : {e}")))?;

        let n = self.fft_size as f32;
        let magnitudes = self.spectrum_buf[..self.fft_size / 2]
            .iter()
            .enumerate()
            .map(|(k, c)| {
                let mag = c.norm() / n;
                // DC is the only bin without a mirrored negative-frequency twin here
                if k == 0 { mag } else { 2.0 * mag }
            })
            .collect();

        Ok(Spectrum {
            frequencies: self.frequencies.clone(),
            magnitudes,
        })
    }

    /// Frequency axis shared by every spectrum of this analyzer.
    #[must_use]
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// FFT window size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference |DFT| / N, no doubling.
    fn naive_dft_mag(x: &[f32]) -> Vec<f32> {
        let n = x.len();
        (0..n / 2)
            .map(|k| {
                let (mut re, mut im) = (0.0f64, 0.0f64);
                for (t, &v) in x.iter().enumerate() {
                    let a = -2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64;
                    re += f64::from(v) * a.cos();
                    im += f64::from(v) * a.sin();
                }
                ((re * re + im * im).sqrt() / n as f64) as f32
            })
            .collect()
    }

    #[test]
    fn dc_is_not_doubled_other_bins_are() -> Result<(), AudioError> {
        let n = 64;
        let frame: Vec<f32> = (0..n)
            .map(|i| 0.3 + (i as f32 * 0.7).sin() + 0.2 * (i as f32 * 2.1).cos())
            .collect();
        let mut fft = SpectrumAnalyzer::new(vec![1.0; n], 8000);
        let spec = fft.windowed_spectrum(&frame)?;
        let reference = naive_dft_mag(&frame);

        assert_eq!(spec.magnitudes.len(), n / 2);
        assert!((spec.magnitudes[0] - reference[0]).abs() < 1e-4);
        for k in 1..n / 2 {
            assert!(
                (spec.magnitudes[k] - 2.0 * reference[k]).abs() < 1e-4,
                "bin {k}"
            );
        }
        Ok(())
    }

    #[test]
    fn kaiser_window_is_applied() -> Result<(), AudioError> {
        let n = 128;
        let window = crate::window::kaiser(n, 14.0);
        let frame: Vec<f32> = (0..n)
            .map(|i| 0.1 + (i as f32 * 0.45).sin() + 0.3 * (i as f32 * 1.3).cos())
            .collect();
        let windowed: Vec<f32> = frame.iter().zip(&window).map(|(x, w)| x * w).collect();

        let mut fft = SpectrumAnalyzer::new(window, 8000);
        let spec = fft.windowed_spectrum(&frame)?;
        let reference = naive_dft_mag(&windowed);
        let unwindowed = naive_dft_mag(&frame);

        assert!((spec.magnitudes[0] - reference[0]).abs() < 1e-4);
        for k in 1..n / 2 {
            assert!((spec.magnitudes[k] - 2.0 * reference[k]).abs() < 1e-4, "bin {k}");
        }
        assert!((spec.magnitudes[0] - unwindowed[0]).abs() > 1e-3);
        Ok(())
    }

    #[test]
    fn frequency_axis() -> Result<(), AudioError> {
        let mut fft = SpectrumAnalyzer::new(vec![1.0; 16], 16000);
        let spec = fft.windowed_spectrum(&[0.0; 16])?;
        assert_eq!(spec.frequencies.len(), 8);
        assert!((spec.frequencies[1] - 1000.0).abs() < 1e-3);
        assert!((spec.frequencies[7] - 7000.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn pure_tone_peaks_at_its_bin() -> Result<(), AudioError> {
        let n = 256;
        let frame: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 16.0 * i as f32 / n as f32).sin())
            .collect();
        let mut fft = SpectrumAnalyzer::new(vec![1.0; n], 256);
        let spec = fft.windowed_spectrum(&frame)?;
        // unit sine, rectangular window: single-sided amplitude ~ 1
        assert!((spec.magnitudes[16] - 1.0).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn wrong_frame_length_is_rejected() {
        let mut fft = SpectrumAnalyzer::new(vec![1.0; 32], 8000);
        assert!(fft.windowed_spectrum(&[0.0; 31]).is_err());
    }
}
