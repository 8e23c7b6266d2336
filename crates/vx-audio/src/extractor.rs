use std::path::Path;

use anyhow::{Context, Result};
use vx_core::config::FeatureConfig;
use vx_core::dataset::Dataset;
use vx_core::frame::FrameFeatures;

use crate::error::AudioError;
use crate::features::{spectral_centroid, spectral_flux, spectral_rolloff, zero_crossing_rate};
use crate::fft::SpectrumAnalyzer;
use crate::mfcc::MelFilterbank;
use crate::window::kaiser;

/// Extracteur de features pour un enregistrement complet.
///
/// Découpe la forme d'onde en frames non chevauchantes de `frame_size`
/// échantillons (la frame partielle finale est ignorée) et produit un
/// `FrameFeatures` par frame, dans l'ordre.
///
/// # Example
/// ```
/// use vx_audio::extractor::FeatureExtractor;
/// use vx_core::config::FeatureConfig;
///
/// let config = FeatureConfig { frame_size: 1024, mfcc_fft_size: 256, mel_bands: 32, ..FeatureConfig::default() };
/// let mut extractor = FeatureExtractor::new(&config, 16000);
/// let signal: Vec<f32> = (0..2500).map(|i| (i as f32 * 0.3).sin()).collect();
/// let frames = extractor.extract(&signal).unwrap();
/// assert_eq!(frames.len(), 2);
/// assert_eq!(frames[0].width(), 17);
/// ```
pub struct FeatureExtractor {
    spectrum: SpectrumAnalyzer,
    mfcc: MelFilterbank,
    frame_size: usize,
    rolloff_fraction: f32,
}

impl FeatureExtractor {
    /// Build the window, FFT plans and mel filterbank for `sample_rate`.
    ///
    /// # Panics
    /// Panics if the configuration has a zero FFT size or more MFCCs than mel
    /// bands; `VoxConfig::validate` rejects both.
    #[must_use]
    pub fn new(config: &FeatureConfig, sample_rate: u32) -> Self {
        Self {
            spectrum: SpectrumAnalyzer::new(
                kaiser(config.frame_size, config.kaiser_beta),
                sample_rate,
            ),
            mfcc: MelFilterbank::new(
                sample_rate,
                config.mfcc_fft_size,
                config.mel_bands,
                config.mfcc_count,
                config.top_db,
            ),
            frame_size: config.frame_size,
            rolloff_fraction: config.rolloff_fraction,
        }
    }

    /// Number of complete frames in a waveform of `len` samples.
    #[must_use]
    pub fn frame_count(&self, len: usize) -> usize {
        len / self.frame_size
    }

    /// Extract one feature row per complete frame of a preprocessed waveform.
    ///
    /// # Errors
    /// Returns `InvalidAudio` if a frame is silent (no spectral energy).
    pub fn extract(&mut self, waveform: &[f32]) -> Result<Vec<FrameFeatures>, AudioError> {
        let count = self.frame_count(waveform.len());
        if count == 0 {
            log::warn!(
                "Forme d'onde plus courte qu'une frame ({} < {} échantillons)",
                waveform.len(),
                self.frame_size
            );
        }

        let mut frames = Vec::with_capacity(count);
        let mut previous = vec![0.0f32; self.frame_size / 2];

        for (i, frame) in waveform.chunks_exact(self.frame_size).enumerate() {
            let mfcc = self.mfcc.compute(frame)?;
            let spec = self.spectrum.windowed_spectrum(frame)?;

            let f_max = spec.frequencies.last().copied().unwrap_or(0.0);
            if f_max <= 0.0 {
                return Err(AudioError::InvalidAudio("axe fréquentiel dégénéré".into()));
            }

            let rolloff =
                spectral_rolloff(&spec.magnitudes, &spec.frequencies, self.rolloff_fraction)
                    .map_err(|e| frame_error(i, e))?;
            let centroid = spectral_centroid(&spec.frequencies, &spec.magnitudes)
                .map_err(|e| frame_error(i, e))?;
            let flux = spectral_flux(&previous, &spec.magnitudes);

            frames.push(FrameFeatures {
                mfcc,
                zero_crossing_rate: zero_crossing_rate(frame),
                spectral_rolloff: rolloff / f_max,
                spectral_centroid: centroid / f_max,
                spectral_flux: flux,
            });
            previous = spec.magnitudes;
        }

        log::debug!("{} frames caractérisées", frames.len());
        Ok(frames)
    }
}

fn frame_error(index: usize, err: AudioError) -> AudioError {
    match err {
        AudioError::InvalidAudio(msg) => AudioError::InvalidAudio(format!("frame {index} : {msg}")),
        other => other,
    }
}

/// Décode, prépare et caractérise un enregistrement, chaque ligne portant `label`.
///
/// # Errors
/// Returns an error if decoding fails, the waveform is degenerate, or a frame is silent.
pub fn extract_recording(path: &Path, label: f32, config: &FeatureConfig) -> Result<Dataset> {
    log::info!("Analyse de '{}'...", path.display());
    let audio = crate::decode::decode_file(path)?;
    let waveform = crate::preprocess::first_channel(audio.channels)
        .and_then(crate::preprocess::prepare_waveform)
        .with_context(|| format!("Forme d'onde inexploitable : {}", path.display()))?;

    let mut extractor = FeatureExtractor::new(config, audio.sample_rate);
    log::info!(
        "{}Hz, {} échantillons, {} frames de {}",
        audio.sample_rate,
        waveform.len(),
        extractor.frame_count(waveform.len()),
        config.frame_size
    );

    let frames = extractor
        .extract(&waveform)
        .with_context(|| format!("Extraction échouée : {}", path.display()))?;
    let mut dataset = Dataset::from_frames(&frames, label)?;
    if dataset.is_empty() {
        dataset = Dataset::new(config.feature_count());
    }
    Ok(dataset)
}
