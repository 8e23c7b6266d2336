use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use vx_audio::FeatureExtractor;
use vx_audio::extractor::extract_recording;
use vx_core::config::VoxConfig;
use vx_core::dataset::{ColumnScaler, Dataset};
use vx_rbf::train_model;

use crate::model_file::SpeakerModel;
use crate::report::Confusion;

/// Label of the target speaker's rows.
pub const TARGET_LABEL: f32 = 1.0;
/// Label of every other speaker's rows.
pub const OTHER_LABEL: f32 = 0.0;

/// Un enregistrement et le label de ses frames.
#[derive(Clone, Debug)]
pub struct Recording {
    pub path: PathBuf,
    pub label: f32,
}

impl Recording {
    pub fn labeled(paths: &[PathBuf], label: f32) -> impl Iterator<Item = Self> + '_ {
        paths.iter().map(move |p| Self {
            path: p.clone(),
            label,
        })
    }
}

/// Extrait toutes les frames de tous les enregistrements, en parallèle.
///
/// Rows keep the order of `recordings`, then the frame order inside each one.
///
/// # Errors
/// Fails on the first recording that cannot be decoded or characterized.
pub fn build_dataset(recordings: &[Recording], config: &VoxConfig) -> Result<Dataset> {
    let parts: Vec<Dataset> = recordings
        .par_iter()
        .map(|r| extract_recording(&r.path, r.label, &config.features))
        .collect::<Result<_>>()?;

    let mut dataset = Dataset::new(config.features.feature_count());
    for (part, recording) in parts.into_iter().zip(recordings) {
        log::info!("{} : {} frames", recording.path.display(), part.len());
        dataset
            .stack(part)
            .with_context(|| format!("Largeur incohérente : {}", recording.path.display()))?;
    }
    Ok(dataset)
}

/// Normalize, shuffle, split, train, and score the held-out rows.
///
/// # Errors
/// Fails on an empty or degenerate dataset, or if training fails.
pub fn train_and_evaluate(
    mut dataset: Dataset,
    config: &VoxConfig,
) -> Result<(SpeakerModel, Confusion)> {
    if dataset.is_empty() {
        bail!("Aucune frame extraite : enregistrements trop courts ?");
    }

    let scaler = ColumnScaler::fit(&dataset)?;
    scaler.apply(&mut dataset)?;

    let mut rng = config
        .dataset
        .shuffle_seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    dataset.shuffle(&mut rng);

    if config.dataset.train_rows >= dataset.len() {
        log::warn!(
            "train_rows = {} >= {} lignes : partition d'évaluation vide",
            config.dataset.train_rows,
            dataset.len()
        );
    }
    let (training, held_out) = dataset.split_at(config.dataset.train_rows);
    log::info!(
        "{} lignes d'entraînement, {} d'évaluation",
        training.len(),
        held_out.len()
    );

    let network = train_model(&config.rbf, &training)?;

    let threshold = config.dataset.threshold;
    let mut confusion = Confusion::default();
    for (x, y) in held_out.iter() {
        confusion.record(network.evaluate(x)?, y, threshold);
    }

    let model = SpeakerModel::new(config.features.clone(), scaler, network, threshold);
    Ok((model, confusion))
}

/// Scores d'un enregistrement : un par frame, dans l'ordre.
#[derive(Clone, Debug)]
pub struct Verdict {
    pub frame_scores: Vec<f32>,
    pub mean_score: f32,
    pub is_target: bool,
}

/// Score every frame of a preprocessed waveform with a trained model.
///
/// # Errors
/// Fails if the waveform has no complete frame or a frame cannot be characterized.
pub fn score_waveform(model: &SpeakerModel, waveform: &[f32], sample_rate: u32) -> Result<Verdict> {
    let mut extractor = FeatureExtractor::new(&model.features, sample_rate);
    let frames = extractor.extract(waveform)?;
    if frames.is_empty() {
        bail!(
            "Enregistrement plus court qu'une frame ({} échantillons)",
            model.features.frame_size
        );
    }

    let mut frame_scores = Vec::with_capacity(frames.len());
    for frame in &frames {
        let mut row = frame.to_row(None);
        model.scaler.apply_row(&mut row)?;
        frame_scores.push(model.network.evaluate(&row)?);
    }

    let mean_score = frame_scores.iter().sum::<f32>() / frame_scores.len() as f32;
    Ok(Verdict {
        is_target: mean_score >= model.threshold,
        frame_scores,
        mean_score,
    })
}

/// Décode un fichier et le score avec `model`.
///
/// # Errors
/// Fails if decoding, preprocessing or scoring fails.
pub fn classify_file(model: &SpeakerModel, path: &Path) -> Result<Verdict> {
    let audio = vx_audio::decode::decode_file(path)?;
    let waveform = vx_audio::preprocess::first_channel(audio.channels)
        .and_then(vx_audio::preprocess::prepare_waveform)
        .with_context(|| format!("Forme d'onde inexploitable : {}", path.display()))?;
    score_waveform(model, &waveform, audio.sample_rate)
        .with_context(|| format!("Classification échouée : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vx_core::config::FeatureConfig;

    fn small_features() -> FeatureConfig {
        FeatureConfig {
            frame_size: 512,
            mfcc_fft_size: 256,
            mel_bands: 32,
            ..FeatureConfig::default()
        }
    }

    fn tone(hz: f32, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * hz * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn tiny_config() -> VoxConfig {
        let mut config = VoxConfig {
            features: small_features(),
            ..VoxConfig::default()
        };
        config.rbf.cluster_count = 2;
        config.rbf.learning_rate = 0.01;
        config.rbf.max_epochs = 3000;
        config.rbf.seed = Some(4);
        config.dataset.shuffle_seed = Some(4);
        config.dataset.train_rows = 12;
        config
    }

    /// Two speakers, each repeating one feature vector.
    fn two_speaker_rows() -> Result<Dataset> {
        let mut ds = Dataset::new(17);
        for _ in 0..8 {
            ds.push(&[1.0; 17], TARGET_LABEL)?;
            ds.push(&[-1.0; 17], OTHER_LABEL)?;
        }
        Ok(ds)
    }

    #[test]
    fn trains_and_reports_on_held_out_rows() -> Result<()> {
        let (model, confusion) = train_and_evaluate(two_speaker_rows()?, &tiny_config())?;
        assert_eq!(confusion.total(), 4);
        assert_eq!(confusion.accuracy(), Some(100.0));
        assert_eq!(model.scaler.scales().len(), 17);
        model.validate()?;
        Ok(())
    }

    #[test]
    fn empty_dataset_is_an_error() {
        assert!(train_and_evaluate(Dataset::new(17), &tiny_config()).is_err());
    }

    #[test]
    fn degenerate_column_is_an_error() -> Result<()> {
        let mut ds = Dataset::new(2);
        ds.push(&[0.0, 1.0], 1.0)?;
        ds.push(&[0.0, -1.0], 0.0)?;
        assert!(train_and_evaluate(ds, &tiny_config()).is_err());
        Ok(())
    }

    #[test]
    fn waveform_scores_one_value_per_frame() -> Result<()> {
        let (model, _) = train_and_evaluate(two_speaker_rows()?, &tiny_config())?;
        let verdict = score_waveform(&model, &tone(440.0, 512 * 3 + 7, 8000), 8000)?;
        assert_eq!(verdict.frame_scores.len(), 3);
        assert!(verdict.frame_scores.iter().all(|s| s.is_finite()));
        let mean = verdict.frame_scores.iter().sum::<f32>() / 3.0;
        assert!((verdict.mean_score - mean).abs() < 1e-6);
        assert_eq!(verdict.is_target, verdict.mean_score >= model.threshold);
        Ok(())
    }

    #[test]
    fn short_waveform_is_rejected() -> Result<()> {
        let (model, _) = train_and_evaluate(two_speaker_rows()?, &tiny_config())?;
        assert!(score_waveform(&model, &tone(440.0, 100, 8000), 8000).is_err());
        Ok(())
    }
}
