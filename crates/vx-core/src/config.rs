use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration complète du pipeline : extraction, réseau RBF, partition du dataset.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use vx_core::config::VoxConfig;
/// let config = VoxConfig::default();
/// assert_eq!(config.features.frame_size, 65536);
/// assert_eq!(config.rbf.data_dimensions, 17);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct VoxConfig {
    /// Feature extraction parameters.
    pub features: FeatureConfig,
    /// RBF network parameters.
    pub rbf: RbfConfig,
    /// Dataset partition and decision parameters.
    pub dataset: DatasetConfig,
}

/// Paramètres d'extraction des features, par frame.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FeatureConfig {
    /// Samples per non-overlapping frame (also the spectrum FFT size).
    pub frame_size: usize,
    /// Fraction of spectral energy defining the roll-off point.
    pub rolloff_fraction: f32,
    /// Shape parameter of the Kaiser analysis window.
    pub kaiser_beta: f32,
    /// Number of cepstral coefficients kept per frame.
    pub mfcc_count: usize,
    /// FFT size of the MFCC analysis frame.
    pub mfcc_fft_size: usize,
    /// Number of mel filters.
    pub mel_bands: usize,
    /// Dynamic range of the log-mel spectrum, in dB below its peak.
    pub top_db: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            frame_size: 65536,
            rolloff_fraction: 0.85,
            kaiser_beta: 14.0,
            mfcc_count: 13,
            mfcc_fft_size: 2048,
            mel_bands: 128,
            top_db: 80.0,
        }
    }
}

impl FeatureConfig {
    /// Width of a feature row produced with this configuration (label excluded).
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.mfcc_count + crate::frame::SPECTRAL_DESCRIPTORS
    }

    /// Reject extraction parameters that cannot build a window, FFT plan or filterbank.
    ///
    /// # Errors
    /// Returns `CoreError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.frame_size < 4 || self.frame_size % 2 != 0 {
            return Err(CoreError::Config(format!(
                "features.frame_size doit être pair et >= 4 (reçu {})",
                self.frame_size
            )));
        }
        if !(0.0..=1.0).contains(&self.rolloff_fraction) {
            return Err(CoreError::Config(format!(
                "features.rolloff_fraction hors de [0, 1] : {}",
                self.rolloff_fraction
            )));
        }
        if self.mfcc_count == 0 || self.mfcc_count > self.mel_bands {
            return Err(CoreError::Config(format!(
                "features.mfcc_count doit être dans [1, mel_bands] (reçu {})",
                self.mfcc_count
            )));
        }
        if self.mfcc_fft_size < 4 || self.mfcc_fft_size % 2 != 0 {
            return Err(CoreError::Config(format!(
                "features.mfcc_fft_size doit être pair et >= 4 (reçu {})",
                self.mfcc_fft_size
            )));
        }
        if !(self.top_db.is_finite() && self.top_db > 0.0) {
            return Err(CoreError::Config("features.top_db doit être > 0".into()));
        }
        if !self.kaiser_beta.is_finite() || self.kaiser_beta < 0.0 {
            return Err(CoreError::Config(format!(
                "features.kaiser_beta doit être >= 0 (reçu {})",
                self.kaiser_beta
            )));
        }
        Ok(())
    }
}

/// Paramètres du réseau RBF et de son entraînement.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RbfConfig {
    /// Width of the input feature vectors.
    pub data_dimensions: usize,
    /// Number of Gaussian basis units (cluster centers).
    pub cluster_count: usize,
    /// Gradient descent step size.
    pub learning_rate: f32,
    /// Number of batch gradient descent epochs.
    pub max_epochs: usize,
    /// Upper bound on k-means relocation passes.
    pub max_cluster_iterations: usize,
    /// Early exit when the MSE improves by less than this between epochs. None = run all epochs.
    #[serde(default)]
    pub tolerance: Option<f32>,
    /// Lower bound on any cluster spread.
    pub min_spread: f32,
    /// Seed for center initialization. None = entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for RbfConfig {
    fn default() -> Self {
        Self {
            data_dimensions: 17,
            cluster_count: 17,
            learning_rate: 0.00001,
            max_epochs: 5000,
            max_cluster_iterations: 300,
            tolerance: None,
            min_spread: 1e-3,
            seed: None,
        }
    }
}

/// Partition train/évaluation et seuil de décision.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DatasetConfig {
    /// Rows (after shuffling) used for training; the rest is held out.
    pub train_rows: usize,
    /// Seed for the row shuffle. None = entropy.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
    /// Scores at or above this value are classified as the target speaker.
    pub threshold: f32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            train_rows: 1200,
            shuffle_seed: None,
            threshold: 0.5,
        }
    }
}

impl VoxConfig {
    /// Reject values that would make extraction or training meaningless.
    ///
    /// # Errors
    /// Returns `CoreError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let f = &self.features;
        f.validate()?;

        let r = &self.rbf;
        if r.data_dimensions != f.feature_count() {
            return Err(CoreError::Config(format!(
                "rbf.data_dimensions ({}) ne correspond pas aux features extraites ({})",
                r.data_dimensions,
                f.feature_count()
            )));
        }
        if r.cluster_count == 0 {
            return Err(CoreError::Config("rbf.cluster_count doit être > 0".into()));
        }
        if !(r.learning_rate.is_finite() && r.learning_rate > 0.0) {
            return Err(CoreError::Config(format!(
                "rbf.learning_rate doit être > 0 (reçu {})",
                r.learning_rate
            )));
        }
        if r.min_spread <= 0.0 {
            return Err(CoreError::Config("rbf.min_spread doit être > 0".into()));
        }
        if self.dataset.train_rows == 0 {
            return Err(CoreError::Config("dataset.train_rows doit être > 0".into()));
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    features: Option<FeatureSection>,
    rbf: Option<RbfSection>,
    dataset: Option<DatasetSection>,
}

/// Features section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct FeatureSection {
    frame_size: Option<usize>,
    rolloff_fraction: Option<f32>,
    kaiser_beta: Option<f32>,
    mfcc_count: Option<usize>,
    mfcc_fft_size: Option<usize>,
    mel_bands: Option<usize>,
    top_db: Option<f32>,
}

/// RBF section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct RbfSection {
    data_dimensions: Option<usize>,
    cluster_count: Option<usize>,
    learning_rate: Option<f32>,
    max_epochs: Option<usize>,
    max_cluster_iterations: Option<usize>,
    tolerance: Option<f32>,
    min_spread: Option<f32>,
    seed: Option<u64>,
}

/// Dataset section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct DatasetSection {
    train_rows: Option<usize>,
    shuffle_seed: Option<u64>,
    threshold: Option<f32>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or fails validation.
///
/// # Example
/// ```no_run
/// use vx_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<VoxConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = VoxConfig::default();

    if let Some(s) = file.features {
        let f = &mut config.features;
        if let Some(v) = s.frame_size {
            f.frame_size = v;
        }
        if let Some(v) = s.rolloff_fraction {
            f.rolloff_fraction = v;
        }
        if let Some(v) = s.kaiser_beta {
            f.kaiser_beta = v;
        }
        if let Some(v) = s.mfcc_count {
            f.mfcc_count = v;
        }
        if let Some(v) = s.mfcc_fft_size {
            f.mfcc_fft_size = v;
        }
        if let Some(v) = s.mel_bands {
            f.mel_bands = v;
        }
        if let Some(v) = s.top_db {
            f.top_db = v;
        }
    }

    if let Some(s) = file.rbf {
        let r = &mut config.rbf;
        if let Some(v) = s.data_dimensions {
            r.data_dimensions = v;
        }
        if let Some(v) = s.cluster_count {
            r.cluster_count = v;
        }
        if let Some(v) = s.learning_rate {
            r.learning_rate = v;
        }
        if let Some(v) = s.max_epochs {
            r.max_epochs = v;
        }
        if let Some(v) = s.max_cluster_iterations {
            r.max_cluster_iterations = v;
        }
        if s.tolerance.is_some() {
            r.tolerance = s.tolerance;
        }
        if let Some(v) = s.min_spread {
            r.min_spread = v;
        }
        if s.seed.is_some() {
            r.seed = s.seed;
        }
    }

    if let Some(s) = file.dataset {
        let d = &mut config.dataset;
        if let Some(v) = s.train_rows {
            d.train_rows = v;
        }
        if s.shuffle_seed.is_some() {
            d.shuffle_seed = s.shuffle_seed;
        }
        if let Some(v) = s.threshold {
            d.threshold = v;
        }
    }

    config.validate()?;
    log::debug!("Configuration chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(VoxConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_toml_overrides_defaults() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            "[rbf]\ncluster_count = 4\nlearning_rate = 0.001\n\n[dataset]\ntrain_rows = 300"
        )?;
        let config = load_config(file.path())?;
        assert_eq!(config.rbf.cluster_count, 4);
        assert!((config.rbf.learning_rate - 0.001).abs() < f32::EPSILON);
        assert_eq!(config.dataset.train_rows, 300);
        // untouched sections keep their defaults
        assert_eq!(config.features, FeatureConfig::default());
        assert_eq!(config.rbf.max_epochs, 5000);
        Ok(())
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let mut config = VoxConfig::default();
        config.rbf.data_dimensions = 18;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn feature_section_is_checked_on_its_own() {
        assert_eq!(FeatureConfig::default().validate(), Ok(()));
        for broken in [
            FeatureConfig { frame_size: 0, ..FeatureConfig::default() },
            FeatureConfig { frame_size: 1023, ..FeatureConfig::default() },
            FeatureConfig { mfcc_fft_size: 2, ..FeatureConfig::default() },
            FeatureConfig { mfcc_count: 0, ..FeatureConfig::default() },
            FeatureConfig { kaiser_beta: f32::NAN, ..FeatureConfig::default() },
        ] {
            assert!(matches!(broken.validate(), Err(CoreError::Config(_))), "{broken:?}");
        }
    }

    #[test]
    fn invalid_toml_value_fails_loading() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[features]\nrolloff_fraction = 1.5")?;
        assert!(load_config(file.path()).is_err());
        Ok(())
    }
}
