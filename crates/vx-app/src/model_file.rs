use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use vx_core::config::FeatureConfig;
use vx_core::dataset::ColumnScaler;
use vx_rbf::RbfNetwork;

/// Version du format de fichier modèle.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Everything needed to score new recordings: the extraction parameters used at
/// training time, the column scales, the trained network and the threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeakerModel {
    pub version: u32,
    pub features: FeatureConfig,
    pub scaler: ColumnScaler,
    pub network: RbfNetwork,
    pub threshold: f32,
}

impl SpeakerModel {
    #[must_use]
    pub fn new(
        features: FeatureConfig,
        scaler: ColumnScaler,
        network: RbfNetwork,
        threshold: f32,
    ) -> Self {
        Self {
            version: MODEL_FORMAT_VERSION,
            features,
            scaler,
            network,
            threshold,
        }
    }

    /// Check the extraction parameters and that the parts agree on the feature width.
    ///
    /// # Errors
    /// Returns an error describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        if self.version != MODEL_FORMAT_VERSION {
            bail!(
                "Version de modèle {} non supportée (attendu {MODEL_FORMAT_VERSION})",
                self.version
            );
        }
        self.features.validate()?;
        self.network.validate()?;
        ColumnScaler::from_scales(self.scaler.scales().to_vec())?;
        let width = self.features.feature_count();
        let dims = self.network.clusters().data_dimensions();
        if self.scaler.scales().len() != width || dims != width {
            bail!(
                "Modèle incohérent : {width} features extraites, {} échelles, réseau de dimension {dims}",
                self.scaler.scales().len()
            );
        }
        if !self.threshold.is_finite() {
            bail!("Seuil de décision invalide : {}", self.threshold);
        }
        Ok(())
    }
}

/// Écrit le modèle en JSON.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn save_model(model: &SpeakerModel, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Impossible de créer {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, model)
        .with_context(|| format!("Sérialisation du modèle échouée : {}", path.display()))?;
    writer.flush()?;
    log::info!("Modèle sauvegardé : {}", path.display());
    Ok(())
}

/// Lit et valide un modèle JSON.
///
/// # Errors
/// Returns an error if the file is unreadable, malformed, or inconsistent.
pub fn load_model(path: &Path) -> Result<SpeakerModel> {
    let file =
        File::open(path).with_context(|| format!("Impossible de lire {}", path.display()))?;
    let model: SpeakerModel = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Modèle invalide : {}", path.display()))?;
    model
        .validate()
        .with_context(|| format!("Modèle rejeté : {}", path.display()))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vx_rbf::network::{ClusterModel, OutputWeights};

    fn model(width: usize) -> Result<SpeakerModel> {
        let features = FeatureConfig::default();
        let clusters = ClusterModel::new(vec![vec![0.5; width], vec![-0.5; width]], vec![1.0, 2.0])?;
        let network = RbfNetwork::from_parts(
            clusters,
            OutputWeights {
                weights: vec![0.8, -0.3],
                bias: 0.1,
            },
        )?;
        let scaler = ColumnScaler::from_scales(vec![2.0; features.feature_count()])?;
        Ok(SpeakerModel::new(features, scaler, network, 0.5))
    }

    #[test]
    fn save_then_load_scores_identically() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model.json");
        let original = model(17)?;
        save_model(&original, &path)?;
        let loaded = load_model(&path)?;

        let x = [0.25f32; 17];
        assert_eq!(
            original.network.evaluate(&x)?.to_bits(),
            loaded.network.evaluate(&x)?.to_bits()
        );
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn width_disagreement_is_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model.json");
        save_model(&model(5)?, &path)?;
        assert!(load_model(&path).is_err());
        Ok(())
    }

    #[test]
    fn unusable_frame_size_is_rejected_on_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("model.json");
        let mut m = model(17)?;
        m.features.frame_size = 0;
        save_model(&m, &path)?;
        let err = load_model(&path).err().map(|e| format!("{e:#}"));
        assert!(err.is_some_and(|msg| msg.contains("frame_size")));
        Ok(())
    }

    #[test]
    fn unknown_version_is_rejected() -> Result<()> {
        let mut m = model(17)?;
        m.version = 99;
        assert!(m.validate().is_err());
        Ok(())
    }
}
