use serde::{Deserialize, Serialize};

use crate::error::RbfError;
use crate::kmeans::squared_distance;

/// Hidden layer of the network: Gaussian units fixed after clustering.
///
/// # Example
/// ```
/// use vx_rbf::network::ClusterModel;
/// let model = ClusterModel::new(vec![vec![0.0, 0.0]], vec![1.0]).unwrap();
/// let phi = model.activations(&[0.0, 0.0]).unwrap();
/// assert_eq!(phi, vec![1.0]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    centers: Vec<Vec<f32>>,
    spreads: Vec<f32>,
}

impl ClusterModel {
    /// Build a hidden layer, checking that every center has the same width and
    /// every spread is a positive finite number.
    ///
    /// # Errors
    /// `InvalidParameter` or `DimensionMismatch` describing the inconsistency.
    pub fn new(centers: Vec<Vec<f32>>, spreads: Vec<f32>) -> Result<Self, RbfError> {
        let model = Self { centers, spreads };
        model.validate()?;
        Ok(model)
    }

    /// Re-check the invariants, e.g. after deserialization.
    ///
    /// # Errors
    /// Same as [`ClusterModel::new`].
    pub fn validate(&self) -> Result<(), RbfError> {
        let Some(first) = self.centers.first() else {
            return Err(RbfError::InvalidParameter("aucun centre".into()));
        };
        let dims = first.len();
        if dims == 0 {
            return Err(RbfError::InvalidParameter("centres de dimension 0".into()));
        }
        if let Some(c) = self.centers.iter().find(|c| c.len() != dims) {
            return Err(RbfError::DimensionMismatch {
                expected: dims,
                found: c.len(),
            });
        }
        if self.spreads.len() != self.centers.len() {
            return Err(RbfError::InvalidParameter(format!(
                "{} spreads pour {} centres",
                self.spreads.len(),
                self.centers.len()
            )));
        }
        if let Some(s) = self.spreads.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(RbfError::InvalidParameter(format!("spread invalide : {s}")));
        }
        Ok(())
    }

    /// Width of the input vectors.
    #[must_use]
    pub fn data_dimensions(&self) -> usize {
        self.centers.first().map_or(0, Vec::len)
    }

    /// Number of Gaussian units.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.centers.len()
    }

    /// Cluster centers.
    #[must_use]
    pub fn centers(&self) -> &[Vec<f32>] {
        &self.centers
    }

    /// Per-cluster spreads (σ).
    #[must_use]
    pub fn spreads(&self) -> &[f32] {
        &self.spreads
    }

    /// `φ_j(x)` for every unit.
    ///
    /// # Errors
    /// `DimensionMismatch` if `x` has the wrong width.
    pub fn activations(&self, x: &[f32]) -> Result<Vec<f32>, RbfError> {
        self.check_width(x)?;
        Ok(self.activations_unchecked(x))
    }

    pub(crate) fn activations_unchecked(&self, x: &[f32]) -> Vec<f32> {
        self.centers
            .iter()
            .zip(&self.spreads)
            .map(|(c, &s)| gaussian(x, c, s))
            .collect()
    }

    pub(crate) fn check_width(&self, x: &[f32]) -> Result<(), RbfError> {
        let expected = self.data_dimensions();
        if x.len() == expected {
            Ok(())
        } else {
            Err(RbfError::DimensionMismatch {
                expected,
                found: x.len(),
            })
        }
    }
}

/// Gaussian basis activation `exp(-‖x - c‖² / (2σ²))`.
#[inline]
#[must_use]
pub fn gaussian(x: &[f32], center: &[f32], spread: f32) -> f32 {
    (-squared_distance(x, center) / (2.0 * spread * spread)).exp()
}

/// Output layer: one weight per unit plus a bias, no output nonlinearity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputWeights {
    /// Weight of each Gaussian unit.
    pub weights: Vec<f32>,
    /// Bias term.
    pub bias: f32,
}

impl OutputWeights {
    /// All weights and the bias at zero.
    #[must_use]
    pub fn zeros(units: usize) -> Self {
        Self {
            weights: vec![0.0; units],
            bias: 0.0,
        }
    }

    /// `Σ w_j·φ_j + b`.
    #[inline]
    #[must_use]
    pub fn combine(&self, activations: &[f32]) -> f32 {
        self.weights
            .iter()
            .zip(activations)
            .map(|(w, p)| w * p)
            .sum::<f32>()
            + self.bias
    }
}

/// Score one feature vector with a trained hidden layer and output weights.
///
/// The score is not clamped; callers threshold it (0.5 by default).
///
/// # Errors
/// `DimensionMismatch` if `x` or the weight vector does not fit the model.
///
/// # Example
/// ```
/// use vx_rbf::network::{ClusterModel, OutputWeights, evaluate_point};
/// let model = ClusterModel::new(vec![vec![1.0]], vec![0.5]).unwrap();
/// let weights = OutputWeights { weights: vec![2.0], bias: -0.5 };
/// let score = evaluate_point(&model, &weights, &[1.0]).unwrap();
/// assert!((score - 1.5).abs() < 1e-6);
/// ```
pub fn evaluate_point(
    model: &ClusterModel,
    weights: &OutputWeights,
    x: &[f32],
) -> Result<f32, RbfError> {
    if weights.weights.len() != model.cluster_count() {
        return Err(RbfError::DimensionMismatch {
            expected: model.cluster_count(),
            found: weights.weights.len(),
        });
    }
    Ok(weights.combine(&model.activations(x)?))
}

/// Trained network: immutable hidden layer plus learned output weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RbfNetwork {
    clusters: ClusterModel,
    output: OutputWeights,
}

impl RbfNetwork {
    /// Assemble a network from its two layers.
    ///
    /// # Errors
    /// Fails if either layer is inconsistent or they disagree on the unit count.
    pub fn from_parts(clusters: ClusterModel, output: OutputWeights) -> Result<Self, RbfError> {
        let network = Self { clusters, output };
        network.validate()?;
        Ok(network)
    }

    /// Re-check both layers, e.g. after deserialization.
    ///
    /// # Errors
    /// Same as [`RbfNetwork::from_parts`].
    pub fn validate(&self) -> Result<(), RbfError> {
        self.clusters.validate()?;
        if self.output.weights.len() != self.clusters.cluster_count() {
            return Err(RbfError::DimensionMismatch {
                expected: self.clusters.cluster_count(),
                found: self.output.weights.len(),
            });
        }
        if !(self.output.bias.is_finite() && self.output.weights.iter().all(|w| w.is_finite())) {
            return Err(RbfError::InvalidParameter("poids non finis".into()));
        }
        Ok(())
    }

    /// Score a feature vector.
    ///
    /// # Errors
    /// `DimensionMismatch` if `x` has the wrong width.
    pub fn evaluate(&self, x: &[f32]) -> Result<f32, RbfError> {
        evaluate_point(&self.clusters, &self.output, x)
    }

    /// `true` if the score reaches `threshold`.
    ///
    /// # Errors
    /// `DimensionMismatch` if `x` has the wrong width.
    pub fn classify(&self, x: &[f32], threshold: f32) -> Result<bool, RbfError> {
        Ok(self.evaluate(x)? >= threshold)
    }

    /// Hidden layer.
    #[must_use]
    pub fn clusters(&self) -> &ClusterModel {
        &self.clusters
    }

    /// Output layer.
    #[must_use]
    pub fn output(&self) -> &OutputWeights {
        &self.output
    }

    /// Split into `(weights, model)`.
    #[must_use]
    pub fn into_parts(self) -> (OutputWeights, ClusterModel) {
        (self.output, self.clusters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network() -> Result<RbfNetwork, RbfError> {
        let clusters = ClusterModel::new(vec![vec![0.0, 0.0], vec![1.0, 1.0]], vec![0.5, 0.5])?;
        RbfNetwork::from_parts(
            clusters,
            OutputWeights {
                weights: vec![-0.2, 1.1],
                bias: 0.05,
            },
        )
    }

    #[test]
    fn activation_decays_with_distance() {
        let near = gaussian(&[0.1, 0.0], &[0.0, 0.0], 1.0);
        let far = gaussian(&[2.0, 0.0], &[0.0, 0.0], 1.0);
        assert!(near > far);
        assert!((gaussian(&[2.0, 0.0], &[0.0, 0.0], 1.0) - (-2.0f32).exp()).abs() < 1e-7);
    }

    #[test]
    fn evaluation_is_deterministic() -> Result<(), RbfError> {
        let net = network()?;
        let x = [0.7, 0.9];
        let a = net.evaluate(&x)?;
        let b = net.evaluate(&x)?;
        assert_eq!(a.to_bits(), b.to_bits());
        Ok(())
    }

    #[test]
    fn output_is_linear_and_unclamped() -> Result<(), RbfError> {
        let clusters = ClusterModel::new(vec![vec![0.0]], vec![1.0])?;
        let net = RbfNetwork::from_parts(
            clusters,
            OutputWeights {
                weights: vec![3.0],
                bias: 0.5,
            },
        )?;
        assert!((net.evaluate(&[0.0])? - 3.5).abs() < 1e-6);
        assert!(net.classify(&[0.0], 0.5)?);
        Ok(())
    }

    #[test]
    fn wrong_width_is_rejected() -> Result<(), RbfError> {
        let net = network()?;
        assert_eq!(
            net.evaluate(&[0.0, 0.0, 0.0]),
            Err(RbfError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
        Ok(())
    }

    #[test]
    fn inconsistent_layers_are_rejected() {
        assert!(ClusterModel::new(vec![vec![0.0], vec![0.0, 1.0]], vec![1.0, 1.0]).is_err());
        assert!(ClusterModel::new(vec![vec![0.0]], vec![0.0]).is_err());
        assert!(ClusterModel::new(Vec::new(), Vec::new()).is_err());
        let clusters = ClusterModel::new(vec![vec![0.0]], vec![1.0]);
        assert!(clusters.is_ok_and(|c| RbfNetwork::from_parts(c, OutputWeights::zeros(2)).is_err()));
    }
}
