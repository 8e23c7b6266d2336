use rand::SeedableRng;
use rand::rngs::StdRng;
use vx_core::config::RbfConfig;
use vx_core::dataset::Dataset;

use crate::error::RbfError;
use crate::kmeans::{KMeans, cluster_spreads};
use crate::network::{ClusterModel, OutputWeights, RbfNetwork};

/// Entraîne un réseau RBF sur un dataset labellisé.
///
/// Stage 1 clusters the feature columns (labels ignored) and freezes centers
/// and spreads. Stage 2 learns the output weights and bias by batch gradient
/// descent on the squared error, `max_epochs` full passes at a fixed learning
/// rate, optionally stopping early when `tolerance` is set.
///
/// # Errors
/// `DimensionMismatch` if the dataset width is not `data_dimensions`, clustering
/// errors (too few rows), `InvalidParameter` for a bad learning rate, `Diverged` if the error
/// stops being finite.
///
/// # Example
/// ```
/// use vx_core::config::RbfConfig;
/// use vx_core::dataset::Dataset;
/// use vx_rbf::train::train_model;
///
/// let mut ds = Dataset::new(1);
/// for i in 0..20 {
///     let x = if i % 2 == 0 { 0.0 } else { 1.0 };
///     ds.push(&[x], x).unwrap();
/// }
/// let config = RbfConfig { data_dimensions: 1, cluster_count: 2, learning_rate: 0.01, max_epochs: 2000, seed: Some(1), ..RbfConfig::default() };
/// let net = train_model(&config, &ds).unwrap();
/// assert!(net.evaluate(&[1.0]).unwrap() > 0.5);
/// assert!(net.evaluate(&[0.0]).unwrap() < 0.5);
/// ```
pub fn train_model(config: &RbfConfig, training: &Dataset) -> Result<RbfNetwork, RbfError> {
    if training.feature_count() != config.data_dimensions {
        return Err(RbfError::DimensionMismatch {
            expected: config.data_dimensions,
            found: training.feature_count(),
        });
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        return Err(RbfError::InvalidParameter(format!(
            "learning rate {}",
            config.learning_rate
        )));
    }

    let points: Vec<&[f32]> = training.iter().map(|(x, _)| x).collect();
    let labels: Vec<f32> = training.iter().map(|(_, y)| y).collect();

    let mut rng = config
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    log::info!(
        "Clustering de {} points en {} centres...",
        points.len(),
        config.cluster_count
    );
    let clustering = KMeans::new(config.cluster_count, config.max_cluster_iterations)
        .fit(&points, &mut rng)?;
    let spreads = cluster_spreads(&points, &clustering, config.min_spread);
    let clusters = ClusterModel::new(clustering.centers, spreads)?;
    log::info!(
        "k-means : {} passes, convergé = {}",
        clustering.iterations,
        clustering.converged
    );

    // Centers are frozen: activations are computed once for every epoch.
    let phi: Vec<Vec<f32>> = points
        .iter()
        .map(|x| clusters.activations_unchecked(x))
        .collect();

    let output = gradient_descent(&phi, &labels, config)?;
    RbfNetwork::from_parts(clusters, output)
}

/// Batch gradient descent on `½ Σ (y - ŷ)²` with `ŷ = w·φ + b`.
fn gradient_descent(
    phi: &[Vec<f32>],
    labels: &[f32],
    config: &RbfConfig,
) -> Result<OutputWeights, RbfError> {
    let units = phi.first().map_or(config.cluster_count, Vec::len);
    let mut output = OutputWeights::zeros(units);
    if phi.is_empty() {
        return Ok(output);
    }

    let lr = f64::from(config.learning_rate);
    let mut grad_w = vec![0.0f64; units];
    let mut previous_mse = f64::INFINITY;

    for epoch in 0..config.max_epochs {
        grad_w.iter_mut().for_each(|g| *g = 0.0);
        let mut grad_b = 0.0f64;
        let mut sq_err = 0.0f64;

        for (row, &y) in phi.iter().zip(labels) {
            let err = f64::from(y - output.combine(row));
            for (g, &p) in grad_w.iter_mut().zip(row) {
                *g += err * f64::from(p);
            }
            grad_b += err;
            sq_err += err * err;
        }

        let mse = sq_err / phi.len() as f64;
        if !mse.is_finite() {
            return Err(RbfError::Diverged { epoch });
        }

        for (w, g) in output.weights.iter_mut().zip(&grad_w) {
            *w += (lr * g) as f32;
        }
        output.bias += (lr * grad_b) as f32;

        if epoch % 1000 == 0 {
            log::debug!("Époque {epoch} : MSE = {mse:.6}");
        }

        if config
            .tolerance
            .is_some_and(|tol| (previous_mse - mse).abs() < f64::from(tol))
        {
            log::info!("Arrêt anticipé à l'époque {epoch} (MSE = {mse:.6})");
            break;
        }
        previous_mse = mse;
    }

    Ok(output)
}
