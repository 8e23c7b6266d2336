use thiserror::Error;

/// Errors originating from the RBF engine.
#[derive(Error, Debug, PartialEq)]
pub enum RbfError {
    /// Input vector width differs from the model dimensionality.
    #[error("Dimensions incompatibles : attendu {expected}, reçu {found}")]
    DimensionMismatch {
        /// Model dimensionality.
        expected: usize,
        /// Width of the offending vector.
        found: usize,
    },

    /// Fewer training rows than requested clusters.
    #[error("Pas assez d'échantillons : {samples} pour {clusters} clusters")]
    NotEnoughSamples {
        /// Training rows available.
        samples: usize,
        /// Clusters requested.
        clusters: usize,
    },

    /// Training produced a non-finite error (learning rate too large).
    #[error("Divergence de la descente de gradient à l'époque {epoch}")]
    Diverged {
        /// Epoch at which the error stopped being finite.
        epoch: usize,
    },

    /// Invalid model or training parameter.
    #[error("Paramètre invalide : {0}")]
    InvalidParameter(String),
}
