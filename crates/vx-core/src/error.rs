use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// A feature column is zero over the whole dataset and cannot be scaled.
    #[error("Colonne de features dégénérée (max = 0) : colonne {column}")]
    DegenerateFeature {
        /// Index of the offending column.
        column: usize,
    },

    /// Row width does not match the dataset or scaler width.
    #[error("Dimensions incompatibles : attendu {expected}, reçu {found}")]
    DimensionMismatch {
        /// Expected number of columns.
        expected: usize,
        /// Actual number of columns.
        found: usize,
    },

    /// Operation requires at least one row.
    #[error("Dataset vide")]
    EmptyDataset,
}
