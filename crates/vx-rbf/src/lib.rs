//! Radial-basis-function network: k-means centers, Gaussian hidden layer,
//! linear output trained by batch gradient descent.

pub mod error;
pub mod kmeans;
pub mod network;
pub mod train;

pub use error::RbfError;
pub use network::{ClusterModel, OutputWeights, RbfNetwork, evaluate_point};
pub use train::train_model;
