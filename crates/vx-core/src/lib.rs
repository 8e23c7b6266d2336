/// Configuration, shared types, and dataset handling for voxid.
///
/// This crate contains the labeled feature matrix, its column normalization,
/// and the TOML configuration used across the voxid workspace.

pub mod config;
pub mod dataset;
pub mod error;
pub mod frame;

pub use config::VoxConfig;
pub use dataset::{ColumnScaler, Dataset};
pub use error::CoreError;
pub use frame::FrameFeatures;
