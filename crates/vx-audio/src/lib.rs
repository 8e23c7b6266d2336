// Audio decoding, spectral analysis, and per-frame feature extraction for voxid.

pub mod decode;
pub mod error;
pub mod extractor;
pub mod features;
pub mod fft;
pub mod mfcc;
pub mod preprocess;
pub mod window;

pub use error::AudioError;
pub use extractor::FeatureExtractor;
