use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::frame::FrameFeatures;

/// Matrice labellisée : une ligne par frame, features puis label en dernière colonne.
///
/// Row order carries no meaning once the dataset has been shuffled.
///
/// # Example
/// ```
/// use vx_core::dataset::Dataset;
/// let mut ds = Dataset::new(2);
/// ds.push(&[0.1, 0.2], 1.0).unwrap();
/// assert_eq!(ds.len(), 1);
/// assert_eq!(ds.label(0), 1.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    feature_count: usize,
    rows: Vec<Vec<f32>>,
}

impl Dataset {
    /// Empty dataset whose rows hold `feature_count` features plus a label.
    #[must_use]
    pub fn new(feature_count: usize) -> Self {
        Self {
            feature_count,
            rows: Vec::new(),
        }
    }

    /// Build a dataset from the frames of one recording, all sharing `label`.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if the frames do not all have the same width.
    pub fn from_frames(frames: &[FrameFeatures], label: f32) -> Result<Self, CoreError> {
        let width = frames.first().map_or(0, FrameFeatures::width);
        let mut ds = Self::new(width);
        for frame in frames {
            if frame.width() != width {
                return Err(CoreError::DimensionMismatch {
                    expected: width,
                    found: frame.width(),
                });
            }
            ds.rows.push(frame.to_row(Some(label)));
        }
        Ok(ds)
    }

    /// Append one row.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if `features` has the wrong width.
    pub fn push(&mut self, features: &[f32], label: f32) -> Result<(), CoreError> {
        if features.len() != self.feature_count {
            return Err(CoreError::DimensionMismatch {
                expected: self.feature_count,
                found: features.len(),
            });
        }
        let mut row = Vec::with_capacity(self.feature_count + 1);
        row.extend_from_slice(features);
        row.push(label);
        self.rows.push(row);
        Ok(())
    }

    /// Append all rows of `other` below the existing ones.
    ///
    /// An empty dataset adopts the width of `other`.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if both datasets are non-empty with different widths.
    pub fn stack(&mut self, other: Self) -> Result<(), CoreError> {
        if self.rows.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.rows.is_empty() {
            return Ok(());
        }
        if other.feature_count != self.feature_count {
            return Err(CoreError::DimensionMismatch {
                expected: self.feature_count,
                found: other.feature_count,
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Uniform random permutation of the rows.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.rows.shuffle(rng);
    }

    /// Split into (first `at` rows, remaining rows). `at` is clamped to the row count.
    #[must_use]
    pub fn split_at(mut self, at: usize) -> (Self, Self) {
        let at = at.min(self.rows.len());
        let tail = self.rows.split_off(at);
        let held_out = Self {
            feature_count: self.feature_count,
            rows: tail,
        };
        (self, held_out)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` if the dataset holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of feature columns (label excluded).
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Feature columns of row `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn features(&self, i: usize) -> &[f32] {
        &self.rows[i][..self.feature_count]
    }

    /// Label of row `i`.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn label(&self, i: usize) -> f32 {
        self.rows[i][self.feature_count]
    }

    /// Iterate over `(features, label)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[f32], f32)> + '_ {
        self.rows
            .iter()
            .map(|r| (&r[..self.feature_count], r[self.feature_count]))
    }

    /// Full rows, label included.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }
}

/// Facteurs de normalisation par colonne, dérivés d'un dataset d'entraînement.
///
/// Each feature column is divided by its maximum absolute value so that the
/// largest magnitude becomes 1.0. The label column is never scaled. Scales
/// fitted on the training set must be reused for any later data.
///
/// # Example
/// ```
/// use vx_core::dataset::{ColumnScaler, Dataset};
/// let mut ds = Dataset::new(2);
/// ds.push(&[2.0, 4.0], 1.0).unwrap();
/// ds.push(&[1.0, 8.0], 0.0).unwrap();
/// let scaler = ColumnScaler::fit(&ds).unwrap();
/// scaler.apply(&mut ds).unwrap();
/// assert_eq!(ds.features(0), &[1.0, 0.5]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    scales: Vec<f32>,
}

impl ColumnScaler {
    /// Compute the max-abs of every feature column.
    ///
    /// # Errors
    /// `EmptyDataset` if there are no rows; `DegenerateFeature` if a column is all zeros.
    pub fn fit(dataset: &Dataset) -> Result<Self, CoreError> {
        if dataset.is_empty() {
            return Err(CoreError::EmptyDataset);
        }
        let mut scales = vec![0.0f32; dataset.feature_count()];
        for (features, _) in dataset.iter() {
            for (s, &v) in scales.iter_mut().zip(features) {
                *s = s.max(v.abs());
            }
        }
        if let Some(column) = scales.iter().position(|&s| s == 0.0 || !s.is_finite()) {
            return Err(CoreError::DegenerateFeature { column });
        }
        Ok(Self { scales })
    }

    /// Rebuild a scaler from stored factors.
    ///
    /// # Errors
    /// `DegenerateFeature` if a factor is zero or not finite.
    pub fn from_scales(scales: Vec<f32>) -> Result<Self, CoreError> {
        if let Some(column) = scales.iter().position(|&s| s == 0.0 || !s.is_finite()) {
            return Err(CoreError::DegenerateFeature { column });
        }
        Ok(Self { scales })
    }

    /// Per-column divisors.
    #[must_use]
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// Scale every row of `dataset` in place.
    ///
    /// # Errors
    /// `DimensionMismatch` if the dataset width differs from the fitted width.
    pub fn apply(&self, dataset: &mut Dataset) -> Result<(), CoreError> {
        if dataset.feature_count != self.scales.len() {
            return Err(CoreError::DimensionMismatch {
                expected: self.scales.len(),
                found: dataset.feature_count,
            });
        }
        for row in &mut dataset.rows {
            for (v, s) in row.iter_mut().zip(&self.scales) {
                *v /= s;
            }
        }
        Ok(())
    }

    /// Scale a single unlabeled feature vector in place.
    ///
    /// # Errors
    /// `DimensionMismatch` if `features` has the wrong width.
    pub fn apply_row(&self, features: &mut [f32]) -> Result<(), CoreError> {
        if features.len() != self.scales.len() {
            return Err(CoreError::DimensionMismatch {
                expected: self.scales.len(),
                found: features.len(),
            });
        }
        for (v, s) in features.iter_mut().zip(&self.scales) {
            *v /= s;
        }
        Ok(())
    }
}
