/// Descripteurs acoustiques d'une frame audio.
///
/// Column order is fixed and must be identical at training and inference time:
/// `mfcc[0..n]`, zero-crossing rate, roll-off, centroid, flux.
///
/// # Example
/// ```
/// use vx_core::frame::FrameFeatures;
/// let f = FrameFeatures { mfcc: vec![0.5; 13], ..FrameFeatures::default() };
/// assert_eq!(f.width(), 17);
/// assert_eq!(f.to_row(Some(1.0)).len(), 18);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameFeatures {
    /// Mel-frequency cepstral coefficients.
    pub mfcc: Vec<f32>,
    /// Fraction of sign changes in the frame [0.0, 1.0].
    pub zero_crossing_rate: f32,
    /// Roll-off frequency divided by the highest bin frequency.
    pub spectral_rolloff: f32,
    /// Centroid frequency divided by the highest bin frequency.
    pub spectral_centroid: f32,
    /// Norm of the spectrum difference with the previous frame, per bin.
    pub spectral_flux: f32,
}

/// Number of non-cepstral descriptors appended after the MFCCs.
pub const SPECTRAL_DESCRIPTORS: usize = 4;

impl FrameFeatures {
    /// Number of feature columns this frame produces (label excluded).
    #[must_use]
    pub fn width(&self) -> usize {
        self.mfcc.len() + SPECTRAL_DESCRIPTORS
    }

    /// Flatten into a dataset row, appending the label when given.
    #[must_use]
    pub fn to_row(&self, label: Option<f32>) -> Vec<f32> {
        let mut row = Vec::with_capacity(self.width() + 1);
        row.extend_from_slice(&self.mfcc);
        row.push(self.zero_crossing_rate);
        row.push(self.spectral_rolloff);
        row.push(self.spectral_centroid);
        row.push(self.spectral_flux);
        if let Some(l) = label {
            row.push(l);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_layout_matches_column_order() {
        let f = FrameFeatures {
            mfcc: vec![1.0, 2.0],
            zero_crossing_rate: 0.1,
            spectral_rolloff: 0.2,
            spectral_centroid: 0.3,
            spectral_flux: 0.4,
        };
        assert_eq!(f.to_row(None), vec![1.0, 2.0, 0.1, 0.2, 0.3, 0.4]);
        assert_eq!(f.to_row(Some(0.0)).last(), Some(&0.0));
    }
}
