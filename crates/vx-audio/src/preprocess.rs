use crate::error::AudioError;

/// Select the first channel of a decoded recording.
///
/// # Errors
/// Returns `InvalidAudio` if there is no channel at all.
pub fn first_channel(channels: Vec<Vec<f32>>) -> Result<Vec<f32>, AudioError> {
    channels
        .into_iter()
        .next()
        .ok_or_else(|| AudioError::InvalidAudio("aucun canal audio".into()))
}

/// Normalise la forme d'onde (amplitude max = 1) puis la centre sur zéro.
///
/// Scaling happens before mean removal, so the peak after centering may differ
/// slightly from 1.
///
/// # Errors
/// Returns `InvalidAudio` if the waveform is empty, silent, or not finite.
///
/// # Example
/// ```
/// use vx_audio::preprocess::prepare_waveform;
/// let y = prepare_waveform(vec![0.0, 2.0, -2.0, 0.0]).unwrap();
/// assert_eq!(y, vec![0.0, 1.0, -1.0, 0.0]);
/// ```
pub fn prepare_waveform(mut samples: Vec<f32>) -> Result<Vec<f32>, AudioError> {
    if samples.is_empty() {
        return Err(AudioError::InvalidAudio("forme d'onde vide".into()));
    }

    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if peak == 0.0 || !peak.is_finite() {
        return Err(AudioError::InvalidAudio(format!(
            "amplitude maximale inexploitable : {peak}"
        )));
    }

    for s in &mut samples {
        *s /= peak;
    }

    let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / samples.len() as f64;
    let mean = mean as f32;
    for s in &mut samples {
        *s -= mean;
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_zero_mean() -> Result<(), AudioError> {
        let y = prepare_waveform(vec![0.5, 1.0, 4.0, 2.5])?;
        let mean: f32 = y.iter().sum::<f32>() / y.len() as f32;
        assert!(mean.abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn peak_scaled_before_centering() -> Result<(), AudioError> {
        let y = prepare_waveform(vec![4.0, 0.0, 0.0, 0.0])?;
        // 4 -> 1.0, mean 0.25
        assert!((y[0] - 0.75).abs() < 1e-6);
        assert!((y[1] + 0.25).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn empty_and_silent_are_rejected() {
        assert!(matches!(
            prepare_waveform(Vec::new()),
            Err(AudioError::InvalidAudio(_))
        ));
        assert!(matches!(
            prepare_waveform(vec![0.0; 16]),
            Err(AudioError::InvalidAudio(_))
        ));
    }

    #[test]
    fn first_channel_of_stereo() -> Result<(), AudioError> {
        let ch = first_channel(vec![vec![1.0, 2.0], vec![3.0, 4.0]])?;
        assert_eq!(ch, vec![1.0, 2.0]);
        assert!(first_channel(Vec::new()).is_err());
        Ok(())
    }
}
