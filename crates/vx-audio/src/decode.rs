use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AudioError;

/// Decoded recording: one sample vector per channel, plus the sample rate from the header.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedAudio {
    /// Planar samples, `channels[c][i]`.
    pub channels: Vec<Vec<f32>>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Decode an audio file into planar f32 channels.
///
/// Supports WAV, MP3, FLAC, OGG, AAC via symphonia. Channels are kept separate
/// so that the caller decides which one to analyze.
///
/// # Errors
/// Returns an error if the file cannot be opened, probed, or has no sample rate.
///
/// # Example
/// ```no_run
/// use vx_audio::decode::decode_file;
/// let audio = decode_file("speech.wav").unwrap();
/// println!("{} Hz, {} channels", audio.sample_rate, audio.channels.len());
/// ```
pub fn decode_file(path: impl AsRef<Path>) -> Result<DecodedAudio> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Cannot open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(
        Box::new(file),
        symphonia::core::io::MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))
        .with_context(|| format!("Failed to probe audio format of {}", path.display()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .context("No default audio track found")?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::DecodeError("sample rate absent de l'en-tête".into()))?;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::DecodeError(e.to_string()))
        .context("Failed to create audio decoder")?;

    let track_id = track.id;
    // Sized from the first decoded packet: headers may omit the channel layout.
    let mut channels: Vec<Vec<f32>> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut max_sample_frames: usize = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Audio decode packet error: {e}");
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Audio decode frame error: {e}");
                continue;
            }
        };

        let spec = *decoded.spec();
        let packet_channels = spec.channels.count().max(1);
        if channels.is_empty() {
            channels = vec![Vec::new(); packet_channels];
        } else if packet_channels != channels.len() {
            log::warn!(
                "Paquet à {packet_channels} canaux dans un flux à {} canaux, ignoré",
                channels.len()
            );
            continue;
        }
        let num_frames = decoded.capacity();
        // Reuse SampleBuffer: only reallocate if this packet is bigger than current capacity
        if sample_buf.is_none() || num_frames > max_sample_frames {
            sample_buf = Some(SampleBuffer::<f32>::new(num_frames as u64, spec));
            max_sample_frames = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        deinterleave(buf.samples(), &mut channels);
    }

    log::info!(
        "Decoded {} samples x {} channels @ {}Hz from {}",
        channels.first().map_or(0, Vec::len),
        channels.len(),
        sample_rate,
        path.display()
    );

    Ok(DecodedAudio {
        channels,
        sample_rate,
    })
}

/// Split interleaved frames into the per-channel vectors.
fn deinterleave(interleaved: &[f32], channels: &mut [Vec<f32>]) {
    let n = channels.len();
    for frame in interleaved.chunks_exact(n) {
        for (ch, &s) in channels.iter_mut().zip(frame) {
            ch.push(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deinterleave_stereo() {
        let mut channels = vec![Vec::new(), Vec::new()];
        deinterleave(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0], &mut channels);
        assert_eq!(channels[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(channels[1], vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn stereo_wav_keeps_both_channels() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stereo.wav");
        let frames: Vec<(i16, i16)> = (0..64).map(|i| (i * 100, -i * 100)).collect();
        std::fs::write(&path, wav_pcm16(&frames, 8000))?;

        let audio = decode_file(&path)?;
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channels.len(), 2);
        assert_eq!(audio.channels[0].len(), 64);
        assert!(audio.channels[0][10] > 0.0);
        assert!(audio.channels[1][10] < 0.0);
        Ok(())
    }

    /// Minimal 16-bit PCM stereo WAV.
    fn wav_pcm16(frames: &[(i16, i16)], sample_rate: u32) -> Vec<u8> {
        let data_len = (frames.len() * 4) as u32;
        let mut out = Vec::with_capacity(44 + data_len as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 4).to_le_bytes());
        out.extend_from_slice(&4u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for &(l, r) in frames {
            out.extend_from_slice(&l.to_le_bytes());
            out.extend_from_slice(&r.to_le_bytes());
        }
        out
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(decode_file("/nonexistent/voxid/missing.wav").is_err());
    }
}
