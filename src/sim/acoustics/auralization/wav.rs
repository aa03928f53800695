use std::path::Path;

use crate::error::{Result, RirError};

/// Converts a sample rate in Hz to the integer rate stored in WAV headers.
pub fn wav_sample_rate(sample_rate: f64) -> Result<u32> {
    let rounded = sample_rate.round();
    if !rounded.is_finite() || rounded < 1.0 || rounded > f64::from(u32::MAX) {
        return Err(RirError::invalid(
            "sample_rate",
            format!("{sample_rate} Hz cannot be stored in a WAV file"),
        ));
    }
    Ok(rounded as u32)
}

/// Reads a WAV file and returns mono samples normalized to [-1, 1] and the sample rate.
///
/// Multi-channel files are downmixed to mono by averaging channels.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f64>, u32)> {
    let reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let raw_samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<std::result::Result<Vec<f64>, hound::Error>>()?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<f64>, hound::Error>>()?,
    };

    let mono = if channels == 1 {
        raw_samples
    } else {
        raw_samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / channels as f64)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

/// Writes one or more equally long channels to a 16-bit PCM WAV file.
///
/// Channels are interleaved frame by frame. Samples are clamped to [-1, 1]
/// before quantization.
pub fn write_wav<P, C>(path: P, channels: &[C], sample_rate: u32) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[f64]>,
{
    let num_channels = u16::try_from(channels.len())
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| {
            RirError::invalid(
                "channels",
                format!("expected 1 to {} channels, got {}", u16::MAX, channels.len()),
            )
        })?;
    let len = channels[0].as_ref().len();
    if let Some(bad) = channels.iter().find(|c| c.as_ref().len() != len) {
        return Err(RirError::invalid(
            "channels",
            format!(
                "all channels must have the same length ({len}), found one with {}",
                bad.as_ref().len()
            ),
        ));
    }

    let spec = hound::WavSpec {
        channels: num_channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;

    for i in 0..len {
        for channel in channels {
            let clamped = channel.as_ref()[i].clamp(-1.0, 1.0);
            writer.write_sample((clamped * i16::MAX as f64) as i16)?;
        }
    }

    writer.finalize()?;
    Ok(())
}
