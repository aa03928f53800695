//! Auralization: turn synthesized impulse responses into audio.
//!
//! Provides WAV export of impulse responses and convolution with dry audio.

pub mod convolve;
pub mod wav;

use std::path::Path;

use log::info;

use crate::error::{Result, RirError};

use super::impulse_response::{ImpulseResponse, normalize_peak};
use convolve::convolve;
use wav::{read_wav, wav_sample_rate, write_wav};

/// Exports an impulse response as a mono 16-bit WAV file.
///
/// Raw responses are small (the direct path is about `1/(4π·d)`), pass
/// `normalize` to scale the peak to full range.
pub fn write_ir_wav<P: AsRef<Path>>(path: P, ir: &ImpulseResponse, normalize: bool) -> Result<()> {
    let samples = if normalize {
        ir.normalized()
    } else {
        ir.samples().to_vec()
    };
    write_wav(path, &[samples], wav_sample_rate(ir.sample_rate())?)
}

/// Convolves a dry recording with an impulse response and writes the
/// peak-normalized result.
///
/// The dry file must use the impulse response's sample rate.
pub fn auralize<P: AsRef<Path>, Q: AsRef<Path>>(
    ir: &ImpulseResponse,
    dry_audio_path: P,
    output_path: Q,
) -> Result<()> {
    let sample_rate = wav_sample_rate(ir.sample_rate())?;
    let (dry_samples, dry_rate) = read_wav(dry_audio_path.as_ref())?;
    if dry_rate != sample_rate {
        return Err(RirError::invalid(
            "sample_rate",
            format!("dry audio is {dry_rate} Hz but the impulse response is {sample_rate} Hz"),
        ));
    }

    let mut wet = convolve(&dry_samples, ir.samples());
    normalize_peak(std::slice::from_mut(&mut wet));
    info!(
        "Auralized {} -> {} ({} samples)",
        dry_audio_path.as_ref().display(),
        output_path.as_ref().display(),
        wet.len()
    );
    write_wav(output_path, &[wet], sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike_ir(sample_rate: f64) -> ImpulseResponse {
        let mut samples = vec![0.0; 100];
        samples[0] = 0.08;
        samples[10] = -0.04;
        ImpulseResponse::new(sample_rate, samples)
    }

    #[test]
    fn test_write_ir_wav() {
        let dir = tempfile::tempdir().unwrap();
        let raw_path = dir.path().join("raw.wav");
        let norm_path = dir.path().join("norm.wav");
        let ir = spike_ir(16000.0);

        write_ir_wav(&raw_path, &ir, false).unwrap();
        write_ir_wav(&norm_path, &ir, true).unwrap();

        let (raw, sr) = wav::read_wav(&raw_path).unwrap();
        assert_eq!(sr, 16000);
        assert_eq!(raw.len(), 100);
        assert!((raw[0] - 0.08).abs() < 1e-4);

        let (norm, _) = wav::read_wav(&norm_path).unwrap();
        assert!((norm[0] - 1.0).abs() < 1e-4);
        assert!((norm[10] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_auralize() {
        let dir = tempfile::tempdir().unwrap();
        let dry_path = dir.path().join("dry.wav");
        let out_path = dir.path().join("wet.wav");

        // Click
        let dry: Vec<f64> = (0..1600).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect();
        wav::write_wav(&dry_path, &[&dry], 16000).unwrap();

        auralize(&spike_ir(16000.0), &dry_path, &out_path).unwrap();

        let (wet, sr) = wav::read_wav(&out_path).unwrap();
        assert_eq!(sr, 16000);
        assert_eq!(wet.len(), 1600 + 100 - 1);
        // A click reproduces the normalized impulse response
        assert!((wet[0] - 1.0).abs() < 1e-3);
        assert!((wet[10] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_auralize_sample_rate_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let dry_path = dir.path().join("dry.wav");
        let out_path = dir.path().join("wet.wav");
        wav::write_wav(&dry_path, &[[0.5; 10]], 44100).unwrap();

        let err = auralize(&spike_ir(16000.0), &dry_path, &out_path).unwrap_err();
        assert!(matches!(err, RirError::InvalidParameter { name: "sample_rate", .. }));
        assert!(!out_path.exists());
    }
}
