use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Below this length (signal or kernel) direct convolution is used.
const DIRECT_MAX_LEN: usize = 64;

/// FFT overlap-add convolution with a fixed kernel.
///
/// The kernel spectrum is computed once, so one convolver can be applied to
/// many signals (e.g. one impulse response and several dry recordings).
pub struct FftConvolver {
    kernel_len: usize,
    block_size: usize,
    kernel_fft: Vec<Complex<f64>>,
    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,
}

impl FftConvolver {
    /// Plans the transforms for `kernel`. Returns None for an empty kernel.
    pub fn new(kernel: &[f64]) -> Option<Self> {
        if kernel.is_empty() {
            return None;
        }
        // Block size: next power of 2 >= 2 * kernel.len()
        let fft_size = (2 * kernel.len()).next_power_of_two();
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);

        let mut kernel_fft = zero_padded(kernel, fft_size);
        fft.process(&mut kernel_fft);

        Some(Self {
            kernel_len: kernel.len(),
            block_size: fft_size - kernel.len() + 1,
            kernel_fft,
            fft,
            ifft,
        })
    }

    fn fft_size(&self) -> usize {
        self.kernel_fft.len()
    }

    /// Convolves `signal` with the kernel.
    ///
    /// Returns a vector of length `signal.len() + kernel.len() - 1`
    /// (empty for an empty signal).
    pub fn apply(&self, signal: &[f64]) -> Vec<f64> {
        if signal.is_empty() {
            return Vec::new();
        }
        let output_len = signal.len() + self.kernel_len - 1;
        let scale = 1.0 / self.fft_size() as f64;
        let mut output = vec![0.0; output_len];

        for (block_idx, chunk) in signal.chunks(self.block_size).enumerate() {
            let pos = block_idx * self.block_size;
            let mut block = zero_padded(chunk, self.fft_size());
            self.fft.process(&mut block);
            for (b, k) in block.iter_mut().zip(self.kernel_fft.iter()) {
                *b *= k;
            }
            self.ifft.process(&mut block);

            // Overlap-add
            let valid_len = (chunk.len() + self.kernel_len - 1).min(output_len - pos);
            for (out, b) in output[pos..pos + valid_len].iter_mut().zip(&block) {
                *out += b.re * scale;
            }
        }

        output
    }
}

fn zero_padded(values: &[f64], len: usize) -> Vec<Complex<f64>> {
    values
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat_n(
            Complex::new(0.0, 0.0),
            len - values.len(),
        ))
        .collect()
}

/// Linear convolution of `signal` with `kernel`.
///
/// Returns a vector of length `signal.len() + kernel.len() - 1`, or an empty
/// vector if either input is empty. Short inputs are convolved directly,
/// longer ones through `FftConvolver`.
pub fn convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    if signal.len() <= DIRECT_MAX_LEN || kernel.len() <= DIRECT_MAX_LEN {
        return convolve_direct(signal, kernel);
    }
    match FftConvolver::new(kernel) {
        Some(conv) => conv.apply(signal),
        None => Vec::new(),
    }
}

/// Direct convolution for short signals.
fn convolve_direct(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let output_len = signal.len() + kernel.len() - 1;
    let mut output = vec![0.0; output_len];
    for (i, &s) in signal.iter().enumerate() {
        for (out, &k) in output[i..].iter_mut().zip(kernel) {
            *out += s * k;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() < tol, "Mismatch at {i}: {x} vs {y}");
        }
    }

    #[test]
    fn test_convolve_unit_impulse() {
        let signal = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = convolve(&signal, &[1.0]);
        assert_close(&result, &signal, 1e-12);
    }

    #[test]
    fn test_convolve_known_result() {
        let result = convolve(&[1.0, 2.0, 3.0], &[1.0, 1.0]);
        assert_close(&result, &[1.0, 3.0, 5.0, 3.0], 1e-12);

        // Delay by one sample
        let result = convolve(&[1.0, 2.0, 3.0], &[0.0, 1.0]);
        assert_close(&result, &[0.0, 1.0, 2.0, 3.0], 1e-12);
    }

    #[test]
    fn test_convolve_empty() {
        assert!(convolve(&[], &[1.0]).is_empty());
        assert!(convolve(&[1.0], &[]).is_empty());
        assert!(FftConvolver::new(&[]).is_none());
    }

    #[test]
    fn test_fft_matches_direct() {
        let signal: Vec<f64> = (0..1500).map(|i| (i as f64 * 0.05).sin()).collect();
        let kernel: Vec<f64> = (0..300).map(|i| (-0.01 * i as f64).exp()).collect();

        let fft_result = convolve(&signal, &kernel);
        let direct_result = convolve_direct(&signal, &kernel);
        assert_close(&fft_result, &direct_result, 1e-8);
    }

    #[test]
    fn test_convolver_is_reusable() {
        let kernel: Vec<f64> = (0..128).map(|i| if i == 100 { 0.5 } else { 0.0 }).collect();
        let conv = FftConvolver::new(&kernel).unwrap();

        for len in [10, 257, 1000] {
            let signal: Vec<f64> = (0..len).map(|i| (i as f64 * 0.3).cos()).collect();
            let out = conv.apply(&signal);
            assert_eq!(out.len(), len + 127);
            // Pure delay of 100 samples with gain 0.5
            for (i, &s) in signal.iter().enumerate() {
                assert!((out[i + 100] - 0.5 * s).abs() < 1e-10);
            }
            assert!(out[..100].iter().all(|v| v.abs() < 1e-10));
        }
        assert!(conv.apply(&[]).is_empty());
    }
}
