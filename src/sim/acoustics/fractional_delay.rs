use std::f64::consts::PI;

/// Half-width of the interpolation kernel in seconds (the kernel spans 8 ms).
pub const KERNEL_HALF_WIDTH_SECONDS: f64 = 0.004;

/// Normalized sinc: `sin(πx) / (πx)`, with `sinc(0) = 1`.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

/// Hann-windowed sinc used to place a pulse at a non-integer sample delay.
///
/// The kernel is full-band (cut-off at Nyquist) and has `half_width` samples
/// of support on each side of the delay. The Hann window reaches zero at
/// `|t| = half_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalDelay {
    half_width: usize,
}

impl FractionalDelay {
    pub fn new(half_width: usize) -> Self {
        Self {
            half_width: half_width.max(1),
        }
    }

    /// Kernel sized for `KERNEL_HALF_WIDTH_SECONDS` at the given sample rate.
    pub fn for_sample_rate(sample_rate: f64) -> Self {
        Self::new((KERNEL_HALF_WIDTH_SECONDS * sample_rate).round() as usize)
    }

    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Kernel value at offset `t = n - delay` (in samples).
    pub fn tap(&self, t: f64) -> f64 {
        let hw = self.half_width as f64;
        if t.abs() >= hw {
            return 0.0;
        }
        let window = 0.5 * (1.0 + (PI * t / hw).cos());
        window * sinc(t)
    }

    /// Adds `gain` times the kernel centred at `delay` into `buffer`.
    ///
    /// Touches samples `floor(delay) - half_width + 1 ..= floor(delay) + half_width`,
    /// clipped to the buffer.
    pub fn accumulate(&self, buffer: &mut [f64], delay: f64, gain: f64) {
        if buffer.is_empty() || !delay.is_finite() || !gain.is_finite() {
            return;
        }
        let hw = self.half_width as i64;
        let base = delay.floor() as i64;
        let first = (base - hw + 1).max(0);
        let last = (base + hw).min(buffer.len() as i64 - 1);
        if first > last {
            return;
        }
        for n in first..=last {
            buffer[n as usize] += gain * self.tap(n as f64 - delay);
        }
    }
}
