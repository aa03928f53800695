use std::f64::consts::PI;

/// Cut-off of the DC-removal high-pass filter.
pub const DC_REMOVAL_CUTOFF_HZ: f64 = 100.0;

/// Second-order (biquad) filter coefficients in Direct Form I.
///
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Filter gain at DC, `H(1)`.
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }
}

/// Biquad filter state for Direct Form I processing.
#[derive(Debug, Clone, Default)]
pub struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a single sample through the filter.
    pub fn process(&mut self, sample: f64, coeffs: &BiquadCoeffs) -> f64 {
        let output =
            coeffs.b0 * sample + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
                - coeffs.a1 * self.y1
                - coeffs.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = sample;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}

/// Designs the two-pole DC-removal high-pass filter.
///
/// With `W = 2π·fc/fs` and `R = e^-W`:
///
/// ```text
/// H(z) = (1 - (1+R) z^-1 + R z^-2) / (1 - 2R cos(W) z^-1 + R^2 z^-2)
/// ```
///
/// The numerator factors as `(1 - z^-1)(1 - R z^-1)`, so the gain at DC is zero.
pub fn design_dc_removal(cutoff_hz: f64, sample_rate: f64) -> BiquadCoeffs {
    let w = 2.0 * PI * cutoff_hz / sample_rate;
    let r = (-w).exp();
    BiquadCoeffs {
        b0: 1.0,
        b1: -(1.0 + r),
        b2: r,
        a1: -2.0 * r * w.cos(),
        a2: r * r,
    }
}

/// Runs a biquad over `signal` in place, left to right, from zero state.
pub fn filter_in_place(signal: &mut [f64], coeffs: &BiquadCoeffs) {
    let mut state = BiquadState::new();
    for s in signal.iter_mut() {
        *s = state.process(*s, coeffs);
    }
}

/// Removes the low-frequency drift of a synthesized impulse response.
pub fn remove_dc(signal: &mut [f64], sample_rate: f64) {
    let coeffs = design_dc_removal(DC_REMOVAL_CUTOFF_HZ, sample_rate);
    filter_in_place(signal, &coeffs);
}
