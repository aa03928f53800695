use super::impulse_response::ImpulseResponse;

/// Half-length of the window around the direct-path peak counted as direct sound.
pub const DIRECT_WINDOW_SECONDS: f64 = 0.0025;

/// Reverberation time from Schroeder backward integration.
///
/// Fits a line to the decay curve between `start_db` and `end_db`,
/// then extrapolates to -60 dB.
fn rt_from_decay(decay: &[f64], time_resolution: f64, start_db: f64, end_db: f64) -> Option<f64> {
    let i_start = decay.iter().position(|&val| val <= start_db)?;
    let i_end = decay.iter().position(|&val| val <= end_db)?;

    if i_end <= i_start {
        return None;
    }

    // Linear regression on the decay curve between start and end
    let n = (i_end - i_start + 1) as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;

    for (i, &y) in decay.iter().enumerate().take(i_end + 1).skip(i_start) {
        if !y.is_finite() {
            return None;
        }
        let x = i as f64 * time_resolution;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);

    if !slope.is_finite() || slope >= 0.0 {
        return None; // Decay should have negative slope
    }

    // Extrapolate to -60 dB
    Some(-60.0 / slope)
}

fn decay_time(ir: &ImpulseResponse, start_db: f64, end_db: f64) -> Option<f64> {
    if ir.is_empty() {
        return None;
    }
    let decay = ir.schroeder_decay();
    rt_from_decay(&decay, 1.0 / ir.sample_rate(), start_db, end_db)
}

/// T20: Reverberation time estimated from -5 dB to -25 dB range.
pub fn t20(ir: &ImpulseResponse) -> Option<f64> {
    decay_time(ir, -5.0, -25.0)
}

/// T30: Reverberation time estimated from -5 dB to -35 dB range.
pub fn t30(ir: &ImpulseResponse) -> Option<f64> {
    decay_time(ir, -5.0, -35.0)
}

/// RT60: Reverberation time (uses T30 by default, falls back to T20).
pub fn rt60(ir: &ImpulseResponse) -> Option<f64> {
    t30(ir).or_else(|| t20(ir))
}

/// EDT: Early Decay Time, estimated from 0 dB to -10 dB range.
pub fn edt(ir: &ImpulseResponse) -> Option<f64> {
    decay_time(ir, 0.0, -10.0)
}

/// Sample index where the direct sound arrives (largest magnitude).
fn onset(ir: &ImpulseResponse) -> Option<usize> {
    ir.peak()
        .and_then(|(idx, value)| (value != 0.0).then_some(idx))
}

/// Energy before and after `split_seconds` past the direct sound.
fn split_energy(ir: &ImpulseResponse, split_seconds: f64) -> Option<(f64, f64)> {
    let start = onset(ir)?;
    let boundary = start + (split_seconds * ir.sample_rate()).round() as usize;
    if boundary >= ir.len() {
        return None;
    }
    let samples = ir.samples();
    let early: f64 = samples[start..boundary].iter().map(|s| s * s).sum();
    let late: f64 = samples[boundary..].iter().map(|s| s * s).sum();
    Some((early, late))
}

/// C80: Clarity (80 ms) in dB.
///
/// C80 = 10 * log10(E_early / E_late) where early = 0-80ms after the direct
/// sound, late = 80ms+.
pub fn c80(ir: &ImpulseResponse) -> Option<f64> {
    let (early, late) = split_energy(ir, 0.080)?;
    if late <= 0.0 {
        return None;
    }
    Some(10.0 * (early / late).log10())
}

/// D50: Definition (50 ms), ratio of early to total energy.
pub fn d50(ir: &ImpulseResponse) -> Option<f64> {
    let (early, late) = split_energy(ir, 0.050)?;
    let total = early + late;
    if total <= 0.0 {
        return None;
    }
    Some(early / total)
}

/// Direct-to-reverberant ratio in dB.
///
/// Direct energy is taken within `DIRECT_WINDOW_SECONDS` of the peak, the
/// reverberant energy is everything after that window.
pub fn direct_to_reverberant(ir: &ImpulseResponse) -> Option<f64> {
    let peak = onset(ir)?;
    let half = (DIRECT_WINDOW_SECONDS * ir.sample_rate()).round() as usize;
    let begin = peak.saturating_sub(half);
    let end = (peak + half + 1).min(ir.len());
    let samples = ir.samples();
    let direct: f64 = samples[begin..end].iter().map(|s| s * s).sum();
    let reverberant: f64 = samples[end..].iter().map(|s| s * s).sum();
    if reverberant <= 0.0 {
        return None;
    }
    Some(10.0 * (direct / reverberant).log10())
}

/// Room acoustic metrics of one impulse response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RirMetrics {
    /// RT60 (seconds). None if not computable.
    pub rt60: Option<f64>,
    /// EDT (seconds).
    pub edt: Option<f64>,
    /// C80 (dB).
    pub c80: Option<f64>,
    /// D50 (ratio 0-1).
    pub d50: Option<f64>,
    /// Direct-to-reverberant ratio (dB).
    pub drr: Option<f64>,
}

impl RirMetrics {
    /// Computes all metrics from an impulse response.
    pub fn from_ir(ir: &ImpulseResponse) -> Self {
        Self {
            rt60: rt60(ir),
            edt: edt(ir),
            c80: c80(ir),
            d50: d50(ir),
            drr: direct_to_reverberant(ir),
        }
    }
}
