/// A sampled room impulse response for one source/receiver pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    sample_rate: f64,
    samples: Vec<f64>,
}

impl ImpulseResponse {
    /// Creates an impulse response from raw samples.
    pub fn new(sample_rate: f64, samples: Vec<f64>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the impulse response is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    /// Returns the time axis in seconds.
    pub fn time_axis(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|i| i as f64 / self.sample_rate)
            .collect()
    }

    /// Sum of squared samples.
    pub fn energy(&self) -> f64 {
        self.samples.iter().map(|s| s * s).sum()
    }

    /// Arithmetic mean of the samples.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Index and value of the sample with the largest magnitude.
    pub fn peak(&self) -> Option<(usize, f64)> {
        self.samples
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
    }

    /// Samples scaled so that the largest magnitude is 1.
    ///
    /// An all-zero response is returned unchanged.
    pub fn normalized(&self) -> Vec<f64> {
        let mut samples = self.samples.clone();
        normalize_peak(std::slice::from_mut(&mut samples));
        samples
    }

    /// Schroeder backward integration of the squared response.
    ///
    /// Returns the energy decay curve in dB, normalized to 0 dB at time 0.
    pub fn schroeder_decay(&self) -> Vec<f64> {
        let energy: Vec<f64> = self.samples.iter().map(|s| s * s).collect();
        let total: f64 = energy.iter().sum();
        if total <= 0.0 {
            return vec![f64::NEG_INFINITY; energy.len()];
        }

        let mut decay = vec![0.0; energy.len()];
        let mut cumulative = total;
        for (d, &e) in decay.iter_mut().zip(energy.iter()) {
            *d = 10.0 * (cumulative.max(0.0) / total).log10();
            cumulative -= e;
        }

        decay
    }
}

/// Scales all channels in place by one factor so the overall peak magnitude
/// is 1. Inter-channel levels are kept and silence is left untouched.
pub fn normalize_peak<C: AsMut<[f64]>>(channels: &mut [C]) {
    let mut peak = 0.0_f64;
    for channel in channels.iter_mut() {
        peak = channel.as_mut().iter().fold(peak, |a, &b| a.max(b.abs()));
    }
    if peak > 0.0 {
        for channel in channels.iter_mut() {
            for s in channel.as_mut() {
                *s /= peak;
            }
        }
    }
}
