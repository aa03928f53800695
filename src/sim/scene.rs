use std::path::Path;

use log::info;
use rayon::prelude::*;

use crate::error::{Result, RirError, ensure_positive};
use crate::name::HasName;
use crate::sim::acoustics::auralization::convolve::FftConvolver;
use crate::sim::acoustics::auralization::wav::{wav_sample_rate, write_wav};
use crate::sim::acoustics::impulse_response::{ImpulseResponse, normalize_peak};
use crate::sim::acoustics::synthesis::{DEFAULT_SOUND_SPEED, SynthesisRequest, synthesize};
use crate::sim::microphone::Microphone;
use crate::sim::room::{Room, WallReflection};
use crate::sim::speaker::Speaker;

/// Sampling and propagation settings shared by every pair of a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub sample_rate: f64,
    pub sound_speed: f64,
}

impl Field {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            sound_speed: DEFAULT_SOUND_SPEED,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("sample_rate", self.sample_rate)?;
        ensure_positive("sound_speed", self.sound_speed)
    }
}

/// A room with microphones and speakers placed inside it.
#[derive(Debug, Clone)]
pub struct Scene {
    room: Room,
    microphones: Vec<Microphone>,
    speakers: Vec<Speaker>,
}

impl Scene {
    /// Checks that both lists are non-empty and every position lies in the room.
    pub fn new(room: Room, microphones: Vec<Microphone>, speakers: Vec<Speaker>) -> Result<Self> {
        if microphones.is_empty() || speakers.is_empty() {
            return Err(RirError::EmptyScene);
        }
        for mic in &microphones {
            if !room.contains(&mic.position) {
                return Err(RirError::PositionOutsideRoom {
                    entity: "microphone",
                    name: mic.name.clone(),
                    position: mic.position.to_string(),
                });
            }
        }
        for spk in &speakers {
            if !room.contains(&spk.position) {
                return Err(RirError::PositionOutsideRoom {
                    entity: "speaker",
                    name: spk.name.clone(),
                    position: spk.position.to_string(),
                });
            }
        }
        Ok(Self {
            room,
            microphones,
            speakers,
        })
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn microphones(&self) -> &[Microphone] {
        &self.microphones
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    /// Synthesis request for one microphone/speaker pair.
    pub fn request(
        &self,
        field: &Field,
        beta: WallReflection,
        mic: &Microphone,
        speaker: &Speaker,
        n_samples: usize,
        high_pass: bool,
    ) -> SynthesisRequest {
        SynthesisRequest {
            sound_speed: field.sound_speed,
            sample_rate: field.sample_rate,
            room: self.room.geometry,
            receiver: mic.position,
            source: speaker.position,
            beta,
            directivity: mic.directivity,
            n_samples,
            high_pass,
            order: self.room.order,
        }
    }

    /// Computes the impulse response of every microphone/speaker pair.
    ///
    /// Pairs are synthesized in parallel and collected in scene order.
    pub fn compute(&self, field: &Field, n_samples: usize, high_pass: bool) -> Result<RirSet> {
        field.validate()?;
        let beta = self.room.reflection(field.sound_speed)?;
        info!(
            "Computing {} x {} impulse responses in '{}' ({} samples at {} Hz)",
            self.speakers.len(),
            self.microphones.len(),
            self.room.get_name(),
            n_samples,
            field.sample_rate
        );

        let requests: Vec<SynthesisRequest> = self
            .speakers
            .iter()
            .flat_map(|spk| {
                self.microphones
                    .iter()
                    .map(move |mic| (mic, spk))
            })
            .map(|(mic, spk)| self.request(field, beta, mic, spk, n_samples, high_pass))
            .collect();

        let flat: Vec<ImpulseResponse> = requests
            .par_iter()
            .map(synthesize)
            .collect::<Result<Vec<_>>>()?;

        let mut it = flat.into_iter();
        let responses: Vec<Vec<ImpulseResponse>> = self
            .speakers
            .iter()
            .map(|_| it.by_ref().take(self.microphones.len()).collect())
            .collect();

        Ok(RirSet {
            sample_rate: field.sample_rate,
            microphones: self.microphones.iter().map(|m| m.name.clone()).collect(),
            speakers: self.speakers.iter().map(|s| s.name.clone()).collect(),
            responses,
        })
    }
}

/// Impulse responses of a scene: one channel per microphone for every speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct RirSet {
    sample_rate: f64,
    microphones: Vec<String>,
    speakers: Vec<String>,
    /// responses[speaker][microphone]
    responses: Vec<Vec<ImpulseResponse>>,
}

impl RirSet {
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn microphone_names(&self) -> &[String] {
        &self.microphones
    }

    pub fn speaker_names(&self) -> &[String] {
        &self.speakers
    }

    pub fn speaker_index(&self, name: &str) -> Option<usize> {
        self.speakers.iter().position(|s| s == name)
    }

    /// Impulse response from `speaker` to `mic` (indices in scene order).
    pub fn get(&self, speaker: usize, mic: usize) -> Option<&ImpulseResponse> {
        self.responses.get(speaker).and_then(|chans| chans.get(mic))
    }

    /// All microphone channels of one speaker.
    pub fn channels(&self, speaker: usize) -> Result<&[ImpulseResponse]> {
        self.responses
            .get(speaker)
            .map(Vec::as_slice)
            .ok_or_else(|| RirError::IndexOutOfRange {
                entity: "speaker",
                index: speaker,
                len: self.speakers.len(),
            })
    }

    /// Convolves a dry signal played by `speaker` with each microphone channel.
    ///
    /// Every output channel has `signal.len() + n_samples - 1` samples.
    pub fn convolve(&self, speaker: usize, signal: &[f64]) -> Result<Vec<Vec<f64>>> {
        let channels = self.channels(speaker)?;
        Ok(channels
            .par_iter()
            .map(|ir| {
                FftConvolver::new(ir.samples())
                    .map_or_else(Vec::new, |conv| conv.apply(signal))
            })
            .collect())
    }

    /// Writes the channels of one speaker as a multi-channel WAV file.
    ///
    /// With `normalize`, all channels are scaled by the same factor so the
    /// loudest sample is at full range and inter-channel levels are kept.
    pub fn write_wav<P: AsRef<Path>>(&self, speaker: usize, path: P, normalize: bool) -> Result<()> {
        let mut channels: Vec<Vec<f64>> = self
            .channels(speaker)?
            .iter()
            .map(|ir| ir.samples().to_vec())
            .collect();
        if normalize {
            normalize_peak(&mut channels);
        }
        write_wav(path, &channels, wav_sample_rate(self.sample_rate)?)
    }
}
