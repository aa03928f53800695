use std::f64::consts::PI;
use std::ops::Add;

use log::{debug, warn};
use rayon::prelude::*;

use crate::Point;
use crate::error::{Result, RirError, ensure_positive};
use crate::geom::EPS;
use crate::sim::acoustics::directivity::MicDirectivity;
use crate::sim::acoustics::filters::remove_dc;
use crate::sim::acoustics::fractional_delay::FractionalDelay;
use crate::sim::acoustics::image_source::{ImageLattice, ImageSource};
use crate::sim::acoustics::impulse_response::ImpulseResponse;
use crate::sim::room::{ReflectionOrder, RoomGeometry, WallReflection};

/// Default speed of sound in m/s.
pub const DEFAULT_SOUND_SPEED: f64 = 340.0;

/// Upper bound on the partial buffers `synthesize_parallel` keeps alive.
///
/// Fixed rather than tied to the thread count so the summation order, and
/// therefore the output, is the same on every machine.
pub const MAX_PARTIAL_BUFFERS: usize = 16;

/// Everything needed to synthesize one impulse response.
///
/// Fields are public, `new()` fills in an omnidirectional receiver,
/// unbounded reflection order, no high-pass and `DEFAULT_SOUND_SPEED`.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub sound_speed: f64,
    pub sample_rate: f64,
    pub room: RoomGeometry,
    pub receiver: Point,
    pub source: Point,
    pub beta: WallReflection,
    pub directivity: MicDirectivity,
    pub n_samples: usize,
    pub high_pass: bool,
    pub order: ReflectionOrder,
}

impl SynthesisRequest {
    pub fn new(
        room: RoomGeometry,
        source: Point,
        receiver: Point,
        beta: WallReflection,
        sample_rate: f64,
        n_samples: usize,
    ) -> Self {
        Self {
            sound_speed: DEFAULT_SOUND_SPEED,
            sample_rate,
            room,
            receiver,
            source,
            beta,
            directivity: MicDirectivity::Omnidirectional,
            n_samples,
            high_pass: false,
            order: ReflectionOrder::Unbounded,
        }
    }

    /// Rejects inputs the engine cannot work with.
    ///
    /// Positions are only checked for finiteness. Keeping them inside the
    /// room is the caller's job (see `Scene::new`).
    pub fn validate(&self) -> Result<()> {
        ensure_positive("sound_speed", self.sound_speed)?;
        ensure_positive("sample_rate", self.sample_rate)?;
        self.room.validate()?;
        if self.n_samples == 0 {
            return Err(RirError::invalid("n_samples", "must be > 0"));
        }
        self.beta.validate()?;
        self.directivity.validate()?;
        if !self.receiver.is_finite() {
            return Err(RirError::invalid(
                "receiver",
                format!("position must be finite, got {}", self.receiver),
            ));
        }
        if !self.source.is_finite() {
            return Err(RirError::invalid(
                "source",
                format!("position must be finite, got {}", self.source),
            ));
        }
        Ok(())
    }

    /// Farthest an image can be and still arrive inside the buffer:
    /// `n_samples / sample_rate * sound_speed`.
    ///
    /// Also used as the truncation radius of unbounded enumeration. Raising
    /// `n_samples` is the way to include later echoes.
    pub fn max_distance(&self) -> f64 {
        self.n_samples as f64 / self.sample_rate * self.sound_speed
    }

    fn lattice(&self) -> ImageLattice {
        ImageLattice::new(
            self.room,
            self.source,
            self.receiver,
            self.order,
            self.max_distance(),
        )
    }

    /// Delay (in samples) and gain of one image, or why it was dropped.
    fn contribution(&self, img: &ImageSource) -> Contribution {
        if img.distance < EPS {
            return Contribution::Degenerate;
        }
        let delay = img.distance / self.sound_speed * self.sample_rate;
        if !(0.0..self.n_samples as f64).contains(&delay) {
            return Contribution::OutOfWindow;
        }

        let gain = self.directivity.gain(img.arrival) * self.beta.gain(&img.reflections)
            / (4.0 * PI * img.distance);
        if !gain.is_finite() {
            return Contribution::Degenerate;
        }
        if gain == 0.0 {
            return Contribution::Silent;
        }
        Contribution::Accepted { delay, gain }
    }

    fn accumulate<I>(&self, images: I, kernel: &FractionalDelay, buffer: &mut [f64]) -> ImageStats
    where
        I: Iterator<Item = ImageSource>,
    {
        let mut stats = ImageStats::default();
        for img in images {
            stats.visited += 1;
            match self.contribution(&img) {
                Contribution::Accepted { delay, gain } => {
                    kernel.accumulate(buffer, delay, gain);
                    stats.accepted += 1;
                }
                Contribution::OutOfWindow => stats.out_of_window += 1,
                Contribution::Silent => stats.silent += 1,
                Contribution::Degenerate => stats.degenerate += 1,
            }
        }
        stats
    }

    fn finish(&self, mut buffer: Vec<f64>, stats: ImageStats) -> ImpulseResponse {
        stats.log();
        if self.high_pass {
            remove_dc(&mut buffer, self.sample_rate);
        }
        ImpulseResponse::new(self.sample_rate, buffer)
    }
}

enum Contribution {
    Accepted { delay: f64, gain: f64 },
    OutOfWindow,
    Silent,
    Degenerate,
}

/// Counters for one synthesis call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ImageStats {
    visited: usize,
    accepted: usize,
    out_of_window: usize,
    silent: usize,
    degenerate: usize,
}

impl ImageStats {
    fn log(&self) {
        debug!(
            "Images: {} visited, {} accepted, {} outside the window, {} silent",
            self.visited, self.accepted, self.out_of_window, self.silent
        );
        if self.degenerate > 0 {
            warn!(
                "Skipped {} degenerate image(s) (receiver on an image or non-finite gain)",
                self.degenerate
            );
        }
    }
}

impl Add for ImageStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            visited: self.visited + other.visited,
            accepted: self.accepted + other.accepted,
            out_of_window: self.out_of_window + other.out_of_window,
            silent: self.silent + other.silent,
            degenerate: self.degenerate + other.degenerate,
        }
    }
}

/// Synthesizes the room impulse response on the calling thread.
pub fn synthesize(req: &SynthesisRequest) -> Result<ImpulseResponse> {
    req.validate()?;
    let lattice = req.lattice();
    let kernel = FractionalDelay::for_sample_rate(req.sample_rate);
    debug!(
        "Synthesizing {} samples, order {:?}, up to {} candidate images",
        req.n_samples,
        req.order,
        lattice.num_candidates()
    );

    let mut buffer = vec![0.0; req.n_samples];
    let stats = req.accumulate(lattice.iter(), &kernel, &mut buffer);
    Ok(req.finish(buffer, stats))
}

/// Number of consecutive x cells accumulated into one partial buffer.
///
/// Splitting `n_cells` into chunks of this length gives at most
/// `MAX_PARTIAL_BUFFERS` chunks.
fn partial_chunk_len(n_cells: usize) -> usize {
    n_cells.div_ceil(MAX_PARTIAL_BUFFERS).max(1)
}

/// Synthesizes the room impulse response using the rayon thread pool.
///
/// The x cells of the image lattice are split into at most
/// `MAX_PARTIAL_BUFFERS` contiguous chunks. Each chunk is accumulated into
/// its own buffer and the buffers are summed in cell order, so the output
/// does not depend on scheduling. It matches `synthesize` up to
/// floating-point summation order.
pub fn synthesize_parallel(req: &SynthesisRequest) -> Result<ImpulseResponse> {
    req.validate()?;
    let lattice = req.lattice();
    let kernel = FractionalDelay::for_sample_rate(req.sample_rate);
    let cells: Vec<i64> = lattice.x_cells().collect();
    let chunk_len = partial_chunk_len(cells.len());
    debug!(
        "Synthesizing {} samples over {} x cells in chunks of {}, order {:?}",
        req.n_samples,
        cells.len(),
        chunk_len,
        req.order
    );

    let partials: Vec<(Vec<f64>, ImageStats)> = cells
        .par_chunks(chunk_len)
        .map(|chunk| {
            let mut partial = vec![0.0; req.n_samples];
            let images = chunk.iter().flat_map(|&p| lattice.iter_x_cell(p));
            let stats = req.accumulate(images, &kernel, &mut partial);
            (partial, stats)
        })
        .collect();

    let mut buffer = vec![0.0; req.n_samples];
    let mut stats = ImageStats::default();
    for (partial, s) in partials {
        for (b, v) in buffer.iter_mut().zip(partial) {
            *b += v;
        }
        stats = stats + s;
    }
    Ok(req.finish(buffer, stats))
}
