use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::{Result, RirError, ensure_positive};
use crate::name::HasName;

/// Number of wall faces of a rectangular room.
pub const NUM_WALLS: usize = 6;

/// Interior dimensions of a rectangular room (meters).
///
/// The room spans `[0, x] × [0, y] × [0, z]`. Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct RoomGeometry {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RoomGeometry {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dimensions as an array, in x, y, z order.
    pub fn dims(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("room_size.x", self.x)?;
        ensure_positive("room_size.y", self.y)?;
        ensure_positive("room_size.z", self.z)?;
        Ok(())
    }

    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Total area of the six walls.
    pub fn surface_area(&self) -> f64 {
        2.0 * (self.x * self.y + self.x * self.z + self.y * self.z)
    }

    /// Whether the point lies inside the room or on its boundary.
    pub fn contains(&self, pt: &Point) -> bool {
        pt.is_finite()
            && (0.0..=self.x).contains(&pt.x)
            && (0.0..=self.y).contains(&pt.y)
            && (0.0..=self.z).contains(&pt.z)
    }
}

impl From<[f64; 3]> for RoomGeometry {
    fn from(d: [f64; 3]) -> Self {
        Self::new(d[0], d[1], d[2])
    }
}

impl From<RoomGeometry> for [f64; 3] {
    fn from(g: RoomGeometry) -> Self {
        g.dims()
    }
}

/// Frequency-independent reflection coefficients of the six walls.
///
/// Order: `(βx1, βx2, βy1, βy2, βz1, βz2)` where `x1` is the wall at `x = 0`
/// and `x2` the wall at `x = Lx` (same for y and z). Each value is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct WallReflection([f64; NUM_WALLS]);

impl WallReflection {
    pub fn new(beta: [f64; NUM_WALLS]) -> Result<Self> {
        let refl = Self(beta);
        refl.validate()?;
        Ok(refl)
    }

    /// Same coefficient on all six walls.
    pub fn uniform(beta: f64) -> Result<Self> {
        Self::new([beta; NUM_WALLS])
    }

    pub fn validate(&self) -> Result<()> {
        for (i, &b) in self.0.iter().enumerate() {
            if !(0.0..=1.0).contains(&b) {
                return Err(RirError::invalid(
                    "beta",
                    format!("coefficient {i} must be in [0, 1], got {b}"),
                ));
            }
        }
        Ok(())
    }

    pub fn as_array(&self) -> &[f64; NUM_WALLS] {
        &self.0
    }

    /// Wall gain `Π βᵢ^countᵢ` for the given per-face reflection counts.
    pub fn gain(&self, counts: &[u32; NUM_WALLS]) -> f64 {
        self.0
            .iter()
            .zip(counts.iter())
            .map(|(&b, &n)| b.powi(n as i32))
            .product()
    }
}

impl TryFrom<&[f64]> for WallReflection {
    type Error = RirError;

    fn try_from(values: &[f64]) -> Result<Self> {
        let beta: [f64; NUM_WALLS] = values.try_into().map_err(|_| {
            RirError::invalid(
                "beta",
                format!("expected {NUM_WALLS} coefficients, got {}", values.len()),
            )
        })?;
        Self::new(beta)
    }
}

impl TryFrom<Vec<f64>> for WallReflection {
    type Error = RirError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::try_from(values.as_slice())
    }
}

impl From<WallReflection> for Vec<f64> {
    fn from(w: WallReflection) -> Self {
        w.0.to_vec()
    }
}

/// How far the image-source enumeration goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectionOrder {
    /// Keep images whose total reflection count is at most this value.
    Bounded(u32),
    /// Keep every image whose echo arrives within the requested window.
    #[default]
    Unbounded,
}

impl ReflectionOrder {
    /// Whether an image with `order` wall reflections is kept.
    pub fn admits(&self, order: u32) -> bool {
        match self {
            Self::Bounded(max) => order <= *max,
            Self::Unbounded => true,
        }
    }
}

/// Converts the `-1 = unbounded` integer convention.
impl TryFrom<i64> for ReflectionOrder {
    type Error = RirError;

    fn try_from(order: i64) -> Result<Self> {
        match order {
            -1 => Ok(Self::Unbounded),
            o if o >= 0 => u32::try_from(o)
                .map(Self::Bounded)
                .map_err(|_| RirError::invalid("order", format!("{o} is too large"))),
            o => Err(RirError::invalid(
                "order",
                format!("must be >= 0 or -1 (unbounded), got {o}"),
            )),
        }
    }
}

/// Acoustic description of the walls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Walls {
    /// Explicit reflection coefficients.
    Beta(WallReflection),
    /// Target reverberation time in seconds, converted with Sabine's formula.
    Rt60(f64),
}

/// A rectangular room.
#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub name: String,
    pub geometry: RoomGeometry,
    pub walls: Walls,
    pub order: ReflectionOrder,
}

impl Room {
    pub fn new(
        name: impl Into<String>,
        geometry: RoomGeometry,
        walls: Walls,
        order: ReflectionOrder,
    ) -> Result<Self> {
        geometry.validate()?;
        match walls {
            Walls::Beta(beta) => beta.validate()?,
            Walls::Rt60(rt60) => {
                if !rt60.is_finite() || rt60 < 0.0 {
                    return Err(RirError::invalid(
                        "rt60",
                        format!("must be finite and >= 0, got {rt60}"),
                    ));
                }
            }
        }
        Ok(Self {
            name: name.into(),
            geometry,
            walls,
            order,
        })
    }

    pub fn contains(&self, pt: &Point) -> bool {
        self.geometry.contains(pt)
    }

    /// Resolves the wall reflection coefficients.
    ///
    /// For RT60 rooms, Sabine's formula gives the average absorption
    /// `α = 24·ln(10)·V / (c·S·RT60)` and every wall gets `β = sqrt(1 - α)`.
    pub fn reflection(&self, sound_speed: f64) -> Result<WallReflection> {
        match self.walls {
            Walls::Beta(beta) => Ok(beta),
            Walls::Rt60(rt60) => rt60_to_reflection(&self.geometry, rt60, sound_speed),
        }
    }
}

impl HasName for Room {
    fn get_name(&self) -> &str {
        &self.name
    }
}

/// Sabine conversion from reverberation time to uniform wall reflection.
///
/// `rt60 = 0` means an anechoic room (all coefficients zero).
pub fn rt60_to_reflection(
    geometry: &RoomGeometry,
    rt60: f64,
    sound_speed: f64,
) -> Result<WallReflection> {
    geometry.validate()?;
    ensure_positive("sound_speed", sound_speed)?;
    if !rt60.is_finite() || rt60 < 0.0 {
        return Err(RirError::invalid(
            "rt60",
            format!("must be finite and >= 0, got {rt60}"),
        ));
    }
    if rt60 == 0.0 {
        return WallReflection::uniform(0.0);
    }

    let alpha = 24.0 * std::f64::consts::LN_10 * geometry.volume()
        / (sound_speed * geometry.surface_area() * rt60);
    if alpha > 1.0 {
        return Err(RirError::invalid(
            "rt60",
            format!(
                "{rt60} s is too short for a {:.1} m^3 room (needs absorption {alpha:.3} > 1)",
                geometry.volume()
            ),
        ));
    }
    WallReflection::uniform((1.0 - alpha).sqrt())
}
