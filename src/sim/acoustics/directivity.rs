use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::Vector;
use crate::error::{Result, RirError};

/// Look direction of a directional microphone, in radians.
///
/// Azimuth is measured in the horizontal plane from the x axis and is
/// normalized into `[0, 2π)`. Elevation is measured up from the horizontal
/// plane and must lie in `[-π/2, π/2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub azimuth: f64,
    pub elevation: f64,
}

impl Orientation {
    pub fn new(azimuth: f64, elevation: f64) -> Result<Self> {
        let orient = Self {
            azimuth: azimuth.rem_euclid(TAU),
            elevation,
        };
        orient.validate()?;
        Ok(orient)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.azimuth.is_finite() {
            return Err(RirError::invalid(
                "mic_azimuth",
                format!("must be finite, got {}", self.azimuth),
            ));
        }
        if !(-FRAC_PI_2..=FRAC_PI_2).contains(&self.elevation) {
            return Err(RirError::invalid(
                "mic_elevation",
                format!("must be in [-pi/2, pi/2], got {}", self.elevation),
            ));
        }
        Ok(())
    }

    /// Unit vector the microphone points at.
    pub fn look_direction(&self) -> Vector {
        Vector::from_spherical(self.azimuth.rem_euclid(TAU), self.elevation)
    }
}

/// First-order microphone polar patterns.
///
/// Every directional pattern has the form `a + (1 - a)·cos θ`, where θ is the
/// angle between the direction of arrival and the look direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MicDirectivity {
    #[default]
    Omnidirectional,
    Dipole(Orientation),
    Subcardioid(Orientation),
    Cardioid(Orientation),
    Hypercardioid(Orientation),
}

impl MicDirectivity {
    pub fn orientation(&self) -> Option<Orientation> {
        match self {
            Self::Omnidirectional => None,
            Self::Dipole(o) | Self::Subcardioid(o) | Self::Cardioid(o) | Self::Hypercardioid(o) => {
                Some(*o)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.orientation() {
            Some(o) => o.validate(),
            None => Ok(()),
        }
    }

    /// Omnidirectional share `a` of the pattern `a + (1 - a)·cos θ`.
    fn omni_weight(&self) -> f64 {
        match self {
            Self::Omnidirectional => 1.0,
            Self::Dipole(_) => 0.0,
            Self::Subcardioid(_) => 0.75,
            Self::Cardioid(_) => 0.5,
            Self::Hypercardioid(_) => 0.25,
        }
    }

    /// Pattern gain for a given `cos θ`. Dipole and hypercardioid can go negative.
    pub fn pattern_gain(&self, cos_theta: f64) -> f64 {
        let a = self.omni_weight();
        a + (1.0 - a) * cos_theta
    }

    /// Gain for sound arriving from `arrival`, the vector pointing from the
    /// microphone toward the (image) source.
    ///
    /// Returns 0 for a zero-length arrival vector with a directional pattern.
    pub fn gain(&self, arrival: Vector) -> f64 {
        let Some(orient) = self.orientation() else {
            return 1.0;
        };
        let Some(dir) = arrival.normalize() else {
            return 0.0;
        };
        let cos_theta = dir.dot(orient.look_direction()).clamp(-1.0, 1.0);
        self.pattern_gain(cos_theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn facing_x() -> Orientation {
        Orientation::new(0.0, 0.0).unwrap()
    }

    #[test]
    fn test_omnidirectional() {
        let omni = MicDirectivity::Omnidirectional;
        assert_eq!(omni.gain(Vector::new(1.0, 0.0, 0.0)), 1.0);
        assert_eq!(omni.gain(Vector::new(-1.0, 0.0, 0.0)), 1.0);
        assert_eq!(omni.gain(Vector::new(0.3, -2.0, 7.0)), 1.0);
        assert_eq!(omni.gain(Vector::new(0.0, 0.0, 0.0)), 1.0);
    }

    #[test]
    fn test_cardioid_forward() {
        let card = MicDirectivity::Cardioid(facing_x());
        // Forward direction: cos(0) = 1, gain = 0.5*(1+1) = 1.0
        let g = card.gain(Vector::new(1.0, 0.0, 0.0));
        assert!((g - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cardioid_backward() {
        let card = MicDirectivity::Cardioid(facing_x());
        // Backward direction: cos(pi) = -1, gain = 0.5*(1-1) = 0.0
        let g = card.gain(Vector::new(-1.0, 0.0, 0.0));
        assert!(g.abs() < 1e-10);
    }

    #[test]
    fn test_cardioid_perpendicular() {
        let card = MicDirectivity::Cardioid(facing_x());
        let g = card.gain(Vector::new(0.0, 1.0, 0.0));
        assert!((g - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_subcardioid() {
        let sub = MicDirectivity::Subcardioid(facing_x());
        // Forward: 0.75 + 0.25 = 1.0
        assert!((sub.gain(Vector::new(2.0, 0.0, 0.0)) - 1.0).abs() < 1e-10);
        // Backward: 0.75 - 0.25 = 0.5
        let g = sub.gain(Vector::new(-1.0, 0.0, 0.0));
        assert!((g - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_hypercardioid_backward_is_negative() {
        let hyper = MicDirectivity::Hypercardioid(facing_x());
        let g = hyper.gain(Vector::new(-1.0, 0.0, 0.0));
        assert!((g + 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_dipole_opposite_is_minus_one() {
        let orient = Orientation::new(PI / 3.0, 0.4).unwrap();
        let dipole = MicDirectivity::Dipole(orient);
        let g = dipole.gain(-orient.look_direction());
        assert!((g + 1.0).abs() < 1e-12);
        let g = dipole.gain(orient.look_direction() * 3.0);
        assert!((g - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_elevation_points_up() {
        let up = MicDirectivity::Dipole(Orientation::new(1.0, FRAC_PI_2).unwrap());
        assert!((up.gain(Vector::new(0.0, 0.0, 5.0)) - 1.0).abs() < 1e-12);
        assert!(up.gain(Vector::new(1.0, 0.0, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_azimuth_normalized() {
        let o = Orientation::new(-FRAC_PI_2, 0.0).unwrap();
        assert!((o.azimuth - 1.5 * PI).abs() < 1e-12);
        let o = Orientation::new(5.0 * PI, 0.0).unwrap();
        assert!((o.azimuth - PI).abs() < 1e-12);
        // Same look direction as the un-normalized angle
        let a = Orientation::new(2.0 * PI + 0.5, 0.1).unwrap().look_direction();
        let b = Orientation::new(0.5, 0.1).unwrap().look_direction();
        assert!((a.dot(b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_elevation() {
        assert!(Orientation::new(0.0, 1.6).is_err());
        assert!(Orientation::new(0.0, -1.6).is_err());
        assert!(Orientation::new(f64::NAN, 0.0).is_err());
        let bad = MicDirectivity::Cardioid(Orientation {
            azimuth: 0.0,
            elevation: 2.0,
        });
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_serde_tagged() {
        let d: MicDirectivity =
            serde_json::from_str(r#"{"type":"cardioid","azimuth":1.0,"elevation":0.5}"#).unwrap();
        assert_eq!(d.orientation().unwrap().elevation, 0.5);
        let d: MicDirectivity = serde_json::from_str(r#"{"type":"omnidirectional"}"#).unwrap();
        assert_eq!(d, MicDirectivity::Omnidirectional);
    }
}
