use crate::error::{Result, RirError};
use crate::name::HasName;
use crate::sim::acoustics::directivity::MicDirectivity;
use crate::sim::speaker::Speaker;
use crate::{Point, Vector};

/// A point receiver with a polar pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Microphone {
    pub name: String,
    pub position: Point,
    pub directivity: MicDirectivity,
}

impl Microphone {
    pub fn new(
        name: impl Into<String>,
        position: Point,
        directivity: MicDirectivity,
    ) -> Result<Self> {
        if !position.is_finite() {
            return Err(RirError::invalid(
                "microphone.position",
                format!("must be finite, got {position}"),
            ));
        }
        directivity.validate()?;
        Ok(Self {
            name: name.into(),
            position,
            directivity,
        })
    }

    /// Omnidirectional microphone.
    pub fn omni(name: impl Into<String>, position: Point) -> Result<Self> {
        Self::new(name, position, MicDirectivity::Omnidirectional)
    }

    /// Places a speaker `radius` meters away from the microphone.
    ///
    /// Angles are in degrees, seen from the microphone: azimuth in the
    /// horizontal plane from the x axis, elevation up from that plane.
    pub fn generate_speaker(
        &self,
        radius: f64,
        azimuth_deg: f64,
        elevation_deg: f64,
        name: impl Into<String>,
    ) -> Result<Speaker> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(RirError::invalid(
                "radius",
                format!("must be finite and >= 0, got {radius}"),
            ));
        }
        let dir = Vector::from_spherical(azimuth_deg.to_radians(), elevation_deg.to_radians());
        Speaker::new(name, self.position + dir * radius)
    }
}

impl HasName for Microphone {
    fn get_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::acoustics::directivity::Orientation;

    #[test]
    fn test_generate_speaker() {
        let mic = Microphone::omni("Mic", Point::new(2.0, 2.0, 1.5)).unwrap();

        let spk = mic.generate_speaker(1.0, 90.0, 0.0, "Front").unwrap();
        assert_eq!(spk.name, "Front");
        assert!((spk.position.x - 2.0).abs() < 1e-12);
        assert!((spk.position.y - 3.0).abs() < 1e-12);
        assert!((spk.position.z - 1.5).abs() < 1e-12);

        let above = mic.generate_speaker(0.5, 0.0, 90.0, "Above").unwrap();
        assert!((above.position.z - 2.0).abs() < 1e-12);
        assert!((mic.position.distance_to(&above.position) - 0.5).abs() < 1e-12);

        assert!(mic.generate_speaker(-1.0, 0.0, 0.0, "Bad").is_err());
    }

    #[test]
    fn test_microphone_validation() {
        assert!(Microphone::omni("M", Point::new(f64::NAN, 0.0, 0.0)).is_err());
        let bad = MicDirectivity::Cardioid(Orientation {
            azimuth: 0.0,
            elevation: -3.0,
        });
        assert!(Microphone::new("M", Point::new(1.0, 1.0, 1.0), bad).is_err());
    }
}
