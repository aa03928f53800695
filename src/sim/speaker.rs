use std::fmt;

use crate::Point;
use crate::error::{Result, RirError};
use crate::name::HasName;

/// An omnidirectional point sound source.
#[derive(Debug, Clone, PartialEq)]
pub struct Speaker {
    pub name: String,
    pub position: Point,
}

impl Speaker {
    pub fn new(name: impl Into<String>, position: Point) -> Result<Self> {
        if !position.is_finite() {
            return Err(RirError::invalid(
                "speaker.position",
                format!("must be finite, got {position}"),
            ));
        }
        Ok(Self {
            name: name.into(),
            position,
        })
    }
}

impl HasName for Speaker {
    fn get_name(&self) -> &str {
        &self.name
    }
}

/// `Name_x_1.0_y_2.0_z_1.5`, usable as a file stem.
impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_x_{:.1}_y_{:.1}_z_{:.1}",
            self.name, self.position.x, self.position.y, self.position.z
        )
    }
}
