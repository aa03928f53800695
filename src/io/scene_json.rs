//! JSON scene files.
//!
//! A scene file holds the sampling settings, the room, and the microphones
//! and speakers placed in it. Entities without a name get a default one
//! (`Room_0`, `Mic_0`, `Speaker_0`, ...).

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::Result;
use crate::name::NameCounter;
use crate::sim::acoustics::directivity::{MicDirectivity, Orientation};
use crate::sim::acoustics::synthesis::DEFAULT_SOUND_SPEED;
use crate::sim::microphone::Microphone;
use crate::sim::room::{ReflectionOrder, Room, RoomGeometry, Walls};
use crate::sim::scene::{Field, RirSet, Scene};
use crate::sim::speaker::Speaker;

fn default_sound_speed() -> f64 {
    DEFAULT_SOUND_SPEED
}

/// On-disk form of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    pub sample_rate: f64,
    #[serde(default = "default_sound_speed")]
    pub sound_speed: f64,
    pub n_samples: usize,
    #[serde(default)]
    pub high_pass: bool,
    pub room: RoomEntry,
    pub microphones: Vec<MicrophoneEntry>,
    pub speakers: Vec<SpeakerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub size: RoomGeometry,
    pub walls: Walls,
    #[serde(default)]
    pub order: ReflectionOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrophoneEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub position: Point,
    #[serde(default)]
    pub directivity: MicDirectivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub position: Point,
}

/// A validated scene together with the settings to compute it.
#[derive(Debug, Clone)]
pub struct SceneSetup {
    pub scene: Scene,
    pub field: Field,
    pub n_samples: usize,
    pub high_pass: bool,
}

impl SceneSetup {
    /// Computes every microphone/speaker pair of the scene.
    pub fn compute(&self) -> Result<RirSet> {
        self.scene
            .compute(&self.field, self.n_samples, self.high_pass)
    }
}

impl SceneFile {
    /// Builds and validates the scene, naming unnamed entities from `names`.
    pub fn into_setup(self, names: &mut NameCounter) -> Result<SceneSetup> {
        let room = Room::new(
            names.name_or_next(self.room.name, "Room"),
            self.room.size,
            self.room.walls,
            self.room.order,
        )?;
        let microphones = self
            .microphones
            .into_iter()
            .map(|m| Microphone::new(names.name_or_next(m.name, "Mic"), m.position, m.directivity))
            .collect::<Result<Vec<_>>>()?;
        let speakers = self
            .speakers
            .into_iter()
            .map(|s| Speaker::new(names.name_or_next(s.name, "Speaker"), s.position))
            .collect::<Result<Vec<_>>>()?;

        let scene = Scene::new(room, microphones, speakers)?;
        let field = Field {
            sample_rate: self.sample_rate,
            sound_speed: self.sound_speed,
        };
        field.validate()?;
        Ok(SceneSetup {
            scene,
            field,
            n_samples: self.n_samples,
            high_pass: self.high_pass,
        })
    }

    /// A small office with two microphones and two talkers.
    pub fn example() -> Self {
        Self {
            sample_rate: 16000.0,
            sound_speed: DEFAULT_SOUND_SPEED,
            n_samples: 8000,
            high_pass: true,
            room: RoomEntry {
                name: Some("Office".to_string()),
                size: RoomGeometry::new(5.0, 4.0, 3.0),
                walls: Walls::Rt60(0.4),
                order: ReflectionOrder::Unbounded,
            },
            microphones: vec![
                MicrophoneEntry {
                    name: Some("Omni".to_string()),
                    position: Point::new(2.5, 2.0, 1.2),
                    directivity: MicDirectivity::Omnidirectional,
                },
                MicrophoneEntry {
                    name: Some("Cardioid".to_string()),
                    position: Point::new(2.6, 2.0, 1.2),
                    directivity: MicDirectivity::Cardioid(Orientation {
                        azimuth: std::f64::consts::PI,
                        elevation: 0.0,
                    }),
                },
            ],
            speakers: vec![
                SpeakerEntry {
                    name: None,
                    position: Point::new(1.0, 2.0, 1.6),
                },
                SpeakerEntry {
                    name: None,
                    position: Point::new(4.0, 3.0, 1.6),
                },
            ],
        }
    }
}

/// Reads a scene file.
pub fn read_scene_file(path: &Path) -> Result<SceneFile> {
    let reader = BufReader::new(File::open(path)?);
    let file: SceneFile = serde_json::from_reader(reader)?;
    debug!(
        "Read scene from {}: {} microphone(s), {} speaker(s)",
        path.display(),
        file.microphones.len(),
        file.speakers.len()
    );
    Ok(file)
}

/// Writes a scene file as pretty-printed JSON.
pub fn write_scene_file(path: &Path, file: &SceneFile) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, file)?;
    Ok(())
}

/// Reads a scene file and builds the validated scene.
pub fn load_scene(path: &Path) -> Result<SceneSetup> {
    read_scene_file(path)?.into_setup(&mut NameCounter::new())
}

/// Parses and validates a scene from a JSON string.
pub fn parse_scene(json: &str) -> Result<SceneSetup> {
    let file: SceneFile = serde_json::from_str(json)?;
    file.into_setup(&mut NameCounter::new())
}

/// Serializes a scene file to a JSON string.
pub fn to_scene_string(file: &SceneFile) -> Result<String> {
    Ok(serde_json::to_string_pretty(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RirError;
    use crate::name::HasName;
    use crate::sim::room::WallReflection;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"{
        "sample_rate": 8000,
        "n_samples": 1000,
        "room": { "size": [4, 4, 3], "walls": { "beta": [0.9, 0.9, 0.8, 0.8, 0.5, 0.5] } },
        "microphones": [
            { "position": [2, 3, 1.5] },
            { "name": "Dipole", "position": [1, 1, 1],
              "directivity": { "type": "dipole", "azimuth": 0.0, "elevation": 0.5 } }
        ],
        "speakers": [ { "position": [2, 2, 1.5] } ]
    }"#;

    #[test]
    fn test_parse_minimal_scene() -> Result<()> {
        let setup = parse_scene(MINIMAL)?;
        assert_eq!(setup.field.sound_speed, DEFAULT_SOUND_SPEED);
        assert_eq!(setup.field.sample_rate, 8000.0);
        assert!(!setup.high_pass);

        let scene = &setup.scene;
        assert_eq!(scene.room().get_name(), "Room_0");
        assert_eq!(scene.room().order, ReflectionOrder::Unbounded);
        assert_eq!(
            scene.room().walls,
            Walls::Beta(WallReflection::new([0.9, 0.9, 0.8, 0.8, 0.5, 0.5])?)
        );
        assert_eq!(scene.microphones()[0].get_name(), "Mic_0");
        assert_eq!(scene.microphones()[1].get_name(), "Dipole");
        assert_eq!(
            scene.microphones()[0].directivity,
            MicDirectivity::Omnidirectional
        );
        assert!(matches!(
            scene.microphones()[1].directivity,
            MicDirectivity::Dipole(o) if o.elevation == 0.5
        ));
        assert_eq!(scene.speakers()[0].get_name(), "Speaker_0");

        let set = setup.compute()?;
        assert_eq!(set.channels(0)?.len(), 2);
        assert_eq!(set.get(0, 0).map(|ir| ir.len()), Some(1000));
        Ok(())
    }

    #[test]
    fn test_bounded_order_and_rt60() -> Result<()> {
        let json = r#"{
            "sample_rate": 16000, "sound_speed": 343, "n_samples": 500, "high_pass": true,
            "room": { "name": "Hall", "size": [10, 8, 4], "walls": { "rt60": 0.8 },
                      "order": { "bounded": 3 } },
            "microphones": [ { "position": [5, 4, 2] } ],
            "speakers": [ { "name": "Lead", "position": [2, 2, 1.5] } ]
        }"#;
        let setup = parse_scene(json)?;
        assert_eq!(setup.scene.room().order, ReflectionOrder::Bounded(3));
        assert_eq!(setup.scene.room().walls, Walls::Rt60(0.8));
        assert_eq!(setup.field.sound_speed, 343.0);
        assert!(setup.high_pass);
        Ok(())
    }

    #[test]
    fn test_invalid_scenes_rejected() {
        // Wrong beta length
        let bad_beta = MINIMAL.replace("[0.9, 0.9, 0.8, 0.8, 0.5, 0.5]", "[0.9, 0.9]");
        assert!(matches!(parse_scene(&bad_beta), Err(RirError::Json(_))));

        // Speaker outside the room
        let outside = MINIMAL.replace("[2, 2, 1.5]", "[2, 2, 7.5]");
        assert!(matches!(
            parse_scene(&outside),
            Err(RirError::PositionOutsideRoom { .. })
        ));

        // No speakers
        let empty = MINIMAL.replace("[ { \"position\": [2, 2, 1.5] } ]", "[]");
        assert!(matches!(parse_scene(&empty), Err(RirError::EmptyScene)));

        // Bad sample rate
        let zero_fs = MINIMAL.replace("\"sample_rate\": 8000", "\"sample_rate\": 0");
        assert!(matches!(
            parse_scene(&zero_fs),
            Err(RirError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_scene_file_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("scene.json");

        let original = SceneFile::example();
        write_scene_file(&path, &original)?;
        let loaded = read_scene_file(&path)?;
        assert_eq!(loaded, original);

        let setup = load_scene(&path)?;
        let names: Vec<&str> = setup.scene.speakers().iter().map(|s| s.get_name()).collect();
        assert_eq!(names, ["Speaker_0", "Speaker_1"]);
        Ok(())
    }

    #[test]
    fn test_example_serialization() -> Result<()> {
        let json = to_scene_string(&SceneFile::example())?;
        assert!(json.contains("\"rt60\": 0.4"));
        assert!(json.contains("\"type\": \"cardioid\""));
        assert!(json.contains("\"order\": \"unbounded\""));
        // Unnamed speakers are not written with a null name
        assert!(!json.contains("null"));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_scene(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, RirError::Io(_)));
    }
}
