//! File I/O for scenes.
//!
//! Audio (WAV) input and output lives in `sim::acoustics::auralization::wav`.

pub mod scene_json;

pub use scene_json::{
    SceneFile, SceneSetup, load_scene, parse_scene, read_scene_file, write_scene_file,
};
