pub mod error;
pub mod geom;
pub mod io;
pub mod name;
pub mod sim;

// Prelude
pub use error::{Result, RirError};
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use name::{HasName, NameCounter};
pub use sim::acoustics::directivity::{MicDirectivity, Orientation};
pub use sim::acoustics::impulse_response::ImpulseResponse;
pub use sim::acoustics::synthesis::{SynthesisRequest, synthesize, synthesize_parallel};
pub use sim::microphone::Microphone;
pub use sim::room::{ReflectionOrder, Room, RoomGeometry, WallReflection, Walls};
pub use sim::scene::{Field, RirSet, Scene};
pub use sim::speaker::Speaker;
