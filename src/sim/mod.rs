pub mod acoustics;
pub mod microphone;
pub mod room;
pub mod scene;
pub mod speaker;
