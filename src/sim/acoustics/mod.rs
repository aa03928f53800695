pub mod auralization;
pub mod directivity;
pub mod filters;
pub mod fractional_delay;
pub mod image_source;
pub mod impulse_response;
pub mod metrics;
pub mod synthesis;
