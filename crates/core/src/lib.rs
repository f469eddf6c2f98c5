pub mod detection;
pub mod diagnostics;
pub mod evaluation;
pub mod image_io;
pub mod pipeline;
pub mod shared;
pub mod transform;
