pub mod circular_buffer;
pub mod config;
pub mod error;
pub mod framing;
pub mod reader;

pub use circular_buffer::CircularBuffer;
pub use error::Error;
