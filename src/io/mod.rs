//! Audio I/O modules
//!
//! In-memory audio decoding using Symphonia, the declared-format allow-list,
//! and the canonical mono sample buffer consumed by pitch extraction.

pub mod decoder;
pub mod format;
pub mod sample_buffer;

pub use decoder::decode;
pub use format::AudioFormat;
pub use sample_buffer::AudioBuffer;
