//! Audio output: device abstraction, decoding, resampling and the cpal backend

pub mod decoder;
pub mod device;
pub mod output;
pub mod resampler;

pub use device::DeviceOutput;
pub use output::{AudioOutput, PlaybackStatus};
