//! Reframe Audio Intelligence
//!
//! Local-first audio processing:
//! - **Background jobs:** Debounce-and-replace slots with cooperative cancellation
//! - **Noise Reduction:** ffmpeg `afftdn` cleanup of the microphone track
//! - **Transcription:** whisper.cpp speech-to-text for captions
//! - **Subtitle Generation:** SRT/VTT output from captions

pub mod jobs;
pub mod noise;
pub mod subtitles;
pub mod transcription;

pub use jobs::{BusyProbe, JobContext, JobSlot};
pub use noise::{FfmpegDenoiser, NoiseReducer, NoiseReductionConfig};
pub use subtitles::*;
pub use transcription::*;
