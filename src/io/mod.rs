//! Audio output: the sink abstraction and its device-backed implementation.

pub mod sink;

pub use sink::{AudioSink, CpalSink, NullSink, SinkError};

/// Identifier for one sounding voice, unique for the life of the engine.
pub type VoiceId = u64;

/// Per-trigger render parameters handed to the sink with the voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    pub frequency: f32,
    pub velocity: f32,
}
