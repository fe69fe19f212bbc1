//! Layered take storage and the live recorder.
//!
//! A session is a small bank of layers, each holding one recorded take as
//! note onsets in milliseconds, plus the recorder that captures the next
//! take. Scheduling lives in [`crate::engine`]; this module only stores.

pub mod layers;
pub mod recorder;

pub use layers::{Layer, LayerStore, NoteEvent};
pub use recorder::Recorder;
