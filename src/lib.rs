pub mod dsp;
pub mod effects; // Effect configuration and chain composition
pub mod engine; // Studio engine: clock, scheduler, loop playback
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod io;
pub mod pitch;
pub mod session; // Layers and recording
pub mod store; // Composition persistence
pub mod voice; // Instrument timbres and envelope policy

pub use engine::{EngineConfig, StudioEngine};
pub use error::StudioError;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
/// Default delay line capacity: one second at a 96kHz device rate, headroom
/// over the 0.8s cap on echo time.
pub(crate) const MAX_DELAY_SAMPLES: usize = 96_000;
