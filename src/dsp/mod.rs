//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! These components are allocation-free after construction and safe to embed
//! directly inside per-note voice graphs. They stay focused on the
//! signal-processing math; orchestration (wet/dry routing, effect order,
//! note lifetimes) lives above them in `graph` and `effects`.

/// Time-domain delay line with optional interpolated reads.
pub mod delay;
/// Fixed-resolution waveshaping curve for distortion.
pub mod distortion;
/// One-shot attack/decay amplitude envelope.
pub mod envelope;
/// Resonant low-pass filter (topology-preserving SVF core).
pub mod filter;
/// Dry/wet blending helpers.
pub mod mix;
/// Oscillator waveforms.
pub mod oscillator;

pub use oscillator::Waveform;
