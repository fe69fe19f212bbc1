//! Composable building blocks for constructing per-note audio graphs.
//!
//! Every triggered note becomes a fresh graph: an oscillator shaped by a
//! one-shot envelope, wrapped by whatever effect stages are enabled at that
//! instant. Nodes render block-wise against a [`node::RenderCtx`]; the
//! `extensions` module adds fluent helpers so chains read left to right.

/// Multiply a signal by a modulator (envelope application).
pub mod amplify;
/// Short delay with LFO-modulated time (chorus wet path).
pub mod chorus;
/// Single-tap feedback delay (echo wet path).
pub mod delay;
/// Waveshaping distortion through a cached lookup curve.
pub mod distortion;
/// One-shot envelope as a renderable node.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.through()`, `.wet_dry()`).
pub mod extensions;
/// Resonant low-pass with an animated cutoff settle.
pub mod filter;
/// Wet/dry split around a single effect.
pub mod mix;
/// Core trait shared by all graph nodes.
pub mod node;
/// Audio-band oscillator node.
pub mod oscillator;
/// Multi-tap reverb (wet path).
pub mod reverb;
/// Serial chaining of two nodes (source then processor).
pub mod through;

pub use node::{GraphNode, RenderCtx};
