//! Instrument timbres: waveform choice plus the amplitude envelope and
//! fixed note lifetime for each.
//!
//! Every value here is a constant per instrument. Nothing in this module
//! knows about tempo, volume sliders, or layers; a piano note decays the
//! same way at 60 BPM as at 200.

use serde::{Deserialize, Serialize};

use crate::dsp::Waveform;
use crate::graph::envelope::EnvNode;
use crate::graph::extensions::NodeExt;
use crate::graph::node::GraphNode;
use crate::graph::oscillator::OscNode;

/// The fixed set of playable timbres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    #[default]
    Synth,
    Piano,
    Strings,
    Bass,
}

/// Per-instrument amplitude envelope and note lifetime.
///
/// `lifetime_ms` is when the engine tears the voice down; it leaves room
/// after the decay so effect tails are not clipped mid-ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopePolicy {
    pub attack_ms: f32,
    pub peak: f32,
    pub decay_ms: f32,
    pub lifetime_ms: u64,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Synth,
        Instrument::Piano,
        Instrument::Strings,
        Instrument::Bass,
    ];

    /// Parse an instrument tag. Unknown tags fall back to the synth
    /// timbre rather than failing; a wrong sound beats no sound.
    pub fn parse(tag: &str) -> Instrument {
        match tag.to_ascii_lowercase().as_str() {
            "piano" => Instrument::Piano,
            "strings" => Instrument::Strings,
            "bass" => Instrument::Bass,
            _ => Instrument::Synth,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Synth => "synth",
            Instrument::Piano => "piano",
            Instrument::Strings => "strings",
            Instrument::Bass => "bass",
        }
    }

    pub fn waveform(&self) -> Waveform {
        match self {
            Instrument::Synth | Instrument::Strings => Waveform::Sawtooth,
            Instrument::Piano => Waveform::Triangle,
            Instrument::Bass => Waveform::Square,
        }
    }

    pub fn envelope(&self) -> EnvelopePolicy {
        match self {
            Instrument::Synth => EnvelopePolicy {
                attack_ms: 15.0,
                peak: 0.8,
                decay_ms: 450.0,
                lifetime_ms: 900,
            },
            Instrument::Piano => EnvelopePolicy {
                attack_ms: 5.0,
                peak: 0.9,
                decay_ms: 900.0,
                lifetime_ms: 1200,
            },
            Instrument::Strings => EnvelopePolicy {
                attack_ms: 180.0,
                peak: 0.7,
                decay_ms: 1300.0,
                lifetime_ms: 2000,
            },
            Instrument::Bass => EnvelopePolicy {
                attack_ms: 10.0,
                peak: 0.85,
                decay_ms: 500.0,
                lifetime_ms: 800,
            },
        }
    }
}

/// Build one single-use voice for a note trigger: oscillator shaped by the
/// instrument's one-shot envelope. The caller splices it into an effect
/// chain and schedules teardown at `envelope().lifetime_ms`.
pub fn build_voice(instrument: Instrument) -> Box<dyn GraphNode> {
    let policy = instrument.envelope();
    Box::new(
        OscNode::new(instrument.waveform()).amplify(EnvNode::one_shot(
            policy.attack_ms,
            policy.peak,
            policy.decay_ms,
        )),
    )
}
