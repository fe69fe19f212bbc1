//! Effect configuration and chain composition.
//!
//! The processing order is fixed: Filter, Distortion, Delay, Reverb,
//! Chorus. Configuration lives in an [`EffectRack`] the user mutates live;
//! each triggered note captures a snapshot of the rack and materializes it
//! into graph nodes, so edits never reach back into already-sounding notes.

use serde::{Deserialize, Serialize};

use crate::graph::chorus::ChorusNode;
use crate::graph::delay::FeedbackDelayNode;
use crate::graph::distortion::DistortionNode;
use crate::graph::filter::SweepFilterNode;
use crate::graph::mix::WetDry;
use crate::graph::node::GraphNode;
use crate::graph::reverb::TapReverbNode;
use crate::graph::through::Through;

/// The five effect stages, in their fixed processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Filter,
    Distortion,
    Delay,
    Reverb,
    Chorus,
}

impl EffectKind {
    /// Processing order. This is the one place the order is written down.
    pub const ORDER: [EffectKind; 5] = [
        EffectKind::Filter,
        EffectKind::Distortion,
        EffectKind::Delay,
        EffectKind::Reverb,
        EffectKind::Chorus,
    ];
}

/// Native parameters per effect kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectParams {
    Filter { cutoff_hz: f32, resonance: f32 },
    Distortion { amount: f32 },
    Delay { time_s: f32, feedback: f32 },
    Reverb { room_size: f32, damping: f32 },
    Chorus { rate_hz: f32, depth_ms: f32 },
}

impl EffectParams {
    fn default_for(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Filter => EffectParams::Filter {
                cutoff_hz: 1200.0,
                resonance: 0.7,
            },
            EffectKind::Distortion => EffectParams::Distortion { amount: 40.0 },
            EffectKind::Delay => EffectParams::Delay {
                time_s: 0.3,
                feedback: 0.35,
            },
            EffectKind::Reverb => EffectParams::Reverb {
                room_size: 0.5,
                damping: 0.5,
            },
            EffectKind::Chorus => EffectParams::Chorus {
                rate_hz: 1.2,
                depth_ms: 2.5,
            },
        }
    }

    /// Map the UI's 0..=100 amount slider onto this effect's primary
    /// parameter range. Secondary parameters keep their current values.
    fn apply_amount(&mut self, amount: u8) {
        let a = amount.min(100) as f32 / 100.0;
        match self {
            // Exponential sweep 200 Hz .. 8 kHz: equal slider steps feel
            // like equal musical intervals.
            EffectParams::Filter { cutoff_hz, .. } => {
                *cutoff_hz = 200.0 * (8000.0f32 / 200.0).powf(a);
            }
            EffectParams::Distortion { amount } => *amount = a * 100.0,
            EffectParams::Delay { time_s, .. } => *time_s = a, // capped at render
            EffectParams::Reverb { room_size, .. } => *room_size = a,
            EffectParams::Chorus { depth_ms, .. } => *depth_ms = 0.5 + a * 4.5,
        }
    }
}

/// One effect stage's live configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectConfig {
    pub kind: EffectKind,
    pub enabled: bool,
    pub params: EffectParams,
    /// Wet/dry balance for this stage. Ignored by the filter, which is
    /// spliced serially.
    pub wetness: f32,
}

impl EffectConfig {
    fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            enabled: false,
            params: EffectParams::default_for(kind),
            wetness: 0.5,
        }
    }
}

/// The full set of effect configurations, one per kind, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRack {
    stages: [EffectConfig; 5],
}

impl Default for EffectRack {
    fn default() -> Self {
        Self {
            stages: EffectKind::ORDER.map(EffectConfig::new),
        }
    }
}

impl EffectRack {
    pub fn stages(&self) -> impl Iterator<Item = &EffectConfig> {
        self.stages.iter()
    }

    pub fn get(&self, kind: EffectKind) -> &EffectConfig {
        &self.stages[Self::index(kind)]
    }

    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) {
        self.stages[Self::index(kind)].enabled = enabled;
    }

    pub fn set_amount(&mut self, kind: EffectKind, amount: u8) {
        self.stages[Self::index(kind)].params.apply_amount(amount);
    }

    pub fn set_wetness(&mut self, kind: EffectKind, wetness: f32) {
        self.stages[Self::index(kind)].wetness = wetness.clamp(0.0, 1.0);
    }

    /// Clone the rack for one note trigger. The snapshot is what gets
    /// materialized; later edits to `self` cannot affect it.
    pub fn snapshot(&self) -> EffectRack {
        self.clone()
    }

    /// Restore a persisted set of stage configs. Unknown or duplicate kinds
    /// cannot occur by construction; order is re-imposed here regardless of
    /// how the input is sorted.
    pub fn from_configs(configs: &[EffectConfig]) -> EffectRack {
        let mut rack = EffectRack::default();
        for config in configs {
            rack.stages[Self::index(config.kind)] = *config;
        }
        rack
    }

    pub fn to_configs(&self) -> Vec<EffectConfig> {
        self.stages.to_vec()
    }

    fn index(kind: EffectKind) -> usize {
        // Declaration order is processing order.
        kind as usize
    }
}

/// Materialize a rack snapshot around a source node.
///
/// Disabled stages are skipped outright so they cost nothing. The filter
/// splices serially; every other enabled stage goes through a wet/dry
/// split at its configured wetness.
///
/// Nothing tempo-shaped enters this function. That is deliberate and
/// load-bearing: changing any BPM can never alter the sound of a note,
/// only when it is scheduled.
pub fn compose_chain(rack: &EffectRack, source: Box<dyn GraphNode>) -> Box<dyn GraphNode> {
    let mut chain = source;

    for config in rack.stages() {
        if !config.enabled {
            continue;
        }
        chain = match config.params {
            EffectParams::Filter {
                cutoff_hz,
                resonance,
            } => Box::new(Through::new(chain, SweepFilterNode::new(cutoff_hz, resonance))),
            EffectParams::Distortion { amount } => {
                splice_wet(chain, DistortionNode::new(amount), config.wetness)
            }
            EffectParams::Delay { time_s, feedback } => {
                splice_wet(chain, FeedbackDelayNode::new(time_s, feedback), config.wetness)
            }
            EffectParams::Reverb { room_size, damping } => {
                splice_wet(chain, TapReverbNode::new(room_size, damping), config.wetness)
            }
            EffectParams::Chorus { rate_hz, depth_ms } => {
                splice_wet(chain, ChorusNode::new(rate_hz, depth_ms), config.wetness)
            }
        };
    }

    chain
}

fn splice_wet<E: GraphNode + 'static>(
    chain: Box<dyn GraphNode>,
    effect: E,
    wetness: f32,
) -> Box<dyn GraphNode> {
    Box::new(Through::new(chain, WetDry::new(effect, wetness)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::RenderCtx;
    use crate::voice::{build_voice, Instrument};

    fn render(node: &mut dyn GraphNode, samples: usize) -> Vec<f32> {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut buffer = vec![0.0f32; samples];
        for chunk in buffer.chunks_mut(512) {
            node.render_block(chunk, &ctx);
        }
        buffer
    }

    #[test]
    fn all_disabled_is_a_bare_voice() {
        // Voices are deterministic, so an effectless chain must produce
        // byte-identical output to the voice alone.
        let mut bare = build_voice(Instrument::Synth);
        let mut composed = compose_chain(&EffectRack::default(), build_voice(Instrument::Synth));

        assert_eq!(render(&mut *bare, 2048), render(&mut *composed, 2048));
    }

    #[test]
    fn enabled_stage_changes_the_signal() {
        let mut rack = EffectRack::default();
        rack.set_enabled(EffectKind::Distortion, true);
        rack.set_amount(EffectKind::Distortion, 90);

        let mut bare = build_voice(Instrument::Synth);
        let mut composed = compose_chain(&rack, build_voice(Instrument::Synth));

        assert_ne!(render(&mut *bare, 2048), render(&mut *composed, 2048));
    }

    #[test]
    fn full_chain_renders_finite_audio() {
        let mut rack = EffectRack::default();
        for kind in EffectKind::ORDER {
            rack.set_enabled(kind, true);
        }

        let mut composed = compose_chain(&rack, build_voice(Instrument::Piano));
        let buffer = render(&mut *composed, 8192);
        assert!(buffer.iter().all(|s| s.is_finite()));
        assert!(buffer.iter().any(|&s| s.abs() > 0.0));
    }

    #[test]
    fn snapshot_shields_sounding_notes_from_edits() {
        let mut rack = EffectRack::default();
        rack.set_enabled(EffectKind::Delay, true);

        let snapshot = rack.snapshot();
        rack.set_amount(EffectKind::Delay, 99);
        rack.set_enabled(EffectKind::Reverb, true);

        assert_ne!(snapshot, rack.snapshot());
        // The earlier snapshot still holds the old values.
        assert!(matches!(
            snapshot.get(EffectKind::Delay).params,
            EffectParams::Delay { time_s, .. } if (time_s - 0.3).abs() < 1e-6
        ));
        assert!(!snapshot.get(EffectKind::Reverb).enabled);
    }

    #[test]
    fn amount_slider_maps_to_native_ranges() {
        let mut rack = EffectRack::default();

        rack.set_amount(EffectKind::Filter, 0);
        assert!(matches!(
            rack.get(EffectKind::Filter).params,
            EffectParams::Filter { cutoff_hz, .. } if (cutoff_hz - 200.0).abs() < 1.0
        ));

        rack.set_amount(EffectKind::Filter, 100);
        assert!(matches!(
            rack.get(EffectKind::Filter).params,
            EffectParams::Filter { cutoff_hz, .. } if (cutoff_hz - 8000.0).abs() < 1.0
        ));

        rack.set_amount(EffectKind::Chorus, 100);
        assert!(matches!(
            rack.get(EffectKind::Chorus).params,
            EffectParams::Chorus { depth_ms, .. } if (depth_ms - 5.0).abs() < 1e-3
        ));
    }

    #[test]
    fn configs_round_trip_through_persistence_form() {
        let mut rack = EffectRack::default();
        rack.set_enabled(EffectKind::Chorus, true);
        rack.set_wetness(EffectKind::Chorus, 0.8);

        let restored = EffectRack::from_configs(&rack.to_configs());
        assert_eq!(restored, rack);
    }
}
