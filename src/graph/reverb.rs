use crate::dsp::delay::DelayLine;
use crate::graph::node::{GraphNode, RenderCtx};

/*
Multi-Tap Reverb
================

A lightweight room approximation: four parallel delay taps with staggered
base times, summed into the wet signal.

  in ──┬── tap 43ms·size ── × g ──┐
       ├── tap 61ms·size ── × g ──┤
       ├── tap 79ms·size ── × g ──┼── out (wet only)
       └── tap 97ms·size ── × g ──┘

Room size scales all four tap times together (a bigger room pushes the
reflections apart); each tap is attenuated by g = 0.3 × (1 − damping), so a
heavily damped room swallows its reflections. No feedback and no allpass
diffusion: tails stay short and cheap, which suits notes with a fixed,
bounded lifetime.
*/

/// Base tap times in milliseconds, before the room-size scale.
const TAP_BASE_MS: [f32; 4] = [43.0, 61.0, 79.0, 97.0];
const TAP_GAIN: f32 = 0.3;

/// Room-size multiplier range: 0.0 maps to a tight 0.3×, 1.0 to full spread.
fn room_scale(room_size: f32) -> f32 {
    0.3 + 0.7 * room_size.clamp(0.0, 1.0)
}

pub struct TapReverbNode {
    taps: [DelayLine; 4],
    room_size: f32,
    damping: f32,
}

impl TapReverbNode {
    pub fn new(room_size: f32, damping: f32) -> Self {
        // Longest tap: 97ms at full room size and a 96kHz device.
        let capacity = 16_384;
        Self {
            taps: [
                DelayLine::with_capacity(capacity),
                DelayLine::with_capacity(capacity),
                DelayLine::with_capacity(capacity),
                DelayLine::with_capacity(capacity),
            ],
            room_size: room_size.clamp(0.0, 1.0),
            damping: damping.clamp(0.0, 1.0),
        }
    }

    pub fn tap_gain(&self) -> f32 {
        TAP_GAIN * (1.0 - self.damping)
    }
}

impl GraphNode for TapReverbNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let scale = room_scale(self.room_size);
        let gain = self.tap_gain();

        let mut tap_samples = [0usize; 4];
        for (i, base_ms) in TAP_BASE_MS.iter().enumerate() {
            tap_samples[i] = ((base_ms * scale / 1000.0) * ctx.sample_rate).max(1.0) as usize;
        }

        for sample in out.iter_mut() {
            let dry = *sample;
            let mut wet = 0.0;
            for (tap, &delay) in self.taps.iter_mut().zip(tap_samples.iter()) {
                wet += tap.next_sample(dry, delay) * gain;
            }
            *sample = wet;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damping_attenuates_taps() {
        assert!((TapReverbNode::new(0.5, 0.0).tap_gain() - 0.3).abs() < 1e-6);
        assert!((TapReverbNode::new(0.5, 0.5).tap_gain() - 0.15).abs() < 1e-6);
        assert!(TapReverbNode::new(0.5, 1.0).tap_gain() < 1e-6);
    }

    #[test]
    fn impulse_produces_four_reflections() {
        let mut node = TapReverbNode::new(1.0, 0.0);
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        let mut buffer = vec![0.0f32; 8192];
        buffer[0] = 1.0;
        node.render_block(&mut buffer, &ctx);

        let reflections = buffer.iter().filter(|s| s.abs() > 0.1).count();
        assert_eq!(reflections, 4, "expected one reflection per tap");
    }

    #[test]
    fn larger_rooms_spread_reflections_later() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        let first_reflection = |room: f32| -> usize {
            let mut node = TapReverbNode::new(room, 0.0);
            let mut buffer = vec![0.0f32; 8192];
            buffer[0] = 1.0;
            node.render_block(&mut buffer, &ctx);
            buffer.iter().position(|s| s.abs() > 0.1).unwrap()
        };

        assert!(first_reflection(1.0) > first_reflection(0.0));
    }
}
