use std::f32::consts::TAU;

use crate::dsp::delay::DelayLine;
use crate::graph::node::{GraphNode, RenderCtx};

/// Center delay time. Long enough to keep the wet copy distinct from the
/// dry signal, short enough not to read as a slapback echo.
const BASE_DELAY_MS: f32 = 20.0;

/// Chorus: a short delay whose time is wobbled by a sine LFO.
///
/// As the delay time moves, the read position drifts against the write
/// position and the wet copy detunes slightly, which is what makes one
/// voice sound like several. Reads are interpolated so the modulation does
/// not zipper. Output is wet-only; the dry blend happens in the surrounding
/// wet/dry stage.
pub struct ChorusNode {
    delay_line: DelayLine,
    lfo_phase: f32,
    rate_hz: f32,
    depth_ms: f32,
}

impl ChorusNode {
    /// - `rate_hz`: LFO speed (0.1 to 5.0 typical, ~1 Hz classic)
    /// - `depth_ms`: how far the delay time swings (0.5 to 5.0 typical)
    pub fn new(rate_hz: f32, depth_ms: f32) -> Self {
        Self {
            delay_line: DelayLine::with_capacity(8_192),
            lfo_phase: 0.0,
            rate_hz: rate_hz.clamp(0.05, 10.0),
            depth_ms: depth_ms.clamp(0.0, 10.0),
        }
    }
}

impl GraphNode for ChorusNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let phase_inc = TAU * self.rate_hz / ctx.sample_rate;

        for sample in out.iter_mut() {
            let lfo = self.lfo_phase.sin();
            let delay_ms = BASE_DELAY_MS + lfo * self.depth_ms;
            let delay_samples = (delay_ms * ctx.sample_rate / 1000.0).max(1.0);

            let wet = self.delay_line.read_interpolated(delay_samples);
            self.delay_line.write(*sample);
            *sample = wet;

            self.lfo_phase += phase_inc;
            if self.lfo_phase >= TAU {
                self.lfo_phase -= TAU;
            }
        }
    }
}
