use crate::dsp::filter::LowPassFilter;
use crate::graph::node::{GraphNode, RenderCtx};

/// How long the cutoff sweep takes to settle back to base, in rendered time.
const SWEEP_TOTAL_S: f32 = 0.3;
/// Portion of the sweep spent rising toward the overshoot peak.
const SWEEP_RISE_S: f32 = 0.045;
/// Peak cutoff during the sweep, as a multiple of the base cutoff.
const SWEEP_PEAK_MULT: f32 = 2.5;

/// Resonant low-pass with an animated cutoff.
///
/// On every note the cutoff overshoots above its configured base, then
/// settles back over ~300 ms of rendered audio. The sweep clock counts
/// rendered samples, so it is identical for every note regardless of the
/// note's lifetime category or any tempo setting.
pub struct SweepFilterNode {
    filter: LowPassFilter,
    base_cutoff_hz: f32,
    elapsed_samples: u64,
}

impl SweepFilterNode {
    pub fn new(base_cutoff_hz: f32, resonance: f32) -> Self {
        Self {
            filter: LowPassFilter::new(base_cutoff_hz, resonance),
            base_cutoff_hz: base_cutoff_hz.max(10.0),
            elapsed_samples: 0,
        }
    }

    /// Sweep shape: 0 at note start, 1 at the rise peak, back to 0 when the
    /// sweep has settled. Piecewise linear.
    fn sweep_amount(&self, t: f32) -> f32 {
        if t < SWEEP_RISE_S {
            t / SWEEP_RISE_S
        } else if t < SWEEP_TOTAL_S {
            1.0 - (t - SWEEP_RISE_S) / (SWEEP_TOTAL_S - SWEEP_RISE_S)
        } else {
            0.0
        }
    }

    fn cutoff_at(&self, t: f32) -> f32 {
        let overshoot = self.base_cutoff_hz * (SWEEP_PEAK_MULT - 1.0);
        self.base_cutoff_hz + overshoot * self.sweep_amount(t)
    }
}

impl GraphNode for SweepFilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        // Update the cutoff once per small chunk; per-sample retuning of the
        // SVF coefficients is not worth the cost at a 45 ms rise time.
        for chunk in out.chunks_mut(32) {
            let t = self.elapsed_samples as f32 / ctx.sample_rate;
            self.filter.set_cutoff(self.cutoff_at(t));
            self.filter.render(chunk, ctx);
            self.elapsed_samples += chunk.len() as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_rises_then_settles_to_base() {
        let node = SweepFilterNode::new(1000.0, 0.5);

        assert!((node.cutoff_at(0.0) - 1000.0).abs() < 1.0);
        assert!((node.cutoff_at(SWEEP_RISE_S) - 2500.0).abs() < 1.0);
        assert!((node.cutoff_at(0.3) - 1000.0).abs() < 1.0);
        assert!((node.cutoff_at(5.0) - 1000.0).abs() < 1.0);
    }

    #[test]
    fn output_stays_finite_through_the_sweep() {
        let mut node = SweepFilterNode::new(600.0, 0.8);
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        let mut buffer = vec![0.5f32; 2048];
        for _ in 0..10 {
            node.render_block(&mut buffer, &ctx);
        }
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
