use crate::dsp::delay::DelayLine;
use crate::graph::node::{GraphNode, RenderCtx};

/// Hard ceiling on the echo time, whatever the configuration asks for.
///
/// Bounds both the delay-line memory and how long runaway feedback can
/// smear; the cap applies at render time so a hostile config cannot sidestep
/// it.
pub const MAX_DELAY_SECS: f32 = 0.8;

const MAX_FEEDBACK: f32 = 0.9;

/// Single-tap delay with feedback. Outputs the echo signal only; the dry
/// blend happens in the surrounding wet/dry stage.
pub struct FeedbackDelayNode {
    delay_line: DelayLine,
    time_s: f32,
    feedback: f32,
}

impl FeedbackDelayNode {
    pub fn new(time_s: f32, feedback: f32) -> Self {
        Self {
            delay_line: DelayLine::new(),
            time_s: time_s.clamp(0.0, MAX_DELAY_SECS),
            feedback: feedback.clamp(0.0, MAX_FEEDBACK),
        }
    }

    pub fn time_s(&self) -> f32 {
        self.time_s
    }
}

impl GraphNode for FeedbackDelayNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let delay_samples =
            ((self.time_s.min(MAX_DELAY_SECS) * ctx.sample_rate) as usize).max(1);

        for sample in out.iter_mut() {
            let delayed = self.delay_line.read_interpolated(delay_samples as f32);
            self.delay_line.write(*sample + delayed * self.feedback);
            *sample = delayed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_time_is_capped() {
        let node = FeedbackDelayNode::new(5.0, 0.3);
        assert!((node.time_s() - MAX_DELAY_SECS).abs() < 1e-6);
    }

    #[test]
    fn impulse_comes_back_after_the_delay() {
        let mut node = FeedbackDelayNode::new(0.01, 0.0); // 480 samples at 48k
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        let mut first = vec![0.0f32; 480];
        first[0] = 1.0;
        node.render_block(&mut first, &ctx);
        assert!(first.iter().all(|&s| s.abs() < 1e-3), "no echo yet");

        let mut second = vec![0.0f32; 480];
        node.render_block(&mut second, &ctx);
        let peak = second.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
        assert!(peak > 0.5, "echo should arrive in the second block");
    }

    #[test]
    fn feedback_decays_rather_than_grows() {
        let mut node = FeedbackDelayNode::new(0.005, 0.89);
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        let mut buffer = vec![0.0f32; 240];
        buffer[0] = 1.0;
        node.render_block(&mut buffer, &ctx);

        let mut last_peak = f32::MAX;
        for _ in 0..20 {
            let mut block = vec![0.0f32; 240];
            node.render_block(&mut block, &ctx);
            let peak = block.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
            assert!(peak <= last_peak + 1e-3, "feedback must not run away");
            last_peak = peak;
        }
    }
}
