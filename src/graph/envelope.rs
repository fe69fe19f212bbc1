use crate::dsp::envelope::OneShotEnvelope;
use crate::graph::node::{GraphNode, RenderCtx};

/// One-shot envelope as a graph node.
///
/// Renders its level curve into the buffer; combine with [`super::amplify`]
/// to gate a source. Times arrive in milliseconds because that is how
/// instrument policies express them.
pub struct EnvNode {
    env: OneShotEnvelope,
    sample_rate_seen: f32,
}

impl EnvNode {
    pub fn one_shot(attack_ms: f32, peak: f32, decay_ms: f32) -> Self {
        Self {
            env: OneShotEnvelope::new(attack_ms / 1000.0, peak, decay_ms / 1000.0),
            sample_rate_seen: 48_000.0,
        }
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.sample_rate_seen = ctx.sample_rate;
        self.env.render(out, ctx.sample_rate);
    }

    fn is_active(&self) -> bool {
        !self.env.is_finished(self.sample_rate_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_inactive_after_decay() {
        let mut env = EnvNode::one_shot(1.0, 1.0, 5.0);
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        assert!(env.is_active());
        let mut buffer = vec![0.0f32; 48_00]; // 100ms, well past 6ms total
        env.render_block(&mut buffer, &ctx);
        assert!(!env.is_active());
    }
}
