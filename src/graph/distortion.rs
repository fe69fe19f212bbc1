use crate::dsp::distortion::{make_curve, shape_buffer, CURVE_RESOLUTION};
use crate::graph::node::{GraphNode, RenderCtx};

/// Waveshaping distortion through a cached fixed-resolution curve.
///
/// The curve is computed at construction and again only when the amount
/// changes; rendering is a table lookup per sample. Output is fully wet,
/// blending happens in the surrounding [`super::mix::WetDry`] stage.
pub struct DistortionNode {
    curve: [f32; CURVE_RESOLUTION],
    amount: f32,
}

impl DistortionNode {
    pub fn new(amount: f32) -> Self {
        let amount = amount.clamp(0.0, 100.0);
        Self {
            curve: make_curve(amount),
            amount,
        }
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Change the drive amount, recomputing the lookup curve.
    pub fn set_amount(&mut self, amount: f32) {
        let amount = amount.clamp(0.0, 100.0);
        if amount != self.amount {
            self.amount = amount;
            self.curve = make_curve(amount);
        }
    }
}

impl GraphNode for DistortionNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        shape_buffer(&self.curve, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_a_buffer_in_place() {
        let mut node = DistortionNode::new(70.0);
        let mut buffer = [0.9f32; 64];
        node.render_block(&mut buffer, &RenderCtx::from_freq(48_000.0, 440.0, 1.0));

        assert!(buffer.iter().all(|s| s.is_finite()));
        assert!(buffer[0] != 0.9, "high drive should reshape the signal");
    }

    #[test]
    fn set_amount_recomputes_only_on_change() {
        let mut node = DistortionNode::new(10.0);
        let before = node.curve;
        node.set_amount(10.0);
        assert_eq!(node.curve, before);

        node.set_amount(90.0);
        assert!(node.curve != before);
    }
}
