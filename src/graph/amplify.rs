use crate::graph::node::{GraphNode, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/// Multiply two signals: the voice's `oscillator × envelope` junction.
///
/// The modulator renders into a pre-allocated scratch buffer, then the
/// output is scaled sample by sample. A voice is done when either side is
/// done, which in practice means when the envelope has decayed out.
pub struct Amplify<N, M> {
    pub signal: N,
    pub modulator: M,
    temp_buffer: Vec<f32>,
}

impl<N, M> Amplify<N, M> {
    pub fn new(signal: N, modulator: M) -> Self {
        Self {
            signal,
            modulator,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<N: GraphNode, M: GraphNode> GraphNode for Amplify<N, M> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        self.signal.render_block(out, ctx);

        let frames = &mut self.temp_buffer[..out.len()];
        frames.fill(0.0);
        self.modulator.render_block(frames, ctx);

        for (o, m) in out.iter_mut().zip(frames.iter()) {
            *o *= *m;
        }
    }

    fn is_active(&self) -> bool {
        self.signal.is_active() && self.modulator.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::envelope::EnvNode;
    use crate::graph::oscillator::OscNode;

    #[test]
    fn silence_once_envelope_finishes() {
        let mut voice = Amplify::new(OscNode::sawtooth(), EnvNode::one_shot(1.0, 1.0, 4.0));
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        let mut buffer = vec![0.0f32; 2048];
        voice.render_block(&mut buffer, &ctx); // ~42ms, envelope spans 5ms

        assert!(buffer[..64].iter().any(|&s| s.abs() > 0.0));
        assert!(buffer[1024..].iter().all(|&s| s == 0.0));
        assert!(!voice.is_active());
    }
}
