use crate::graph::node::{GraphNode, RenderCtx};

/// Serial signal chain: render the source, then let the processor transform
/// the buffer in place. This is how effect stages splice after a voice:
///
/// ```text
/// [voice] --> [stage] --> [stage] --> output
/// ```
pub struct Through<S, F> {
    source: S,
    processor: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, processor: F) -> Self {
        Self { source, processor }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.processor.render_block(out, ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active() || self.processor.is_active()
    }
}
