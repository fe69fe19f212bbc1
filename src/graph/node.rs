/// Context passed to graph nodes during rendering.
///
/// - `sample_rate`: audio sample rate (e.g. 48000.0)
/// - `frequency`: pitch to render (Hz)
/// - `velocity`: intensity (0.0 to 1.0)
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub frequency: f32,
    pub velocity: f32,
}

impl RenderCtx {
    pub fn from_freq(sample_rate: f32, frequency: f32, velocity: f32) -> Self {
        Self {
            sample_rate,
            frequency,
            velocity,
        }
    }
}

/// Core trait for audio processing graph nodes.
///
/// Source nodes fill the buffer; processor nodes transform it in place.
/// Voices are single-shot, so there are no gate events: a node starts
/// sounding the moment it exists and `is_active` reports when it has
/// nothing further to contribute.
pub trait GraphNode: Send {
    /// Render one block into `out`.
    ///
    /// `out` holds at most [`MAX_BLOCK_SIZE`](crate::MAX_BLOCK_SIZE) frames;
    /// nodes with scratch buffers size them to that limit, so callers must
    /// split larger requests into chunks.
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Whether this node is still producing sound.
    ///
    /// Used to retire finished voices early; scheduled teardown at the
    /// instrument's note lifetime is the authoritative stop either way.
    fn is_active(&self) -> bool {
        true
    }
}

/// Allow boxed graph nodes to be used as graph nodes (dynamic dispatch).
impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
