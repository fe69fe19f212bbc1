use crate::dsp::mix::blend_dry_wet;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/*
Wet/Dry Split
=============

Every effect stage except the filter is blended, not inserted serially: the
running signal is duplicated into a dry path and a wet path, the wet path is
processed by the effect, and the two are summed with complementary gains.

  in ──┬────────────── × (1 − wetness) ──┐
       │                                 + ── out
       └── [effect] ─── × wetness ───────┘

A voice is single-use, so the split cannot be modeled as two independent
sources rendering the same input twice. Instead the incoming buffer (the dry
signal) is copied to scratch, the effect processes the copy, and the blend
happens in place. Inserted via `Through`, so `chain.through(WetDry::new(fx,
0.4))` reads exactly like the topology above.
*/

pub struct WetDry<E> {
    effect: E,
    wetness: f32,
    wet_buffer: Vec<f32>,
}

impl<E> WetDry<E> {
    pub fn new(effect: E, wetness: f32) -> Self {
        Self {
            effect,
            wetness: wetness.clamp(0.0, 1.0),
            wet_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<E: GraphNode> GraphNode for WetDry<E> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);
        let wet = &mut self.wet_buffer[..out.len()];
        wet.copy_from_slice(out);
        self.effect.render_block(wet, ctx);

        // out currently holds the dry signal; fold the wet copy in.
        for (o, &w) in out.iter_mut().zip(wet.iter()) {
            *o = blend_dry_wet(*o, w, self.wetness);
        }
    }
}
