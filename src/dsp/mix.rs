//! Dry/wet blending helpers.
//!
//! Effects in this engine render their fully-wet signal; blending against the
//! unprocessed input happens at the graph level. These are the shared
//! primitives for that blend: linear crossfade with complementary weights,
//! so the two gains always sum to 1.0 and the blend never boosts level.

/// Blend dry and wet samples: `dry × (1 − mix) + wet × mix`.
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Add signal `b` into signal `a`. Can exceed [-1, 1]; gain-stage afterwards.
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (sa, &sb) in a.iter_mut().zip(b.iter()) {
        *sa += sb;
    }
}
