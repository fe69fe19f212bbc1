use std::f32::consts::PI;

use crate::graph::node::RenderCtx;

/// Resonant low-pass filter.
///
/// Topology-preserving state-variable core (two integrators, trapezoidal
/// integration). Only the low-pass output is exposed; that is the one
/// response this engine sculpts timbres with. Stable under cutoff sweeps,
/// which matters because the filter stage animates its cutoff every note.
pub struct LowPassFilter {
    ic1eq: f32, // first integrator state
    ic2eq: f32, // second integrator state

    pub cutoff_hz: f32,
    pub resonance: f32, // 0.0 = gentle rolloff, toward 1.0 = strong peak
}

impl LowPassFilter {
    pub fn new(cutoff_hz: f32, resonance: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz: cutoff_hz.max(10.0),
            resonance: resonance.clamp(0.0, 0.95),
        }
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.cutoff_hz = cutoff_hz.max(10.0);
    }

    #[inline]
    fn next_sample(&mut self, sample: f32, g: f32, k: f32) -> f32 {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        // Keep the prewarped cutoff below Nyquist or g blows up.
        let cutoff = self.cutoff_hz.min(ctx.sample_rate * 0.45);
        let g = (PI * cutoff / ctx.sample_rate).tan();
        let k = 2.0 - 2.0 * self.resonance;

        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, g, k);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorBlock;

    fn rms(buffer: &[f32]) -> f32 {
        (buffer.iter().map(|s| s * s).sum::<f32>() / buffer.len() as f32).sqrt()
    }

    #[test]
    fn attenuates_content_above_cutoff() {
        let ctx = RenderCtx::from_freq(48_000.0, 8_000.0, 1.0);
        let mut osc = OscillatorBlock::sine();
        let mut buffer = vec![0.0f32; 4096];
        osc.render(&mut buffer, &ctx);
        let open_level = rms(&buffer[1024..]);

        let mut filter = LowPassFilter::new(500.0, 0.0);
        filter.render(&mut buffer, &ctx);
        let filtered_level = rms(&buffer[1024..]);

        assert!(
            filtered_level < open_level * 0.2,
            "8kHz through a 500Hz low-pass should drop hard ({open_level} -> {filtered_level})"
        );
    }

    #[test]
    fn passes_content_below_cutoff() {
        let ctx = RenderCtx::from_freq(48_000.0, 200.0, 1.0);
        let mut osc = OscillatorBlock::sine();
        let mut buffer = vec![0.0f32; 4096];
        osc.render(&mut buffer, &ctx);
        let open_level = rms(&buffer[1024..]);

        let mut filter = LowPassFilter::new(4_000.0, 0.0);
        filter.render(&mut buffer, &ctx);
        let filtered_level = rms(&buffer[1024..]);

        assert!(filtered_level > open_level * 0.8);
    }

    #[test]
    fn stays_finite_at_high_resonance() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut osc = OscillatorBlock::sawtooth();
        let mut buffer = vec![0.0f32; 8192];
        osc.render(&mut buffer, &ctx);

        let mut filter = LowPassFilter::new(1_000.0, 0.95);
        filter.render(&mut buffer, &ctx);

        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
