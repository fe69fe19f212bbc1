use crate::MIN_TIME;

/*
One-Shot Amplitude Envelope
===========================

Voices in this engine are single-shot: a note is triggered, rings for a fixed
lifetime, and is torn down. There is no gate to hold or release, so the
classic ADSR collapses to two linear ramps:

  Level
   peak ┐   ╱╲
        │  ╱  ╲
        │ ╱    ╲
    0.0 └╱──────╲────→ Time
        Attack  Decay

  Attack:  0 → peak over attack_time
  Decay:   peak → 0 over decay_time

Once decay completes the envelope reports finished and stays at 0.0. It can
never be retriggered; a new note builds a new envelope.

The level is computed from elapsed samples each block rather than from cached
increments, so the envelope tracks the render context's sample rate without
invalidation logic.
*/

/// Stage of the one-shot envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Done,
}

pub struct OneShotEnvelope {
    attack_time: f32, // seconds, 0 → peak
    peak: f32,        // level reached at end of attack
    decay_time: f32,  // seconds, peak → 0
    elapsed_samples: u64,
}

impl OneShotEnvelope {
    pub fn new(attack_time: f32, peak: f32, decay_time: f32) -> Self {
        Self {
            attack_time: attack_time.max(MIN_TIME),
            peak: peak.clamp(0.0, 1.0),
            decay_time: decay_time.max(MIN_TIME),
            elapsed_samples: 0,
        }
    }

    pub fn stage(&self, sample_rate: f32) -> EnvelopeStage {
        let t = self.elapsed_samples as f32 / sample_rate;
        if t < self.attack_time {
            EnvelopeStage::Attack
        } else if t < self.attack_time + self.decay_time {
            EnvelopeStage::Decay
        } else {
            EnvelopeStage::Done
        }
    }

    pub fn is_finished(&self, sample_rate: f32) -> bool {
        self.stage(sample_rate) == EnvelopeStage::Done
    }

    #[inline]
    fn level_at(&self, t: f32) -> f32 {
        if t < self.attack_time {
            self.peak * (t / self.attack_time)
        } else {
            let into_decay = t - self.attack_time;
            if into_decay < self.decay_time {
                self.peak * (1.0 - into_decay / self.decay_time)
            } else {
                0.0
            }
        }
    }

    /// Fill `out` with envelope levels, advancing the internal position.
    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        for sample in out.iter_mut() {
            let t = self.elapsed_samples as f32 / sample_rate;
            *sample = self.level_at(t);
            self.elapsed_samples += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn render_ms(env: &mut OneShotEnvelope, ms: f32) -> Vec<f32> {
        let mut buffer = vec![0.0f32; (SR * ms / 1000.0) as usize];
        env.render(&mut buffer, SR);
        buffer
    }

    #[test]
    fn rises_to_peak_then_decays_to_zero() {
        let mut env = OneShotEnvelope::new(0.010, 0.8, 0.100);

        let attack = render_ms(&mut env, 10.0);
        let near_peak = attack[attack.len() - 1];
        assert!((near_peak - 0.8).abs() < 0.01, "peak was {near_peak}");

        let decay = render_ms(&mut env, 100.0);
        assert!(decay[decay.len() - 1] < 0.01);
        assert!(env.is_finished(SR));
    }

    #[test]
    fn finished_envelope_renders_silence() {
        let mut env = OneShotEnvelope::new(0.001, 1.0, 0.001);
        let _ = render_ms(&mut env, 10.0);
        assert!(env.is_finished(SR));

        let tail = render_ms(&mut env, 5.0);
        assert!(tail.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn levels_are_monotone_in_attack() {
        let mut env = OneShotEnvelope::new(0.020, 1.0, 0.100);
        let attack = render_ms(&mut env, 20.0);
        for pair in attack.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn timing_ignores_anything_but_its_own_parameters() {
        // Two envelopes with the same parameters produce the same curve
        // regardless of how the caller slices the blocks.
        let mut a = OneShotEnvelope::new(0.005, 0.9, 0.050);
        let mut b = OneShotEnvelope::new(0.005, 0.9, 0.050);

        let mut whole = vec![0.0f32; 512];
        a.render(&mut whole, SR);

        let mut chunked = vec![0.0f32; 512];
        for chunk in chunked.chunks_mut(100) {
            b.render(chunk, SR);
        }

        assert_eq!(whole, chunked);
    }
}
