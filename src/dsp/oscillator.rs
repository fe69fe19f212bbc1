use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
Oscillator Waveforms
====================

The oscillator is the raw sound source of every voice. Phase runs 0..1 and
wraps; each waveform is a pure function of phase:

  Sine:      sin(2π·phase)          pure tone, fundamental only
  Sawtooth:  2·phase − 1            bright and buzzy, all harmonics
  Square:    ±1 at half phase       hollow, odd harmonics only
  Triangle:  folded ramp            soft, weak odd harmonics

The phase increment per sample is frequency / sample_rate, so pitch follows
the render context and nothing needs recomputing when the frequency changes.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Sawtooth,
    Square,
    Triangle,
}

/// Block-rendering oscillator with persistent phase.
pub struct OscillatorBlock {
    waveform: Waveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(Waveform::Sawtooth)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(Waveform::Triangle)
    }

    #[inline]
    fn sample_at(&self, phase: f32) -> f32 {
        match self.waveform {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
        }
    }

    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let phase_inc = ctx.frequency / ctx.sample_rate;

        for sample in out.iter_mut() {
            *sample = self.sample_at(self.phase);
            self.phase += phase_inc;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }
}
