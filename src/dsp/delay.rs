use crate::MAX_DELAY_SAMPLES;

/// Circular delay line.
///
/// Capacity is fixed at construction; reads are clamped to it, which is what
/// enforces the engine-wide echo-time cap. `read_interpolated` supports
/// fractional delays for modulated effects (chorus), where stepping between
/// whole-sample delays would zipper.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new() -> Self {
        Self::with_capacity(MAX_DELAY_SAMPLES)
    }

    pub fn with_capacity(samples: usize) -> Self {
        Self {
            buffer: vec![0.0; samples.max(2)],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Push one sample and return the one delayed by `delay_samples`.
    pub fn next_sample(&mut self, sample: f32, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay_samples = delay_samples.min(len - 1);

        self.buffer[self.write_pos] = sample;
        let read_pos = (self.write_pos + len - delay_samples) % len;
        let delayed = self.buffer[read_pos];

        self.write_pos = (self.write_pos + 1) % len;
        delayed
    }

    /// Read at a fractional delay without writing, linearly interpolated.
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay_samples = delay_samples.clamp(1.0, (len - 1) as f32);

        let whole = delay_samples.floor() as usize;
        let frac = delay_samples - whole as f32;

        let a = self.buffer[(self.write_pos + len - whole) % len];
        let b = self.buffer[(self.write_pos + len - whole - 1) % len];
        a * (1.0 - frac) + b * frac
    }

    /// Write one sample and advance the write position.
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}
