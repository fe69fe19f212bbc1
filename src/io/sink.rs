//! Where rendered voices become sound.
//!
//! The engine talks to an [`AudioSink`]; the default implementation opens a
//! cpal output stream and hands voices to the callback over a lock-free
//! ring. When no output device exists the engine falls back to a
//! [`NullSink`], so every other feature keeps working silently.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use crate::graph::node::{GraphNode, RenderCtx};
use crate::io::{VoiceId, VoiceParams};
use crate::MAX_BLOCK_SIZE;

/// Capacity of the command ring. Commands are small and drained every
/// callback, so overflow means the UI thread is wildly ahead of audio.
const COMMAND_QUEUE_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("no default output device available")]
    NoDevice,

    #[error("failed to fetch default output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

/// Output surface the engine renders into.
///
/// Not `Send`: the cpal stream is pinned to the thread that built it, and
/// the engine lives on that thread too.
pub trait AudioSink {
    /// Hand a fully composed voice to the output. The sink owns it until
    /// release or until the voice reports itself inactive.
    fn play(&mut self, id: VoiceId, voice: Box<dyn GraphNode>, params: VoiceParams);

    /// Tear a voice down. Unknown ids are ignored; the voice may have
    /// already retired itself.
    fn release(&mut self, id: VoiceId);

    fn set_master_gain(&mut self, gain: f32);

    fn sample_rate(&self) -> f32;
}

enum SinkCommand {
    Play {
        id: VoiceId,
        voice: Box<dyn GraphNode>,
        params: VoiceParams,
    },
    Release {
        id: VoiceId,
    },
    SetMasterGain(f32),
}

struct ActiveVoice {
    id: VoiceId,
    node: Box<dyn GraphNode>,
    ctx: RenderCtx,
}

/// Device-backed sink. The audio callback owns the voices; this side only
/// pushes commands into the ring.
pub struct CpalSink {
    producer: rtrb::Producer<SinkCommand>,
    sample_rate: f32,
    // Held for its Drop; the stream stops when the sink goes away.
    _stream: cpal::Stream,
}

impl CpalSink {
    pub fn try_new() -> Result<Self, SinkError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SinkError::NoDevice)?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let (producer, mut consumer) = rtrb::RingBuffer::<SinkCommand>::new(COMMAND_QUEUE_LEN);

        let mut voices: Vec<ActiveVoice> = Vec::with_capacity(32);
        let mut master_gain = 0.8f32;
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut voice_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                while let Ok(command) = consumer.pop() {
                    match command {
                        SinkCommand::Play { id, voice, params } => {
                            voices.push(ActiveVoice {
                                id,
                                node: voice,
                                ctx: RenderCtx::from_freq(
                                    sample_rate,
                                    params.frequency,
                                    params.velocity,
                                ),
                            });
                        }
                        SinkCommand::Release { id } => {
                            voices.retain(|v| v.id != id);
                        }
                        SinkCommand::SetMasterGain(gain) => master_gain = gain,
                    }
                }

                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);

                    let block = &mut render_buf[..frames];
                    block.fill(0.0);

                    for voice in voices.iter_mut() {
                        let vbuf = &mut voice_buf[..frames];
                        vbuf.fill(0.0);
                        voice.node.render_block(vbuf, &voice.ctx);
                        crate::dsp::mix::sum_in_place(block, vbuf);
                    }
                    voices.retain(|v| v.node.is_active());

                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        let s = s * master_gain;
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                    }

                    frames_written += frames;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            producer,
            sample_rate,
            _stream: stream,
        })
    }

    fn push(&mut self, command: SinkCommand) {
        // Dropping under pressure beats blocking the UI thread against the
        // audio callback.
        if self.producer.push(command).is_err() {
            log::warn!("audio command queue full, dropping command");
        }
    }
}

impl AudioSink for CpalSink {
    fn play(&mut self, id: VoiceId, voice: Box<dyn GraphNode>, params: VoiceParams) {
        self.push(SinkCommand::Play { id, voice, params });
    }

    fn release(&mut self, id: VoiceId) {
        self.push(SinkCommand::Release { id });
    }

    fn set_master_gain(&mut self, gain: f32) {
        self.push(SinkCommand::SetMasterGain(gain.clamp(0.0, 1.0)));
    }

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Silent sink for headless environments. Discards voices but counts plays,
/// which keeps the rest of the engine observable without a device.
pub struct NullSink {
    sample_rate: f32,
    plays: u64,
}

impl NullSink {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            plays: 0,
        }
    }

    pub fn plays(&self) -> u64 {
        self.plays
    }
}

impl AudioSink for NullSink {
    fn play(&mut self, _id: VoiceId, _voice: Box<dyn GraphNode>, _params: VoiceParams) {
        self.plays += 1;
    }

    fn release(&mut self, _id: VoiceId) {}

    fn set_master_gain(&mut self, _gain: f32) {}

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}
