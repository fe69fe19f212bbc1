//! The studio engine: live triggering, recording, and loop playback.
//!
//! All timing runs on a logical millisecond clock. Triggered notes sound
//! immediately and are optionally captured by the recorder; loop playback
//! replays captured takes by scheduling each onset on the tick queue.
//!
//! Tempo is a scheduling concern only. A layer's tempo (against the
//! session's reference BPM) stretches or squeezes the spacing between its
//! onsets; it never touches the frequency, envelope, or effect parameters
//! of any voice. That separation is the core invariant of the engine.

pub mod clock;
pub mod scheduler;

use crate::effects::EffectRack;
use crate::error::StudioError;
use crate::io::{AudioSink, CpalSink, NullSink, VoiceId, VoiceParams};
use crate::pitch::Note;
use crate::session::{LayerStore, NoteEvent, Recorder};
use crate::store::{timestamp_now_ms, Composition, SCHEMA_VERSION};
use crate::voice::{build_voice, Instrument};

use clock::{Clock, SystemClock};
use scheduler::{Task, TickScheduler};

/// Reference tempo bounds for the session.
pub const MIN_REFERENCE_BPM: f32 = 60.0;
pub const MAX_REFERENCE_BPM: f32 = 180.0;

/// Extra silence appended to a loop pass when a take's recorded length
/// would leave no air after its last onset.
const LOOP_TAIL_MS: u64 = 500;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub max_layers: usize,
    pub reference_bpm: f32,
    /// Used by the silent fallback sink; a real device reports its own rate.
    pub sample_rate: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_layers: 4,
            reference_bpm: 120.0,
            sample_rate: 48_000.0,
        }
    }
}

/// Mutable session settings, separate from the stores they steer.
pub struct StudioState {
    pub instrument: Instrument,
    pub master_volume: f32,
    pub reference_bpm: f32,
    pub active_layer: usize,
    pub effects: EffectRack,
}

type HighlightFn = Box<dyn FnMut(Note, Instrument)>;

/// The engine. Owns every store and the audio sink; callers drive it from
/// one thread and call [`StudioEngine::tick`] frequently (every few ms) to
/// drain due work.
pub struct StudioEngine {
    state: StudioState,
    layers: LayerStore,
    recorder: Recorder,
    scheduler: TickScheduler,
    clock: Box<dyn Clock>,
    sink: Box<dyn AudioSink>,
    /// Per-layer loop generation. Bumped on stop/clear; queued cycle tasks
    /// from an older generation are dropped when they fire.
    loop_generations: Vec<u64>,
    next_voice_id: VoiceId,
    highlight: Option<HighlightFn>,
}

impl StudioEngine {
    /// Open the default output device, or fall back to a silent sink so
    /// recording, looping, and persistence still work headless.
    pub fn new(config: EngineConfig) -> Self {
        let sink: Box<dyn AudioSink> = match CpalSink::try_new() {
            Ok(sink) => Box::new(sink),
            Err(err) => {
                log::warn!("audio unavailable ({err}), continuing silently");
                Box::new(NullSink::new(config.sample_rate))
            }
        };
        Self::with_parts(config, sink, Box::new(SystemClock::new()))
    }

    /// Assemble from explicit parts. This is how tests inject a manual
    /// clock and an observing sink.
    pub fn with_parts(
        config: EngineConfig,
        mut sink: Box<dyn AudioSink>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let reference_bpm = config.reference_bpm.clamp(MIN_REFERENCE_BPM, MAX_REFERENCE_BPM);
        let master_volume = 0.8;
        sink.set_master_gain(master_volume);

        Self {
            state: StudioState {
                instrument: Instrument::default(),
                master_volume,
                reference_bpm,
                active_layer: 0,
                effects: EffectRack::default(),
            },
            layers: LayerStore::new(config.max_layers, reference_bpm),
            recorder: Recorder::new(),
            scheduler: TickScheduler::new(),
            clock,
            sink,
            loop_generations: vec![0; config.max_layers],
            next_voice_id: 0,
            highlight: None,
        }
    }

    pub fn state(&self) -> &StudioState {
        &self.state
    }

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Register a callback fired for every sounded note, live or looped.
    /// UIs use it to flash the key that just played.
    pub fn set_highlight(&mut self, callback: HighlightFn) {
        self.highlight = Some(callback);
    }

    // -- live triggering ---------------------------------------------------

    /// Sound a note now with the current instrument, and capture it when a
    /// recording session is open.
    pub fn trigger_note(&mut self, note: Note) {
        let now = self.clock.now_ms();
        let instrument = self.state.instrument;
        let velocity = 1.0;
        self.sound_note(note, instrument, velocity, now);
        self.recorder.capture(note, instrument, velocity, now);
    }

    fn sound_note(&mut self, note: Note, instrument: Instrument, velocity: f32, now_ms: u64) {
        let id = self.next_voice_id;
        self.next_voice_id += 1;

        // The rack is materialized here, at sound time. A looped note picks
        // up whatever the effects are NOW, not what they were when recorded.
        let voice = crate::effects::compose_chain(&self.state.effects, build_voice(instrument));
        self.sink.play(
            id,
            voice,
            VoiceParams {
                frequency: note.frequency(),
                velocity,
            },
        );

        let lifetime = instrument.envelope().lifetime_ms;
        self.scheduler
            .schedule(now_ms + lifetime, Task::ReleaseVoice { id });

        if let Some(callback) = &mut self.highlight {
            callback(note, instrument);
        }
    }

    // -- tick --------------------------------------------------------------

    /// Drain and execute every task due at the current clock time.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        while let Some((fired_at, task)) = self.scheduler.pop_due(now) {
            match task {
                Task::LoopNote {
                    layer,
                    note,
                    instrument,
                    velocity,
                } => {
                    log::trace!("loop note {note} from layer {layer}");
                    self.sound_note(note, instrument, velocity, fired_at);
                }
                Task::LoopCycle { layer, generation } => {
                    if self.loop_generations[layer] != generation {
                        continue; // loop was stopped or restarted since
                    }
                    // Re-arm from the task's own fire time so cycles never
                    // drift with tick latency.
                    self.queue_loop_pass(layer, fired_at);
                }
                Task::ReleaseVoice { id } => self.sink.release(id),
            }
        }
    }

    // -- recording ---------------------------------------------------------

    /// Open a recording session targeting the active layer.
    pub fn start_recording(&mut self) -> Result<(), StudioError> {
        let target = self.state.active_layer;
        self.layers.ensure_layer(target)?;
        self.recorder.start(target, self.clock.now_ms())
    }

    /// Close the session. An empty take is discarded and the target layer
    /// keeps its previous notes; returns the layer that received a take.
    pub fn stop_recording(&mut self) -> Result<Option<usize>, StudioError> {
        let Some((layer, notes, length_ms)) = self.recorder.stop(self.clock.now_ms()) else {
            return Ok(None);
        };
        if notes.is_empty() {
            log::debug!("discarding empty take for layer {layer}");
            return Ok(None);
        }
        self.layers.replace_notes(layer, notes, length_ms)?;
        Ok(Some(layer))
    }

    // -- looping -----------------------------------------------------------

    /// Start looping a layer. An empty or unrecorded layer is rejected
    /// with [`StudioError::EmptyLayer`] so front ends can tell the user;
    /// a layer already looping is left alone.
    pub fn start_layer_loop(&mut self, index: usize) -> Result<(), StudioError> {
        let layer = self
            .layers
            .get(index)?
            .filter(|l| !l.is_empty())
            .ok_or(StudioError::EmptyLayer { index })?;
        if layer.is_playing {
            return Ok(());
        }

        self.loop_generations[index] += 1;
        self.layers.set_playing(index, true)?;
        self.queue_loop_pass(index, self.clock.now_ms());
        Ok(())
    }

    /// Stop a layer's loop. Notes already queued for this pass still fire,
    /// so the loop finishes its phrase instead of cutting mid-gesture; only
    /// the next cycle is cancelled.
    pub fn stop_layer_loop(&mut self, index: usize) -> Result<(), StudioError> {
        self.layers.set_playing(index, false)?;
        self.loop_generations[index] += 1;
        Ok(())
    }

    /// Start every layer that has a take. Layers already looping keep
    /// their phase.
    pub fn start_all_loops(&mut self) {
        for index in self.layers.recorded_indices() {
            // recorded_indices only yields valid, non-empty layers
            let _ = self.start_layer_loop(index);
        }
    }

    pub fn stop_all_loops(&mut self) {
        for index in self.layers.playing_indices() {
            let _ = self.stop_layer_loop(index);
        }
    }

    /// Schedule one full pass of a layer's take, tempo-scaled, plus the
    /// cycle task that re-arms the next pass.
    fn queue_loop_pass(&mut self, index: usize, base_ms: u64) {
        let Ok(Some(layer)) = self.layers.get(index) else {
            return;
        };
        if layer.is_empty() {
            return;
        }

        // Faster layer tempo packs onsets tighter; the notes themselves are
        // untouched.
        let scale = self.state.reference_bpm / layer.tempo_bpm;
        let scale_ms = |ms: u32| (ms as f32 * scale).round() as u64;

        let events: Vec<NoteEvent> = layer.notes.clone();
        let last_onset = events.iter().map(|e| e.offset_ms).max().unwrap_or(0);
        let period = scale_ms(layer.length_ms).max(scale_ms(last_onset) + LOOP_TAIL_MS);
        let generation = self.loop_generations[index];

        for event in events {
            self.scheduler.schedule(
                base_ms + scale_ms(event.offset_ms),
                Task::LoopNote {
                    layer: index,
                    note: event.note,
                    instrument: event.instrument,
                    velocity: event.velocity,
                },
            );
        }
        self.scheduler.schedule(
            base_ms + period,
            Task::LoopCycle {
                layer: index,
                generation,
            },
        );
    }

    // -- layer management --------------------------------------------------

    pub fn set_active_layer(&mut self, index: usize) -> Result<(), StudioError> {
        self.layers.ensure_layer(index)?;
        self.state.active_layer = index;
        Ok(())
    }

    pub fn set_layer_tempo(&mut self, index: usize, tempo_bpm: f32) -> Result<(), StudioError> {
        self.layers.set_tempo(index, tempo_bpm)
        // A running loop picks the new tempo up on its next cycle.
    }

    pub fn clear_layer(&mut self, index: usize) -> Result<(), StudioError> {
        self.loop_generations
            .get_mut(index)
            .map(|g| *g += 1)
            .ok_or(StudioError::InvalidLayer {
                index,
                max: self.layers.max_layers(),
            })?;
        self.layers.clear(index)
    }

    pub fn clear_all_layers(&mut self) {
        for generation in &mut self.loop_generations {
            *generation += 1;
        }
        self.layers.clear_all();
    }

    // -- session settings --------------------------------------------------

    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.state.instrument = instrument;
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.state.master_volume = volume.clamp(0.0, 1.0);
        self.sink.set_master_gain(self.state.master_volume);
    }

    /// Volume as the UI exposes it: a 0..=100 slider mapped to linear gain.
    pub fn set_master_volume_percent(&mut self, percent: u8) {
        self.set_master_volume(percent.min(100) as f32 / 100.0);
    }

    /// Change the session reference tempo. Every looping layer's effective
    /// rate shifts together on its next cycle.
    pub fn set_reference_bpm(&mut self, bpm: f32) {
        self.state.reference_bpm = bpm.clamp(MIN_REFERENCE_BPM, MAX_REFERENCE_BPM);
    }

    pub fn effects_mut(&mut self) -> &mut EffectRack {
        &mut self.state.effects
    }

    // -- persistence -------------------------------------------------------

    /// Snapshot the active layer as a savable composition: its notes plus
    /// the instrument, effects, and tempo they were played with.
    pub fn snapshot_composition(&self, name: &str) -> Result<Composition, StudioError> {
        let active = self.state.active_layer;
        let (notes, tempo_bpm) = match self.layers.get(active)? {
            Some(layer) => (layer.notes.clone(), layer.tempo_bpm),
            None => (Vec::new(), self.state.reference_bpm),
        };
        Ok(Composition {
            schema_version: SCHEMA_VERSION,
            name: name.to_owned(),
            notes,
            instrument: self.state.instrument,
            effects: self.state.effects.to_configs(),
            tempo_bpm,
            timestamp_ms: timestamp_now_ms(),
        })
    }

    /// Load a composition into the active layer. The layer's loop stops
    /// and its take is replaced; instrument and effects become current.
    pub fn apply_composition(&mut self, composition: &Composition) -> Result<(), StudioError> {
        let active = self.state.active_layer;
        self.stop_layer_loop(active)?;

        self.state.instrument = composition.instrument;
        self.state.effects = EffectRack::from_configs(&composition.effects);

        let length_ms = composition
            .notes
            .iter()
            .map(|e| e.offset_ms)
            .max()
            .unwrap_or(0);
        self.layers
            .replace_notes(active, composition.notes.clone(), length_ms)?;
        self.layers.set_tempo(active, composition.tempo_bpm)?;
        Ok(())
    }
}
