//! Fixed-size bank of loop layers.

use serde::{Deserialize, Serialize};

use crate::error::StudioError;
use crate::pitch::Note;
use crate::voice::Instrument;

/// Tempo bounds for an individual layer.
pub const MIN_TEMPO_BPM: f32 = 60.0;
pub const MAX_TEMPO_BPM: f32 = 200.0;

/// One captured note onset, relative to the start of its take.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub note: Note,
    pub instrument: Instrument,
    pub velocity: f32,
    /// Milliseconds since the take began.
    pub offset_ms: u32,
}

/// One loop layer: a take plus its own tempo and transport flag.
///
/// Offsets are stored exactly as recorded. Tempo is applied at schedule
/// time as a ratio against the session's reference BPM, so retempoing a
/// layer never rewrites its notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub index: usize,
    pub notes: Vec<NoteEvent>,
    pub tempo_bpm: f32,
    /// Duration of the take in ms, as measured at record time. The loop
    /// cycle length; kept even when longer than the last onset so trailing
    /// silence survives a round trip.
    pub length_ms: u32,
    #[serde(skip)]
    pub is_playing: bool,
}

impl Layer {
    fn new(index: usize, tempo_bpm: f32) -> Self {
        Self {
            index,
            notes: Vec::new(),
            tempo_bpm,
            length_ms: 0,
            is_playing: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// The bank of layers. Slots start unused and are created on demand; an
/// index at or past `max_layers` is an error everywhere.
#[derive(Debug)]
pub struct LayerStore {
    slots: Vec<Option<Layer>>,
    default_tempo_bpm: f32,
}

impl LayerStore {
    pub fn new(max_layers: usize, default_tempo_bpm: f32) -> Self {
        Self {
            slots: (0..max_layers).map(|_| None).collect(),
            default_tempo_bpm,
        }
    }

    pub fn max_layers(&self) -> usize {
        self.slots.len()
    }

    fn check(&self, index: usize) -> Result<(), StudioError> {
        if index >= self.slots.len() {
            return Err(StudioError::InvalidLayer {
                index,
                max: self.slots.len(),
            });
        }
        Ok(())
    }

    /// Fetch a layer. `Ok(None)` means the index is valid but nothing has
    /// been recorded there yet.
    pub fn get(&self, index: usize) -> Result<Option<&Layer>, StudioError> {
        self.check(index)?;
        Ok(self.slots[index].as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Result<Option<&mut Layer>, StudioError> {
        self.check(index)?;
        Ok(self.slots[index].as_mut())
    }

    /// Create the slot's layer if absent and return it.
    pub fn ensure_layer(&mut self, index: usize) -> Result<&mut Layer, StudioError> {
        self.check(index)?;
        let tempo = self.default_tempo_bpm;
        Ok(self.slots[index].get_or_insert_with(|| Layer::new(index, tempo)))
    }

    /// Overwrite a layer's take. Tempo and transport state are preserved
    /// across re-records; only the notes change.
    pub fn replace_notes(
        &mut self,
        index: usize,
        notes: Vec<NoteEvent>,
        length_ms: u32,
    ) -> Result<(), StudioError> {
        let layer = self.ensure_layer(index)?;
        layer.notes = notes;
        layer.length_ms = length_ms;
        Ok(())
    }

    pub fn set_tempo(&mut self, index: usize, tempo_bpm: f32) -> Result<(), StudioError> {
        let layer = self.ensure_layer(index)?;
        layer.tempo_bpm = tempo_bpm.clamp(MIN_TEMPO_BPM, MAX_TEMPO_BPM);
        Ok(())
    }

    pub fn set_playing(&mut self, index: usize, playing: bool) -> Result<(), StudioError> {
        if let Some(layer) = self.get_mut(index)? {
            // An empty layer can never be marked playing.
            layer.is_playing = playing && !layer.notes.is_empty();
        }
        Ok(())
    }

    /// Drop a layer's notes but keep the slot and its tempo.
    pub fn clear(&mut self, index: usize) -> Result<(), StudioError> {
        if let Some(layer) = self.get_mut(index)? {
            layer.notes.clear();
            layer.length_ms = 0;
            layer.is_playing = false;
        }
        Ok(())
    }

    pub fn clear_all(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Indices of layers that currently have a take.
    pub fn recorded_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .flatten()
            .filter(|layer| !layer.is_empty())
            .map(|layer| layer.index)
            .collect()
    }

    pub fn playing_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .flatten()
            .filter(|layer| layer.is_playing)
            .map(|layer| layer.index)
            .collect()
    }

    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.slots.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::Note;

    fn event(offset_ms: u32) -> NoteEvent {
        NoteEvent {
            note: "C4".parse::<Note>().unwrap(),
            instrument: Instrument::Synth,
            velocity: 1.0,
            offset_ms,
        }
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut store = LayerStore::new(4, 120.0);
        assert_eq!(
            store.ensure_layer(4),
            Err(StudioError::InvalidLayer { index: 4, max: 4 })
        );
        assert!(store.get(99).is_err());
    }

    #[test]
    fn unrecorded_slot_reads_as_none() {
        let store = LayerStore::new(4, 120.0);
        assert_eq!(store.get(2).unwrap(), None);
    }

    #[test]
    fn rerecord_keeps_tempo_and_transport() {
        let mut store = LayerStore::new(4, 120.0);
        store.replace_notes(1, vec![event(0)], 400).unwrap();
        store.set_tempo(1, 90.0).unwrap();
        store.set_playing(1, true).unwrap();

        store.replace_notes(1, vec![event(100), event(200)], 600).unwrap();

        let layer = store.get(1).unwrap().unwrap();
        assert_eq!(layer.notes.len(), 2);
        assert_eq!(layer.length_ms, 600);
        assert!((layer.tempo_bpm - 90.0).abs() < 1e-6);
        assert!(layer.is_playing);
    }

    #[test]
    fn tempo_clamps_to_bounds() {
        let mut store = LayerStore::new(4, 120.0);
        store.set_tempo(0, 10.0).unwrap();
        assert!((store.get(0).unwrap().unwrap().tempo_bpm - MIN_TEMPO_BPM).abs() < 1e-6);
        store.set_tempo(0, 999.0).unwrap();
        assert!((store.get(0).unwrap().unwrap().tempo_bpm - MAX_TEMPO_BPM).abs() < 1e-6);
    }

    #[test]
    fn clear_empties_but_keeps_the_slot() {
        let mut store = LayerStore::new(4, 120.0);
        store.replace_notes(0, vec![event(0)], 100).unwrap();
        store.set_tempo(0, 150.0).unwrap();

        store.clear(0).unwrap();

        let layer = store.get(0).unwrap().unwrap();
        assert!(layer.is_empty());
        assert!(!layer.is_playing);
        assert!((layer.tempo_bpm - 150.0).abs() < 1e-6);
    }

    #[test]
    fn recorded_indices_skip_empty_layers() {
        let mut store = LayerStore::new(4, 120.0);
        store.replace_notes(0, vec![event(0)], 100).unwrap();
        store.ensure_layer(1).unwrap();
        store.replace_notes(3, vec![event(50)], 200).unwrap();
        assert_eq!(store.recorded_indices(), vec![0, 3]);
    }
}
