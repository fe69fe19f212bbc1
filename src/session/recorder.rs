//! Capture of live note triggers into a pending take.

use crate::error::StudioError;
use crate::pitch::Note;
use crate::session::layers::NoteEvent;
use crate::voice::Instrument;

struct RecordingSession {
    target_layer: usize,
    start_ms: u64,
    buffer: Vec<NoteEvent>,
}

/// Records note onsets against a wall-clock start time.
///
/// The recorder is a passive tap: the engine sounds the note either way and
/// calls [`Recorder::capture`] when a session is open. Timing comes from the
/// engine's clock, so offsets are in the same millisecond domain the
/// scheduler replays in.
#[derive(Default)]
pub struct Recorder {
    session: Option<RecordingSession>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn target_layer(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.target_layer)
    }

    /// Open a session. Only one can be open at a time.
    pub fn start(&mut self, target_layer: usize, now_ms: u64) -> Result<(), StudioError> {
        if self.session.is_some() {
            return Err(StudioError::AlreadyRecording);
        }
        self.session = Some(RecordingSession {
            target_layer,
            start_ms: now_ms,
            buffer: Vec::new(),
        });
        Ok(())
    }

    /// Append a note onset to the open session. No-op when closed.
    pub fn capture(&mut self, note: Note, instrument: Instrument, velocity: f32, now_ms: u64) {
        if let Some(session) = &mut self.session {
            let offset_ms = now_ms.saturating_sub(session.start_ms) as u32;
            session.buffer.push(NoteEvent {
                note,
                instrument,
                velocity,
                offset_ms,
            });
        }
    }

    /// Close the session and hand back the take: target layer, captured
    /// notes, and the take length in ms. `None` when nothing was open.
    pub fn stop(&mut self, now_ms: u64) -> Option<(usize, Vec<NoteEvent>, u32)> {
        let session = self.session.take()?;
        let length_ms = now_ms.saturating_sub(session.start_ms) as u32;
        Some((session.target_layer, session.buffer, length_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c4() -> Note {
        "C4".parse().unwrap()
    }

    #[test]
    fn offsets_are_relative_to_session_start() {
        let mut recorder = Recorder::new();
        recorder.start(0, 1_000).unwrap();
        recorder.capture(c4(), Instrument::Synth, 1.0, 1_000);
        recorder.capture(c4(), Instrument::Synth, 1.0, 1_350);

        let (layer, notes, length_ms) = recorder.stop(1_800).unwrap();
        assert_eq!(layer, 0);
        assert_eq!(notes[0].offset_ms, 0);
        assert_eq!(notes[1].offset_ms, 350);
        assert_eq!(length_ms, 800);
        assert!(!recorder.is_recording());
    }

    #[test]
    fn second_start_is_rejected() {
        let mut recorder = Recorder::new();
        recorder.start(0, 0).unwrap();
        assert_eq!(recorder.start(1, 10), Err(StudioError::AlreadyRecording));
        // The original session survives the rejected start.
        assert_eq!(recorder.target_layer(), Some(0));
    }

    #[test]
    fn capture_without_session_is_ignored() {
        let mut recorder = Recorder::new();
        recorder.capture(c4(), Instrument::Piano, 0.8, 500);
        assert!(recorder.stop(600).is_none());
    }

    #[test]
    fn empty_take_still_reports_its_length() {
        let mut recorder = Recorder::new();
        recorder.start(2, 100).unwrap();
        let (layer, notes, length_ms) = recorder.stop(400).unwrap();
        assert_eq!(layer, 2);
        assert!(notes.is_empty());
        assert_eq!(length_ms, 300);
    }
}
