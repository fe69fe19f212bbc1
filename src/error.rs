use thiserror::Error;

/// Errors surfaced by the studio engine and its stores.
///
/// Expected synthesis races (releasing a voice that already died, stopping a
/// loop that is not running) are handled as no-ops and never reach this type.
/// What does reach it are data-integrity problems the caller should hear
/// about: bad layer indices and invalid state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudioError {
    #[error("layer index {index} out of range (0..{max})")]
    InvalidLayer { index: usize, max: usize },

    #[error("a recording session is already open")]
    AlreadyRecording,

    #[error("layer {index} has no notes to play")]
    EmptyLayer { index: usize },

    #[error("unrecognized note name '{0}'")]
    BadNote(String),
}
