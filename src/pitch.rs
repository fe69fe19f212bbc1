//! Note identifiers and the pitch table.
//!
//! A [`Note`] is a pitch class plus an octave ("C#4"). Frequencies come from
//! twelve-tone equal temperament anchored at A4 = 440 Hz, so the table never
//! needs to be stored: it is a pure function of the semitone index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StudioError;

/// The twelve pitch classes, sharps only (flats normalize on parse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    /// Semitone offset from C within one octave.
    pub fn semitone(self) -> i32 {
        match self {
            PitchClass::C => 0,
            PitchClass::Cs => 1,
            PitchClass::D => 2,
            PitchClass::Ds => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::Fs => 6,
            PitchClass::G => 7,
            PitchClass::Gs => 8,
            PitchClass::A => 9,
            PitchClass::As => 10,
            PitchClass::B => 11,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

/// A playable note: pitch class plus octave. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub pitch_class: PitchClass,
    pub octave: i8,
}

impl Note {
    pub fn new(pitch_class: PitchClass, octave: i8) -> Self {
        Self {
            pitch_class,
            octave,
        }
    }

    /// Frequency in Hz under equal temperament, A4 = 440 Hz.
    pub fn frequency(&self) -> f32 {
        // A4 sits 9 semitones above C4; count distance from there.
        let semitones_from_a4 =
            (self.octave as i32 - 4) * 12 + self.pitch_class.semitone() - PitchClass::A.semitone();
        440.0 * 2.0_f32.powf(semitones_from_a4 as f32 / 12.0)
    }

    /// Parse a note name like "C4", "F#3", or "Bb5".
    pub fn parse(name: &str) -> Result<Self, StudioError> {
        let bad = || StudioError::BadNote(name.to_string());

        let mut chars = name.chars();
        let letter = chars.next().ok_or_else(bad)?.to_ascii_uppercase();
        let rest: String = chars.collect();

        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest.as_str()),
        };

        let base = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(bad()),
        };

        let octave: i8 = octave_str.parse().map_err(|_| bad())?;

        // Normalize so Cb4 becomes B3 and B#3 becomes C4.
        let semitone = base + accidental;
        let (semitone, octave) = if semitone < 0 {
            (semitone + 12, octave - 1)
        } else if semitone > 11 {
            (semitone - 12, octave + 1)
        } else {
            (semitone, octave)
        };

        let pitch_class = match semitone {
            0 => PitchClass::C,
            1 => PitchClass::Cs,
            2 => PitchClass::D,
            3 => PitchClass::Ds,
            4 => PitchClass::E,
            5 => PitchClass::F,
            6 => PitchClass::Fs,
            7 => PitchClass::G,
            8 => PitchClass::Gs,
            9 => PitchClass::A,
            10 => PitchClass::As,
            11 => PitchClass::B,
            _ => unreachable!(),
        };

        Ok(Note::new(pitch_class, octave))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::parse(s)
    }
}
