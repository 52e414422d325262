// The two voices of a first-species exercise.
//
// `Cantus` is the fixed, given line: immutable once built, and guaranteed to
// hold at least two notes (a cadence needs a penultimate and a final).
// `Counterpoint` is the added line, one note per cantus note, built left to
// right by the generator (search.rs) or supplied whole to the validator
// (rules.rs). `Position` fixes which side of the cantus the added voice sits
// on for the whole exercise.

use crate::pitch::{MAX_OCTAVE, MIN_OCTAVE, Pitch};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CantusError {
    #[error("a cantus needs at least 2 notes, got {len}")]
    TooShort { len: usize },
    #[error("note {index} is in octave {octave}, outside {MIN_OCTAVE}..={MAX_OCTAVE}")]
    OctaveOutOfRange { index: usize, octave: i32 },
}

/// First note whose octave lies outside the playable range, as
/// `(index, octave)`.
pub fn first_out_of_range(notes: &[Pitch]) -> Option<(usize, i32)> {
    notes
        .iter()
        .position(|p| !p.in_range())
        .map(|index| (index, notes[index].octave))
}

/// The fixed voice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Pitch>", into = "Vec<Pitch>")]
pub struct Cantus {
    notes: Vec<Pitch>,
}

impl Cantus {
    pub fn new(notes: Vec<Pitch>) -> Result<Self, CantusError> {
        if notes.len() < 2 {
            return Err(CantusError::TooShort { len: notes.len() });
        }
        if let Some((index, octave)) = first_out_of_range(&notes) {
            return Err(CantusError::OctaveOutOfRange { index, octave });
        }
        Ok(Cantus { notes })
    }

    pub fn notes(&self) -> &[Pitch] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always false: construction rejects short lines.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.notes.len() - 1
    }

    pub fn penultimate_index(&self) -> usize {
        self.notes.len() - 2
    }

    pub fn final_pitch(&self) -> Pitch {
        self.notes[self.last_index()]
    }

    pub fn penultimate(&self) -> Pitch {
        self.notes[self.penultimate_index()]
    }

    pub fn lowest(&self) -> Pitch {
        self.notes.iter().copied().min().unwrap_or(self.notes[0])
    }

    pub fn highest(&self) -> Pitch {
        self.notes.iter().copied().max().unwrap_or(self.notes[0])
    }
}

impl Index<usize> for Cantus {
    type Output = Pitch;

    fn index(&self, index: usize) -> &Pitch {
        &self.notes[index]
    }
}

impl TryFrom<Vec<Pitch>> for Cantus {
    type Error = CantusError;

    fn try_from(notes: Vec<Pitch>) -> Result<Self, Self::Error> {
        Cantus::new(notes)
    }
}

impl From<Cantus> for Vec<Pitch> {
    fn from(cantus: Cantus) -> Self {
        cantus.notes
    }
}

/// The added voice. Index `i` sounds against cantus index `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counterpoint {
    notes: Vec<Pitch>,
}

impl Counterpoint {
    pub fn new(notes: Vec<Pitch>) -> Self {
        Counterpoint { notes }
    }

    pub fn notes(&self) -> &[Pitch] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Pitch> {
        self.notes.get(index).copied()
    }

    pub(crate) fn push(&mut self, pitch: Pitch) {
        self.notes.push(pitch);
    }

    pub(crate) fn pop(&mut self) -> Option<Pitch> {
        self.notes.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.notes.clear();
    }
}

impl Index<usize> for Counterpoint {
    type Output = Pitch;

    fn index(&self, index: usize) -> &Pitch {
        &self.notes[index]
    }
}

/// Which side of the cantus the counterpoint is written on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Above,
    Below,
}

impl Position {
    /// Whether `counterpoint` lies on this side of `cantus` (or meets it).
    pub fn is_on_side(self, counterpoint: Pitch, cantus: Pitch) -> bool {
        match self {
            Position::Above => counterpoint >= cantus,
            Position::Below => counterpoint <= cantus,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Above => write!(f, "above"),
            Position::Below => write!(f, "below"),
        }
    }
}

/// Space-separated note names, e.g. `D4 E4 F4`.
pub fn format_line(notes: &[Pitch]) -> String {
    notes
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Accidental, Letter};

    fn n(letter: Letter, octave: i32) -> Pitch {
        Pitch::natural(letter, octave)
    }

    #[test]
    fn test_cantus_rejects_short_lines() {
        assert_eq!(Cantus::new(vec![]), Err(CantusError::TooShort { len: 0 }));
        assert_eq!(
            Cantus::new(vec![n(Letter::D, 4)]),
            Err(CantusError::TooShort { len: 1 })
        );
        assert!(Cantus::new(vec![n(Letter::E, 4), n(Letter::D, 4)]).is_ok());
    }

    #[test]
    fn test_cantus_accessors() {
        let cantus = Cantus::new(vec![
            n(Letter::D, 4),
            n(Letter::A, 4),
            n(Letter::E, 4),
            n(Letter::D, 4),
        ])
        .unwrap();
        assert_eq!(cantus.final_pitch(), n(Letter::D, 4));
        assert_eq!(cantus.penultimate(), n(Letter::E, 4));
        assert_eq!(cantus.penultimate_index(), 2);
        assert_eq!(cantus.lowest(), n(Letter::D, 4));
        assert_eq!(cantus.highest(), n(Letter::A, 4));
        assert_eq!(cantus[1], n(Letter::A, 4));
    }

    #[test]
    fn test_cantus_json_enforces_length() {
        let json = r#"[{"letter":"D","accidental":"Natural","octave":4}]"#;
        assert!(serde_json::from_str::<Cantus>(json).is_err());

        let json = r#"[{"letter":"E","accidental":"Natural","octave":4},
                       {"letter":"D","accidental":"Natural","octave":4}]"#;
        let cantus: Cantus = serde_json::from_str(json).unwrap();
        assert_eq!(cantus.len(), 2);
    }

    #[test]
    fn test_cantus_rejects_out_of_range_octaves() {
        assert_eq!(
            Cantus::new(vec![n(Letter::E, 4), n(Letter::D, 400_000_000)]),
            Err(CantusError::OctaveOutOfRange {
                index: 1,
                octave: 400_000_000
            })
        );
        assert!(Cantus::new(vec![n(Letter::C, -1), n(Letter::G, 9)]).is_ok());

        let json = r#"[{"letter":"E","accidental":"Natural","octave":4},
                       {"letter":"D","accidental":"Natural","octave":400000000}]"#;
        assert!(serde_json::from_str::<Cantus>(json).is_err());
    }

    #[test]
    fn test_first_out_of_range() {
        assert_eq!(first_out_of_range(&[n(Letter::D, 4), n(Letter::E, 4)]), None);
        assert_eq!(
            first_out_of_range(&[n(Letter::D, 4), n(Letter::E, 10), n(Letter::F, -2)]),
            Some((1, 10))
        );
    }

    #[test]
    fn test_position_sides() {
        let d4 = n(Letter::D, 4);
        let a4 = n(Letter::A, 4);
        assert!(Position::Above.is_on_side(a4, d4));
        assert!(!Position::Below.is_on_side(a4, d4));
        assert!(Position::Below.is_on_side(d4, d4));
    }

    #[test]
    fn test_format_line() {
        let line = [n(Letter::D, 4), Pitch::new(Letter::C, Accidental::Sharp, 5)];
        assert_eq!(format_line(&line), "D4 C♯5");
    }
}
