// Church modes and their accidental licences.
//
// The six modes of the 16th-century system, each on its traditional
// (untransposed) final. A mode is a step pattern from the final plus at most
// one licensed accidental: the raised leading tone of Dorian, Mixolydian, and
// Aeolian (cadence only), or the B♭ of Lydian (anywhere, to soften the
// F–B tritone).
//
// This module provides:
// - Mode definitions with their scale degree patterns
// - Spelled scale membership and degree lookup
// - The licensed-accidental table and its positional rule
// - Leading-tone and "mi contra fa" (tritone removal) tests shared by the
//   mode detector (analysis.rs) and the rule validator (rules.rs)
//
// All tables are `match` arms over `Mode`: read-only, process-wide, and
// fixed at compile time.

use crate::pitch::{Accidental, Interval, Letter, Pitch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six church modes, each defined by their interval pattern from the final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// D Dorian: D E F G A B C D
    Dorian,
    /// E Phrygian: E F G A B C D E (half-step from 1 to 2)
    Phrygian,
    /// F Lydian: F G A B C D E F (raised 4th, usually softened to B♭)
    Lydian,
    /// G Mixolydian: G A B C D E F G
    Mixolydian,
    /// A Aeolian: A B C D E F G A
    Aeolian,
    /// C Ionian: C D E F G A B C
    Ionian,
}

/// Where in the line a licensed accidental may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Only on the penultimate note (cadential leading tone).
    Penultimate,
    Anywhere,
}

/// The one chromatic pitch a mode tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LicensedAccidental {
    pub letter: Letter,
    pub accidental: Accidental,
    pub placement: Placement,
}

impl LicensedAccidental {
    /// Same letter and accidental, any octave.
    pub fn matches(&self, pitch: Pitch) -> bool {
        pitch.letter == self.letter && pitch.accidental == self.accidental
    }

    /// Whether the accidental may sit at `index` in a line of `len` notes.
    pub fn allowed_at(&self, index: usize, len: usize) -> bool {
        match self.placement {
            Placement::Anywhere => true,
            Placement::Penultimate => len >= 2 && index == len - 2,
        }
    }
}

/// Authentic or plagal, by the range a line covers relative to its final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Authentic,
    Plagal,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Aeolian,
        Mode::Ionian,
    ];

    /// Semitone intervals from the final to each scale degree.
    /// Returns 7 intervals representing degrees 1-7.
    pub fn intervals(self) -> [i32; 7] {
        match self {
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Mode::Ionian => [0, 2, 4, 5, 7, 9, 11],
        }
    }

    pub fn final_letter(self) -> Letter {
        match self {
            Mode::Dorian => Letter::D,
            Mode::Phrygian => Letter::E,
            Mode::Lydian => Letter::F,
            Mode::Mixolydian => Letter::G,
            Mode::Aeolian => Letter::A,
            Mode::Ionian => Letter::C,
        }
    }

    pub fn licensed_accidental(self) -> Option<LicensedAccidental> {
        let (letter, accidental, placement) = match self {
            Mode::Dorian => (Letter::C, Accidental::Sharp, Placement::Penultimate),
            Mode::Lydian => (Letter::B, Accidental::Flat, Placement::Anywhere),
            Mode::Mixolydian => (Letter::F, Accidental::Sharp, Placement::Penultimate),
            Mode::Aeolian => (Letter::G, Accidental::Sharp, Placement::Penultimate),
            Mode::Phrygian | Mode::Ionian => return None,
        };
        Some(LicensedAccidental {
            letter,
            accidental,
            placement,
        })
    }

    /// Whether a line ending on `pitch` can be in this mode.
    pub fn matches_final(self, pitch: Pitch) -> bool {
        pitch.letter == self.final_letter() && !pitch.is_altered()
    }

    /// Scale degree (0 = final .. 6 = seventh) of a pitch's letter.
    pub fn degree_of(self, pitch: Pitch) -> usize {
        (pitch.letter.index() - self.final_letter().index()).rem_euclid(7) as usize
    }

    /// Whether the pitch, as spelled, belongs to the mode's diatonic scale.
    pub fn contains(self, pitch: Pitch) -> bool {
        let final_pc = self.final_letter().natural_semitone();
        let offset = (pitch.pitch_class() - final_pc).rem_euclid(12);
        offset == self.intervals()[self.degree_of(pitch)]
    }

    pub fn is_licensed(self, pitch: Pitch) -> bool {
        self.licensed_accidental()
            .is_some_and(|licence| licence.matches(pitch))
    }

    /// In the scale, or the mode's licensed accidental.
    pub fn admits(self, pitch: Pitch) -> bool {
        self.contains(pitch) || self.is_licensed(pitch)
    }

    /// Correctly spelled scale pitch at a diatonic index.
    pub fn scale_pitch(self, diatonic: i32) -> Pitch {
        let letter = Letter::from_index(diatonic);
        let final_pc = self.final_letter().natural_semitone();
        let degree = (letter.index() - self.final_letter().index()).rem_euclid(7) as usize;
        let target_pc = (final_pc + self.intervals()[degree]).rem_euclid(12);
        // Alteration needed to move the natural letter onto the target, in -6..=5.
        let alteration = (target_pc - letter.natural_semitone() + 6).rem_euclid(12) - 6;
        let accidental = Accidental::from_alteration(alteration).unwrap_or(Accidental::Natural);
        Pitch::from_diatonic(diatonic, accidental)
    }

    /// All scale pitches whose MIDI numbers fall in `low..=high`, ascending.
    pub fn scale_pitches(self, low: i32, high: i32) -> Vec<Pitch> {
        // Letters can sit up to two semitones from their sounding pitch, so
        // scan a slightly wider diatonic window and filter by MIDI number.
        let first = (low - 2).div_euclid(12) * 7 - 7;
        let last = (high + 2).div_euclid(12) * 7 + 7;
        (first..=last)
            .map(|d| self.scale_pitch(d))
            .filter(|p| (low..=high).contains(&p.midi()))
            .collect()
    }

    /// Whether `pitch` is a leading tone to `final_pitch`: spelled one letter
    /// below and sounding one semitone below.
    pub fn is_leading_tone(self, pitch: Pitch, final_pitch: Pitch) -> bool {
        self.degree_of(pitch) == 6
            && (final_pitch.pitch_class() - pitch.pitch_class()).rem_euclid(12) == 1
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// B♭: the soft-hexachord flat, available anywhere to correct mi contra fa.
pub fn is_soft_b(pitch: Pitch) -> bool {
    pitch.letter == Letter::B && pitch.accidental == Accidental::Flat
}

/// Whether the accidental on `pitch` exists to remove a tritone: its natural
/// spelling forms a tritone with at least one of `against`, and the altered
/// spelling forms none.
pub fn removes_tritone(pitch: Pitch, against: &[Pitch]) -> bool {
    if !pitch.is_altered() {
        return false;
    }
    let natural = pitch.natural_form();
    let natural_clashes = against
        .iter()
        .any(|&other| Interval::between(natural, other).is_tritone());
    let altered_clashes = against
        .iter()
        .any(|&other| Interval::between(pitch, other).is_tritone());
    natural_clashes && !altered_clashes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(letter: Letter, octave: i32) -> Pitch {
        Pitch::natural(letter, octave)
    }

    #[test]
    fn test_d_dorian_pitches() {
        let mode = Mode::Dorian;
        for letter in Letter::ALL {
            assert!(mode.contains(n(letter, 4)), "{letter:?} should be in D Dorian");
        }
        assert!(!mode.contains(Pitch::new(Letter::E, Accidental::Flat, 4)));
        assert!(!mode.contains(Pitch::new(Letter::F, Accidental::Sharp, 4)));
        assert!(!mode.contains(Pitch::new(Letter::C, Accidental::Sharp, 5)));
        assert!(mode.admits(Pitch::new(Letter::C, Accidental::Sharp, 5)));
    }

    #[test]
    fn test_scale_degree() {
        let mode = Mode::Dorian;
        assert_eq!(mode.degree_of(n(Letter::D, 4)), 0);
        assert_eq!(mode.degree_of(n(Letter::A, 4)), 4);
        assert_eq!(mode.degree_of(n(Letter::C, 3)), 6);
    }

    #[test]
    fn test_phrygian_half_step() {
        let mode = Mode::Phrygian;
        let e4 = n(Letter::E, 4);
        let f4 = n(Letter::F, 4);
        assert_eq!(e4.semitones_to(f4), 1);
        assert_eq!(mode.degree_of(f4), 1);
        assert!(mode.licensed_accidental().is_none());
        // D is a whole step below E: no leading tone in Phrygian.
        assert!(!mode.is_leading_tone(n(Letter::D, 4), e4));
    }

    #[test]
    fn test_scale_pitches_in_range() {
        // D4 (62) .. D5 (74) in Dorian: the white-key octave.
        let pitches = Mode::Dorian.scale_pitches(62, 74);
        let names: Vec<String> = pitches.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, ["D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5"]);
    }

    #[test]
    fn test_licences() {
        let dorian = Mode::Dorian.licensed_accidental().unwrap();
        assert!(dorian.matches(Pitch::new(Letter::C, Accidental::Sharp, 3)));
        assert!(dorian.allowed_at(7, 9));
        assert!(!dorian.allowed_at(3, 9));
        let lydian = Mode::Lydian.licensed_accidental().unwrap();
        assert!(lydian.allowed_at(3, 9));
        assert!(Mode::Ionian.licensed_accidental().is_none());
    }

    #[test]
    fn test_leading_tone() {
        let d4 = n(Letter::D, 4);
        assert!(Mode::Dorian.is_leading_tone(Pitch::new(Letter::C, Accidental::Sharp, 5), d4));
        assert!(!Mode::Dorian.is_leading_tone(n(Letter::C, 5), d4));
        // D♭ sounds a semitone below D but is not spelled as a seventh.
        assert!(!Mode::Dorian.is_leading_tone(Pitch::new(Letter::D, Accidental::Flat, 4), d4));
    }

    #[test]
    fn test_removes_tritone() {
        let b_flat = Pitch::new(Letter::B, Accidental::Flat, 4);
        assert!(removes_tritone(b_flat, &[n(Letter::F, 4)]));
        assert!(!removes_tritone(b_flat, &[n(Letter::A, 4)]));
        // The flat does not help against E: B♭–E is itself a tritone.
        assert!(!removes_tritone(b_flat, &[n(Letter::F, 4), n(Letter::E, 5)]));
        assert!(!removes_tritone(n(Letter::B, 4), &[n(Letter::F, 4)]));
        assert!(is_soft_b(b_flat));
    }
}
