// Pitch and interval arithmetic for two-voice modal counterpoint.
//
// A `Pitch` is a spelled note: diatonic letter, accidental, and octave. All
// arithmetic is exact integer math over two coordinates:
// - the MIDI number (semitones), which governs what the ear hears, and
// - the diatonic index (letter steps), which governs how an interval is
//   spelled.
//
// Spelling is never normalized. C♯ and D♭ share a MIDI number but form
// different intervals (an augmented unison against C versus a minor second),
// and modal legality depends on that difference.
//
// This module provides:
// - `Pitch`, `Letter`, `Accidental` value types
// - `Interval` with number/quality/name classification
// - `classify()` mapping a vertical interval to Perfect/Imperfect (or None)
// - `Motion` classification between two consecutive note-pairs
//
// Used by mode.rs for scale membership, rules.rs for every legality check,
// and search.rs for candidate ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Diatonic letter name, in scale order from C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Position within the octave (C = 0 .. B = 6).
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Letter at a (possibly negative or out-of-octave) diatonic position.
    pub fn from_index(index: i32) -> Letter {
        Letter::ALL[index.rem_euclid(7) as usize]
    }

    /// Semitones above C of the unaltered letter.
    pub fn natural_semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Semitone offset applied to the natural letter.
    pub fn alteration(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    pub fn from_alteration(alteration: i32) -> Option<Accidental> {
        match alteration {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            0 => Some(Accidental::Natural),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "𝄫",
            Accidental::Flat => "♭",
            Accidental::Natural => "",
            Accidental::Sharp => "♯",
            Accidental::DoubleSharp => "𝄪",
        }
    }
}

/// Octaves a pitch may be written in. MIDI 0..=127 spans C-1 to G9.
pub const MIN_OCTAVE: i32 = -1;
pub const MAX_OCTAVE: i32 = 9;

/// A spelled pitch. Octave numbering follows scientific pitch notation
/// (C4 = middle C = MIDI 60).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub letter: Letter,
    pub accidental: Accidental,
    pub octave: i32,
}

impl Pitch {
    pub fn new(letter: Letter, accidental: Accidental, octave: i32) -> Self {
        Pitch {
            letter,
            accidental,
            octave,
        }
    }

    pub fn natural(letter: Letter, octave: i32) -> Self {
        Pitch::new(letter, Accidental::Natural, octave)
    }

    /// Build the pitch at a diatonic index with the given accidental.
    pub fn from_diatonic(diatonic: i32, accidental: Accidental) -> Self {
        Pitch::new(Letter::from_index(diatonic), accidental, diatonic.div_euclid(7))
    }

    /// Whether the octave lies within `MIN_OCTAVE..=MAX_OCTAVE`. Pitch
    /// arithmetic assumes this; lines check it when they are built.
    pub fn in_range(self) -> bool {
        (MIN_OCTAVE..=MAX_OCTAVE).contains(&self.octave)
    }

    /// MIDI note number (may fall just outside 0..=127 at the octave limits).
    pub fn midi(self) -> i32 {
        (self.octave + 1) * 12 + self.letter.natural_semitone() + self.accidental.alteration()
    }

    /// Letter steps above C0.
    pub fn diatonic(self) -> i32 {
        self.octave * 7 + self.letter.index()
    }

    pub fn pitch_class(self) -> i32 {
        self.midi().rem_euclid(12)
    }

    pub fn is_altered(self) -> bool {
        self.accidental != Accidental::Natural
    }

    /// The same letter and octave without its accidental.
    pub fn natural_form(self) -> Pitch {
        Pitch::natural(self.letter, self.octave)
    }

    /// Signed semitones from `self` up to `other`.
    pub fn semitones_to(self, other: Pitch) -> i32 {
        other.midi() - self.midi()
    }

    pub fn interval_to(self, other: Pitch) -> Interval {
        Interval::between(self, other)
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.midi()
            .cmp(&other.midi())
            .then(self.diatonic().cmp(&other.diatonic()))
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}{}", self.letter, self.accidental.symbol(), self.octave)
    }
}

/// Signed semitone distance from `a` to `b`.
pub fn semitone_distance(a: Pitch, b: Pitch) -> i32 {
    a.semitones_to(b)
}

/// Spelled interval from `a` to `b`.
pub fn diatonic_interval(a: Pitch, b: Pitch) -> Interval {
    Interval::between(a, b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    Perfect,
    Major,
    Minor,
    Augmented,
    Diminished,
}

/// Simple (octave-reduced) interval names recognized by the style. Anything
/// augmented or diminished other than the tritone is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalName {
    Unison,
    MinorSecond,
    MajorSecond,
    MinorThird,
    MajorThird,
    PerfectFourth,
    Tritone,
    PerfectFifth,
    MinorSixth,
    MajorSixth,
    MinorSeventh,
    MajorSeventh,
    Octave,
    Other,
}

/// A directed interval: signed letter steps and signed semitones from a
/// lower-indexed pitch to another. Direction follows the letter steps; a
/// spelled interval is "upward" when its letters ascend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub steps: i32,
    pub semitones: i32,
}

impl Interval {
    pub fn between(from: Pitch, to: Pitch) -> Interval {
        Interval {
            steps: to.diatonic() - from.diatonic(),
            semitones: to.midi() - from.midi(),
        }
    }

    pub fn abs_steps(self) -> i32 {
        self.steps.abs()
    }

    pub fn abs_semitones(self) -> i32 {
        self.semitones.abs()
    }

    /// Audible direction: +1 up, -1 down, 0 none.
    pub fn direction(self) -> i32 {
        self.semitones.signum()
    }

    /// Generic number counting both ends (unison = 1, tenth = 10).
    pub fn number(self) -> i32 {
        self.abs_steps() + 1
    }

    /// Letter steps within the octave (0 = unison/octave .. 6 = seventh).
    pub fn simple_steps(self) -> i32 {
        self.abs_steps() % 7
    }

    pub fn is_step(self) -> bool {
        self.abs_steps() == 1
    }

    /// A melodic move of a fourth or more.
    pub fn is_leap(self) -> bool {
        self.abs_steps() >= 3
    }

    /// Semitone size measured in the direction of the letter steps, with the
    /// octaves removed.
    fn reduced_semitones(self) -> i32 {
        let sized = if self.steps == 0 {
            self.semitones.abs()
        } else {
            self.semitones * self.steps.signum()
        };
        sized - 12 * (self.abs_steps() / 7)
    }

    /// Quality, or None for doubly-altered spellings the style never uses.
    pub fn quality(self) -> Option<Quality> {
        let reduced = self.reduced_semitones();
        match self.simple_steps() {
            0 | 3 | 4 => {
                let perfect = [0, 0, 0, 5, 7][self.simple_steps() as usize];
                match reduced - perfect {
                    0 => Some(Quality::Perfect),
                    1 => Some(Quality::Augmented),
                    -1 => Some(Quality::Diminished),
                    _ => None,
                }
            }
            steps => {
                let major = [0, 2, 4, 0, 0, 9, 11][steps as usize];
                match reduced - major {
                    0 => Some(Quality::Major),
                    -1 => Some(Quality::Minor),
                    1 => Some(Quality::Augmented),
                    -2 => Some(Quality::Diminished),
                    _ => None,
                }
            }
        }
    }

    /// Augmented fourth or diminished fifth, simple or compound.
    pub fn is_tritone(self) -> bool {
        matches!(
            (self.simple_steps(), self.quality()),
            (3, Some(Quality::Augmented)) | (4, Some(Quality::Diminished))
        )
    }

    pub fn name(self) -> IntervalName {
        use IntervalName::*;
        if self.is_tritone() {
            return Tritone;
        }
        match (self.simple_steps(), self.quality()) {
            (0, Some(Quality::Perfect)) if self.abs_steps() == 0 => Unison,
            (0, Some(Quality::Perfect)) => Octave,
            (1, Some(Quality::Minor)) => MinorSecond,
            (1, Some(Quality::Major)) => MajorSecond,
            (2, Some(Quality::Minor)) => MinorThird,
            (2, Some(Quality::Major)) => MajorThird,
            (3, Some(Quality::Perfect)) => PerfectFourth,
            (4, Some(Quality::Perfect)) => PerfectFifth,
            (5, Some(Quality::Minor)) => MinorSixth,
            (5, Some(Quality::Major)) => MajorSixth,
            (6, Some(Quality::Minor)) => MinorSeventh,
            (6, Some(Quality::Major)) => MajorSeventh,
            _ => Other,
        }
    }
}

/// Consonance class of a vertical interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalClass {
    Perfect,
    Imperfect,
}

impl IntervalClass {
    pub fn index(self) -> usize {
        match self {
            IntervalClass::Perfect => 0,
            IntervalClass::Imperfect => 1,
        }
    }
}

/// Classify a vertical interval. Returns None for everything the style
/// forbids outright: seconds, fourths, tritones, sevenths, any augmented or
/// diminished spelling, and anything wider than an eleventh.
pub fn classify(interval: Interval) -> Option<IntervalClass> {
    if interval.number() > 11 {
        return None;
    }
    match (interval.simple_steps(), interval.quality()?) {
        (0, Quality::Perfect) | (4, Quality::Perfect) => Some(IntervalClass::Perfect),
        (2, Quality::Major | Quality::Minor) | (5, Quality::Major | Quality::Minor) => {
            Some(IntervalClass::Imperfect)
        }
        _ => None,
    }
}

/// Interval between two simultaneous pitches, measured upward from the lower.
pub fn vertical(a: Pitch, b: Pitch) -> Interval {
    if a <= b {
        Interval::between(a, b)
    } else {
        Interval::between(b, a)
    }
}

/// Relative motion of two voices moving from one note-pair to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motion {
    /// Same direction, same letter distance (the generic interval is kept).
    Parallel,
    /// Same direction, different distance.
    Similar,
    /// Opposite directions.
    Contrary,
    /// At least one voice holds its pitch.
    Oblique,
}

impl Motion {
    pub fn index(self) -> usize {
        match self {
            Motion::Parallel => 0,
            Motion::Similar => 1,
            Motion::Contrary => 2,
            Motion::Oblique => 3,
        }
    }

    /// Classify the motion of voice A (`a_from` → `a_to`) against voice B.
    pub fn between(a_from: Pitch, a_to: Pitch, b_from: Pitch, b_to: Pitch) -> Motion {
        let a = Interval::between(a_from, a_to);
        let b = Interval::between(b_from, b_to);
        if a.direction() == 0 || b.direction() == 0 {
            Motion::Oblique
        } else if a.direction() != b.direction() {
            Motion::Contrary
        } else if a.steps == b.steps {
            Motion::Parallel
        } else {
            Motion::Similar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(letter: Letter, octave: i32) -> Pitch {
        Pitch::natural(letter, octave)
    }

    #[test]
    fn test_midi_numbers() {
        assert_eq!(n(Letter::C, 4).midi(), 60);
        assert_eq!(n(Letter::A, 4).midi(), 69);
        assert_eq!(Pitch::new(Letter::C, Accidental::Sharp, 5).midi(), 73);
        assert_eq!(Pitch::new(Letter::B, Accidental::Flat, 3).midi(), 58);
        // B♯3 sounds as C4 but keeps its lower letter.
        let b_sharp = Pitch::new(Letter::B, Accidental::Sharp, 3);
        assert_eq!(b_sharp.midi(), 60);
        assert!(b_sharp < n(Letter::C, 4));
    }

    #[test]
    fn test_octave_range() {
        assert!(n(Letter::C, MIN_OCTAVE).in_range());
        assert!(n(Letter::G, MAX_OCTAVE).in_range());
        assert!(!n(Letter::C, MAX_OCTAVE + 1).in_range());
        assert!(!n(Letter::E, 400_000_000).in_range());
        assert!(!n(Letter::E, i32::MIN).in_range());
    }

    #[test]
    fn test_from_diatonic_handles_octaves() {
        assert_eq!(Pitch::from_diatonic(4 * 7 + 1, Accidental::Natural), n(Letter::D, 4));
        assert_eq!(Pitch::from_diatonic(-1, Accidental::Natural), n(Letter::B, -1));
    }

    #[test]
    fn test_interval_names() {
        let d4 = n(Letter::D, 4);
        assert_eq!(diatonic_interval(d4, n(Letter::A, 4)).name(), IntervalName::PerfectFifth);
        assert_eq!(diatonic_interval(d4, n(Letter::F, 4)).name(), IntervalName::MinorThird);
        assert_eq!(diatonic_interval(d4, n(Letter::D, 5)).name(), IntervalName::Octave);
        assert_eq!(diatonic_interval(d4, d4).name(), IntervalName::Unison);
        let e4 = n(Letter::E, 4);
        let c_sharp5 = Pitch::new(Letter::C, Accidental::Sharp, 5);
        assert_eq!(diatonic_interval(e4, c_sharp5).name(), IntervalName::MajorSixth);
        assert_eq!(diatonic_interval(n(Letter::F, 4), n(Letter::B, 4)).name(), IntervalName::Tritone);
        assert_eq!(diatonic_interval(n(Letter::B, 3), n(Letter::F, 4)).name(), IntervalName::Tritone);
    }

    #[test]
    fn test_descending_interval_keeps_quality() {
        let down = diatonic_interval(n(Letter::A, 4), n(Letter::D, 4));
        assert_eq!(down.steps, -4);
        assert_eq!(down.semitones, -7);
        assert_eq!(down.quality(), Some(Quality::Perfect));
        assert_eq!(down.direction(), -1);
    }

    #[test]
    fn test_enharmonic_spelling_matters() {
        let c4 = n(Letter::C, 4);
        let c_sharp = Pitch::new(Letter::C, Accidental::Sharp, 4);
        let d_flat = Pitch::new(Letter::D, Accidental::Flat, 4);
        assert_eq!(semitone_distance(c4, c_sharp), semitone_distance(c4, d_flat));
        assert_eq!(diatonic_interval(c4, c_sharp).quality(), Some(Quality::Augmented));
        assert_eq!(diatonic_interval(c4, d_flat).name(), IntervalName::MinorSecond);
        // A diminished fourth sounds like a major third but is not one.
        let dim4 = diatonic_interval(Pitch::new(Letter::C, Accidental::Sharp, 4), n(Letter::F, 4));
        assert_eq!(dim4.abs_semitones(), 4);
        assert_eq!(classify(dim4), None);
    }

    #[test]
    fn test_classify() {
        let d4 = n(Letter::D, 4);
        assert_eq!(classify(vertical(d4, d4)), Some(IntervalClass::Perfect));
        assert_eq!(classify(vertical(d4, n(Letter::A, 4))), Some(IntervalClass::Perfect));
        assert_eq!(classify(vertical(d4, n(Letter::D, 5))), Some(IntervalClass::Perfect));
        assert_eq!(classify(vertical(d4, n(Letter::F, 4))), Some(IntervalClass::Imperfect));
        assert_eq!(classify(vertical(d4, n(Letter::B, 4))), Some(IntervalClass::Imperfect));
        // Tenth is fine, twelfth is beyond the eleventh limit.
        assert_eq!(classify(vertical(d4, n(Letter::F, 5))), Some(IntervalClass::Imperfect));
        assert_eq!(classify(vertical(d4, n(Letter::A, 5))), None);
        assert_eq!(classify(vertical(d4, n(Letter::G, 4))), None); // P4
        assert_eq!(classify(vertical(d4, n(Letter::E, 4))), None); // M2
        assert_eq!(classify(vertical(d4, n(Letter::C, 5))), None); // m7
    }

    #[test]
    fn test_vertical_is_order_independent() {
        let a = n(Letter::F, 3);
        let b = n(Letter::D, 4);
        assert_eq!(vertical(a, b), vertical(b, a));
        assert_eq!(vertical(a, b).name(), IntervalName::MajorSixth);
    }

    #[test]
    fn test_motion_classification() {
        let (d4, e4, f4, a4, b4, g4) = (
            n(Letter::D, 4),
            n(Letter::E, 4),
            n(Letter::F, 4),
            n(Letter::A, 4),
            n(Letter::B, 4),
            n(Letter::G, 4),
        );
        assert_eq!(Motion::between(a4, b4, d4, e4), Motion::Parallel);
        assert_eq!(Motion::between(a4, b4, d4, f4), Motion::Similar);
        assert_eq!(Motion::between(a4, g4, d4, e4), Motion::Contrary);
        assert_eq!(Motion::between(a4, a4, d4, e4), Motion::Oblique);
        assert_eq!(Motion::between(a4, a4, d4, d4), Motion::Oblique);
    }

    #[test]
    fn test_display() {
        assert_eq!(Pitch::new(Letter::C, Accidental::Sharp, 5).to_string(), "C♯5");
        assert_eq!(Pitch::new(Letter::B, Accidental::Flat, 3).to_string(), "B♭3");
        assert_eq!(n(Letter::D, 4).to_string(), "D4");
    }
}
