// Mode detection: which mode and species a cantus firmus is written in.
//
// The detector narrows the six modes down to one in a fixed order:
// 1. the final (last note) picks the modes whose final letter matches;
// 2. every pitch of the line must be in that mode's scale or be its licensed
//    accidental (otherwise `NonModal`);
// 3. the ambitus (range relative to the final) decides authentic vs plagal
//    (`AmbitusMismatch` if it fits neither);
// 4. cadence evidence from the last two notes is preferred when it separates
//    candidates;
// 5. every accidental actually present must be a penultimate leading tone or
//    a tritone correction, or the mode is dropped and the remaining set is
//    re-examined (`IllegalAccidental` once nothing is left);
// 6. more than one survivor is reported as `Ambiguous`, never guessed.
//
// Consumed by search.rs (generation) and rules.rs (validation), which both
// start by calling `analyse_mode`.

use crate::line::Cantus;
use crate::mode::{Mode, Species, removes_tritone};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ModalError {
    #[error("no mode on this final admits every pitch of the cantus")]
    NonModal,
    #[error("the cantus range fits neither an authentic nor a plagal ambitus")]
    AmbitusMismatch,
    #[error("an accidental in the cantus is neither a cadential leading tone nor a tritone correction")]
    IllegalAccidental,
    #[error("more than one mode fits the cantus equally well")]
    Ambiguous,
}

/// Boundary tolerance, in semitones, for the ambitus windows.
const AMBITUS_TOLERANCE: i32 = 1;

/// Lowest and highest notes of a line, as signed semitone offsets from its
/// final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambitus {
    pub lowest: i32,
    pub highest: i32,
}

impl Ambitus {
    pub fn of(cantus: &Cantus) -> Ambitus {
        let final_midi = cantus.final_pitch().midi();
        Ambitus {
            lowest: cantus.lowest().midi() - final_midi,
            highest: cantus.highest().midi() - final_midi,
        }
    }

    /// Authentic: from about a step below the final up to its octave.
    /// Plagal: reaching down about a fourth and up no more than a fifth.
    pub fn species(self) -> Option<Species> {
        if self.lowest >= -2 - AMBITUS_TOLERANCE {
            (self.highest <= 12 + AMBITUS_TOLERANCE).then_some(Species::Authentic)
        } else if (self.lowest + 5).abs() <= AMBITUS_TOLERANCE
            && self.highest <= 7 + AMBITUS_TOLERANCE
        {
            Some(Species::Plagal)
        } else {
            None
        }
    }
}

/// Infer the mode and species of a cantus firmus.
pub fn analyse_mode(cantus: &Cantus) -> Result<(Mode, Species), ModalError> {
    let final_pitch = cantus.final_pitch();
    let mut pool: Vec<Mode> = Mode::ALL
        .iter()
        .copied()
        .filter(|mode| mode.matches_final(final_pitch))
        .filter(|mode| cantus.notes().iter().all(|&p| mode.admits(p)))
        .collect();
    if pool.is_empty() {
        debug!("no mode on final {final_pitch} admits the cantus");
        return Err(ModalError::NonModal);
    }

    loop {
        let ambitus = Ambitus::of(cantus);
        let species = ambitus.species().ok_or(ModalError::AmbitusMismatch)?;

        let supported: Vec<Mode> = pool
            .iter()
            .copied()
            .filter(|&mode| cadence_supports(mode, species, cantus))
            .collect();
        let preferred = if supported.is_empty() {
            pool.clone()
        } else {
            supported
        };

        let rejected: Vec<Mode> = preferred
            .iter()
            .copied()
            .filter(|&mode| !accidentals_justified(mode, cantus))
            .collect();
        if rejected.is_empty() {
            let mode = pick_unique(&preferred)?;
            debug!("cantus analysed as {mode} {species} (ambitus {ambitus:?})");
            return Ok((mode, species));
        }

        debug!("dropping {rejected:?}: unjustified accidental");
        pool.retain(|mode| !rejected.contains(mode));
        if pool.is_empty() {
            return Err(ModalError::IllegalAccidental);
        }
    }
}

/// Whether the terminal cadence supports `mode`: the final is approached by
/// step, or the penultimate note sits on the species' cadential degree
/// (final or fifth for authentic, third for plagal).
fn cadence_supports(mode: Mode, species: Species, cantus: &Cantus) -> bool {
    let penultimate = cantus.penultimate();
    let approach = penultimate.interval_to(cantus.final_pitch());
    if approach.is_step() {
        return true;
    }
    let degree = mode.degree_of(penultimate);
    match species {
        Species::Authentic => degree == 0 || degree == 4,
        Species::Plagal => degree == 2,
    }
}

/// Every altered note is either the licensed leading tone on the penultimate
/// note, or removes a tritone against a neighbouring note or the final.
fn accidentals_justified(mode: Mode, cantus: &Cantus) -> bool {
    let notes = cantus.notes();
    let final_pitch = cantus.final_pitch();
    notes.iter().enumerate().all(|(i, &pitch)| {
        if !pitch.is_altered() {
            return true;
        }
        let leading_tone = i == cantus.penultimate_index()
            && mode.is_licensed(pitch)
            && mode.is_leading_tone(pitch, final_pitch);
        if leading_tone {
            return true;
        }
        let mut against = vec![final_pitch];
        if i > 0 {
            against.push(notes[i - 1]);
        }
        if let Some(&next) = notes.get(i + 1) {
            against.push(next);
        }
        removes_tritone(pitch, &against)
    })
}

fn pick_unique(modes: &[Mode]) -> Result<Mode, ModalError> {
    match modes {
        [mode] => Ok(*mode),
        _ => Err(ModalError::Ambiguous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::{Accidental, Letter, Pitch};

    fn n(letter: Letter, octave: i32) -> Pitch {
        Pitch::natural(letter, octave)
    }

    fn cantus(notes: &[Pitch]) -> Cantus {
        Cantus::new(notes.to_vec()).unwrap()
    }

    fn dorian_scale_line() -> Cantus {
        use Letter::*;
        cantus(&[
            n(D, 4),
            n(E, 4),
            n(F, 4),
            n(G, 4),
            n(A, 4),
            n(G, 4),
            n(F, 4),
            n(E, 4),
            n(D, 4),
        ])
    }

    #[test]
    fn test_dorian_authentic() {
        assert_eq!(
            analyse_mode(&dorian_scale_line()),
            Ok((Mode::Dorian, Species::Authentic))
        );
    }

    #[test]
    fn test_dorian_plagal() {
        use Letter::*;
        let line = cantus(&[
            n(D, 4),
            n(F, 4),
            n(E, 4),
            n(C, 4),
            n(A, 3),
            n(C, 4),
            n(D, 4),
            n(F, 4),
            n(E, 4),
            n(D, 4),
        ]);
        assert_eq!(Ambitus::of(&line), Ambitus { lowest: -5, highest: 3 });
        assert_eq!(analyse_mode(&line), Ok((Mode::Dorian, Species::Plagal)));
    }

    #[test]
    fn test_unlicensed_sharp_is_non_modal() {
        use Letter::*;
        let line = cantus(&[
            n(D, 4),
            n(E, 4),
            Pitch::new(F, Accidental::Sharp, 4),
            n(G, 4),
            n(E, 4),
            n(D, 4),
        ]);
        assert_eq!(analyse_mode(&line), Err(ModalError::NonModal));
    }

    #[test]
    fn test_altered_final_is_non_modal() {
        use Letter::*;
        let line = cantus(&[n(D, 4), Pitch::new(C, Accidental::Sharp, 4)]);
        assert_eq!(analyse_mode(&line), Err(ModalError::NonModal));
    }

    #[test]
    fn test_range_too_wide() {
        use Letter::*;
        let line = cantus(&[
            n(D, 4),
            n(F, 4),
            n(A, 4),
            n(D, 5),
            n(F, 5),
            n(E, 5),
            n(D, 5),
            n(A, 4),
            n(F, 4),
            n(E, 4),
            n(D, 4),
        ]);
        assert_eq!(analyse_mode(&line), Err(ModalError::AmbitusMismatch));
    }

    #[test]
    fn test_range_too_low() {
        use Letter::*;
        let line = cantus(&[n(D, 4), n(A, 3), n(G, 3), n(A, 3), n(E, 4), n(D, 4)]);
        assert_eq!(analyse_mode(&line), Err(ModalError::AmbitusMismatch));
    }

    #[test]
    fn test_cadential_leading_tone_accepted() {
        use Letter::*;
        let line = cantus(&[
            n(D, 4),
            n(F, 4),
            n(E, 4),
            n(D, 4),
            Pitch::new(C, Accidental::Sharp, 4),
            n(D, 4),
        ]);
        assert_eq!(analyse_mode(&line), Ok((Mode::Dorian, Species::Authentic)));
    }

    #[test]
    fn test_misplaced_leading_tone_is_illegal() {
        use Letter::*;
        let line = cantus(&[
            n(D, 4),
            Pitch::new(C, Accidental::Sharp, 4),
            n(D, 4),
            n(E, 4),
            n(F, 4),
            n(E, 4),
            n(D, 4),
        ]);
        assert_eq!(analyse_mode(&line), Err(ModalError::IllegalAccidental));
    }

    #[test]
    fn test_lydian_b_flat_removes_tritone() {
        use Letter::*;
        let line = cantus(&[
            n(F, 4),
            n(G, 4),
            n(A, 4),
            Pitch::new(B, Accidental::Flat, 4),
            n(A, 4),
            n(G, 4),
            n(F, 4),
        ]);
        assert_eq!(analyse_mode(&line), Ok((Mode::Lydian, Species::Authentic)));
    }

    #[test]
    fn test_ambitus_windows() {
        let authentic = Ambitus { lowest: -3, highest: 13 };
        assert_eq!(authentic.species(), Some(Species::Authentic));
        let plagal = Ambitus { lowest: -4, highest: 8 };
        assert_eq!(plagal.species(), Some(Species::Plagal));
        assert_eq!(Ambitus { lowest: -4, highest: 9 }.species(), None);
        assert_eq!(Ambitus { lowest: 0, highest: 14 }.species(), None);
        assert_eq!(Ambitus { lowest: -7, highest: 5 }.species(), None);
    }

    #[test]
    fn test_multiple_survivors_are_ambiguous() {
        assert_eq!(pick_unique(&[Mode::Dorian]), Ok(Mode::Dorian));
        assert_eq!(
            pick_unique(&[Mode::Dorian, Mode::Aeolian]),
            Err(ModalError::Ambiguous)
        );
    }

    #[test]
    fn test_cadence_support() {
        use Letter::*;
        let stepwise = dorian_scale_line();
        assert!(cadence_supports(Mode::Dorian, Species::Authentic, &stepwise));
        let from_fifth = cantus(&[n(D, 4), n(A, 4), n(D, 4)]);
        assert!(cadence_supports(Mode::Dorian, Species::Authentic, &from_fifth));
        assert!(!cadence_supports(Mode::Dorian, Species::Plagal, &from_fifth));
    }
}
