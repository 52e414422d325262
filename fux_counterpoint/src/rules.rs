// First-species rule bank and the standalone validator.
//
// `validate_note` decides whether one candidate pitch may stand at one index
// given the counterpoint committed before it. It reads only indices below
// `index`, so the generator (search.rs) and the validator below share it
// unchanged. Rules run in a fixed order and the first failure is reported:
//
//   1. consonance   vertical class, opening/closing perfects, cadence
//   2. motion       how the vertical class may be approached
//   3. parallels    consecutive/hidden perfects, unisons taken by leap
//   4. melodic      melodic intervals, leap recovery, repetition, range
//   5. spacing      distance between the voices
//   6. accidental   leading tone or tritone correction only
//
// The numeric thresholds come from `EngineConfig`.

use crate::analysis::{ModalError, analyse_mode};
use crate::config::EngineConfig;
use crate::line::{Cantus, Counterpoint, Position, first_out_of_range};
use crate::mode::{is_soft_b, removes_tritone};
use crate::pitch::{Interval, IntervalClass, IntervalName, Motion, Pitch, Quality, classify, vertical};
use crate::search::SearchState;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    Consonance,
    Motion,
    Parallel,
    Melodic,
    Spacing,
    Accidental,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::Consonance => "consonance",
            ViolationKind::Motion => "motion",
            ViolationKind::Parallel => "parallel",
            ViolationKind::Melodic => "melodic",
            ViolationKind::Spacing => "spacing",
            ViolationKind::Accidental => "accidental",
        };
        f.write_str(name)
    }
}

/// The first rule a note broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleViolation {
    pub index: usize,
    pub kind: ViolationKind,
    pub reason: &'static str,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note {}: {} ({})", self.index, self.reason, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ValidationError {
    #[error("mode detection failed: {0}")]
    Modal(#[from] ModalError),
    #[error("cantus has {cantus} notes but the counterpoint has {counterpoint}")]
    LengthMismatch { cantus: usize, counterpoint: usize },
    #[error("counterpoint note {index} is in octave {octave}, outside the playable range")]
    OctaveOutOfRange { index: usize, octave: i32 },
    #[error("{} rule violation(s)", .0.len())]
    Violations(Vec<RuleViolation>),
}

/// Which motions may approach a vertical class, indexed by
/// `[from class][to class][motion]` with motions ordered
/// Parallel, Similar, Contrary, Oblique.
const MOTION_TABLE: [[[bool; 4]; 2]; 2] = [
    // from perfect
    [[false, false, true, true], [true, true, true, true]],
    // from imperfect
    [[false, false, true, true], [true, true, true, true]],
];

pub fn motion_permitted(from: IntervalClass, to: IntervalClass, motion: Motion) -> bool {
    MOTION_TABLE[from.index()][to.index()][motion.index()]
}

/// The previous note-pair and how both voices leave it.
struct Previous {
    counterpoint: Pitch,
    harmony: Interval,
    class: Option<IntervalClass>,
    motion: Motion,
    /// Counterpoint move into the candidate.
    melodic: Interval,
    /// Cantus move over the same span.
    cantus_melodic: Interval,
    /// The counterpoint note before `counterpoint`, if any.
    before: Option<Pitch>,
}

struct Context {
    index: usize,
    last: usize,
    penultimate: usize,
    candidate: Pitch,
    cantus_note: Pitch,
    harmony: Interval,
    class: Option<IntervalClass>,
    previous: Option<Previous>,
}

impl Context {
    fn new(state: &SearchState, candidate: Pitch, index: usize) -> Context {
        let cantus = state.cantus();
        let line = state.counterpoint();
        let cantus_note = cantus[index];
        let harmony = vertical(candidate, cantus_note);
        let previous = index
            .checked_sub(1)
            .and_then(|p| line.get(p).map(|cp| (p, cp)))
            .map(|(p, counterpoint)| {
                let cantus_prev = cantus[p];
                let harmony = vertical(counterpoint, cantus_prev);
                Previous {
                    counterpoint,
                    harmony,
                    class: classify(harmony),
                    motion: Motion::between(counterpoint, candidate, cantus_prev, cantus_note),
                    melodic: Interval::between(counterpoint, candidate),
                    cantus_melodic: Interval::between(cantus_prev, cantus_note),
                    before: p.checked_sub(1).and_then(|b| line.get(b)),
                }
            });
        Context {
            index,
            last: cantus.last_index(),
            penultimate: cantus.penultimate_index(),
            candidate,
            cantus_note,
            harmony,
            class: classify(harmony),
            previous,
        }
    }

    fn at_boundary(&self) -> bool {
        self.index == 0 || self.index == self.last
    }
}

type RuleResult = Result<(), &'static str>;

/// Check `candidate` at `index` against the committed notes before it. An
/// index past the end of the cantus has nothing to sound against and is
/// reported as a consonance violation.
pub fn validate_note(
    state: &SearchState,
    candidate: Pitch,
    index: usize,
) -> Result<(), RuleViolation> {
    if index >= state.cantus().len() {
        return Err(RuleViolation {
            index,
            kind: ViolationKind::Consonance,
            reason: "no cantus note sounds at this index",
        });
    }
    let ctx = Context::new(state, candidate, index);
    let at = |kind: ViolationKind| move |reason: &'static str| RuleViolation { index, kind, reason };

    consonance(state, &ctx).map_err(at(ViolationKind::Consonance))?;
    motion(&ctx).map_err(at(ViolationKind::Motion))?;
    parallels(&ctx).map_err(at(ViolationKind::Parallel))?;
    melodic(state, &ctx).map_err(at(ViolationKind::Melodic))?;
    spacing(state, &ctx).map_err(at(ViolationKind::Spacing))?;
    accidental(state, &ctx).map_err(at(ViolationKind::Accidental))?;
    Ok(())
}

fn consonance(state: &SearchState, ctx: &Context) -> RuleResult {
    let class = ctx.class.ok_or("dissonant or over-wide vertical interval")?;

    if ctx.at_boundary() {
        if class != IntervalClass::Perfect {
            return Err("first and last notes must form a perfect consonance");
        }
        if ctx.harmony.simple_steps() == 4 {
            let opening_above = ctx.index == 0
                && state.position() == Position::Above
                && ctx.candidate > ctx.cantus_note;
            if !opening_above {
                return Err("a fifth may only open a line written above the cantus");
            }
        }
        return Ok(());
    }

    if ctx.index == ctx.penultimate {
        let name = ctx.harmony.name();
        let (cadential, reason) = match state.position() {
            Position::Above => (
                name == IntervalName::MajorSixth
                    && ctx.harmony.abs_steps() == 5
                    && ctx.candidate > ctx.cantus_note,
                "penultimate note must be a major sixth above the cantus",
            ),
            Position::Below => (
                name == IntervalName::MinorThird
                    && ctx.harmony.abs_steps() == 2
                    && ctx.candidate < ctx.cantus_note,
                "penultimate note must be a minor third below the cantus",
            ),
        };
        if !cadential {
            return Err(reason);
        }
    }
    Ok(())
}

fn motion(ctx: &Context) -> RuleResult {
    let Some(prev) = &ctx.previous else {
        return Ok(());
    };
    let (Some(from), Some(to)) = (prev.class, ctx.class) else {
        return Ok(());
    };
    if motion_permitted(from, to, prev.motion) {
        Ok(())
    } else {
        Err("perfect consonance approached by parallel or similar motion")
    }
}

fn parallels(ctx: &Context) -> RuleResult {
    let Some(prev) = &ctx.previous else {
        return Ok(());
    };
    let perfect_now = ctx.class == Some(IntervalClass::Perfect);

    if perfect_now
        && prev.class == Some(IntervalClass::Perfect)
        && matches!(prev.motion, Motion::Parallel | Motion::Similar)
    {
        return Err("consecutive perfect consonances");
    }

    if perfect_now && prev.motion == Motion::Similar {
        let upper = if ctx.candidate >= ctx.cantus_note {
            prev.melodic
        } else {
            prev.cantus_melodic
        };
        if upper.abs_steps() >= 2 {
            return Err("hidden perfect consonance: upper voice leaps in similar motion");
        }
    }

    let into_octave = perfect_now && ctx.harmony.abs_steps() > 0 && ctx.harmony.simple_steps() == 0;
    if into_octave
        && prev.harmony.abs_steps() == 9
        && prev.motion == Motion::Contrary
        && prev.melodic.is_step()
        && prev.cantus_melodic.is_step()
    {
        return Err("octave reached from a tenth by contrary steps");
    }

    let leaping = prev.melodic.abs_steps() >= 2 || prev.cantus_melodic.abs_steps() >= 2;
    if leaping && ctx.harmony.abs_steps() == 0 && ctx.index != ctx.last {
        return Err("unison entered by leap");
    }
    if leaping && prev.harmony.abs_steps() == 0 && ctx.index > 1 {
        return Err("unison left by leap");
    }
    Ok(())
}

fn melodic(state: &SearchState, ctx: &Context) -> RuleResult {
    if let Some(prev) = &ctx.previous {
        let step = prev.melodic;
        if step.is_tritone() {
            return Err("melodic tritone");
        }
        if !matches!(
            step.quality(),
            Some(Quality::Perfect | Quality::Major | Quality::Minor)
        ) {
            return Err("augmented or diminished melodic interval");
        }
        let size_ok = step.abs_steps() <= 4
            || (step.abs_steps() == 5 && step.quality() == Some(Quality::Minor) && step.direction() > 0)
            || step.abs_steps() == 7;
        if !size_ok {
            return Err("leap wider than a fifth other than an ascending minor sixth or an octave");
        }
        if let Some(before) = prev.before {
            let earlier = Interval::between(before, prev.counterpoint);
            if earlier.is_leap() && !(step.is_step() && step.direction() == -earlier.direction()) {
                return Err("leap not recovered by a step in the opposite direction");
            }
            if before == prev.counterpoint && prev.counterpoint == ctx.candidate {
                return Err("same pitch three times in a row");
            }
        }
    }
    if !state.config().in_vocal_range(ctx.candidate.midi()) {
        return Err("outside the vocal range");
    }
    Ok(())
}

fn spacing(state: &SearchState, ctx: &Context) -> RuleResult {
    let config = state.config();
    let distance = ctx.candidate.semitones_to(ctx.cantus_note).abs();
    if distance > config.max_spacing {
        return Err("voices too far apart");
    }
    if !ctx.at_boundary() && distance < config.min_spacing {
        return Err("voices too close mid-line");
    }
    Ok(())
}

fn accidental(state: &SearchState, ctx: &Context) -> RuleResult {
    let candidate = ctx.candidate;
    if !candidate.is_altered() {
        return Ok(());
    }
    let mode = state.mode();
    let cantus = state.cantus();
    let final_pitch = cantus.final_pitch();

    if ctx.index == ctx.penultimate
        && mode.is_licensed(candidate)
        && mode.is_leading_tone(candidate, final_pitch)
    {
        return Ok(());
    }

    let licensed_here = mode
        .licensed_accidental()
        .is_some_and(|licence| licence.matches(candidate) && licence.allowed_at(ctx.index, cantus.len()));
    if licensed_here || is_soft_b(candidate) {
        let mut against = vec![ctx.cantus_note, final_pitch];
        if let Some(prev) = &ctx.previous {
            against.push(prev.counterpoint);
        }
        if removes_tritone(candidate, &against) {
            return Ok(());
        }
    }
    Err("accidental is neither the cadential leading tone nor a tritone correction")
}

/// Check a complete counterpoint with the default configuration.
pub fn validate_counterpoint(
    cantus: &Cantus,
    counterpoint: &Counterpoint,
    position: Position,
) -> Result<(), ValidationError> {
    validate_counterpoint_with(cantus, counterpoint, position, &EngineConfig::default())
}

/// Check every note of `counterpoint` and report all violations, one per
/// offending note.
pub fn validate_counterpoint_with(
    cantus: &Cantus,
    counterpoint: &Counterpoint,
    position: Position,
    config: &EngineConfig,
) -> Result<(), ValidationError> {
    let (mode, species) = analyse_mode(cantus)?;
    if counterpoint.len() != cantus.len() {
        return Err(ValidationError::LengthMismatch {
            cantus: cantus.len(),
            counterpoint: counterpoint.len(),
        });
    }
    if let Some((index, octave)) = first_out_of_range(counterpoint.notes()) {
        return Err(ValidationError::OctaveOutOfRange { index, octave });
    }

    let state = SearchState::with_counterpoint(
        cantus,
        mode,
        species,
        position,
        config,
        counterpoint.clone(),
    );
    let violations: Vec<RuleViolation> = counterpoint
        .notes()
        .iter()
        .enumerate()
        .filter_map(|(index, &pitch)| validate_note(&state, pitch, index).err())
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        debug!("{} violation(s) against {mode} {species}", violations.len());
        Err(ValidationError::Violations(violations))
    }
}
