// Backtracking generation of a first-species counterpoint line.
//
// Depth-first search with chronological backtracking over the cantus
// indices, driven by an explicit frame stack rather than recursion so long
// cantus lines cannot exhaust the call stack. Each frame holds the ordered
// candidate list for one index and a cursor: everything before the cursor
// has been tried at that index and is never retried while the frame lives.
// Popping a frame (its index ran dry) un-commits the previous note; the
// previous frame's cursor has already moved past it. A frame rebuilt later,
// after an earlier backtrack, starts again from a fresh candidate list.
//
// Candidate ordering is deterministic: pitches on the counterpoint's side of
// the cantus note first, then ascending melodic distance from the previous
// counterpoint note (from the cantus's first note at index 0), ties broken
// by scale degree counted up from the final. Crossed voices stay legal but
// are only tried once every uncrossed pitch at that index has failed.
//
// Every candidate is checked by `rules::validate_note`, the same predicate
// bank the standalone validator runs, so anything the search returns
// validates.
//
// The search checks a shared `CancelFlag` and the configured step budget
// once per index-step; both stop the search with a distinct error.

use crate::analysis::{ModalError, analyse_mode};
use crate::config::EngineConfig;
use crate::line::{Cantus, Counterpoint, Position, format_line};
use crate::mode::{Mode, Species};
use crate::pitch::Pitch;
use crate::rules::validate_note;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GenerationError {
    #[error("mode detection failed: {0}")]
    Modal(#[from] ModalError),
    #[error("no counterpoint satisfies every rule against this cantus")]
    NoSolution,
    #[error("search cancelled")]
    Cancelled,
    #[error("search stopped after {steps} steps without a solution")]
    BudgetExhausted { steps: u64 },
}

/// Cooperative cancellation shared between a caller and running searches.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Candidates for one index, and how many have been tried.
#[derive(Debug, Clone)]
struct Frame {
    candidates: Vec<Pitch>,
    cursor: usize,
}

/// Everything one generation (or validation) run reads and writes. Each run
/// owns its state exclusively, so independent runs can proceed on separate
/// threads without locking.
#[derive(Debug, Clone)]
pub struct SearchState<'a> {
    cantus: &'a Cantus,
    mode: Mode,
    species: Species,
    position: Position,
    config: &'a EngineConfig,
    counterpoint: Counterpoint,
    frames: Vec<Frame>,
}

impl<'a> SearchState<'a> {
    pub fn new(
        cantus: &'a Cantus,
        mode: Mode,
        species: Species,
        position: Position,
        config: &'a EngineConfig,
    ) -> Self {
        Self::with_counterpoint(cantus, mode, species, position, config, Counterpoint::default())
    }

    /// A state with a line already committed, for validation.
    pub fn with_counterpoint(
        cantus: &'a Cantus,
        mode: Mode,
        species: Species,
        position: Position,
        config: &'a EngineConfig,
        counterpoint: Counterpoint,
    ) -> Self {
        SearchState {
            cantus,
            mode,
            species,
            position,
            config,
            counterpoint,
            frames: Vec::new(),
        }
    }

    pub fn cantus(&self) -> &'a Cantus {
        self.cantus
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// The committed prefix (generation) or the whole line (validation).
    pub fn counterpoint(&self) -> &Counterpoint {
        &self.counterpoint
    }

    /// Pitches already tried at `index` by the live frame, in trial order.
    /// Empty if the search has not reached `index` or has backed out of it.
    pub fn tried(&self, index: usize) -> &[Pitch] {
        self.frames
            .get(index)
            .map(|frame| &frame.candidates[..frame.cursor])
            .unwrap_or(&[])
    }

    /// The bounded pitch alphabet for `index`, in trial order: scale pitches
    /// from the cantus's range out to `candidate_span` on the counterpoint's
    /// side, plus the licensed accidental where it may appear. Pitches that
    /// would cross the cantus note at `index` sort after the rest.
    pub fn candidates(&self, index: usize) -> Vec<Pitch> {
        let span = self.config.candidate_span;
        let (low, high) = match self.position {
            Position::Above => (self.cantus.lowest().midi(), self.cantus.highest().midi() + span),
            Position::Below => (self.cantus.lowest().midi() - span, self.cantus.highest().midi()),
        };
        let low = low.max(self.config.vocal_range.0);
        let high = high.min(self.config.vocal_range.1);

        let mut pitches = self.mode.scale_pitches(low, high);
        if let Some(licence) = self
            .mode
            .licensed_accidental()
            .filter(|licence| licence.allowed_at(index, self.cantus.len()))
        {
            let octaves = (low.div_euclid(12) - 2)..=(high.div_euclid(12) + 1);
            pitches.extend(
                octaves
                    .map(|octave| Pitch::new(licence.letter, licence.accidental, octave))
                    .filter(|p| (low..=high).contains(&p.midi())),
            );
        }

        let reference = index
            .checked_sub(1)
            .and_then(|previous| self.counterpoint.get(previous))
            .unwrap_or(self.cantus[0]);
        let against = self.cantus.notes().get(index).copied();
        pitches.sort_by_key(|p| {
            (
                against.is_some_and(|note| !self.position.is_on_side(*p, note)),
                (p.midi() - reference.midi()).abs(),
                self.mode.degree_of(*p),
                p.midi(),
                p.accidental.alteration(),
            )
        });
        pitches
    }

    fn push_frame(&mut self, index: usize) {
        let candidates = self.candidates(index);
        self.frames.push(Frame {
            candidates,
            cursor: 0,
        });
    }

    /// Try the untried candidates at `index` in order; return the first that
    /// passes every rule, or None once the frame is exhausted.
    fn advance(&mut self, index: usize) -> Option<Pitch> {
        loop {
            let frame = &mut self.frames[index];
            let candidate = *frame.candidates.get(frame.cursor)?;
            frame.cursor += 1;
            match validate_note(self, candidate, index) {
                Ok(()) => return Some(candidate),
                Err(violation) => trace!("{candidate} rejected: {violation}"),
            }
        }
    }

    /// Run the search to completion from an empty line.
    pub fn search(&mut self, cancel: &CancelFlag) -> Result<Counterpoint, GenerationError> {
        let len = self.cantus.len();
        self.counterpoint.clear();
        self.frames.clear();
        self.push_frame(0);

        let mut steps: u64 = 0;
        let mut backtracks: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                warn!("search cancelled after {steps} steps");
                return Err(GenerationError::Cancelled);
            }
            if self.config.max_steps.is_some_and(|max| steps >= max) {
                warn!("search budget of {steps} steps exhausted");
                return Err(GenerationError::BudgetExhausted { steps });
            }
            steps += 1;

            let index = self.frames.len() - 1;
            match self.advance(index) {
                Some(pitch) => {
                    self.counterpoint.push(pitch);
                    if index + 1 == len {
                        debug!(
                            "found {} in {steps} steps ({backtracks} backtracks)",
                            format_line(self.counterpoint.notes())
                        );
                        return Ok(self.counterpoint.clone());
                    }
                    self.push_frame(index + 1);
                }
                None => {
                    self.frames.pop();
                    if self.frames.is_empty() {
                        debug!("search space exhausted after {steps} steps");
                        return Err(GenerationError::NoSolution);
                    }
                    self.counterpoint.pop();
                    backtracks += 1;
                    trace!("index {index} exhausted, back to {}", index - 1);
                }
            }
        }
    }
}

/// Generate a counterpoint for a cantus whose mode is already known.
pub fn generate_in_mode(
    cantus: &Cantus,
    mode: Mode,
    species: Species,
    position: Position,
    config: &EngineConfig,
    cancel: &CancelFlag,
) -> Result<Counterpoint, GenerationError> {
    let mut state = SearchState::new(cantus, mode, species, position, config);
    state.search(cancel)
}

/// Analyse the cantus's mode, then generate a counterpoint with the default
/// configuration.
pub fn generate_counterpoint(
    cantus: &Cantus,
    position: Position,
) -> Result<Counterpoint, GenerationError> {
    generate_counterpoint_with(cantus, position, &EngineConfig::default(), &CancelFlag::new())
}

pub fn generate_counterpoint_with(
    cantus: &Cantus,
    position: Position,
    config: &EngineConfig,
    cancel: &CancelFlag,
) -> Result<Counterpoint, GenerationError> {
    let (mode, species) = analyse_mode(cantus)?;
    debug!(
        "generating {position} {} ({mode} {species})",
        format_line(cantus.notes())
    );
    generate_in_mode(cantus, mode, species, position, config, cancel)
}
