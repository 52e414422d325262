// Fux Counterpoint Engine
//
// A deterministic modal analysis and first-species counterpoint engine. Given
// a cantus firmus it infers the church mode and species the line is written
// in, generates a second voice note against note by backtracking search over
// a bounded pitch alphabet, or checks an existing second voice against the
// same rule set and reports every offending note.
//
// Architecture:
// - pitch.rs: Spelled pitches, diatonic intervals, consonance classes, motion
// - mode.rs: Church mode tables (dorian through ionian), licensed accidentals
// - line.rs: Cantus / Counterpoint / Position value types
// - analysis.rs: Mode detection (final, scale membership, ambitus, cadence)
// - rules.rs: The six-rule validator shared by generation and validation
// - search.rs: Depth-first backtracking generator with cancellation + budget
// - config.rs: Tunable thresholds (range, spacing, search budget)
// - batch.rs: Parallel runner for many independent exercises
// - midi.rs: MIDI file output of a solved exercise
//
// No randomness anywhere: the same cantus always yields the same answer.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod line;
pub mod midi;
pub mod mode;
pub mod pitch;
pub mod rules;
pub mod search;

pub use analysis::analyse_mode;
pub use rules::validate_counterpoint;
pub use search::generate_counterpoint;
