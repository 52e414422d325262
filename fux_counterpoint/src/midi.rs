// MIDI output for a solved two-voice exercise.
//
// Converts a cantus and its counterpoint into a Standard MIDI File for
// playback. Track 0 carries the tempo; each voice gets its own track and
// channel, upper voice first. Every note is a whole note, as first species
// is written.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1
// (multi-track).

use crate::line::{Cantus, Counterpoint, Position};
use crate::pitch::Pitch;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per whole note.
const TICKS_PER_WHOLE: u32 = TICKS_PER_QUARTER as u32 * 4;

const TEMPO_BPM: u32 = 120;

/// Choir aahs.
const PROGRAM: u8 = 52;

/// Write an exercise to a MIDI file.
pub fn write_exercise(
    cantus: &Cantus,
    counterpoint: &Counterpoint,
    position: Position,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let smf = exercise_to_smf(cantus, counterpoint, position);
    let mut buf = Vec::new();
    smf.write(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Convert an exercise to an in-memory SMF.
pub fn exercise_to_smf<'a>(
    cantus: &Cantus,
    counterpoint: &Counterpoint,
    position: Position,
) -> Smf<'a> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let mut tempo_track: Track<'a> = Vec::new();
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / TEMPO_BPM))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    let voices = match position {
        Position::Above => [
            ("Counterpoint", counterpoint.notes()),
            ("Cantus firmus", cantus.notes()),
        ],
        Position::Below => [
            ("Cantus firmus", cantus.notes()),
            ("Counterpoint", counterpoint.notes()),
        ],
    };
    for (channel, (name, notes)) in voices.into_iter().enumerate() {
        smf.tracks.push(voice_track(name, u4::new(channel as u8), notes));
    }
    smf
}

fn voice_track<'a>(name: &'a str, channel: u4, notes: &[Pitch]) -> Track<'a> {
    let mut track: Track<'a> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(PROGRAM),
            },
        },
    });

    for pitch in notes {
        let key = u7::new(pitch.midi().clamp(0, 127) as u8);
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(80),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(TICKS_PER_WHOLE),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    track
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::Letter;

    fn exercise() -> (Cantus, Counterpoint) {
        let cantus = Cantus::new(vec![
            Pitch::natural(Letter::E, 4),
            Pitch::natural(Letter::D, 4),
        ])
        .unwrap();
        let counterpoint = Counterpoint::new(vec![
            Pitch::natural(Letter::B, 4),
            Pitch::natural(Letter::D, 5),
        ]);
        (cantus, counterpoint)
    }

    #[test]
    fn test_exercise_to_smf_tracks() {
        let (cantus, counterpoint) = exercise();
        let smf = exercise_to_smf(&cantus, &counterpoint, Position::Above);
        // 1 tempo track + 2 voice tracks
        assert_eq!(smf.tracks.len(), 3);
        // name, program, two notes on/off, end of track
        assert_eq!(smf.tracks[1].len(), 2 + 2 * 2 + 1);
    }

    #[test]
    fn test_upper_voice_first() {
        let (cantus, counterpoint) = exercise();
        let smf = exercise_to_smf(&cantus, &counterpoint, Position::Above);
        let first_key = smf.tracks[1].iter().find_map(|event| match event.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } => Some(key.as_int()),
            _ => None,
        });
        assert_eq!(first_key, Some(71), "B4 leads the counterpoint track");
    }

    #[test]
    fn test_write_exercise_file() {
        let (cantus, counterpoint) = exercise();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exercise.mid");
        write_exercise(&cantus, &counterpoint, Position::Below, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
        let parsed = Smf::parse(&bytes).unwrap();
        assert_eq!(parsed.tracks.len(), 3);
    }
}
