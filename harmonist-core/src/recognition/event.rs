//! Timestamped note events and MIDI message decoding

use crate::types::{pitch_name, Pitch};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoteEventKind {
    NoteOn,
    NoteOff,
}

/// A note-on or note-off stamped with logical time in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoteEvent {
    pub kind: NoteEventKind,
    pub pitch: Pitch,
    pub velocity: u8,
    pub time_ms: u64,
}

impl NoteEvent {
    pub fn note_on(pitch: Pitch, velocity: u8, time_ms: u64) -> Self {
        NoteEvent {
            kind: NoteEventKind::NoteOn,
            pitch,
            velocity,
            time_ms,
        }
    }

    pub fn note_off(pitch: Pitch, time_ms: u64) -> Self {
        NoteEvent {
            kind: NoteEventKind::NoteOff,
            pitch,
            velocity: 0,
            time_ms,
        }
    }

    /// Decode a raw MIDI channel message; anything but note on/off yields `None`.
    ///
    /// A note-on with velocity 0 is a note-off, as running-status senders emit it.
    pub fn from_midi(message: &[u8], time_ms: u64) -> Option<Self> {
        let (&status, data) = message.split_first()?;
        let (&pitch, &velocity) = match data {
            [pitch, velocity, ..] => (pitch, velocity),
            _ => return None,
        };
        let pitch = Pitch::from(pitch & 0x7F);
        match status & 0xF0 {
            0x90 if velocity > 0 => Some(NoteEvent::note_on(pitch, velocity & 0x7F, time_ms)),
            0x90 | 0x80 => Some(NoteEvent::note_off(pitch, time_ms)),
            _ => None,
        }
    }

    pub fn is_note_on(&self) -> bool {
        self.kind == NoteEventKind::NoteOn
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NoteEventKind::NoteOn => write!(
                f,
                "on {} vel {} @{}ms",
                pitch_name(self.pitch),
                self.velocity,
                self.time_ms
            ),
            NoteEventKind::NoteOff => write!(f, "off {} @{}ms", pitch_name(self.pitch), self.time_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_midi() {
        assert_eq!(
            NoteEvent::from_midi(&[0x90, 60, 100], 5),
            Some(NoteEvent::note_on(60, 100, 5))
        );
        assert_eq!(
            NoteEvent::from_midi(&[0x93, 64, 0], 7),
            Some(NoteEvent::note_off(64, 7))
        );
        assert_eq!(
            NoteEvent::from_midi(&[0x80, 67, 40], 9),
            Some(NoteEvent::note_off(67, 9))
        );
        assert_eq!(NoteEvent::from_midi(&[0xB0, 64, 127], 0), None);
        assert_eq!(NoteEvent::from_midi(&[0x90, 60], 0), None);
        assert_eq!(NoteEvent::from_midi(&[], 0), None);
    }
}
