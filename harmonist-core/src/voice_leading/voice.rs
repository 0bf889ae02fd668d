//! Voice roles, their registers and four-voice assignments

use crate::types::{pitch_class, pitch_name, Pitch};
#[cfg(feature = "colored")]
use colored::*;
use std::fmt;

/// The four voices, indexed from the bottom (0 = bass, 3 = soprano)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoiceRole {
    Bass,
    Tenor,
    Alto,
    Soprano,
}

impl VoiceRole {
    pub const ALL: [VoiceRole; 4] = [
        VoiceRole::Bass,
        VoiceRole::Tenor,
        VoiceRole::Alto,
        VoiceRole::Soprano,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            VoiceRole::Bass => "bass",
            VoiceRole::Tenor => "tenor",
            VoiceRole::Alto => "alto",
            VoiceRole::Soprano => "soprano",
        }
    }

    fn abbreviation(self) -> &'static str {
        match self {
            VoiceRole::Bass => "B",
            VoiceRole::Tenor => "T",
            VoiceRole::Alto => "A",
            VoiceRole::Soprano => "S",
        }
    }
}

impl fmt::Display for VoiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Inclusive legal pitch range of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoiceRange {
    pub low: Pitch,
    pub high: Pitch,
}

impl VoiceRange {
    pub const fn new(low: Pitch, high: Pitch) -> Self {
        VoiceRange { low, high }
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        (self.low..=self.high).contains(&pitch)
    }

    pub fn midpoint(&self) -> f32 {
        (self.low + self.high) as f32 / 2.0
    }

    pub fn width(&self) -> f32 {
        (self.high - self.low).max(1) as f32
    }

    /// Every octave transposition of `pitch` that fits the range, ascending
    pub fn octaves_of(&self, pitch: Pitch) -> impl Iterator<Item = Pitch> + '_ {
        let pc = pitch_class(pitch) as Pitch;
        let first = self.low + (pc - self.low).rem_euclid(12);
        (first..=self.high).step_by(12)
    }

    /// Octave transposition of `pitch` inside the range nearest to `target`.
    ///
    /// Falls back to `pitch` itself for ranges narrower than an octave that miss its pitch class.
    pub fn nearest(&self, pitch: Pitch, target: Pitch) -> Pitch {
        self.octaves_of(pitch)
            .min_by_key(|&p| (p - target).abs())
            .unwrap_or(pitch)
    }

    /// Shift by octaves until inside the range
    pub fn fold(&self, pitch: Pitch) -> Pitch {
        self.nearest(pitch, pitch)
    }
}

/// Legal ranges for all four roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    pub bass: VoiceRange,
    pub tenor: VoiceRange,
    pub alto: VoiceRange,
    pub soprano: VoiceRange,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            bass: VoiceRange::new(40, 62),
            tenor: VoiceRange::new(48, 69),
            alto: VoiceRange::new(55, 74),
            soprano: VoiceRange::new(60, 81),
        }
    }
}

impl Registers {
    pub fn get(&self, role: VoiceRole) -> &VoiceRange {
        match role {
            VoiceRole::Bass => &self.bass,
            VoiceRole::Tenor => &self.tenor,
            VoiceRole::Alto => &self.alto,
            VoiceRole::Soprano => &self.soprano,
        }
    }
}

/// Pitch-or-absent for each of the four roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoiceAssignment {
    voices: [Option<Pitch>; 4],
}

impl VoiceAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assignment with all four roles filled, bass first
    pub fn from_pitches(pitches: [Pitch; 4]) -> Self {
        VoiceAssignment {
            voices: pitches.map(Some),
        }
    }

    pub fn get(&self, role: VoiceRole) -> Option<Pitch> {
        self.voices[role.index()]
    }

    pub fn set(&mut self, role: VoiceRole, pitch: Option<Pitch>) {
        self.voices[role.index()] = pitch;
    }

    pub fn with(mut self, role: VoiceRole, pitch: Pitch) -> Self {
        self.set(role, Some(pitch));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.voices.iter().all(Option::is_none)
    }

    pub fn is_complete(&self) -> bool {
        self.voices.iter().all(Option::is_some)
    }

    /// Present voices as (role, pitch), bass first
    pub fn iter(&self) -> impl Iterator<Item = (VoiceRole, Pitch)> + '_ {
        VoiceRole::ALL
            .iter()
            .filter_map(|&role| self.get(role).map(|pitch| (role, pitch)))
    }

    /// Present pitches in role order, bass first (not re-sorted)
    pub fn pitches(&self) -> Vec<Pitch> {
        self.iter().map(|(_, pitch)| pitch).collect()
    }

    /// Present pitches sorted by sounding height
    pub fn sounding(&self) -> Vec<Pitch> {
        let mut pitches = self.pitches();
        pitches.sort_unstable();
        pitches
    }

    /// Sum of absolute motion over roles present on both sides
    pub fn total_movement(&self, next: &VoiceAssignment) -> i32 {
        VoiceRole::ALL
            .iter()
            .filter_map(|&role| Some((next.get(role)? - self.get(role)?).abs()))
            .sum()
    }
}

fn voice_label(pitch: Option<Pitch>) -> String {
    pitch.map_or_else(|| "-".to_string(), pitch_name)
}

#[cfg(feature = "colored")]
impl fmt::Display for VoiceAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = VoiceRole::ALL
            .iter()
            .rev()
            .map(|&role| {
                format!(
                    "{}:{}",
                    role.abbreviation().bright_black(),
                    voice_label(self.get(role)).cyan()
                )
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(not(feature = "colored"))]
impl fmt::Display for VoiceAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = VoiceRole::ALL
            .iter()
            .rev()
            .map(|&role| format!("{}:{}", role.abbreviation(), voice_label(self.get(role))))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_nearest_octave() {
        let tenor = VoiceRange::new(48, 69);
        assert_eq!(tenor.nearest(64, 60), 64);
        assert_eq!(tenor.nearest(76, 60), 64);
        assert_eq!(tenor.nearest(40, 66), 64);
        assert_eq!(tenor.octaves_of(60).collect::<Vec<_>>(), vec![48, 60]);
        assert_eq!(tenor.fold(84), 60);
    }

    #[test]
    fn test_assignment_accessors() {
        let assignment = VoiceAssignment::from_pitches([48, 55, 64, 72]);
        assert_eq!(assignment.get(VoiceRole::Alto), Some(64));
        assert!(assignment.is_complete());
        assert_eq!(assignment.pitches(), vec![48, 55, 64, 72]);

        let partial = VoiceAssignment::new().with(VoiceRole::Soprano, 72);
        assert!(!partial.is_empty());
        assert!(!partial.is_complete());
        assert_eq!(partial.iter().collect::<Vec<_>>(), vec![(VoiceRole::Soprano, 72)]);
    }

    #[test]
    fn test_total_movement_skips_absent() {
        let a = VoiceAssignment::from_pitches([48, 55, 64, 72]);
        let b = VoiceAssignment::new()
            .with(VoiceRole::Bass, 50)
            .with(VoiceRole::Soprano, 71);
        assert_eq!(a.total_movement(&b), 3);
    }
}
