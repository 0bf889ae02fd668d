//! Key context: tonic, scale and spelling preference

use super::pitch::{
    parse_pitch_class_prefix, pitch_class_name, spelled_name, PitchClass, FLAT_KEY_ROOTS,
};
use crate::error::HarmonyError;
use std::fmt;
use std::str::FromStr;

pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
pub const NATURAL_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];

/// A tonal center: root pitch class plus the seven scale intervals above it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyContext {
    pub root: PitchClass,
    pub scale: [u8; 7],
}

impl KeyContext {
    pub fn major(root: PitchClass) -> Self {
        KeyContext {
            root: root % 12,
            scale: MAJOR_SCALE,
        }
    }

    pub fn minor(root: PitchClass) -> Self {
        KeyContext {
            root: root % 12,
            scale: NATURAL_MINOR_SCALE,
        }
    }

    pub fn is_minor(&self) -> bool {
        self.scale[2] == 3
    }

    /// Semitone offset of a 1-based scale degree above the key root
    pub fn degree_offset(&self, degree: usize) -> u8 {
        self.scale[(degree.max(1) - 1) % 7]
    }

    /// Pitch class a semitone below the tonic
    pub fn leading_tone(&self) -> PitchClass {
        (self.root + 11) % 12
    }

    pub fn contains(&self, pc: PitchClass) -> bool {
        let offset = (pc + 12 - self.root % 12) % 12;
        self.scale.contains(&offset)
    }

    /// Whether chord roots in this key read better with flats
    pub fn prefers_flats(&self) -> bool {
        let relative_major = if self.is_minor() {
            (self.root + 3) % 12
        } else {
            self.root
        };
        FLAT_KEY_ROOTS.contains(&relative_major)
    }

    pub fn name(&self) -> String {
        let root = if self.prefers_flats() {
            spelled_name(self.root, true)
        } else {
            pitch_class_name(self.root)
        };
        if self.is_minor() {
            format!("{} minor", root)
        } else {
            format!("{} major", root)
        }
    }
}

impl Default for KeyContext {
    fn default() -> Self {
        KeyContext::major(0)
    }
}

impl fmt::Display for KeyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parses "C", "Bb major", "Am", "F# minor" and "c#m"
impl FromStr for KeyContext {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let mut normalized = String::with_capacity(text.len());
        let mut chars = text.chars();
        if let Some(first) = chars.next() {
            normalized.push(first.to_ascii_uppercase());
        }
        normalized.extend(chars);

        let (root, consumed) = parse_pitch_class_prefix(&normalized)?;
        match normalized[consumed..].trim().to_lowercase().as_str() {
            "" | "maj" | "major" => Ok(KeyContext::major(root)),
            "m" | "min" | "minor" => Ok(KeyContext::minor(root)),
            _ => Err(HarmonyError::InvalidNote(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert_eq!(KeyContext::default().name(), "C major");
        assert_eq!(KeyContext::major(10).name(), "Bb major");
        assert_eq!(KeyContext::minor(9).name(), "A minor");
        assert_eq!(KeyContext::minor(2).name(), "D minor");
        assert_eq!(KeyContext::minor(7).name(), "G minor");
    }

    #[test]
    fn test_degrees_and_membership() {
        let g = KeyContext::major(7);
        assert_eq!(g.degree_offset(5), 7);
        assert_eq!(g.leading_tone(), 6);
        assert!(g.contains(6));
        assert!(!g.contains(5));
        assert!(KeyContext::minor(9).is_minor());
    }

    #[test]
    fn test_parse_key() {
        assert_eq!("C".parse::<KeyContext>().unwrap(), KeyContext::major(0));
        assert_eq!("Bb major".parse::<KeyContext>().unwrap(), KeyContext::major(10));
        assert_eq!("Am".parse::<KeyContext>().unwrap(), KeyContext::minor(9));
        assert_eq!("f# minor".parse::<KeyContext>().unwrap(), KeyContext::minor(6));
        assert!("H".parse::<KeyContext>().is_err());
        assert!("C lydian".parse::<KeyContext>().is_err());
    }
}
