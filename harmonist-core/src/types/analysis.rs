use super::pitch::{pitch_class, pitch_name, Pitch, PitchClass};
use super::quality::UNKNOWN;
use crate::analysis::symbol::symbol_with_bass;
#[cfg(feature = "colored")]
use colored::*;
use std::fmt;

/// A finished chord analysis: root, quality, voicing facts and harmonic color.
///
/// Built once by the analyzer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChordAnalysis {
    pub root: Pitch,
    pub quality: String,
    pub bass: Pitch,
    /// Position of the root within the sorted pitch set (0 = root position)
    pub inversion: usize,
    pub tensions: Vec<String>,
    pub alterations: Vec<String>,
    /// Dissonance estimate in [0, 1]
    pub tension: f32,
    /// Roman-numeral function, present when a key was supplied
    pub function: Option<String>,
    pub pitches: Vec<Pitch>,
}

impl ChordAnalysis {
    pub fn root_pc(&self) -> PitchClass {
        pitch_class(self.root)
    }

    pub fn bass_pc(&self) -> PitchClass {
        pitch_class(self.bass)
    }

    pub fn is_unknown(&self) -> bool {
        self.quality == UNKNOWN
    }

    /// Chord symbol including slash bass when the bass is not the root
    pub fn symbol(&self) -> String {
        symbol_with_bass(self.root, &self.quality, self.bass)
    }

    /// Same root pitch class and quality, ignoring voicing
    pub fn same_chord(&self, other: &ChordAnalysis) -> bool {
        self.root_pc() == other.root_pc() && self.quality == other.quality
    }

    fn pitch_list(&self) -> String {
        self.pitches
            .iter()
            .map(|&p| pitch_name(p))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(feature = "colored")]
impl fmt::Display for ChordAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.is_unknown() {
            self.symbol().red().bold()
        } else {
            self.symbol().green().bold()
        };
        write!(f, "{} ({})", symbol, self.quality.bright_black())?;
        if let Some(function) = &self.function {
            write!(f, " {}", function.yellow())?;
        }
        if !self.tensions.is_empty() {
            write!(f, " tensions: {}", self.tensions.join(",").cyan())?;
        }
        if !self.alterations.is_empty() {
            write!(f, " alt: {}", self.alterations.join(",").magenta())?;
        }
        write!(
            f,
            " tension {:.2} [{}]",
            self.tension,
            self.pitch_list().bright_black()
        )
    }
}

#[cfg(not(feature = "colored"))]
impl fmt::Display for ChordAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol(), self.quality)?;
        if let Some(function) = &self.function {
            write!(f, " {}", function)?;
        }
        if !self.tensions.is_empty() {
            write!(f, " tensions: {}", self.tensions.join(","))?;
        }
        if !self.alterations.is_empty() {
            write!(f, " alt: {}", self.alterations.join(","))?;
        }
        write!(f, " tension {:.2} [{}]", self.tension, self.pitch_list())
    }
}

/// One way of reading a pitch set: a candidate root with the quality it yields
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InversionCandidate {
    pub root: Pitch,
    pub bass: Pitch,
    pub inversion: usize,
    pub quality: String,
}
