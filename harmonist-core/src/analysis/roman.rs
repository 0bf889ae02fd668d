//! Roman-numeral function symbols ("ii7", "bVII", "vii°", "V7") against a key

use super::identify::build_analysis;
use super::symbol::voice_ascending;
use crate::error::{HarmonyError, Result};
use crate::types::quality::{self, ChordQuality};
use crate::types::{pitch_class, ChordAnalysis, KeyContext, Pitch, PitchClass, MIDDLE_C};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScaleDegree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

impl ScaleDegree {
    const ALL: [ScaleDegree; 7] = [
        ScaleDegree::I,
        ScaleDegree::II,
        ScaleDegree::III,
        ScaleDegree::IV,
        ScaleDegree::V,
        ScaleDegree::VI,
        ScaleDegree::VII,
    ];

    /// 1-based degree number
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn numeral(self, uppercase: bool) -> &'static str {
        const UPPER: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];
        const LOWER: [&str; 7] = ["i", "ii", "iii", "iv", "v", "vi", "vii"];
        if uppercase {
            UPPER[self as usize]
        } else {
            LOWER[self as usize]
        }
    }

    /// Longest numeral at the start of `text`, with its case and byte length
    fn parse_prefix(text: &str) -> Option<(ScaleDegree, bool, usize)> {
        // Longest spellings first so "vii" is not read as "v"
        const ORDER: [usize; 7] = [6, 2, 5, 3, 1, 4, 0];
        for uppercase in [true, false] {
            for &index in &ORDER {
                let degree = Self::ALL[index];
                let numeral = degree.numeral(uppercase);
                if text.starts_with(numeral) {
                    return Some((degree, uppercase, numeral.len()));
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Accidental {
    Flat,
    Sharp,
}

impl Accidental {
    fn offset(self) -> i32 {
        match self {
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        }
    }
}

impl fmt::Display for Accidental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accidental::Flat => write!(f, "b"),
            Accidental::Sharp => write!(f, "#"),
        }
    }
}

/// A parsed function symbol, independent of any key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbol {
    pub accidental: Option<Accidental>,
    pub degree: ScaleDegree,
    pub uppercase: bool,
    pub quality: &'static ChordQuality,
    text: String,
}

impl FunctionSymbol {
    /// Root pitch class of this function in `key`
    pub fn root_pc(&self, key: &KeyContext) -> PitchClass {
        let offset = key.degree_offset(self.degree.number()) as i32
            + self.accidental.map_or(0, Accidental::offset);
        (key.root as i32 + offset).rem_euclid(12) as PitchClass
    }

    /// Voice the function in `key` around middle C and analyze it
    pub fn to_chord(&self, key: &KeyContext) -> ChordAnalysis {
        let root = MIDDLE_C + self.root_pc(key) as Pitch;
        let stacked: Vec<Pitch> = self
            .quality
            .intervals
            .iter()
            .map(|&i| root + i as Pitch)
            .collect();
        let pitches = voice_ascending(&stacked);
        let mut analysis = build_analysis(root, self.quality.name, 0, &pitches, Some(key));
        analysis.function = Some(self.text.clone());
        analysis
    }

    /// Accidental plus numeral, without any quality suffix ("bVII7" -> "bVII")
    pub fn core(&self) -> String {
        match self.accidental {
            Some(accidental) => format!("{}{}", accidental, self.degree.numeral(self.uppercase)),
            None => self.degree.numeral(self.uppercase).to_string(),
        }
    }
}

impl fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn quality_for_suffix(suffix: &str, uppercase: bool) -> Option<&'static ChordQuality> {
    let name = match (suffix, uppercase) {
        ("", true) => "major",
        ("", false) => "minor",
        ("7", true) => "dominant7",
        ("7", false) => "minor7",
        ("maj7" | "M7" | "Δ7", true) => "major7",
        ("maj7" | "M7" | "Δ7", false) => "minor_major7",
        ("°" | "o" | "dim", _) => "diminished",
        ("°7" | "o7" | "dim7", _) => "diminished7",
        ("ø" | "ø7" | "m7b5", _) => "half_diminished7",
        ("+" | "aug", _) => "augmented",
        ("+7", _) => "augmented7",
        ("+maj7" | "+M7", _) => "augmented_major7",
        ("9", true) => "dominant9",
        ("9", false) => "minor9",
        ("maj9", _) => "major9",
        ("11", true) => "dominant11",
        ("11", false) => "minor11",
        ("maj11", _) => "major11",
        ("13", true) => "dominant13",
        ("13", false) => "minor13",
        ("maj13", _) => "major13",
        ("6", true) => "major6",
        ("6", false) => "minor6",
        _ => {
            if !uppercase {
                if let Some(quality) = quality::from_token(&format!("m{}", suffix)) {
                    return Some(quality);
                }
            }
            return quality::from_token(suffix);
        }
    };
    quality::lookup(name)
}

impl FromStr for FunctionSymbol {
    type Err = HarmonyError;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = || HarmonyError::InvalidFunction(text.to_string());

        let (accidental, rest) = if let Some(rest) = text.strip_prefix('b') {
            (Some(Accidental::Flat), rest)
        } else if let Some(rest) = text.strip_prefix('♭') {
            (Some(Accidental::Flat), rest)
        } else if let Some(rest) = text.strip_prefix('#') {
            (Some(Accidental::Sharp), rest)
        } else if let Some(rest) = text.strip_prefix('♯') {
            (Some(Accidental::Sharp), rest)
        } else {
            (None, text)
        };

        let (degree, uppercase, length) = ScaleDegree::parse_prefix(rest).ok_or_else(invalid)?;
        let quality = quality_for_suffix(&rest[length..], uppercase).ok_or_else(invalid)?;

        Ok(FunctionSymbol {
            accidental,
            degree,
            uppercase,
            quality,
            text: text.to_string(),
        })
    }
}

/// Parse a function symbol such as "ii7" or "bVII"
pub fn parse_function(text: &str) -> Result<FunctionSymbol> {
    text.parse()
}

/// Resolve a function symbol in `key`; `None` when the symbol does not parse
pub fn chord_from_function(symbol: &str, key: &KeyContext) -> Option<ChordAnalysis> {
    parse_function(symbol).ok().map(|f| f.to_chord(key))
}

/// Degree and accidental for a root `offset` semitones above the tonic
fn degree_for_offset(offset: u8, minor_key: bool) -> (Option<Accidental>, ScaleDegree) {
    use Accidental::*;
    use ScaleDegree::*;
    if minor_key {
        match offset {
            0 => (None, I),
            1 => (Some(Flat), II),
            2 => (None, II),
            3 => (None, III),
            4 => (Some(Sharp), III),
            5 => (None, IV),
            6 => (Some(Sharp), IV),
            7 => (None, V),
            8 => (None, VI),
            9 => (Some(Sharp), VI),
            10 => (None, VII),
            _ => (Some(Sharp), VII),
        }
    } else {
        match offset {
            0 => (None, I),
            1 => (Some(Flat), II),
            2 => (None, II),
            3 => (Some(Flat), III),
            4 => (None, III),
            5 => (None, IV),
            6 => (Some(Sharp), IV),
            7 => (None, V),
            8 => (Some(Flat), VI),
            9 => (None, VI),
            10 => (Some(Flat), VII),
            _ => (None, VII),
        }
    }
}

fn function_suffix(quality: &ChordQuality, uppercase: bool) -> String {
    let suffix = match quality.name {
        "major" | "minor" => "",
        "diminished" => "°",
        "augmented" => "+",
        "dominant7" | "minor7" => "7",
        "major7" | "minor_major7" => "maj7",
        "diminished7" => "°7",
        "half_diminished7" => "ø7",
        "augmented7" => "+7",
        "augmented_major7" => "+maj7",
        "dominant9" | "minor9" => "9",
        "dominant11" | "minor11" => "11",
        "dominant13" | "minor13" => "13",
        "major6" | "minor6" => "6",
        _ if !uppercase => quality
            .suffix
            .strip_prefix('m')
            .unwrap_or(quality.suffix),
        _ => quality.suffix,
    };
    suffix.to_string()
}

/// Name the function of a chord relative to `key`, e.g. (67, "dominant7", C major) -> "V7".
///
/// Numerals are lowercase for qualities built on a minor third. Chromatic
/// roots carry an accidental (bII, bIII, #IV, bVI, bVII in major keys).
pub fn function_symbol(root: Pitch, quality_name: &str, key: &KeyContext) -> String {
    let offset = (pitch_class(root) + 12 - key.root % 12) % 12;
    let (accidental, degree) = degree_for_offset(offset, key.is_minor());
    let prefix = accidental.map(|a| a.to_string()).unwrap_or_default();

    let Some(quality) = quality::lookup(quality_name) else {
        return format!("{}{}?", prefix, degree.numeral(true));
    };

    let uppercase = !(quality.contains(3) && !quality.contains(4));
    format!(
        "{}{}{}",
        prefix,
        degree.numeral(uppercase),
        function_suffix(quality, uppercase)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_function_symbols() {
        let ii7 = parse_function("ii7").unwrap();
        assert_eq!(ii7.degree, ScaleDegree::II);
        assert!(!ii7.uppercase);
        assert_eq!(ii7.quality.name, "minor7");

        let flat_seven = parse_function("bVII").unwrap();
        assert_eq!(flat_seven.accidental, Some(Accidental::Flat));
        assert_eq!(flat_seven.quality.name, "major");
        assert_eq!(flat_seven.core(), "bVII");

        assert_eq!(parse_function("vii°").unwrap().quality.name, "diminished");
        assert_eq!(parse_function("viiø7").unwrap().quality.name, "half_diminished7");
        assert_eq!(parse_function("V7").unwrap().quality.name, "dominant7");
        assert_eq!(parse_function("IVmaj7").unwrap().quality.name, "major7");
        assert_eq!(parse_function("iv6").unwrap().quality.name, "minor6");
        assert_eq!(parse_function("Vsus4").unwrap().quality.name, "sus4");
        assert_eq!(parse_function("iadd9").unwrap().quality.name, "minor_add9");
    }

    #[test]
    fn test_parse_function_rejects_garbage() {
        assert!(parse_function("").is_err());
        assert!(parse_function("X").is_err());
        assert!(parse_function("Vwhat").is_err());
    }

    #[test]
    fn test_function_resolves_in_key() {
        let c = KeyContext::major(0);
        let v7 = chord_from_function("V7", &c).unwrap();
        assert_eq!(v7.root, 67);
        assert_eq!(v7.pitches, vec![67, 71, 74, 77]);
        assert_eq!(v7.function.as_deref(), Some("V7"));

        let bvii = chord_from_function("bVII", &c).unwrap();
        assert_eq!(bvii.root_pc(), 10);

        let a_minor = KeyContext::minor(9);
        let iii = chord_from_function("III", &a_minor).unwrap();
        assert_eq!(iii.root_pc(), 0);
        assert_eq!(iii.quality, "major");
    }

    #[test]
    fn test_function_symbol_naming() {
        let c = KeyContext::major(0);
        assert_eq!(function_symbol(60, "major", &c), "I");
        assert_eq!(function_symbol(62, "minor7", &c), "ii7");
        assert_eq!(function_symbol(71, "diminished", &c), "vii°");
        assert_eq!(function_symbol(71, "half_diminished7", &c), "viiø7");
        assert_eq!(function_symbol(70, "major", &c), "bVII");
        assert_eq!(function_symbol(66, "diminished7", &c), "#iv°7");
        assert_eq!(function_symbol(68, "major", &c), "bVI");
        assert_eq!(function_symbol(61, "major", &c), "bII");
        assert_eq!(function_symbol(63, "major", &c), "bIII");
        assert_eq!(function_symbol(60, "unknown", &c), "I?");
    }

    #[test]
    fn test_function_symbol_round_trips_through_parse() {
        let key = KeyContext::major(7);
        for quality in crate::types::VOCABULARY {
            let symbol = function_symbol(69, quality.name, &key);
            let parsed = parse_function(&symbol).unwrap();
            assert_eq!(parsed.quality.name, quality.name, "via {}", symbol);
            assert_eq!(parsed.root_pc(&key), 9);
        }
    }
}
