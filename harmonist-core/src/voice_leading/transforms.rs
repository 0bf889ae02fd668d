//! Post-selection voicing transforms
//!
//! Transforms only move a voice when the result stays inside that voice's
//! register. Crossings they introduce are left for the rule checker to report.

use super::voice::{Registers, VoiceAssignment, VoiceRole};
use crate::error::HarmonyError;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoicingStyle {
    #[default]
    Close,
    Open,
    Drop2,
    /// Scale each voice's distance from the outer-voice midpoint
    Spread(f32),
}

impl FromStr for VoicingStyle {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "close" => Ok(VoicingStyle::Close),
            "open" => Ok(VoicingStyle::Open),
            "drop2" | "drop-2" => Ok(VoicingStyle::Drop2),
            _ => lower
                .strip_prefix("spread")
                .map(|rest| rest.trim_start_matches([':', '=', ' ']))
                .and_then(|factor| {
                    if factor.is_empty() {
                        Some(1.5)
                    } else {
                        factor.parse::<f32>().ok()
                    }
                })
                .map(VoicingStyle::Spread)
                .ok_or_else(|| HarmonyError::UnknownStyle(s.to_string())),
        }
    }
}

/// Open voicing: drop the alto an octave, then pull tenor and alto at least a fifth apart
pub fn open_voicing(assignment: &VoiceAssignment, registers: &Registers) -> VoiceAssignment {
    let mut result = *assignment;
    let Some(mut alto) = result.get(VoiceRole::Alto) else {
        return result;
    };

    if registers.alto.contains(alto - 12) {
        alto -= 12;
        result.set(VoiceRole::Alto, Some(alto));
    }

    if let Some(tenor) = result.get(VoiceRole::Tenor) {
        if (alto - tenor).abs() < 7 {
            if registers.tenor.contains(tenor - 12) {
                result.set(VoiceRole::Tenor, Some(tenor - 12));
            } else if registers.alto.contains(alto + 12) {
                result.set(VoiceRole::Alto, Some(alto + 12));
            }
        }
    }
    result
}

/// Drop-2: lower the second-highest sounding voice by an octave
pub fn drop2_voicing(assignment: &VoiceAssignment, registers: &Registers) -> VoiceAssignment {
    let mut result = *assignment;
    let mut voices: Vec<(VoiceRole, i32)> = assignment.iter().collect();
    if voices.len() < 2 {
        return result;
    }
    // Highest first; on equal pitch the higher role counts as higher
    voices.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

    let (role, pitch) = voices[1];
    if registers.get(role).contains(pitch - 12) {
        result.set(role, Some(pitch - 12));
    }
    result
}

/// Spread: scale each voice's distance from the soprano/bass midpoint by `factor`
pub fn spread_voicing(
    assignment: &VoiceAssignment,
    registers: &Registers,
    factor: f32,
) -> VoiceAssignment {
    let mut result = *assignment;
    let (Some(bass), Some(soprano)) = (
        assignment.get(VoiceRole::Bass),
        assignment.get(VoiceRole::Soprano),
    ) else {
        return result;
    };
    let midpoint = (bass + soprano) as f32 / 2.0;

    for (role, pitch) in assignment.iter() {
        let spread = (midpoint + (pitch as f32 - midpoint) * factor).round() as i32;
        if registers.get(role).contains(spread) {
            result.set(role, Some(spread));
        }
    }
    result
}

pub fn apply_voicing(
    assignment: &VoiceAssignment,
    style: VoicingStyle,
    registers: &Registers,
) -> VoiceAssignment {
    match style {
        VoicingStyle::Close => *assignment,
        VoicingStyle::Open => open_voicing(assignment, registers),
        VoicingStyle::Drop2 => drop2_voicing(assignment, registers),
        VoicingStyle::Spread(factor) => spread_voicing(assignment, registers, factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice_leading::rules::crossings;

    #[test]
    fn test_drop2_lowers_second_highest() {
        let close = VoiceAssignment::from_pitches([48, 60, 67, 76]);
        let dropped = drop2_voicing(&close, &Registers::default());
        assert_eq!(dropped.pitches(), vec![48, 60, 55, 76]);
        // alto now sits under the tenor and is reported, not fixed
        assert_eq!(crossings(&dropped).len(), 1);
    }

    #[test]
    fn test_drop2_respects_register() {
        // alto at 64 can't drop to 52 when its floor is 55
        let registers = Registers::default();
        let close = VoiceAssignment::from_pitches([43, 55, 64, 71]);
        let dropped = drop2_voicing(&close, &registers);
        assert_eq!(dropped.get(VoiceRole::Alto), Some(64));
    }

    #[test]
    fn test_open_voicing_separates_inner_voices() {
        let close = VoiceAssignment::from_pitches([48, 60, 67, 76]);
        let open = open_voicing(&close, &Registers::default());
        // alto 67 -> 55 lands within a fifth of tenor 60, so the tenor drops to 48
        assert_eq!(open.pitches(), vec![48, 48, 55, 76]);

        // alto already at its floor stays put
        let low = VoiceAssignment::from_pitches([48, 55, 64, 72]);
        assert_eq!(open_voicing(&low, &Registers::default()), low);
    }

    #[test]
    fn test_spread_keeps_registers() {
        let close = VoiceAssignment::from_pitches([48, 55, 64, 72]);
        let spread = spread_voicing(&close, &Registers::default(), 2.0);
        // midpoint 60: bass -> 36 out of range (kept), soprano -> 84 out of range (kept)
        assert_eq!(spread.pitches(), vec![48, 50, 68, 72]);
        assert_eq!(spread_voicing(&close, &Registers::default(), 1.0), close);
    }

    #[test]
    fn test_parse_voicing_style() {
        assert_eq!("open".parse::<VoicingStyle>().unwrap(), VoicingStyle::Open);
        assert_eq!("drop-2".parse::<VoicingStyle>().unwrap(), VoicingStyle::Drop2);
        assert_eq!(
            "spread:1.25".parse::<VoicingStyle>().unwrap(),
            VoicingStyle::Spread(1.25)
        );
        assert!("wide".parse::<VoicingStyle>().is_err());
    }
}
