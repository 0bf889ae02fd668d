//! Dissonance scoring and tension/alteration extraction

use crate::types::{Pitch, PitchSet};

/// Dissonance weight of an interval class
fn interval_weight(interval: i32) -> f32 {
    match interval {
        1 => 0.8,
        2 => 0.3,
        6 => 0.6,
        10 => 0.4,
        11 => 0.5,
        _ => 0.0,
    }
}

/// Average pairwise dissonance of a pitch set, clamped to [0, 1]
pub fn tension_score(pitches: &[Pitch]) -> f32 {
    let set = PitchSet::from(pitches);
    let pitches = set.pitches();
    if pitches.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, &lower) in pitches.iter().enumerate() {
        for &higher in &pitches[i + 1..] {
            total += interval_weight((higher - lower).rem_euclid(12));
            pairs += 1;
        }
    }

    (total / pairs as f32).clamp(0.0, 1.0)
}

const TENSION_ORDER: [&str; 3] = ["9", "11", "13"];
const ALTERATION_ORDER: [&str; 6] = ["b9", "#9", "#11", "b13", "b5", "#5"];

fn label_for(interval: i32) -> Option<&'static str> {
    match interval {
        13 => Some("b9"),
        14 => Some("9"),
        15 => Some("#9"),
        17 => Some("11"),
        18 => Some("#11"),
        20 => Some("b13"),
        21 => Some("13"),
        1 => Some("b9"),
        2 => Some("9"),
        5 => Some("11"),
        9 => Some("13"),
        6 => Some("b5"),
        8 => Some("#5"),
        _ => None,
    }
}

/// Split the color tones above `root` into natural tensions and alterations.
///
/// Intervals are taken raw (p - root), so a compound interval like 15 reads as
/// #9 while its simple form 3 stays a minor third. Pitches below the root fold
/// into the first octave. Both lists come back deduplicated in display order.
pub fn extract_tensions(root: Pitch, pitches: &[Pitch]) -> (Vec<String>, Vec<String>) {
    let mut intervals: Vec<i32> = pitches
        .iter()
        .map(|&p| {
            let raw = p - root;
            if raw < 0 {
                raw.rem_euclid(12)
            } else {
                raw
            }
        })
        .collect();
    intervals.sort_unstable();
    intervals.dedup();

    let labels: Vec<&str> = intervals.iter().filter_map(|&i| label_for(i)).collect();

    let tensions = TENSION_ORDER
        .iter()
        .filter(|t| labels.contains(t))
        .map(|t| t.to_string())
        .collect();
    let alterations = ALTERATION_ORDER
        .iter()
        .filter(|a| labels.contains(a))
        .map(|a| a.to_string())
        .collect();

    (tensions, alterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tension_score_consonant_triad() {
        assert_eq!(tension_score(&[60, 64, 67]), 0.0);
        assert_eq!(tension_score(&[60]), 0.0);
        assert_eq!(tension_score(&[]), 0.0);
    }

    #[test]
    fn test_tension_score_cluster() {
        // pairs: 1 (0.8), 2 (0.3), 1 (0.8)
        let score = tension_score(&[60, 61, 62]);
        assert!((score - 1.9 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_tension_score_dominant_seventh() {
        // C E G Bb: 4,7,10,3,6,3 -> 0.4 + 0.6 over six pairs
        let score = tension_score(&[60, 64, 67, 70]);
        assert!((score - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_extract_compound_tensions() {
        // C7 with 9 and #11 voiced above the octave
        let (tensions, alterations) = extract_tensions(48, &[48, 52, 55, 58, 62, 66]);
        assert_eq!(tensions, vec!["9"]);
        assert_eq!(alterations, vec!["#11"]);
    }

    #[test]
    fn test_extract_simple_intervals() {
        let (tensions, alterations) = extract_tensions(60, &[60, 61, 64, 67, 70]);
        assert!(tensions.is_empty());
        assert_eq!(alterations, vec!["b9"]);

        // a plain minor third is never a #9
        let (tensions, alterations) = extract_tensions(60, &[60, 63, 67]);
        assert!(tensions.is_empty() && alterations.is_empty());

        let (_, alterations) = extract_tensions(60, &[60, 64, 67, 70, 75]);
        assert_eq!(alterations, vec!["#9"]);
    }

    #[test]
    fn test_extract_dedups_and_orders() {
        let (tensions, _) = extract_tensions(60, &[60, 62, 64, 69, 74, 81]);
        assert_eq!(tensions, vec!["9", "13"]);
    }
}
