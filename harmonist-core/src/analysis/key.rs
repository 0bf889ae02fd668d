//! Major-key detection by weighted key-profile scores

use crate::types::{pitch_class, ChordAnalysis, Pitch, PitchClass};

/// Krumhansl-Kessler major-key profile, indexed by semitones above the tonic
const MAJOR_PROFILE: [f32; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Profile score of every candidate tonic for a pitch multiset
pub fn key_scores(pitches: &[Pitch]) -> [f32; 12] {
    let mut histogram = [0u32; 12];
    for &pitch in pitches {
        histogram[pitch_class(pitch) as usize] += 1;
    }

    let mut scores = [0.0f32; 12];
    for (root, score) in scores.iter_mut().enumerate() {
        *score = histogram
            .iter()
            .enumerate()
            .map(|(pc, &count)| count as f32 * MAJOR_PROFILE[(pc + 12 - root) % 12])
            .sum();
    }
    scores
}

/// Most likely major tonic of a pitch multiset; ties go to the lowest pitch class, empty input is C
pub fn detect_key(pitches: &[Pitch]) -> PitchClass {
    let scores = key_scores(pitches);
    let mut best = 0usize;
    for (root, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = root;
        }
    }
    best as PitchClass
}

/// Key detection over every pitch of a chord sequence
pub fn detect_key_from_chords(chords: &[ChordAnalysis]) -> PitchClass {
    let pitches: Vec<Pitch> = chords.iter().flat_map(|c| c.pitches.iter().copied()).collect();
    detect_key(&pitches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_key_cadence_in_c() {
        // C-F-G-C
        let pitches = [60, 64, 67, 65, 69, 72, 67, 71, 74, 60, 64, 67];
        assert_eq!(detect_key(&pitches), 0);
    }

    #[test]
    fn test_detect_key_cadence_in_d() {
        // D-G-A-D
        let pitches = [62, 66, 69, 67, 71, 74, 69, 73, 76, 62, 66, 69];
        assert_eq!(detect_key(&pitches), 2);
    }

    #[test]
    fn test_detect_key_tie_goes_to_lowest_pitch_class() {
        // a tritone scores the same from both of its notes
        let scores = key_scores(&[60, 66]);
        assert_eq!(scores[0], scores[6]);
        assert_eq!(detect_key(&[66, 60]), 0);
        assert_eq!(detect_key(&[67, 61]), 1);
    }

    #[test]
    fn test_detect_key_empty_is_c() {
        assert_eq!(detect_key(&[]), 0);
        assert_eq!(key_scores(&[]), [0.0; 12]);
    }
}
