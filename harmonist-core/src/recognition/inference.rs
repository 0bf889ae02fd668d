//! Root inference and confidence scoring for live chord recognition

use super::config::{RecognitionConfig, RootInference};
use crate::analysis::identify::{chord_tones, intervals_above};
use crate::types::quality::{self, UNKNOWN};
use crate::types::Pitch;
use crate::voice_leading::position_smoothness;
use tracing::trace;

/// Qualities the recognizer matches directly; extended chords are left to the analyzer
pub const RECOGNITION_TEMPLATES: &[&str] = &[
    "major",
    "minor",
    "diminished",
    "augmented",
    "dominant7",
    "major7",
    "minor7",
    "minor_major7",
    "diminished7",
    "half_diminished7",
    "major6",
    "minor6",
    "sus2",
    "sus4",
    "dominant7_sus4",
    "add9",
    "minor_add9",
];

/// Upper structures read as a chord whose root is not sounding.
///
/// Stack and context inference only try sounding pitches as roots, and a
/// sounding root always completes a template first (minor7 or minor_add9 for
/// the ninth shape). These readings answer [`score_root`] when it is asked
/// about a root that is not sounding.
const ROOTLESS: &[(&[u8], &str)] = &[
    (&[3, 7, 10], "minor7"),
    (&[4, 7, 11], "major7"),
    (&[4, 7, 10], "dominant7"),
    (&[3, 6, 10], "half_diminished7"),
    (&[2, 3, 7, 10], "minor9"),
];

const POWER_CONFIDENCE: f32 = 0.9;
const SHELL_CONFIDENCE: f32 = 0.85;
const ROOTLESS_CONFIDENCE: f32 = 0.7;
const UNKNOWN_CONFIDENCE: f32 = 0.3;
const EXTRA_NOTE_PENALTY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootCandidate {
    pub root: Pitch,
    pub quality: &'static str,
    pub confidence: f32,
}

impl RootCandidate {
    /// Idealized chord tones of this reading, used for smoothness ranking
    pub fn template_pitches(&self) -> Vec<Pitch> {
        if self.quality == UNKNOWN {
            vec![self.root]
        } else {
            chord_tones(self.root, self.quality)
        }
    }
}

/// Read `pitches` with `root` as the root and score how convincing that is.
///
/// A fully present template scores `1 - 0.1 * extra notes`; the best such
/// template wins, earlier templates on ties. Failing that the set is tried as
/// a power chord, a shell voicing and a rootless upper structure.
pub fn score_root(pitches: &[Pitch], root: Pitch) -> RootCandidate {
    let intervals = intervals_above(pitches, root);
    let mut best: Option<(&'static str, f32)> = None;

    for &name in RECOGNITION_TEMPLATES {
        let Some(template) = quality::lookup(name) else {
            continue;
        };
        let matched = template
            .intervals
            .iter()
            .filter(|i| intervals.contains(i))
            .count();
        if matched < template.size() {
            continue;
        }
        let extra = intervals.len() - matched;
        let score = (matched as f32 / template.size() as f32
            - EXTRA_NOTE_PENALTY * extra as f32)
            .clamp(0.0, 1.0);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((name, score));
        }
    }

    let (quality, confidence) = best
        .or_else(|| fallback_reading(&intervals))
        .unwrap_or((UNKNOWN, UNKNOWN_CONFIDENCE));
    RootCandidate {
        root,
        quality,
        confidence,
    }
}

fn fallback_reading(intervals: &[u8]) -> Option<(&'static str, f32)> {
    if intervals == [0, 7] {
        return Some(("power", POWER_CONFIDENCE));
    }

    if intervals.len() == 3 && intervals[0] == 0 {
        let shell = match (intervals[1], intervals[2]) {
            (4, 10) => Some("dominant7"),
            (4, 11) => Some("major7"),
            (3, 10) => Some("minor7"),
            (3, 11) => Some("minor_major7"),
            _ => None,
        };
        if let Some(name) = shell {
            return Some((name, SHELL_CONFIDENCE));
        }
    }

    let upper: Vec<u8> = intervals.iter().copied().filter(|&i| i != 0).collect();
    ROOTLESS
        .iter()
        .find(|(pattern, _)| *pattern == upper.as_slice())
        .map(|&(_, name)| (name, ROOTLESS_CONFIDENCE))
}

/// Every sounding pitch tried as root, keeping readings above the threshold
pub fn stack_candidates(pitches: &[Pitch], threshold: f32) -> Vec<RootCandidate> {
    pitches
        .iter()
        .map(|&root| score_root(pitches, root))
        .filter(|candidate| candidate.confidence > threshold)
        .collect()
}

/// Pick a root for `pitches` (sorted ascending) under the configured mode.
///
/// `previous` holds the notes of the chord that was sounding before, used by
/// context ranking. Returns `None` only for empty input.
pub fn infer_root(
    pitches: &[Pitch],
    previous: Option<&[Pitch]>,
    config: &RecognitionConfig,
) -> Option<RootCandidate> {
    let &bass = pitches.first()?;
    let bass_reading = score_root(pitches, bass);

    let chosen = match config.inference {
        RootInference::Bass => bass_reading,
        RootInference::Stack => {
            let candidates = stack_candidates(pitches, config.candidate_threshold);
            pick_best(&candidates, bass, |c| c.confidence).unwrap_or(bass_reading)
        }
        RootInference::Context => {
            let candidates = stack_candidates(pitches, config.candidate_threshold);
            let weight = config.context_weight;
            let picked = match previous.filter(|notes| !notes.is_empty()) {
                Some(previous) => pick_best(&candidates, bass, |c| {
                    (1.0 - weight) * c.confidence
                        + weight * position_smoothness(&c.template_pitches(), previous)
                }),
                None => pick_best(&candidates, bass, |c| c.confidence),
            };
            picked.unwrap_or(bass_reading)
        }
    };

    trace!(
        root = chosen.root,
        quality = chosen.quality,
        confidence = chosen.confidence,
        mode = %config.inference,
        "inferred root"
    );
    Some(chosen)
}

/// Highest score wins; among equal scores the bass, otherwise the first candidate
fn pick_best<F>(candidates: &[RootCandidate], bass: Pitch, score: F) -> Option<RootCandidate>
where
    F: Fn(&RootCandidate) -> f32,
{
    let scored: Vec<(RootCandidate, f32)> = candidates.iter().map(|c| (*c, score(c))).collect();
    let top = scored
        .iter()
        .map(|&(_, s)| s)
        .fold(f32::NEG_INFINITY, f32::max);

    let mut tied = scored
        .iter()
        .filter(|&&(_, s)| (s - top).abs() < f32::EPSILON)
        .map(|&(c, _)| c);
    let first = tied.next()?;
    if first.root == bass {
        return Some(first);
    }
    Some(tied.find(|c| c.root == bass).unwrap_or(first))
}
