//! Voice-leading rule checks between two assignments
//!
//! Detection is purely diagnostic: a violation is reported, never repaired.

use super::voice::{VoiceAssignment, VoiceRole};
use crate::types::{pitch_class, pitch_name, KeyContext, Pitch, PitchClass};
#[cfg(feature = "colored")]
use colored::*;
use std::fmt;

/// Movement of one voice from one chord to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoiceMovement {
    pub role: VoiceRole,
    pub from: Pitch,
    pub to: Pitch,
    pub semitones: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VoiceLeadingViolation {
    ParallelFifths { lower: VoiceRole, upper: VoiceRole },
    ParallelOctaves { lower: VoiceRole, upper: VoiceRole },
    VoiceCrossing { lower: VoiceRole, upper: VoiceRole },
    VoiceOverlap { lower: VoiceRole, upper: VoiceRole },
    LargeLeap { role: VoiceRole, semitones: i32 },
    UnresolvedLeadingTone { role: VoiceRole },
    UnresolvedSeventh { role: VoiceRole },
}

impl fmt::Display for VoiceLeadingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceLeadingViolation::ParallelFifths { lower, upper } => {
                write!(f, "parallel 5ths ({}/{})", lower, upper)
            }
            VoiceLeadingViolation::ParallelOctaves { lower, upper } => {
                write!(f, "parallel 8ves ({}/{})", lower, upper)
            }
            VoiceLeadingViolation::VoiceCrossing { lower, upper } => {
                write!(f, "voice crossing ({}/{})", lower, upper)
            }
            VoiceLeadingViolation::VoiceOverlap { lower, upper } => {
                write!(f, "voice overlap ({}/{})", lower, upper)
            }
            VoiceLeadingViolation::LargeLeap { role, semitones } => {
                write!(f, "large leap in {} ({})", role, semitones)
            }
            VoiceLeadingViolation::UnresolvedLeadingTone { role } => {
                write!(f, "unresolved leading tone in {}", role)
            }
            VoiceLeadingViolation::UnresolvedSeventh { role } => {
                write!(f, "unresolved seventh in {}", role)
            }
        }
    }
}

/// Counts of motion types across all voice pairs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionMetrics {
    /// Pairs moving in the same direction (parallel or similar)
    pub similar_motion_count: usize,
    pub contrary_motion_count: usize,
    pub oblique_motion_count: usize,
    pub stepwise_motion_count: usize,
    pub leap_count: usize,
    pub common_tone_retention: f32,
}

/// What the checker needs beyond the two assignments
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RuleContext {
    /// Enables the leading-tone check
    pub key: Option<KeyContext>,
    /// Root of the chord being left; enables the seventh check
    pub previous_root: Option<Pitch>,
    /// Root of the chord being entered
    pub next_root: Option<Pitch>,
    /// Motion above this many semitones is a large leap
    pub large_leap: i32,
}

impl RuleContext {
    pub fn new() -> Self {
        RuleContext {
            large_leap: 7,
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: KeyContext) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_roots(mut self, previous: Option<Pitch>, next: Option<Pitch>) -> Self {
        self.previous_root = previous;
        self.next_root = next;
        self
    }
}

/// Full result of checking one transition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleReport {
    pub movements: Vec<VoiceMovement>,
    pub common_tones: Vec<PitchClass>,
    pub metrics: MotionMetrics,
    pub violations: Vec<VoiceLeadingViolation>,
}

impl RuleReport {
    pub fn total_movement(&self) -> i32 {
        self.movements.iter().map(|m| m.semitones.abs()).sum()
    }

    pub fn has_parallels(&self) -> bool {
        self.violations.iter().any(|v| {
            matches!(
                v,
                VoiceLeadingViolation::ParallelFifths { .. }
                    | VoiceLeadingViolation::ParallelOctaves { .. }
            )
        })
    }
}

/// Movements of every role present in both assignments
pub fn movements(prev: &VoiceAssignment, next: &VoiceAssignment) -> Vec<VoiceMovement> {
    VoiceRole::ALL
        .iter()
        .filter_map(|&role| {
            let from = prev.get(role)?;
            let to = next.get(role)?;
            Some(VoiceMovement {
                role,
                from,
                to,
                semitones: to - from,
            })
        })
        .collect()
}

fn same_direction(a: &VoiceMovement, b: &VoiceMovement) -> bool {
    (a.semitones > 0 && b.semitones > 0) || (a.semitones < 0 && b.semitones < 0)
}

/// Parallel perfect fifths and octaves between any two moving voices
fn parallel_violations(moves: &[VoiceMovement], out: &mut Vec<VoiceLeadingViolation>) {
    for (i, lower) in moves.iter().enumerate() {
        for upper in &moves[i + 1..] {
            if !same_direction(lower, upper) {
                continue;
            }
            let before = (upper.from - lower.from).abs() % 12;
            let after = (upper.to - lower.to).abs() % 12;
            match (before, after) {
                (7, 7) => out.push(VoiceLeadingViolation::ParallelFifths {
                    lower: lower.role,
                    upper: upper.role,
                }),
                (0, 0) => out.push(VoiceLeadingViolation::ParallelOctaves {
                    lower: lower.role,
                    upper: upper.role,
                }),
                _ => {}
            }
        }
    }
}

/// Adjacent voices sounding out of order within one assignment
pub fn crossings(assignment: &VoiceAssignment) -> Vec<VoiceLeadingViolation> {
    VoiceRole::ALL
        .windows(2)
        .filter_map(|pair| {
            let (lower, upper) = (pair[0], pair[1]);
            let low = assignment.get(lower)?;
            let high = assignment.get(upper)?;
            (low > high).then_some(VoiceLeadingViolation::VoiceCrossing { lower, upper })
        })
        .collect()
}

/// A voice moving past where its neighbour just was
fn overlaps(prev: &VoiceAssignment, next: &VoiceAssignment, out: &mut Vec<VoiceLeadingViolation>) {
    for pair in VoiceRole::ALL.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        if let (Some(new_low), Some(old_high)) = (next.get(lower), prev.get(upper)) {
            if new_low > old_high {
                out.push(VoiceLeadingViolation::VoiceOverlap { lower, upper });
            }
        }
        if let (Some(new_high), Some(old_low)) = (next.get(upper), prev.get(lower)) {
            if new_high < old_low {
                out.push(VoiceLeadingViolation::VoiceOverlap { lower, upper });
            }
        }
    }
}

fn resolution_violations(
    moves: &[VoiceMovement],
    next: &VoiceAssignment,
    context: &RuleContext,
    out: &mut Vec<VoiceLeadingViolation>,
) {
    if let Some(key) = &context.key {
        let leading_tone = key.leading_tone();
        let arrives_on_tonic = next.iter().any(|(_, p)| pitch_class(p) == key.root);
        if arrives_on_tonic {
            for movement in moves {
                if pitch_class(movement.from) == leading_tone && movement.semitones != 1 {
                    out.push(VoiceLeadingViolation::UnresolvedLeadingTone {
                        role: movement.role,
                    });
                }
            }
        }
    }

    if let Some(previous_root) = context.previous_root {
        let harmony_changed = context
            .next_root
            .map_or(true, |next_root| pitch_class(next_root) != pitch_class(previous_root));
        if harmony_changed {
            let minor_seventh = pitch_class(previous_root + 10);
            let major_seventh = pitch_class(previous_root + 11);
            for movement in moves {
                let pc = pitch_class(movement.from);
                let resolves_down = movement.semitones == -1 || movement.semitones == -2;
                if (pc == minor_seventh || pc == major_seventh) && !resolves_down {
                    out.push(VoiceLeadingViolation::UnresolvedSeventh {
                        role: movement.role,
                    });
                }
            }
        }
    }
}

/// Every violation of the transition `prev -> next`
pub fn detect_violations(
    prev: &VoiceAssignment,
    next: &VoiceAssignment,
    context: &RuleContext,
) -> Vec<VoiceLeadingViolation> {
    let moves = movements(prev, next);
    let mut violations = Vec::new();

    parallel_violations(&moves, &mut violations);
    violations.extend(crossings(next));
    overlaps(prev, next, &mut violations);
    resolution_violations(&moves, next, context, &mut violations);

    for movement in &moves {
        if movement.semitones.abs() > context.large_leap {
            violations.push(VoiceLeadingViolation::LargeLeap {
                role: movement.role,
                semitones: movement.semitones.abs(),
            });
        }
    }

    violations
}

fn calculate_metrics(moves: &[VoiceMovement], common_tones: usize, voices: usize) -> MotionMetrics {
    let mut metrics = MotionMetrics::default();

    for (i, a) in moves.iter().enumerate() {
        for b in &moves[i + 1..] {
            if a.semitones == 0 && b.semitones == 0 {
                continue;
            } else if a.semitones == 0 || b.semitones == 0 {
                metrics.oblique_motion_count += 1;
            } else if same_direction(a, b) {
                metrics.similar_motion_count += 1;
            } else {
                metrics.contrary_motion_count += 1;
            }
        }
    }

    for movement in moves {
        match movement.semitones.abs() {
            0 => {}
            1..=2 => metrics.stepwise_motion_count += 1,
            _ => metrics.leap_count += 1,
        }
    }

    metrics.common_tone_retention = if voices > 0 {
        common_tones as f32 / voices as f32
    } else {
        0.0
    };
    metrics
}

/// Check the transition between two assignments
pub fn check_rules(
    prev: &VoiceAssignment,
    next: &VoiceAssignment,
    context: &RuleContext,
) -> RuleReport {
    let moves = movements(prev, next);

    let next_pcs: Vec<PitchClass> = next.iter().map(|(_, p)| pitch_class(p)).collect();
    let mut common_tones: Vec<PitchClass> = prev
        .iter()
        .map(|(_, p)| pitch_class(p))
        .filter(|pc| next_pcs.contains(pc))
        .collect();
    common_tones.sort_unstable();
    common_tones.dedup();

    let metrics = calculate_metrics(&moves, common_tones.len(), moves.len());
    let violations = detect_violations(prev, next, context);

    RuleReport {
        movements: moves,
        common_tones,
        metrics,
        violations,
    }
}

/// Smoothness of moving between two pitch lists paired by sorted position.
///
/// `1 - avg(|delta|) / 12` over the first `min(len)` pairs, clamped to [0, 1];
/// 0 when either side is empty.
pub fn position_smoothness(from: &[Pitch], to: &[Pitch]) -> f32 {
    let mut from = from.to_vec();
    let mut to = to.to_vec();
    from.sort_unstable();
    to.sort_unstable();

    let pairs = from.len().min(to.len());
    if pairs == 0 {
        return 0.0;
    }
    let total: i32 = from
        .iter()
        .zip(to.iter())
        .map(|(a, b)| (b - a).abs())
        .sum();
    (1.0 - total as f32 / pairs as f32 / 12.0).clamp(0.0, 1.0)
}

/// All orderings of `items`
pub fn permutations(items: &[usize]) -> Vec<Vec<usize>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }

    let mut result = Vec::new();
    for (i, &item) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(i);
        for mut perm in permutations(&rest) {
            perm.insert(0, item);
            result.push(perm);
        }
    }
    result
}

#[cfg(feature = "colored")]
impl fmt::Display for RuleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moves: Vec<String> = self
            .movements
            .iter()
            .map(|m| {
                let text = format!(
                    "{} {}→{} ({:+})",
                    m.role,
                    pitch_name(m.from),
                    pitch_name(m.to),
                    m.semitones
                );
                match m.semitones.abs() {
                    0 => text.bright_blue().to_string(),
                    1..=2 => text.green().to_string(),
                    3..=4 => text.yellow().to_string(),
                    _ => text.red().to_string(),
                }
            })
            .collect();
        write!(f, "{}", moves.join(", "))?;
        if !self.violations.is_empty() {
            let violations: Vec<String> =
                self.violations.iter().map(|v| v.to_string()).collect();
            write!(f, " {} {}", "⚠".red(), violations.join(", ").red())?;
        }
        Ok(())
    }
}

#[cfg(not(feature = "colored"))]
impl fmt::Display for RuleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moves: Vec<String> = self
            .movements
            .iter()
            .map(|m| {
                format!(
                    "{} {}→{} ({:+})",
                    m.role,
                    pitch_name(m.from),
                    pitch_name(m.to),
                    m.semitones
                )
            })
            .collect();
        write!(f, "{}", moves.join(", "))?;
        if !self.violations.is_empty() {
            let violations: Vec<String> =
                self.violations.iter().map(|v| v.to_string()).collect();
            write!(f, " ⚠ {}", violations.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_voices(bass: Pitch, tenor: Pitch) -> VoiceAssignment {
        VoiceAssignment::new()
            .with(VoiceRole::Bass, bass)
            .with(VoiceRole::Tenor, tenor)
    }

    #[test]
    fn test_parallel_fifths_flagged() {
        // C3/G3 -> D3/A3
        let report = check_rules(&two_voices(48, 55), &two_voices(50, 57), &RuleContext::new());
        assert_eq!(
            report.violations,
            vec![VoiceLeadingViolation::ParallelFifths {
                lower: VoiceRole::Bass,
                upper: VoiceRole::Tenor,
            }]
        );
        assert!(report.has_parallels());
    }

    #[test]
    fn test_contrary_fifths_not_flagged() {
        // C3/G3 -> F2/C4 keeps the fifth class but moves apart
        let report = check_rules(&two_voices(48, 55), &two_voices(41, 60), &RuleContext::new());
        assert!(!report.has_parallels());
        assert_eq!(report.metrics.contrary_motion_count, 1);
    }

    #[test]
    fn test_parallel_octaves_flagged() {
        let report = check_rules(&two_voices(48, 60), &two_voices(50, 62), &RuleContext::new());
        assert_eq!(
            report.violations,
            vec![VoiceLeadingViolation::ParallelOctaves {
                lower: VoiceRole::Bass,
                upper: VoiceRole::Tenor,
            }]
        );
    }

    #[test]
    fn test_crossing_and_overlap() {
        let prev = VoiceAssignment::from_pitches([48, 55, 64, 72]);
        let next = VoiceAssignment::from_pitches([48, 67, 64, 72]);
        let violations = detect_violations(&prev, &next, &RuleContext::new());
        assert!(violations.contains(&VoiceLeadingViolation::VoiceCrossing {
            lower: VoiceRole::Tenor,
            upper: VoiceRole::Alto,
        }));
        assert!(violations.contains(&VoiceLeadingViolation::VoiceOverlap {
            lower: VoiceRole::Tenor,
            upper: VoiceRole::Alto,
        }));
        // detection leaves the assignment untouched
        assert_eq!(next.get(VoiceRole::Tenor), Some(67));
    }

    #[test]
    fn test_leading_tone_resolution() {
        let key = KeyContext::major(0);
        let context = RuleContext::new().with_key(key);
        // G7 -> C with B rising to C is fine
        let prev = VoiceAssignment::from_pitches([43, 59, 65, 67]);
        let good = VoiceAssignment::from_pitches([48, 60, 64, 67]);
        assert!(!detect_violations(&prev, &good, &context)
            .iter()
            .any(|v| matches!(v, VoiceLeadingViolation::UnresolvedLeadingTone { .. })));

        let bad = VoiceAssignment::from_pitches([48, 55, 64, 72]);
        assert!(detect_violations(&prev, &bad, &context)
            .contains(&VoiceLeadingViolation::UnresolvedLeadingTone { role: VoiceRole::Tenor }));
    }

    #[test]
    fn test_seventh_must_fall() {
        let context = RuleContext::new().with_roots(Some(43), Some(48));
        // F (the seventh of G7) in the alto
        let prev = VoiceAssignment::from_pitches([43, 59, 65, 67]);
        let resolved = VoiceAssignment::from_pitches([48, 60, 64, 67]);
        assert!(!detect_violations(&prev, &resolved, &context)
            .iter()
            .any(|v| matches!(v, VoiceLeadingViolation::UnresolvedSeventh { .. })));

        let held = VoiceAssignment::from_pitches([48, 60, 65, 69]);
        assert!(detect_violations(&prev, &held, &context)
            .contains(&VoiceLeadingViolation::UnresolvedSeventh { role: VoiceRole::Alto }));
    }

    #[test]
    fn test_metrics_and_common_tones() {
        let prev = VoiceAssignment::from_pitches([48, 55, 64, 72]);
        let next = VoiceAssignment::from_pitches([53, 57, 65, 72]);
        let report = check_rules(&prev, &next, &RuleContext::new());
        assert_eq!(report.common_tones, vec![0]);
        assert_eq!(report.total_movement(), 8);
        assert_eq!(report.metrics.stepwise_motion_count, 2);
        assert_eq!(report.metrics.leap_count, 1);
        assert_eq!(report.metrics.oblique_motion_count, 3);
    }

    #[test]
    fn test_position_smoothness() {
        assert_eq!(position_smoothness(&[60, 64, 67], &[60, 64, 67]), 1.0);
        assert_eq!(position_smoothness(&[], &[60]), 0.0);
        assert!((position_smoothness(&[60, 64, 67], &[60, 65, 69]) - (1.0 - 1.0 / 12.0)).abs() < 1e-6);
        assert_eq!(position_smoothness(&[40], &[80]), 0.0);
    }

    #[test]
    fn test_permutations() {
        assert_eq!(permutations(&[0, 1, 2]).len(), 6);
        assert_eq!(permutations(&[0, 1, 2, 3]).len(), 24);
    }
}
