//! Four-voice assignment by cost-scored candidate search

use super::rules::{
    detect_violations, movements, permutations, RuleContext, VoiceLeadingViolation,
    VoiceMovement,
};
use super::transforms::{apply_voicing, VoicingStyle};
use super::voice::{Registers, VoiceAssignment, VoiceRole};
use crate::analysis::identify::analyze;
use crate::types::{pitch_class, KeyContext, Pitch, PitchSet};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, trace};

/// Weights and limits of the optimizer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimizerConfig {
    pub registers: Registers,
    /// Motion above this costs double
    pub soft_threshold: i32,
    /// Motion above this costs `hard_penalty` outright
    pub hard_threshold: i32,
    pub hard_penalty: f32,
    pub common_tone_bonus: f32,
    pub parallel_penalty: f32,
    pub crossing_penalty: f32,
    pub overlap_penalty: f32,
    pub resolution_penalty: f32,
    pub comfort_weight: f32,
    /// Reported as a large leap (diagnostic only)
    pub large_leap: i32,
    pub history_limit: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            registers: Registers::default(),
            soft_threshold: 4,
            hard_threshold: 12,
            hard_penalty: 100.0,
            common_tone_bonus: 5.0,
            parallel_penalty: 50.0,
            crossing_penalty: 30.0,
            overlap_penalty: 20.0,
            resolution_penalty: 25.0,
            comfort_weight: 10.0,
            large_leap: 7,
            history_limit: 16,
        }
    }
}

impl OptimizerConfig {
    pub fn with_registers(mut self, registers: Registers) -> Self {
        self.registers = registers;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Cost of one voice moving `semitones` (sign ignored)
    pub fn movement_cost(&self, semitones: i32) -> f32 {
        let m = semitones.abs();
        if m == 0 {
            -self.common_tone_bonus
        } else if m > self.hard_threshold {
            self.hard_penalty
        } else if m > self.soft_threshold {
            2.0 * m as f32
        } else {
            m as f32
        }
    }

    fn violation_cost(&self, violation: &VoiceLeadingViolation) -> f32 {
        match violation {
            VoiceLeadingViolation::ParallelFifths { .. }
            | VoiceLeadingViolation::ParallelOctaves { .. } => self.parallel_penalty,
            VoiceLeadingViolation::VoiceCrossing { .. } => self.crossing_penalty,
            VoiceLeadingViolation::VoiceOverlap { .. } => self.overlap_penalty,
            VoiceLeadingViolation::UnresolvedLeadingTone { .. }
            | VoiceLeadingViolation::UnresolvedSeventh { .. } => self.resolution_penalty,
            VoiceLeadingViolation::LargeLeap { .. } => 0.0,
        }
    }

    fn comfort_cost(&self, assignment: &VoiceAssignment) -> f32 {
        assignment
            .iter()
            .map(|(role, pitch)| {
                let range = self.registers.get(role);
                self.comfort_weight * (pitch as f32 - range.midpoint()).abs() / range.width()
            })
            .sum()
    }
}

/// Per-chord options for [`VoiceLeadingOptimizer::process_chord`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoicingOptions {
    /// Keep the chord root in the bass
    pub force_root_bass: bool,
    /// Chord root; identified from the pitches when absent
    pub root: Option<Pitch>,
    /// Enables leading-tone checks
    pub key: Option<KeyContext>,
    pub style: VoicingStyle,
}

impl VoicingOptions {
    pub fn with_root(mut self, root: Pitch) -> Self {
        self.root = Some(root);
        self
    }

    pub fn with_root_bass(mut self) -> Self {
        self.force_root_bass = true;
        self
    }

    pub fn with_key(mut self, key: KeyContext) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_style(mut self, style: VoicingStyle) -> Self {
        self.style = style;
        self
    }
}

/// Outcome of voicing one chord
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoicedChord {
    pub assignment: VoiceAssignment,
    pub cost: f32,
    pub movements: Vec<VoiceMovement>,
    pub violations: Vec<VoiceLeadingViolation>,
}

impl VoicedChord {
    pub fn total_movement(&self) -> i32 {
        self.movements.iter().map(|m| m.semitones.abs()).sum()
    }
}

/// Stateful four-voice optimizer; owns the current assignment
#[derive(Debug, Clone, Default)]
pub struct VoiceLeadingOptimizer {
    config: OptimizerConfig,
    current: VoiceAssignment,
    previous_root: Option<Pitch>,
    history: VecDeque<VoicedChord>,
}

impl VoiceLeadingOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OptimizerConfig) -> Self {
        VoiceLeadingOptimizer {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Copy of the current assignment
    pub fn current(&self) -> VoiceAssignment {
        self.current
    }

    pub fn previous_root(&self) -> Option<Pitch> {
        self.previous_root
    }

    /// Recent results, oldest first
    pub fn history(&self) -> impl Iterator<Item = &VoicedChord> {
        self.history.iter()
    }

    pub fn reset(&mut self) {
        self.current = VoiceAssignment::default();
        self.previous_root = None;
        self.history.clear();
        debug!("voice leading state reset");
    }

    /// Voice a chord and return only the resulting assignment
    pub fn assign_voices(&mut self, pitches: &[Pitch], options: &VoicingOptions) -> VoiceAssignment {
        self.process_chord(pitches, options).assignment
    }

    /// Voice a chord against the current assignment and make the result current.
    ///
    /// An empty chord leaves the state untouched.
    pub fn process_chord(&mut self, pitches: &[Pitch], options: &VoicingOptions) -> VoicedChord {
        let set = PitchSet::from(pitches);
        if set.is_empty() {
            return VoicedChord {
                assignment: self.current,
                cost: 0.0,
                movements: Vec::new(),
                violations: Vec::new(),
            };
        }

        let root = options.root.unwrap_or_else(|| analyze(set.pitches(), None).root);
        let context = RuleContext {
            key: options.key,
            previous_root: self.previous_root,
            next_root: Some(root),
            large_leap: self.config.large_leap,
        };

        let selected = if self.current.is_empty() {
            self.initial_voicing(&set, root, options.force_root_bass)
        } else {
            self.best_candidate(&set, root, options.force_root_bass, &context)
        };

        let assignment = apply_voicing(&selected, options.style, &self.config.registers);
        let voiced = VoicedChord {
            assignment,
            cost: self.evaluate(&assignment, &context),
            movements: movements(&self.current, &assignment),
            violations: detect_violations(&self.current, &assignment, &context),
        };
        debug!(assignment = %voiced.assignment, cost = voiced.cost, "voiced chord");

        self.current = assignment;
        self.previous_root = Some(root);
        self.history.push_back(voiced.clone());
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
        voiced
    }

    /// Bass at the bottom, the rest stacked upward, gaps filled by doubling from the root
    fn initial_voicing(&self, set: &PitchSet, root: Pitch, force_root_bass: bool) -> VoiceAssignment {
        let registers = &self.config.registers;
        let four = reduce_to_four(set.pitches());

        let root_pc = pitch_class(root);
        let bass = if force_root_bass {
            four.iter()
                .copied()
                .find(|&p| pitch_class(p) == root_pc)
                .unwrap_or(root)
        } else {
            four[0]
        };

        let mut upper: Vec<Pitch> = four.iter().copied().filter(|&p| p != bass).collect();
        let mut doubling = std::iter::once(root)
            .chain(four.iter().copied().filter(|&p| p != root))
            .cycle();
        while upper.len() < 3 {
            match doubling.next() {
                Some(pitch) => upper.push(pitch),
                None => break,
            }
        }

        let mut assignment = VoiceAssignment::new();
        let mut below = registers.bass.fold(bass);
        assignment.set(VoiceRole::Bass, Some(below));

        for (role, &pitch) in [VoiceRole::Tenor, VoiceRole::Alto, VoiceRole::Soprano]
            .iter()
            .zip(upper.iter())
        {
            let range = registers.get(*role);
            let placed = range
                .octaves_of(pitch)
                .filter(|&p| p >= below)
                .min_by_key(|&p| (p - pitch).abs())
                .unwrap_or_else(|| range.fold(pitch));
            assignment.set(*role, Some(placed));
            below = placed;
        }
        assignment
    }

    /// Four-pitch member lists to permute over the roles
    fn member_sets(set: &PitchSet) -> Vec<Vec<Pitch>> {
        let pitches = set.pitches();
        match pitches.len() {
            0 => Vec::new(),
            1 | 2 => vec![pitches.iter().copied().cycle().take(4).collect()],
            3 => pitches
                .iter()
                .map(|&doubled| {
                    let mut four = pitches.to_vec();
                    four.push(doubled);
                    four
                })
                .collect(),
            _ => vec![reduce_to_four(pitches)],
        }
    }

    fn candidates(&self, set: &PitchSet) -> Vec<VoiceAssignment> {
        let registers = &self.config.registers;
        let orders = permutations(&[0, 1, 2, 3]);
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for members in Self::member_sets(set) {
            for order in &orders {
                let mut assignment = VoiceAssignment::new();
                for (role, &member) in VoiceRole::ALL.iter().zip(order.iter()) {
                    let range = registers.get(*role);
                    let target = self
                        .current
                        .get(*role)
                        .unwrap_or(range.midpoint().round() as Pitch);
                    assignment.set(*role, Some(range.nearest(members[member], target)));
                }
                if seen.insert(assignment) {
                    candidates.push(assignment);
                }
            }
        }
        candidates
    }

    fn evaluate(&self, candidate: &VoiceAssignment, context: &RuleContext) -> f32 {
        let motion: f32 = VoiceRole::ALL
            .iter()
            .map(|&role| match (self.current.get(role), candidate.get(role)) {
                (Some(from), Some(to)) => self.config.movement_cost(to - from),
                _ => 0.0,
            })
            .sum();
        let penalties: f32 = detect_violations(&self.current, candidate, context)
            .iter()
            .map(|v| self.config.violation_cost(v))
            .sum();
        motion + penalties + self.config.comfort_cost(candidate)
    }

    fn best_candidate(
        &self,
        set: &PitchSet,
        root: Pitch,
        force_root_bass: bool,
        context: &RuleContext,
    ) -> VoiceAssignment {
        let mut candidates = self.candidates(set);
        if force_root_bass {
            let root_pc = pitch_class(root);
            let rooted: Vec<VoiceAssignment> = candidates
                .iter()
                .copied()
                .filter(|c| c.get(VoiceRole::Bass).map(pitch_class) == Some(root_pc))
                .collect();
            if !rooted.is_empty() {
                candidates = rooted;
            }
        }

        let mut best = self.current;
        let mut best_cost = f32::INFINITY;
        for candidate in candidates {
            let cost = self.evaluate(&candidate, context);
            trace!(candidate = %candidate, cost, "scored candidate");
            if cost < best_cost {
                best_cost = cost;
                best = candidate;
            }
        }
        best
    }
}

/// Keep the bass and three upper pitches, shedding fifths above the bass first, then the highest
pub fn reduce_to_four(pitches: &[Pitch]) -> Vec<Pitch> {
    let mut sorted = pitches.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let Some((&bass, rest)) = sorted.split_first() else {
        return Vec::new();
    };

    let mut upper = rest.to_vec();
    while upper.len() > 3 {
        match upper.iter().position(|&p| (p - bass).rem_euclid(12) == 7) {
            Some(fifth) => {
                upper.remove(fifth);
            }
            None => {
                upper.pop();
            }
        }
    }

    let mut four = Vec::with_capacity(4);
    four.push(bass);
    four.extend(upper);
    four
}
