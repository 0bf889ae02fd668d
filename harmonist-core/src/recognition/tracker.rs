//! Bounded record of ended chords and progression detection

use super::session::RecognizedChord;
use crate::analysis::{classify_progression, detect_key_from_chords, function_symbol};
use crate::types::{ChordAnalysis, KeyContext, PitchClass};
use std::collections::VecDeque;
use tracing::debug;

/// Key and progression pattern found across recently ended chords
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressionDetected {
    pub key_root: PitchClass,
    pub progression_type: String,
    /// Function symbols relative to the detected major key
    pub functions: Vec<String>,
    pub chords: Vec<RecognizedChord>,
}

/// Bounded list of ended chords, re-evaluated on every append
#[derive(Debug, Clone)]
pub struct ProgressionTracker {
    chords: VecDeque<RecognizedChord>,
    limit: usize,
    min_chords: usize,
    detected_key: Option<PitchClass>,
    progression_type: Option<String>,
}

impl ProgressionTracker {
    pub fn new(limit: usize, min_chords: usize) -> Self {
        ProgressionTracker {
            chords: VecDeque::with_capacity(limit),
            limit: limit.max(1),
            min_chords,
            detected_key: None,
            progression_type: None,
        }
    }

    /// Append an ended chord; once enough chords are held, detect key and pattern
    pub fn push(&mut self, chord: RecognizedChord) -> Option<ProgressionDetected> {
        self.chords.push_back(chord);
        while self.chords.len() > self.limit {
            self.chords.pop_front();
        }
        if self.chords.len() < self.min_chords {
            return None;
        }

        let analyses: Vec<ChordAnalysis> =
            self.chords.iter().map(|c| c.analysis.clone()).collect();
        let key_root = detect_key_from_chords(&analyses);
        let key = KeyContext::major(key_root);
        let functions: Vec<String> = analyses
            .iter()
            .map(|a| function_symbol(a.root, &a.quality, &key))
            .collect();
        let progression_type = classify_progression(&functions).to_string();
        debug!(
            key = %key.name(),
            progression = %progression_type,
            chords = analyses.len(),
            "progression detected"
        );

        self.detected_key = Some(key_root);
        self.progression_type = Some(progression_type.clone());
        Some(ProgressionDetected {
            key_root,
            progression_type,
            functions,
            chords: self.chords.iter().cloned().collect(),
        })
    }

    pub fn chords(&self) -> impl Iterator<Item = &RecognizedChord> {
        self.chords.iter()
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    pub fn detected_key(&self) -> Option<PitchClass> {
        self.detected_key
    }

    pub fn progression_type(&self) -> Option<&str> {
        self.progression_type.as_deref()
    }

    pub fn clear(&mut self) {
        self.chords.clear();
        self.detected_key = None;
        self.progression_type = None;
    }
}
