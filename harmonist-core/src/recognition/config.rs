//! Recognition settings and root inference modes

use crate::error::HarmonyError;
use crate::types::KeyContext;
use std::fmt;
use std::str::FromStr;

/// How the session picks a root among the sounding pitches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RootInference {
    /// The lowest pitch is the root
    Bass,
    /// Every sounding pitch is tried; highest confidence wins
    #[default]
    Stack,
    /// Stack candidates re-ranked by smoothness from the previous chord
    Context,
}

impl FromStr for RootInference {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bass" => Ok(RootInference::Bass),
            "stack" => Ok(RootInference::Stack),
            "context" => Ok(RootInference::Context),
            other => Err(HarmonyError::UnknownInferenceMode(other.to_string())),
        }
    }
}

impl fmt::Display for RootInference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RootInference::Bass => "bass",
            RootInference::Stack => "stack",
            RootInference::Context => "context",
        };
        write!(f, "{}", name)
    }
}

/// Settings for a [`RecognitionSession`](super::RecognitionSession)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecognitionConfig {
    pub debounce_ms: u64,
    pub inference: RootInference,
    /// Sounding notes needed for a block chord
    pub min_notes: usize,
    pub history_limit: usize,
    pub progression_limit: usize,
    /// Ended chords needed before progression detection runs
    pub progression_min: usize,
    /// How long onsets stay available for broken-chord detection
    pub broken_window_ms: u64,
    pub broken_min_notes: usize,
    pub broken_threshold: f32,
    /// Stack candidates at or below this confidence are discarded
    pub candidate_threshold: f32,
    /// Share of the context score given to smoothness
    pub context_weight: f32,
    /// Enables function symbols on recognized chords
    pub key: Option<KeyContext>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        RecognitionConfig {
            debounce_ms: 50,
            inference: RootInference::Stack,
            min_notes: 2,
            history_limit: 64,
            progression_limit: 16,
            progression_min: 4,
            broken_window_ms: 500,
            broken_min_notes: 3,
            broken_threshold: 0.7,
            candidate_threshold: 0.5,
            context_weight: 0.3,
            key: None,
        }
    }
}

impl RecognitionConfig {
    pub fn with_debounce(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_inference(mut self, inference: RootInference) -> Self {
        self.inference = inference;
        self
    }

    pub fn with_key(mut self, key: KeyContext) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_broken_window(mut self, window_ms: u64) -> Self {
        self.broken_window_ms = window_ms;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}
