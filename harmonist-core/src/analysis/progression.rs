//! Weighted progression generation and progression classification

use super::roman::{chord_from_function, parse_function};
use crate::error::HarmonyError;
use crate::types::{ChordAnalysis, KeyContext};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Style {
    #[default]
    Pop,
    Jazz,
    Blues,
    Classical,
}

impl FromStr for Style {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pop" => Ok(Style::Pop),
            "jazz" => Ok(Style::Jazz),
            "blues" => Ok(Style::Blues),
            "classical" => Ok(Style::Classical),
            other => Err(HarmonyError::UnknownStyle(other.to_string())),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Style::Pop => "pop",
            Style::Jazz => "jazz",
            Style::Blues => "blues",
            Style::Classical => "classical",
        };
        write!(f, "{}", name)
    }
}

type Transitions = &'static [(&'static str, &'static [(&'static str, f32)])];

static POP: Transitions = &[
    ("I", &[("IV", 0.3), ("V", 0.3), ("vi", 0.25), ("ii", 0.15)]),
    ("ii", &[("V", 0.6), ("IV", 0.2), ("vi", 0.2)]),
    ("iii", &[("vi", 0.5), ("IV", 0.5)]),
    ("IV", &[("I", 0.35), ("V", 0.4), ("vi", 0.15), ("ii", 0.1)]),
    ("V", &[("I", 0.5), ("vi", 0.35), ("IV", 0.15)]),
    ("vi", &[("IV", 0.5), ("V", 0.2), ("ii", 0.2), ("I", 0.1)]),
];

static JAZZ: Transitions = &[
    (
        "Imaj7",
        &[("ii7", 0.4), ("vi7", 0.3), ("IVmaj7", 0.2), ("iii7", 0.1)],
    ),
    ("ii7", &[("V7", 0.8), ("bII7", 0.2)]),
    ("iii7", &[("vi7", 0.8), ("ii7", 0.2)]),
    ("IVmaj7", &[("V7", 0.4), ("ii7", 0.3), ("iii7", 0.3)]),
    ("V7", &[("Imaj7", 0.7), ("vi7", 0.2), ("iii7", 0.1)]),
    ("vi7", &[("ii7", 0.7), ("IVmaj7", 0.3)]),
    ("bII7", &[("Imaj7", 1.0)]),
];

static BLUES: Transitions = &[
    ("I7", &[("IV7", 0.5), ("I7", 0.3), ("V7", 0.2)]),
    ("IV7", &[("I7", 0.6), ("IV7", 0.2), ("V7", 0.2)]),
    ("V7", &[("IV7", 0.5), ("I7", 0.5)]),
];

static CLASSICAL: Transitions = &[
    (
        "I",
        &[
            ("V", 0.35),
            ("IV", 0.3),
            ("vi", 0.15),
            ("ii", 0.1),
            ("iii", 0.05),
            ("vii°", 0.05),
        ],
    ),
    ("ii", &[("V", 0.7), ("vii°", 0.3)]),
    ("iii", &[("vi", 0.6), ("IV", 0.4)]),
    ("IV", &[("V", 0.5), ("I", 0.25), ("ii", 0.15), ("vii°", 0.1)]),
    ("V", &[("I", 0.7), ("vi", 0.3)]),
    ("vi", &[("ii", 0.5), ("IV", 0.4), ("V", 0.1)]),
    ("vii°", &[("I", 1.0)]),
];

const FALLBACK: &[(&str, f32)] = &[("I", 1.0)];

static SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("I", &["iii", "vi"]),
    ("ii", &["IV"]),
    ("iii", &["I"]),
    ("IV", &["ii"]),
    ("V", &["vii°"]),
    ("vi", &["I", "iii"]),
    ("Imaj7", &["iii7", "vi7"]),
    ("ii7", &["IVmaj7"]),
    ("V7", &["bII7"]),
    ("I7", &["IV7"]),
    ("IV7", &["ii7"]),
];

impl Style {
    fn transitions(self) -> Transitions {
        match self {
            Style::Pop => POP,
            Style::Jazz => JAZZ,
            Style::Blues => BLUES,
            Style::Classical => CLASSICAL,
        }
    }
}

/// Accidental plus numeral of a function symbol ("bVII7" -> "bVII"); unparseable text is kept whole
pub fn normalize_function(symbol: &str) -> String {
    parse_function(symbol)
        .map(|f| f.core())
        .unwrap_or_else(|_| symbol.trim().to_string())
}

/// Exact key first, then a key with the same accidental and numeral
fn lookup<'a, T>(table: &'a [(&'static str, T)], function: &str) -> Option<&'a T> {
    if let Some((_, value)) = table.iter().find(|(key, _)| *key == function) {
        return Some(value);
    }
    let core = normalize_function(function);
    table
        .iter()
        .find(|(key, _)| normalize_function(key) == core)
        .map(|(_, value)| value)
}

/// Settings for [`generate_progression`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressionConfig {
    pub length: usize,
    pub style: Style,
    pub start: String,
    pub end: String,
    /// Probability of swapping a drawn chord for a substitute
    pub complexity: f64,
    pub key: KeyContext,
    pub seed: Option<u64>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        ProgressionConfig {
            length: 4,
            style: Style::Pop,
            start: "I".to_string(),
            end: "I".to_string(),
            complexity: 0.2,
            key: KeyContext::default(),
            seed: None,
        }
    }
}

impl ProgressionConfig {
    pub fn new(length: usize, style: Style) -> Self {
        ProgressionConfig {
            length,
            style,
            ..Default::default()
        }
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = start.into();
        self
    }

    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = end.into();
        self
    }

    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_key(mut self, key: KeyContext) -> Self {
        self.key = key;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn draw<R: Rng + ?Sized>(weights: &[(&'static str, f32)], rng: &mut R) -> &'static str {
    let total: f32 = weights.iter().map(|(_, w)| w).sum();
    let target = rng.gen::<f32>() * total;
    let mut cumulative = 0.0;
    for &(function, weight) in weights {
        cumulative += weight;
        if target < cumulative {
            return function;
        }
    }
    weights.last().map_or("I", |&(function, _)| function)
}

/// Generate the function symbols of a progression using the supplied RNG
pub fn generate_functions<R: Rng + ?Sized>(config: &ProgressionConfig, rng: &mut R) -> Vec<String> {
    match config.length {
        0 => return Vec::new(),
        1 => return vec![config.end.clone()],
        _ => {}
    }

    let table = config.style.transitions();
    let complexity = config.complexity.clamp(0.0, 1.0);
    let mut functions = vec![config.start.clone()];

    for _ in 1..config.length - 1 {
        let current = functions.last().map_or("I", String::as_str);
        let weights = lookup(table, current).copied().unwrap_or(FALLBACK);
        let mut next = draw(weights, rng);

        if complexity > 0.0 && rng.gen_bool(complexity) {
            if let Some(&substitute) =
                lookup(SUBSTITUTIONS, next).and_then(|subs| subs.choose(&mut *rng))
            {
                debug!(from = next, to = substitute, "substituting");
                next = substitute;
            }
        }
        functions.push(next.to_string());
    }

    functions.push(config.end.clone());
    functions
}

/// Generate a progression with an explicit RNG
pub fn generate_progression_with_rng<R: Rng + ?Sized>(
    config: &ProgressionConfig,
    rng: &mut R,
) -> Vec<ChordAnalysis> {
    generate_functions(config, rng)
        .iter()
        .filter_map(|function| {
            chord_from_function(function, &config.key).or_else(|| {
                warn!(function = %function, "unparseable function symbol, using I");
                chord_from_function("I", &config.key).map(|mut tonic| {
                    tonic.function = Some(function.clone());
                    tonic
                })
            })
        })
        .collect()
}

/// Generate a progression; seeded configs are reproducible
pub fn generate_progression(config: &ProgressionConfig) -> Vec<ChordAnalysis> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_progression_with_rng(config, &mut rng)
}

/// Known progressions, tested in order as whole-token runs
static PATTERNS: &[(&str, &str)] = &[
    ("I-I-I-I-IV-IV-I-I-V-IV-I-I", "twelve_bar_blues"),
    ("I-V-vi-iii-IV-I-IV-V", "canon"),
    ("I-V-vi-IV", "pop"),
    ("vi-IV-I-V", "pop_minor_start"),
    ("I-vi-IV-V", "doo_wop"),
    ("I-vi-ii-V", "jazz_turnaround"),
    ("i-VII-VI-V", "andalusian"),
    ("ii-V-I", "jazz_cadence"),
    ("I-IV-V-I", "authentic_cadence"),
    ("i-iv-V-i", "minor_cadence"),
    ("IV-I", "plagal_cadence"),
];

/// Name the progression formed by a sequence of function symbols
pub fn classify_progression<S: AsRef<str>>(functions: &[S]) -> &'static str {
    let joined = functions
        .iter()
        .map(|f| normalize_function(f.as_ref()))
        .collect::<Vec<_>>()
        .join("-");
    let padded = format!("-{}-", joined);
    let contains = |pattern: &str| padded.contains(&format!("-{}-", pattern));

    if let Some((_, name)) = PATTERNS.iter().find(|(pattern, _)| contains(pattern)) {
        return name;
    }
    if contains("ii-V") {
        "ii_v_movement"
    } else if contains("V-I") {
        "dominant_resolution"
    } else {
        "custom"
    }
}
