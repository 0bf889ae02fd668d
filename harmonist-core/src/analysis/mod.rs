//! Harmonic analysis: identification, symbols, functions, progressions and keys

pub mod identify;
pub mod key;
pub mod progression;
pub mod roman;
pub mod symbol;
pub mod tension;

pub use identify::{analyze, chord_tones, enumerate_inversions, identify_quality};
pub use key::{detect_key, detect_key_from_chords, key_scores};
pub use progression::{
    classify_progression, generate_functions, generate_progression,
    generate_progression_with_rng, normalize_function, ProgressionConfig, Style,
};
pub use roman::{chord_from_function, function_symbol, parse_function, FunctionSymbol};
pub use symbol::{
    chord_from_symbol, parse_symbol, spelled_symbol, symbol_from_chord, symbol_with_bass,
    symbol_with_inversion,
};
pub use tension::{extract_tensions, tension_score};
