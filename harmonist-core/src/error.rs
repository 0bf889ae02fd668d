use thiserror::Error;

/// Errors from parsing musical text (note names, chord symbols, roman numerals).
///
/// Musical ambiguity is never an error: unmatched chords resolve to the
/// "unknown" quality instead. These variants only cover malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarmonyError {
    #[error("invalid note name '{0}'")]
    InvalidNote(String),
    #[error("invalid chord symbol '{0}'")]
    InvalidSymbol(String),
    #[error("unknown chord quality '{0}'")]
    UnknownQuality(String),
    #[error("invalid function symbol '{0}'")]
    InvalidFunction(String),
    #[error("unknown progression style '{0}'")]
    UnknownStyle(String),
    #[error("unknown root inference mode '{0}'")]
    UnknownInferenceMode(String),
}

pub type Result<T> = std::result::Result<T, HarmonyError>;
