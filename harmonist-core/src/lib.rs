//! # Harmonist Core
//!
//! Harmony engine behind the `harmonist` shell, usable without any audio or
//! MIDI dependencies.
//!
//! - [`analysis`]: identify chords, name symbols and functions, generate and
//!   classify progressions, detect keys
//! - [`voice_leading`]: keep four voices moving smoothly across a chord stream
//! - [`recognition`]: turn timestamped note events into recognized chords
//!
//! ## Features
//!
//! - **serde**: Serialize analyses, snapshots and events
//! - **wasm**: JavaScript bindings via wasm-bindgen
//! - **colored**: Colored terminal output for `Display` impls
//!
//! ## Example
//!
//! ```
//! use harmonist_core::analysis::{analyze, chord_from_symbol};
//!
//! let pitches = chord_from_symbol("Dm7").unwrap();
//! let analysis = analyze(pitches.pitches(), None);
//! assert_eq!(analysis.quality, "minor7");
//! ```

pub mod analysis;
pub mod error;
pub mod recognition;
pub mod types;
pub mod voice_leading;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{HarmonyError, Result};
pub use recognition::{NoteEvent, RecognitionConfig, RecognitionSession, RootInference};
pub use types::{ChordAnalysis, KeyContext, Pitch, PitchClass, PitchSet};
pub use voice_leading::{VoiceAssignment, VoiceLeadingOptimizer, VoicingOptions, VoicingStyle};
