pub mod analysis;
pub mod key;
pub mod pitch;
pub mod quality;

pub use analysis::{ChordAnalysis, InversionCandidate};
pub use key::KeyContext;
pub use pitch::{
    parse_pitch, parse_pitch_class, pitch_class, pitch_class_name, pitch_name, spelled_name,
    Pitch, PitchClass, PitchSet, MIDDLE_C,
};
pub use quality::{ChordQuality, QualityFamily, UNKNOWN, VOCABULARY};
