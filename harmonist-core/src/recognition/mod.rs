//! Live chord recognition over a stream of note events

pub mod config;
pub mod debounce;
pub mod event;
pub mod inference;
pub mod session;
pub mod tracker;

pub use config::{RecognitionConfig, RootInference};
pub use debounce::Debounce;
pub use event::{NoteEvent, NoteEventKind};
pub use inference::{infer_root, score_root, stack_candidates, RootCandidate, RECOGNITION_TEMPLATES};
pub use session::{
    ActiveNote, ChordChange, ListenerResult, RecognitionSession, RecognizedChord, SessionSnapshot,
    SessionState,
};
pub use tracker::{ProgressionDetected, ProgressionTracker};
