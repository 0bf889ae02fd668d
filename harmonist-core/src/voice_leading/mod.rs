//! Four-voice leading: role registers, rule checks, candidate search and voicing transforms

pub mod optimizer;
pub mod rules;
pub mod transforms;
pub mod voice;

pub use optimizer::{
    reduce_to_four, OptimizerConfig, VoiceLeadingOptimizer, VoicedChord, VoicingOptions,
};
pub use rules::{
    check_rules, crossings, detect_violations, permutations, position_smoothness, MotionMetrics,
    RuleContext, RuleReport, VoiceLeadingViolation, VoiceMovement,
};
pub use transforms::{apply_voicing, drop2_voicing, open_voicing, spread_voicing, VoicingStyle};
pub use voice::{Registers, VoiceAssignment, VoiceRange, VoiceRole};
