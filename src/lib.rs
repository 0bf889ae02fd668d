//! # Harmonist
//!
//! Interactive front-end for `harmonist-core`: a line-oriented REPL for chord
//! analysis and voice leading, plus live chord recognition from MIDI input.
//!
//! - `commands`: the command registry and its handlers
//! - `midi`: the recognizer thread and MIDI input ports
//! - `repl`: the read-eval-print loop

pub mod commands;
pub mod midi;
pub mod repl;
