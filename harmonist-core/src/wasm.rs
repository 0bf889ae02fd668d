//! WASM bindings for harmonist-core
//!
//! Results cross the boundary as plain JS objects through serde-wasm-bindgen.
//! Functions return `null` rather than throwing when input can't be read.

use crate::analysis::{
    analyze, chord_from_function, chord_from_symbol, classify_progression, generate_progression,
    ProgressionConfig, Style,
};
use crate::recognition::{ChordChange, NoteEvent, RecognitionConfig, RecognitionSession};
use crate::types::{KeyContext, VOCABULARY};
use crate::voice_leading::{VoiceLeadingOptimizer, VoicingOptions, VoicingStyle};
use std::sync::{Arc, Mutex};
use wasm_bindgen::prelude::*;

#[derive(serde::Serialize)]
struct ErrorJS {
    error: String,
}

fn error_value(message: impl ToString) -> JsValue {
    serde_wasm_bindgen::to_value(&ErrorJS {
        error: message.to_string(),
    })
    .unwrap_or(JsValue::NULL)
}

fn parse_key(key: Option<String>) -> Result<Option<KeyContext>, JsValue> {
    key.map(|text| text.parse::<KeyContext>().map_err(error_value))
        .transpose()
}

/// Analyze MIDI pitches, optionally relative to a key such as "Bb" or "Am"
#[wasm_bindgen]
pub fn analyze_pitches(pitches: Vec<i32>, key: Option<String>) -> JsValue {
    let key = match parse_key(key) {
        Ok(key) => key,
        Err(error) => return error,
    };
    serde_wasm_bindgen::to_value(&analyze(&pitches, key.as_ref())).unwrap_or(JsValue::NULL)
}

/// Pitches of a chord symbol ("Cmaj7", "F/A"), or null when it doesn't parse
#[wasm_bindgen]
pub fn symbol_pitches(symbol: &str) -> JsValue {
    match chord_from_symbol(symbol) {
        Some(set) => serde_wasm_bindgen::to_value(set.pitches()).unwrap_or(JsValue::NULL),
        None => JsValue::NULL,
    }
}

#[wasm_bindgen]
pub fn function_chord(symbol: &str, key: &str) -> JsValue {
    let key = match key.parse::<KeyContext>() {
        Ok(key) => key,
        Err(e) => return error_value(e),
    };
    match chord_from_function(symbol, &key) {
        Some(chord) => serde_wasm_bindgen::to_value(&chord).unwrap_or(JsValue::NULL),
        None => JsValue::NULL,
    }
}

#[derive(serde::Serialize)]
struct ProgressionJS {
    progression_type: String,
    chords: Vec<crate::types::ChordAnalysis>,
}

#[wasm_bindgen]
pub fn generate(length: usize, style: &str, key: Option<String>, seed: Option<u32>) -> JsValue {
    let style = match style.parse::<Style>() {
        Ok(style) => style,
        Err(e) => return error_value(e),
    };
    let key = match parse_key(key) {
        Ok(key) => key.unwrap_or_default(),
        Err(error) => return error,
    };

    let mut config = ProgressionConfig::new(length, style).with_key(key);
    if let Some(seed) = seed {
        config = config.with_seed(u64::from(seed));
    }
    let chords = generate_progression(&config);
    let functions: Vec<&str> = chords.iter().filter_map(|c| c.function.as_deref()).collect();

    serde_wasm_bindgen::to_value(&ProgressionJS {
        progression_type: classify_progression(&functions).to_string(),
        chords,
    })
    .unwrap_or(JsValue::NULL)
}

/// Every quality name the analyzer knows, in identification order
#[wasm_bindgen]
pub fn vocabulary() -> js_sys::Array {
    VOCABULARY
        .iter()
        .map(|quality| JsValue::from_str(quality.name))
        .collect()
}

/// Stateful voice-leading optimizer for JS callers
#[wasm_bindgen]
pub struct Voicer {
    optimizer: VoiceLeadingOptimizer,
    style: VoicingStyle,
}

#[wasm_bindgen]
impl Voicer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Voicer {
        Voicer {
            optimizer: VoiceLeadingOptimizer::new(),
            style: VoicingStyle::Close,
        }
    }

    /// "close", "open", "drop2" or "spread:<factor>"; returns false for anything else
    pub fn set_style(&mut self, style: &str) -> bool {
        match style.parse() {
            Ok(style) => {
                self.style = style;
                true
            }
            Err(_) => false,
        }
    }

    pub fn voice(&mut self, pitches: Vec<i32>) -> JsValue {
        let options = VoicingOptions::default().with_style(self.style);
        let voiced = self.optimizer.process_chord(&pitches, &options);
        serde_wasm_bindgen::to_value(&voiced.assignment.pitches()).unwrap_or(JsValue::NULL)
    }

    pub fn reset(&mut self) {
        self.optimizer.reset();
    }
}

impl Default for Voicer {
    fn default() -> Self {
        Voicer::new()
    }
}

/// Live recognizer driven by the host's clock
#[wasm_bindgen]
pub struct Recognizer {
    session: RecognitionSession,
    changes: Arc<Mutex<Vec<ChordChange>>>,
}

#[wasm_bindgen]
impl Recognizer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Recognizer {
        let mut session = RecognitionSession::new(RecognitionConfig::default());
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        session.on_chord_change(move |change| {
            if let Ok(mut pending) = sink.lock() {
                pending.push(change.clone());
            }
            Ok(())
        });
        Recognizer { session, changes }
    }

    /// Feed a raw MIDI message; non-note messages are ignored
    pub fn midi(&mut self, message: &[u8], time_ms: f64) {
        if let Some(event) = NoteEvent::from_midi(message, time_ms.max(0.0) as u64) {
            self.session.on_note_event(event);
        }
    }

    pub fn note_on(&mut self, pitch: i32, velocity: u8, time_ms: f64) {
        self.session
            .on_note_event(NoteEvent::note_on(pitch, velocity, time_ms.max(0.0) as u64));
    }

    pub fn note_off(&mut self, pitch: i32, time_ms: f64) {
        self.session
            .on_note_event(NoteEvent::note_off(pitch, time_ms.max(0.0) as u64));
    }

    pub fn advance(&mut self, time_ms: f64) {
        self.session.advance_to(time_ms.max(0.0) as u64);
    }

    /// Chord changes since the last call
    pub fn take_changes(&mut self) -> JsValue {
        let drained: Vec<ChordChange> = match self.changes.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        serde_wasm_bindgen::to_value(&drained).unwrap_or(JsValue::NULL)
    }

    pub fn snapshot(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.session.snapshot()).unwrap_or(JsValue::NULL)
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }
}

impl Default for Recognizer {
    fn default() -> Self {
        Recognizer::new()
    }
}
