//! The live recognition session: note events in, chord and progression events out

use super::config::{RecognitionConfig, RootInference};
use super::debounce::Debounce;
use super::event::{NoteEvent, NoteEventKind};
use super::inference::infer_root;
use super::tracker::{ProgressionDetected, ProgressionTracker};
use crate::analysis::identify::build_analysis;
use crate::types::{ChordAnalysis, Pitch, PitchClass};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, trace, warn};

/// What a listener returns; errors are logged and never reach the session
pub type ListenerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Listener<E> = Box<dyn FnMut(&E) -> ListenerResult + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    /// Nothing pending and no chord sounding
    Idle,
    /// Notes changed and the debounce has not fired yet
    Accumulating,
    /// A chord is sounding and nothing is pending
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveNote {
    pub pitch: Pitch,
    pub velocity: u8,
    pub onset_ms: u64,
}

/// A chord the session settled on, open until `end_ms` is set
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecognizedChord {
    pub analysis: ChordAnalysis,
    pub confidence: f32,
    pub start_ms: u64,
    pub end_ms: Option<u64>,
    /// Assembled from recent onsets rather than simultaneous notes
    pub broken: bool,
}

impl RecognizedChord {
    pub fn symbol(&self) -> String {
        self.analysis.symbol()
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.end_ms.map(|end| end.saturating_sub(self.start_ms))
    }
}

impl fmt::Display for RecognizedChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.symbol(), self.confidence)?;
        if self.broken {
            write!(f, " broken")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChordChange {
    pub current: RecognizedChord,
    /// The chord this one replaced, already closed
    pub previous: Option<RecognizedChord>,
}

/// Point-in-time copy of everything the session tracks
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub time_ms: u64,
    pub inference: RootInference,
    pub active_notes: Vec<ActiveNote>,
    pub current: Option<RecognizedChord>,
    pub history: Vec<RecognizedChord>,
    pub progression: Vec<RecognizedChord>,
    pub detected_key: Option<PitchClass>,
    pub progression_type: Option<String>,
    pub pending_deadline: Option<u64>,
}

/// Turns a stream of timestamped note events into recognized chords.
///
/// Time is logical: the session only moves forward when it sees an event or
/// an explicit [`advance_to`](Self::advance_to). Every note change restarts
/// the debounce; when it expires the sounding notes are analyzed once.
pub struct RecognitionSession {
    config: RecognitionConfig,
    debounce: Debounce,
    active: BTreeMap<Pitch, ActiveNote>,
    onsets: VecDeque<(u64, Pitch)>,
    current: Option<RecognizedChord>,
    history: VecDeque<RecognizedChord>,
    tracker: ProgressionTracker,
    last_time: u64,
    chord_listeners: Vec<Listener<ChordChange>>,
    progression_listeners: Vec<Listener<ProgressionDetected>>,
}

impl RecognitionSession {
    pub fn new(config: RecognitionConfig) -> Self {
        RecognitionSession {
            debounce: Debounce::new(config.debounce_ms),
            tracker: ProgressionTracker::new(config.progression_limit, config.progression_min),
            history: VecDeque::with_capacity(config.history_limit),
            config,
            active: BTreeMap::new(),
            onsets: VecDeque::new(),
            current: None,
            last_time: 0,
            chord_listeners: Vec::new(),
            progression_listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.config
    }

    pub fn set_inference(&mut self, inference: RootInference) {
        debug!(mode = %inference, "root inference changed");
        self.config.inference = inference;
    }

    pub fn on_chord_change<F>(&mut self, listener: F)
    where
        F: FnMut(&ChordChange) -> ListenerResult + Send + 'static,
    {
        self.chord_listeners.push(Box::new(listener));
    }

    pub fn on_progression_detected<F>(&mut self, listener: F)
    where
        F: FnMut(&ProgressionDetected) -> ListenerResult + Send + 'static,
    {
        self.progression_listeners.push(Box::new(listener));
    }

    /// Feed one note event. A deadline the event has reached fires first.
    pub fn on_note_event(&mut self, event: NoteEvent) {
        let now = self.clamp_time(event.time_ms);
        self.fire_due(now);
        trace!(%event, "note event");

        match event.kind {
            NoteEventKind::NoteOn => {
                self.active.insert(
                    event.pitch,
                    ActiveNote {
                        pitch: event.pitch,
                        velocity: event.velocity,
                        onset_ms: now,
                    },
                );
                self.onsets.push_back((now, event.pitch));
            }
            NoteEventKind::NoteOff => {
                if self.active.remove(&event.pitch).is_none() {
                    trace!(pitch = event.pitch, "note-off for a silent pitch");
                    return;
                }
            }
        }
        self.debounce.schedule(now);
    }

    /// Move logical time forward, firing an expired debounce
    pub fn advance_to(&mut self, time_ms: u64) {
        let now = self.clamp_time(time_ms);
        self.fire_due(now);
    }

    pub fn state(&self) -> SessionState {
        if self.debounce.pending().is_some() {
            SessionState::Accumulating
        } else if self.current.is_some() {
            SessionState::Stable
        } else {
            SessionState::Idle
        }
    }

    pub fn current_chord(&self) -> Option<&RecognizedChord> {
        self.current.as_ref()
    }

    pub fn history(&self) -> impl Iterator<Item = &RecognizedChord> {
        self.history.iter()
    }

    pub fn active_pitches(&self) -> Vec<Pitch> {
        self.active.keys().copied().collect()
    }

    pub fn time_ms(&self) -> u64 {
        self.last_time
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            time_ms: self.last_time,
            inference: self.config.inference,
            active_notes: self.active.values().copied().collect(),
            current: self.current.clone(),
            history: self.history.iter().cloned().collect(),
            progression: self.tracker.chords().cloned().collect(),
            detected_key: self.tracker.detected_key(),
            progression_type: self.tracker.progression_type().map(str::to_string),
            pending_deadline: self.debounce.pending(),
        }
    }

    /// Drop all notes, chords and pending work; listeners and logical time are kept
    pub fn reset(&mut self) {
        debug!("recognition session reset");
        self.debounce.cancel();
        self.active.clear();
        self.onsets.clear();
        self.current = None;
        self.history.clear();
        self.tracker.clear();
    }

    fn clamp_time(&mut self, time_ms: u64) -> u64 {
        if time_ms < self.last_time {
            warn!(
                time_ms,
                last_ms = self.last_time,
                "event time went backwards, clamping"
            );
            return self.last_time;
        }
        self.last_time = time_ms;
        time_ms
    }

    fn fire_due(&mut self, now: u64) {
        if let Some(at) = self.debounce.due(now) {
            self.settle(at);
        }
    }

    fn settle(&mut self, at: u64) {
        while self
            .onsets
            .front()
            .is_some_and(|&(onset, _)| onset.saturating_add(self.config.broken_window_ms) < at)
        {
            self.onsets.pop_front();
        }

        if self.active.len() >= self.config.min_notes.max(1) {
            let pitches = self.active_pitches();
            self.recognize(pitches, at, false);
            // onsets of a block chord never feed a later broken reading
            self.onsets.clear();
        } else if self.current.as_ref().is_some_and(|c| !c.broken) {
            self.end_current(at);
        } else {
            self.settle_broken(at);
        }
    }

    fn settle_broken(&mut self, at: u64) {
        let mut pitches: Vec<Pitch> = self.onsets.iter().map(|&(_, pitch)| pitch).collect();
        pitches.sort_unstable();
        pitches.dedup();

        if pitches.len() >= self.config.broken_min_notes && self.recognize(pitches, at, true) {
            return;
        }
        self.end_current(at);
    }

    /// Analyze `pitches` and update the current chord; false when a broken reading is too weak
    fn recognize(&mut self, pitches: Vec<Pitch>, at: u64, broken: bool) -> bool {
        let previous_notes = self
            .current
            .as_ref()
            .or(self.history.back())
            .map(|chord| chord.analysis.pitches.clone());
        let Some(candidate) = infer_root(&pitches, previous_notes.as_deref(), &self.config) else {
            return false;
        };
        if broken && candidate.confidence <= self.config.broken_threshold {
            trace!(confidence = candidate.confidence, "broken reading rejected");
            return false;
        }

        let inversion = pitches
            .iter()
            .position(|&p| p == candidate.root)
            .unwrap_or(0);
        let analysis = build_analysis(
            candidate.root,
            candidate.quality,
            inversion,
            &pitches,
            self.config.key.as_ref(),
        );

        if let Some(current) = self.current.as_mut() {
            if current.analysis.same_chord(&analysis) {
                trace!(symbol = %analysis.symbol(), "same chord, merging");
                current.analysis = analysis;
                current.confidence = candidate.confidence;
                current.broken = broken;
                return true;
            }
        }

        let previous = self.current.take().map(|mut chord| {
            chord.end_ms = Some(at);
            chord
        });
        let current = RecognizedChord {
            analysis,
            confidence: candidate.confidence,
            start_ms: at,
            end_ms: None,
            broken,
        };
        debug!(
            chord = %current,
            previous = ?previous.as_ref().map(RecognizedChord::symbol),
            at,
            "chord changed"
        );

        self.current = Some(current.clone());
        let change = ChordChange {
            current,
            previous: previous.clone(),
        };
        dispatch(&mut self.chord_listeners, &change, "chord");
        if let Some(previous) = previous {
            self.archive(previous);
        }
        true
    }

    fn end_current(&mut self, at: u64) {
        if let Some(mut chord) = self.current.take() {
            chord.end_ms = Some(at);
            debug!(chord = %chord, at, "chord ended");
            self.archive(chord);
        }
    }

    fn archive(&mut self, chord: RecognizedChord) {
        debug_assert!(chord.end_ms.is_some(), "archived chord must be closed");
        self.history.push_back(chord.clone());
        while self.history.len() > self.config.history_limit {
            self.history.pop_front();
        }
        if let Some(detected) = self.tracker.push(chord) {
            dispatch(&mut self.progression_listeners, &detected, "progression");
        }
    }
}

impl Default for RecognitionSession {
    fn default() -> Self {
        RecognitionSession::new(RecognitionConfig::default())
    }
}

impl fmt::Debug for RecognitionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionSession")
            .field("state", &self.state())
            .field("time_ms", &self.last_time)
            .field("active", &self.active_pitches())
            .field("current", &self.current)
            .field("history", &self.history.len())
            .field("chord_listeners", &self.chord_listeners.len())
            .field("progression_listeners", &self.progression_listeners.len())
            .finish()
    }
}

/// Call every listener, isolating failures and panics from the session and each other
fn dispatch<E>(listeners: &mut [Listener<E>], event: &E, kind: &str) {
    for (index, listener) in listeners.iter_mut().enumerate() {
        match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => warn!(listener = index, %error, "{} listener failed", kind),
            Err(_) => warn!(listener = index, "{} listener panicked", kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn recording(session: &mut RecognitionSession) -> Arc<Mutex<Vec<ChordChange>>> {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        session.on_chord_change(move |change| {
            sink.lock().unwrap().push(change.clone());
            Ok(())
        });
        changes
    }

    fn press(session: &mut RecognitionSession, pitches: &[Pitch], time_ms: u64) {
        for &pitch in pitches {
            session.on_note_event(NoteEvent::note_on(pitch, 90, time_ms));
        }
    }

    fn release(session: &mut RecognitionSession, pitches: &[Pitch], time_ms: u64) {
        for &pitch in pitches {
            session.on_note_event(NoteEvent::note_off(pitch, time_ms));
        }
    }

    #[test]
    fn test_triad_emits_single_change() {
        let mut session = RecognitionSession::default();
        let changes = recording(&mut session);

        session.on_note_event(NoteEvent::note_on(62, 80, 0));
        session.on_note_event(NoteEvent::note_on(65, 80, 5));
        session.on_note_event(NoteEvent::note_on(69, 80, 10));
        session.advance_to(40);
        assert!(changes.lock().unwrap().is_empty());
        assert_eq!(session.state(), SessionState::Accumulating);

        session.advance_to(1_000);
        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        let chord = &changes[0].current;
        assert_eq!(chord.analysis.root, 62);
        assert_eq!(chord.analysis.quality, "minor");
        assert_eq!(chord.start_ms, 60);
        assert!(!chord.broken);
        assert_eq!(changes[0].previous, None);
        assert_eq!(session.state(), SessionState::Stable);
    }

    #[test]
    fn test_revoicing_merges() {
        let mut session = RecognitionSession::default();
        let changes = recording(&mut session);

        press(&mut session, &[60, 64, 67], 0);
        press(&mut session, &[72], 200);
        session.advance_to(1_000);

        assert_eq!(changes.lock().unwrap().len(), 1);
        let current = session.current_chord().unwrap();
        assert_eq!(current.start_ms, 50);
        assert_eq!(current.analysis.pitches, vec![60, 64, 67, 72]);
    }

    #[test]
    fn test_legato_change_closes_previous() {
        let mut session = RecognitionSession::default();
        let changes = recording(&mut session);

        press(&mut session, &[60, 64, 67], 0);
        release(&mut session, &[60, 64, 67], 100);
        press(&mut session, &[55, 59, 62], 100);
        session.advance_to(1_000);

        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 2);
        let previous = changes[1].previous.as_ref().unwrap();
        assert_eq!(previous.symbol(), "C");
        assert_eq!(previous.end_ms, Some(150));
        assert_eq!(changes[1].current.symbol(), "G");
        assert_eq!(session.history().count(), 1);
    }

    #[test]
    fn test_history_keeps_only_the_newest_chords() {
        assert_eq!(RecognitionConfig::default().history_limit, 64);

        let mut session = RecognitionSession::new(RecognitionConfig::default().with_history_limit(3));
        let chords: [[Pitch; 3]; 6] = [
            [60, 64, 67],
            [65, 69, 72],
            [67, 71, 74],
            [69, 72, 76],
            [62, 65, 69],
            [64, 67, 71],
        ];
        let mut time = 0;
        for (i, chord) in chords.iter().enumerate() {
            if i > 0 {
                release(&mut session, &chords[i - 1], time);
            }
            press(&mut session, chord, time);
            time += 200;
        }
        session.advance_to(time);

        let kept: Vec<String> = session.history().map(|c| c.symbol()).collect();
        assert_eq!(kept, vec!["G", "Am", "Dm"]);
        assert_eq!(session.current_chord().map(|c| c.symbol()), Some("Em".to_string()));
    }

    #[test]
    fn test_release_ends_chord() {
        let mut session = RecognitionSession::default();
        press(&mut session, &[60, 64, 67], 0);
        release(&mut session, &[64, 67], 300);
        session.advance_to(1_000);

        assert_eq!(session.current_chord(), None);
        let ended: Vec<_> = session.history().collect();
        assert_eq!(ended.len(), 1);
        assert_eq!(ended[0].end_ms, Some(350));
        assert_eq!(ended[0].duration_ms(), Some(300));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_broken_chord_from_arpeggio() {
        let mut session = RecognitionSession::default();
        let changes = recording(&mut session);

        session.on_note_event(NoteEvent::note_on(60, 90, 0));
        session.on_note_event(NoteEvent::note_off(60, 80));
        session.on_note_event(NoteEvent::note_on(64, 90, 100));
        session.on_note_event(NoteEvent::note_off(64, 180));
        session.on_note_event(NoteEvent::note_on(67, 90, 200));
        session.advance_to(1_000);

        let changes = changes.lock().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes[0].current.broken);
        assert_eq!(changes[0].current.symbol(), "C");
    }

    #[test]
    fn test_progression_detected() {
        let mut session = RecognitionSession::default();
        let detected = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&detected);
        session.on_progression_detected(move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });

        let chords: [&[Pitch]; 5] = [
            &[60, 64, 67],
            &[57, 60, 64],
            &[53, 57, 60],
            &[55, 59, 62],
            &[60, 64, 67],
        ];
        let mut held: &[Pitch] = &[];
        for (i, chord) in chords.iter().enumerate() {
            let t = i as u64 * 200;
            release(&mut session, held, t);
            press(&mut session, chord, t);
            held = chord;
        }
        session.advance_to(2_000);

        let detected = detected.lock().unwrap();
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].key_root, 0);
        assert_eq!(detected[0].progression_type, "doo_wop");
        let snapshot = session.snapshot();
        assert_eq!(snapshot.detected_key, Some(0));
        assert_eq!(snapshot.progression.len(), 4);
    }

    #[test]
    fn test_listener_failures_are_isolated() {
        let mut session = RecognitionSession::default();
        session.on_chord_change(|_| Err("listener broke".into()));
        session.on_chord_change(|_| panic!("listener exploded"));
        let changes = recording(&mut session);

        press(&mut session, &[60, 64, 67], 0);
        session.advance_to(100);
        assert_eq!(changes.lock().unwrap().len(), 1);
        assert!(session.current_chord().is_some());
    }

    #[test]
    fn test_backwards_time_is_clamped() {
        let mut session = RecognitionSession::default();
        session.on_note_event(NoteEvent::note_on(60, 90, 100));
        session.on_note_event(NoteEvent::note_on(64, 90, 20));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.time_ms, 100);
        assert_eq!(snapshot.pending_deadline, Some(150));
        assert_eq!(snapshot.active_notes[1].onset_ms, 100);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut session = RecognitionSession::default();
        press(&mut session, &[60, 64, 67], 0);
        session.advance_to(100);
        press(&mut session, &[48], 120);
        session.reset();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Idle);
        assert!(snapshot.active_notes.is_empty());
        assert_eq!(snapshot.current, None);
        assert_eq!(snapshot.pending_deadline, None);
        assert_eq!(snapshot.time_ms, 120);
    }

    #[test]
    fn test_session_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RecognitionSession>();
    }
}
