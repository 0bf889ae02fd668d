use harmonist_core::recognition::{
    ChordChange, NoteEvent, ProgressionDetected, RecognitionConfig, RecognitionSession,
    RootInference, SessionState,
};
use harmonist_core::types::KeyContext;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn collect_changes(session: &mut RecognitionSession) -> Arc<Mutex<Vec<ChordChange>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    session.on_chord_change(move |change| {
        sink.lock().unwrap().push(change.clone());
        Ok(())
    });
    changes
}

/// Feed raw MIDI bytes the way a device callback would
fn play(session: &mut RecognitionSession, messages: &[([u8; 3], u64)]) {
    for (message, time_ms) in messages {
        if let Some(event) = NoteEvent::from_midi(message, *time_ms) {
            session.on_note_event(event);
        }
    }
}

#[test]
fn minor_triad_from_midi_bytes() {
    let mut session = RecognitionSession::default();
    let changes = collect_changes(&mut session);

    play(
        &mut session,
        &[([0x90, 62, 100], 0), ([0x90, 65, 100], 4), ([0x90, 69, 100], 10)],
    );
    session.advance_to(500);

    let changes = changes.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].current.analysis.root, 62);
    assert_eq!(changes[0].current.analysis.quality, "minor");
    assert_eq!(changes[0].current.symbol(), "Dm");
}

#[test]
fn key_adds_function_symbols() {
    let config = RecognitionConfig::default().with_key(KeyContext::major(0));
    let mut session = RecognitionSession::new(config);
    let changes = collect_changes(&mut session);

    play(
        &mut session,
        &[
            ([0x90, 55, 90], 0),
            ([0x90, 59, 90], 0),
            ([0x90, 62, 90], 0),
            ([0x90, 65, 90], 0),
        ],
    );
    session.advance_to(100);

    let changes = changes.lock().unwrap();
    assert_eq!(changes[0].current.analysis.function.as_deref(), Some("V7"));
}

#[test]
fn running_status_note_off_ends_chord() {
    let mut session = RecognitionSession::default();
    play(
        &mut session,
        &[
            ([0x90, 60, 90], 0),
            ([0x90, 64, 90], 0),
            ([0x90, 67, 90], 0),
            ([0x90, 64, 0], 400),
            ([0x90, 67, 0], 400),
        ],
    );
    assert_eq!(session.state(), SessionState::Accumulating);
    session.advance_to(1_000);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::Idle);
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].end_ms, Some(450));
    assert_eq!(snapshot.active_notes.len(), 1);
}

#[test]
fn progression_listener_sees_cadence() {
    let mut session = RecognitionSession::new(
        RecognitionConfig::default().with_inference(RootInference::Context),
    );
    let detected: Arc<Mutex<Vec<ProgressionDetected>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&detected);
    session.on_progression_detected(move |event| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });

    // I IV V I, then one more chord so the last I is closed
    let chords: [[i32; 3]; 5] = [
        [60, 64, 67],
        [60, 65, 69],
        [59, 62, 67],
        [60, 64, 67],
        [57, 60, 64],
    ];
    let mut time = 0;
    let mut held: Option<[i32; 3]> = None;
    for chord in chords {
        if let Some(previous) = held {
            for pitch in previous {
                session.on_note_event(NoteEvent::note_off(pitch, time));
            }
        }
        for pitch in chord {
            session.on_note_event(NoteEvent::note_on(pitch, 90, time));
        }
        held = Some(chord);
        time += 250;
    }
    session.advance_to(time);

    let detected = detected.lock().unwrap();
    assert_eq!(detected.len(), 1);
    assert_eq!(detected[0].functions, vec!["I", "IV", "V", "I"]);
    assert_eq!(detected[0].progression_type, "authentic_cadence");
}
