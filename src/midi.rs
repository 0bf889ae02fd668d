//! Live MIDI input for chord recognition
//!
//! A worker thread owns the [`RecognitionSession`] and is fed over a
//! crossbeam channel, mirroring how the output side used to own its
//! connection. The midir callback and the REPL only ever send commands.

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use harmonist_core::recognition::{
    ChordChange, NoteEvent, NoteEventKind, ProgressionDetected, RecognitionConfig,
    RecognitionSession, RootInference, SessionSnapshot,
};
use harmonist_core::types::Pitch;
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How often the worker advances logical time while no events arrive
const TICK: Duration = Duration::from_millis(10);

/// Commands accepted by the recognizer thread.
///
/// Notes carry no time: the worker stamps them on receipt, so they can never
/// land behind a tick it has already applied.
#[derive(Debug)]
pub enum RecognizerCommand {
    Note {
        kind: NoteEventKind,
        pitch: Pitch,
        velocity: u8,
    },
    Reset,
    SetMode(RootInference),
    Snapshot(Sender<SessionSnapshot>),
    Shutdown,
}

/// What the recognizer reports back to the REPL
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    ChordChanged(ChordChange),
    Progression(ProgressionDetected),
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

struct RecognizerWorker {
    session: RecognitionSession,
    command_rx: Receiver<RecognizerCommand>,
    started: Instant,
}

impl RecognizerWorker {
    /// Apply one command at `now`; returns false once the worker should stop
    fn apply(&mut self, command: RecognizerCommand, now: u64) -> bool {
        match command {
            RecognizerCommand::Note {
                kind,
                pitch,
                velocity,
            } => self.session.on_note_event(NoteEvent {
                kind,
                pitch,
                velocity,
                time_ms: now,
            }),
            RecognizerCommand::Reset => self.session.reset(),
            RecognizerCommand::SetMode(mode) => self.session.set_inference(mode),
            RecognizerCommand::Snapshot(reply) => {
                self.session.advance_to(now);
                let _ = reply.send(self.session.snapshot());
            }
            RecognizerCommand::Shutdown => return false,
        }
        true
    }

    fn run(&mut self) {
        loop {
            match self.command_rx.recv_timeout(TICK) {
                Ok(command) => {
                    if !self.apply(command, elapsed_ms(self.started)) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    self.session.advance_to(elapsed_ms(self.started));
                }
            }
        }
        debug!("recognizer thread stopped");
    }
}

/// Handle to the recognizer thread; shuts it down on drop
pub struct RecognizerHandle {
    command_tx: Sender<RecognizerCommand>,
    event_rx: Receiver<RecognizerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl RecognizerHandle {
    pub fn spawn(config: RecognitionConfig) -> Result<Self> {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let started = Instant::now();

        let mut session = RecognitionSession::new(config);
        let changes = event_tx.clone();
        session.on_chord_change(move |change| {
            changes
                .send(RecognizerEvent::ChordChanged(change.clone()))
                .map_err(Into::into)
        });
        session.on_progression_detected(move |progression| {
            event_tx
                .send(RecognizerEvent::Progression(progression.clone()))
                .map_err(Into::into)
        });

        let thread = thread::Builder::new()
            .name("recognizer".to_string())
            .spawn(move || {
                RecognizerWorker {
                    session,
                    command_rx,
                    started,
                }
                .run()
            })
            .context("failed to start recognizer thread")?;

        Ok(Self {
            command_tx,
            event_rx,
            thread: Some(thread),
        })
    }

    pub fn sender(&self) -> Sender<RecognizerCommand> {
        self.command_tx.clone()
    }

    pub fn events(&self) -> Receiver<RecognizerEvent> {
        self.event_rx.clone()
    }

    fn send(&self, command: RecognizerCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| anyhow!("recognizer thread is not running"))
    }

    pub fn note_on(&self, pitch: Pitch, velocity: u8) -> Result<()> {
        self.send(RecognizerCommand::Note {
            kind: NoteEventKind::NoteOn,
            pitch,
            velocity,
        })
    }

    pub fn note_off(&self, pitch: Pitch) -> Result<()> {
        self.send(RecognizerCommand::Note {
            kind: NoteEventKind::NoteOff,
            pitch,
            velocity: 0,
        })
    }

    pub fn reset(&self) -> Result<()> {
        self.send(RecognizerCommand::Reset)
    }

    pub fn set_mode(&self, mode: RootInference) -> Result<()> {
        self.send(RecognizerCommand::SetMode(mode))
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(RecognizerCommand::Snapshot(reply_tx))?;
        reply_rx
            .recv_timeout(Duration::from_secs(1))
            .context("recognizer did not answer")
    }
}

impl Drop for RecognizerHandle {
    fn drop(&mut self) {
        let _ = self.command_tx.send(RecognizerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("recognizer thread panicked");
            }
        }
    }
}

/// An open MIDI input port forwarding note messages to the recognizer
pub struct MidiListener {
    _connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiListener {
    /// Names of the available MIDI input ports.
    /// Creating the client can fail transiently on macOS, so it is retried.
    pub fn list_ports() -> Result<Vec<String>> {
        let mut last_err = None;
        for attempt in 0..3 {
            if attempt > 0 {
                thread::sleep(Duration::from_millis(100));
            }
            match MidiInput::new("harmonist") {
                Ok(midi_in) => {
                    return Ok(midi_in
                        .ports()
                        .iter()
                        .filter_map(|p| midi_in.port_name(p).ok())
                        .collect());
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(anyhow!(
            "MIDI initialization failed after 3 attempts: {:?}",
            last_err
        ))
    }

    /// Open the first port whose name contains `query` (any port when `None`)
    pub fn connect(query: Option<&str>, commands: Sender<RecognizerCommand>) -> Result<Self> {
        let mut midi_in =
            MidiInput::new("harmonist").map_err(|e| anyhow!("MIDI input unavailable: {}", e))?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        let port = ports
            .iter()
            .find(|p| {
                query.map_or(true, |query| {
                    midi_in
                        .port_name(p)
                        .map(|name| name.contains(query))
                        .unwrap_or(false)
                })
            })
            .ok_or_else(|| anyhow!("MIDI input port '{}' not found", query.unwrap_or("*")))?;
        let port_name = midi_in.port_name(port)?;

        let connection = midi_in
            .connect(
                port,
                "harmonist-in",
                move |_stamp, message, _| {
                    if let Some(event) = NoteEvent::from_midi(message, 0) {
                        let _ = commands.send(RecognizerCommand::Note {
                            kind: event.kind,
                            pitch: event.pitch,
                            velocity: event.velocity,
                        });
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("failed to open '{}': {}", port_name, e))?;

        info!(port = %port_name, "listening for MIDI input");
        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizer_thread_reports_chord() {
        let handle = RecognizerHandle::spawn(RecognitionConfig::default()).unwrap();
        let events = handle.events();
        for pitch in [60, 64, 67] {
            handle.note_on(pitch, 90).unwrap();
        }

        let event = events.recv_timeout(Duration::from_secs(2)).unwrap();
        match event {
            RecognizerEvent::ChordChanged(change) => assert_eq!(change.current.symbol(), "C"),
            other => panic!("unexpected event {:?}", other),
        }

        handle.reset().unwrap();
        let snapshot = handle.snapshot().unwrap();
        assert!(snapshot.current.is_none());
        assert!(snapshot.active_notes.is_empty());
    }

    #[test]
    fn test_notes_are_stamped_after_the_last_tick() {
        let (_command_tx, command_rx) = unbounded();
        let mut worker = RecognizerWorker {
            session: RecognitionSession::default(),
            command_rx,
            started: Instant::now(),
        };
        worker.session.advance_to(1_001);
        for pitch in [60, 64, 67] {
            assert!(worker.apply(
                RecognizerCommand::Note {
                    kind: NoteEventKind::NoteOn,
                    pitch,
                    velocity: 90,
                },
                1_001,
            ));
        }
        assert_eq!(worker.session.time_ms(), 1_001);
        let snapshot = worker.session.snapshot();
        assert!(snapshot.active_notes.iter().all(|n| n.onset_ms == 1_001));
        assert_eq!(snapshot.pending_deadline, Some(1_051));

        worker.session.advance_to(1_060);
        assert_eq!(
            worker.session.current_chord().map(|c| c.symbol()),
            Some("C".to_string())
        );
        assert!(!worker.apply(RecognizerCommand::Shutdown, 1_060));
    }

    #[test]
    fn test_mode_change_is_applied() {
        let handle = RecognizerHandle::spawn(RecognitionConfig::default()).unwrap();
        handle.set_mode(RootInference::Context).unwrap();
        assert_eq!(handle.snapshot().unwrap().inference, RootInference::Context);
    }
}
