//! Chord recognition commands driven from typed notes

use crate::commands::{parse_chord, CommandContext, CommandResult};
use colored::*;
use harmonist_core::recognition::{RootInference, SessionSnapshot};
use harmonist_core::types::{pitch_class_name, pitch_name};

const TYPED_VELOCITY: u8 = 90;

/// Handle `recognize play <notes>` - release what is held, then press these notes
pub fn cmd_recognize_play(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let pitches = match parse_chord(args) {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(e),
    };

    for pitch in std::mem::take(&mut ctx.held) {
        if let Err(e) = ctx.recognizer.note_off(pitch) {
            return CommandResult::Error(e.to_string());
        }
    }
    for &pitch in &pitches {
        if let Err(e) = ctx.recognizer.note_on(pitch, TYPED_VELOCITY) {
            return CommandResult::Error(e.to_string());
        }
    }
    ctx.held = pitches;
    CommandResult::Success
}

/// Handle `recognize release [notes]` - release the given notes, or everything held
pub fn cmd_recognize_release(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let released = if args.is_empty() {
        std::mem::take(&mut ctx.held)
    } else {
        match parse_chord(args) {
            Ok(p) => {
                ctx.held.retain(|held| !p.contains(held));
                p
            }
            Err(e) => return CommandResult::Error(e),
        }
    };

    for pitch in released {
        if let Err(e) = ctx.recognizer.note_off(pitch) {
            return CommandResult::Error(e.to_string());
        }
    }
    CommandResult::Success
}

/// Handle `recognize mode [bass|stack|context]`
pub fn cmd_recognize_mode(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return match ctx.recognizer.snapshot() {
            Ok(snapshot) => CommandResult::Message(format!("Root inference: {}", snapshot.inference)),
            Err(e) => CommandResult::Error(e.to_string()),
        };
    }
    let mode = match args.parse::<RootInference>() {
        Ok(mode) => mode,
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    match ctx.recognizer.set_mode(mode) {
        Ok(()) => CommandResult::Message(format!("Root inference set to {}", mode).green().to_string()),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `recognize status`
pub fn cmd_recognize_status(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.recognizer.snapshot() {
        Ok(snapshot) => CommandResult::Message(format_snapshot(&snapshot)),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

/// Handle `recognize reset`
pub fn cmd_recognize_reset(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.held.clear();
    match ctx.recognizer.reset() {
        Ok(()) => CommandResult::Message("Recognition session cleared".to_string()),
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut lines = vec![format!(
        "{} {:?} at {} ms ({} inference)",
        "state:".dimmed(),
        snapshot.state,
        snapshot.time_ms,
        snapshot.inference
    )];

    let notes: Vec<String> = snapshot
        .active_notes
        .iter()
        .map(|n| pitch_name(n.pitch))
        .collect();
    if !notes.is_empty() {
        lines.push(format!("{} {}", "notes:".dimmed(), notes.join(" ").cyan()));
    }

    match &snapshot.current {
        Some(chord) => lines.push(format!(
            "{} {} since {} ms",
            "chord:".dimmed(),
            chord.to_string().green().bold(),
            chord.start_ms
        )),
        None => lines.push(format!("{} -", "chord:".dimmed())),
    }

    if !snapshot.history.is_empty() {
        let recent: Vec<String> = snapshot
            .history
            .iter()
            .rev()
            .take(8)
            .rev()
            .map(|c| c.symbol())
            .collect();
        lines.push(format!("{} {}", "history:".dimmed(), recent.join(" ")));
    }

    if let (Some(key), Some(kind)) = (snapshot.detected_key, &snapshot.progression_type) {
        lines.push(format!(
            "{} {} in {} major",
            "progression:".dimmed(),
            kind.yellow(),
            pitch_class_name(key)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_play_then_status_shows_chord() {
        let mut ctx = CommandContext::new().unwrap();
        assert!(matches!(
            cmd_recognize_play("C4 E4 G4", &mut ctx),
            CommandResult::Success
        ));
        assert_eq!(ctx.held, vec![60, 64, 67]);

        thread::sleep(Duration::from_millis(200));
        let snapshot = ctx.recognizer.snapshot().unwrap();
        assert_eq!(snapshot.current.map(|c| c.symbol()), Some("C".to_string()));

        cmd_recognize_release("E4", &mut ctx);
        assert_eq!(ctx.held, vec![60, 67]);

        cmd_recognize_reset("", &mut ctx);
        assert!(ctx.held.is_empty());
        assert!(ctx.recognizer.snapshot().unwrap().current.is_none());
    }

    #[test]
    fn test_mode_rejects_unknown() {
        let mut ctx = CommandContext::new().unwrap();
        assert!(matches!(
            cmd_recognize_mode("loudest", &mut ctx),
            CommandResult::Error(_)
        ));
        assert!(matches!(
            cmd_recognize_mode("bass", &mut ctx),
            CommandResult::Message(_)
        ));
    }
}
