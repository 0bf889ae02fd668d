//! MIDI input REPL commands

use crate::commands::{CommandContext, CommandResult};
use crate::midi::MidiListener;
use colored::*;

/// Handle `midi devices` command - list available MIDI input ports
pub fn cmd_midi_devices(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match MidiListener::list_ports() {
        Ok(ports) if ports.is_empty() => CommandResult::Message(
            "No MIDI input ports found. Make sure a MIDI device or virtual port is connected."
                .yellow()
                .to_string(),
        ),
        Ok(ports) => {
            let mut output = format!("{}\n", "Available MIDI Input Ports:".bold());
            for (i, port) in ports.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, port.cyan()));
            }
            output.push_str(&format!(
                "\n{} {}",
                "Use".dimmed(),
                "midi listen <port name>".green()
            ));
            CommandResult::Message(output)
        }
        Err(e) => CommandResult::Error(format!("Failed to list MIDI ports: {}", e)),
    }
}

/// Handle `midi listen [port]` command - feed a MIDI input port to the recognizer
pub fn cmd_midi_listen(args: &str, ctx: &mut CommandContext) -> CommandResult {
    // close the previous port first so the same device can be reopened
    ctx.midi_input = None;

    let query = (!args.is_empty()).then_some(args);
    match MidiListener::connect(query, ctx.recognizer.sender()) {
        Ok(listener) => {
            let message = format!("Listening on MIDI port: {}", listener.port_name().green());
            ctx.midi_input = Some(listener);
            CommandResult::Message(message)
        }
        Err(e) => CommandResult::Error(format!("{:#}", e)),
    }
}

/// Handle `midi stop` command
pub fn cmd_midi_stop(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    match ctx.midi_input.take() {
        Some(listener) => {
            CommandResult::Message(format!("Stopped listening to {}", listener.port_name()))
        }
        None => CommandResult::Error("Not listening to any MIDI port".to_string()),
    }
}
