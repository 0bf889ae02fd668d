//! General REPL commands (help, quit)

use crate::commands::{CommandContext, CommandResult};
use colored::*;

/// Handle `help` command
pub fn cmd_help(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    print_help();
    CommandResult::Success
}

/// Handle `quit` or `exit` command
pub fn cmd_quit(_args: &str, _ctx: &mut CommandContext) -> CommandResult {
    CommandResult::Exit
}

fn section(title: &str, entries: &[(&str, &str)]) {
    println!("{}", title.green());
    for (usage, what) in entries {
        println!("  {:<36} {}", usage.cyan(), what);
    }
    println!();
}

fn print_help() {
    println!("{}", "Harmonist".bold());
    println!("{}", "=========".bold());
    println!();
    println!(
        "{}",
        "Chords are a single symbol (Cmaj7, F/A, Bbm7b5) or notes (C4 E4 G4, 60 64 67).".dimmed()
    );
    println!();
    section(
        "Analysis:",
        &[
            ("identify <chord>", "Name the chord quality"),
            ("analyze <chord> [in <key>]", "Root, inversion, tensions and function"),
            ("symbol <notes>", "Chord symbol for a set of notes"),
            ("chord <symbol>", "Notes of a chord symbol"),
            ("tension <chord>", "Dissonance score"),
            ("key <notes>", "Most likely major key"),
            ("function <numeral> [in <key>]", "Resolve a roman numeral (V7 in F)"),
            (
                "progression [n] [style] [in <key>] [seed <n>]",
                "Generate and classify a progression",
            ),
        ],
    );
    section(
        "Voice leading:",
        &[
            ("voice <chord>", "Voice the next chord from the current one"),
            ("voice style <close|open|drop2|spread>", "Choose the voicing transform"),
            ("voice reset", "Forget the current voicing"),
        ],
    );
    section(
        "Recognition:",
        &[
            ("recognize play <notes>", "Hold these notes (releases the previous ones)"),
            ("recognize release [notes]", "Release some or all held notes"),
            ("recognize mode <bass|stack|context>", "Root inference mode"),
            ("recognize status", "Current chord, history and progression"),
            ("recognize reset", "Clear the session"),
        ],
    );
    section(
        "MIDI input:",
        &[
            ("midi devices", "List MIDI input ports"),
            ("midi listen [port]", "Recognize chords from a MIDI port"),
            ("midi stop", "Close the MIDI port"),
        ],
    );
    section(
        "General:",
        &[("help", "Show this help"), ("quit / exit", "Leave harmonist")],
    );
}
