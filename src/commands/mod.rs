//! Command registry for REPL commands
//!
//! Commands are matched by longest prefix, so "voice reset" wins over "voice".

pub mod analyze;
pub mod general;
pub mod midi;
pub mod recognize;
pub mod voicing;

use crate::midi::{MidiListener, RecognizerHandle};
use anyhow::Result;
use harmonist_core::analysis::chord_from_symbol;
use harmonist_core::recognition::RecognitionConfig;
use harmonist_core::types::{parse_pitch, KeyContext, Pitch};
use harmonist_core::voice_leading::{VoiceLeadingOptimizer, VoicingOptions};

/// Result of executing a command
#[derive(Debug)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// No registered command matches the input
    NotACommand,
    /// Error occurred
    Error(String),
}

/// State shared by command handlers
pub struct CommandContext {
    pub optimizer: VoiceLeadingOptimizer,
    pub voicing: VoicingOptions,
    pub recognizer: RecognizerHandle,
    pub midi_input: Option<MidiListener>,
    /// Notes typed with `recognize play` that are still held
    pub held: Vec<Pitch>,
}

impl CommandContext {
    pub fn new() -> Result<Self> {
        Ok(Self {
            optimizer: VoiceLeadingOptimizer::new(),
            voicing: VoicingOptions::default(),
            recognizer: RecognizerHandle::spawn(RecognitionConfig::default())?,
            midi_input: None,
            held: Vec::new(),
        })
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("identify", analyze::cmd_identify);
    registry.register("analyze", analyze::cmd_analyze);
    registry.register("symbol", analyze::cmd_symbol);
    registry.register("chord", analyze::cmd_chord);
    registry.register("tension", analyze::cmd_tension);
    registry.register("key", analyze::cmd_key);
    registry.register("progression", analyze::cmd_progression);
    registry.register("function", analyze::cmd_function);

    registry.register("voice", voicing::cmd_voice);
    registry.register("voice reset", voicing::cmd_voice_reset);
    registry.register("voice style", voicing::cmd_voice_style);

    registry.register("recognize play", recognize::cmd_recognize_play);
    registry.register("recognize release", recognize::cmd_recognize_release);
    registry.register("recognize mode", recognize::cmd_recognize_mode);
    registry.register("recognize status", recognize::cmd_recognize_status);
    registry.register("recognize reset", recognize::cmd_recognize_reset);

    registry.register("midi devices", midi::cmd_midi_devices);
    registry.register("midi listen", midi::cmd_midi_listen);
    registry.register("midi stop", midi::cmd_midi_stop);

    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);

    registry
}

/// Split a trailing "in <key>" off command arguments
pub fn split_key(args: &str) -> Result<(&str, Option<KeyContext>), String> {
    let (rest, key) = if let Some(key) = args.strip_prefix("in ") {
        ("", key)
    } else if let Some(at) = args.rfind(" in ") {
        (args[..at].trim(), &args[at + 4..])
    } else {
        return Ok((args, None));
    };
    let key = key.parse::<KeyContext>().map_err(|e| e.to_string())?;
    Ok((rest, Some(key)))
}

/// Read a chord from either one symbol ("Cmaj7", "F/A") or a list of notes ("C4 E4 G4", "60,64,67")
pub fn parse_chord(args: &str) -> Result<Vec<Pitch>, String> {
    let tokens: Vec<&str> = args
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    match tokens.as_slice() {
        [] => Err("expected a chord symbol or a list of notes".to_string()),
        [single] => chord_from_symbol(single)
            .map(|set| set.into_vec())
            .or_else(|| parse_pitch(single).ok().map(|p| vec![p]))
            .ok_or_else(|| format!("'{}' is neither a chord symbol nor a note", single)),
        many => many
            .iter()
            .map(|t| parse_pitch(t).map_err(|e| e.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> CommandContext {
        CommandContext::new().unwrap()
    }

    fn message(result: CommandResult) -> String {
        match result {
            CommandResult::Message(text) => text,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let registry = create_registry();
        let mut ctx = ctx();
        let options = ctx.voicing;
        ctx.optimizer.process_chord(&[60, 64, 67], &options);
        assert!(matches!(
            registry.execute("voice reset", &mut ctx),
            CommandResult::Message(_)
        ));
        assert!(ctx.optimizer.current().is_empty());
        assert!(matches!(
            registry.execute("voicereset", &mut ctx),
            CommandResult::NotACommand
        ));
        assert!(matches!(registry.execute("quit", &mut ctx), CommandResult::Exit));
    }

    #[test]
    fn test_parse_chord_inputs() {
        assert_eq!(parse_chord("C4 E4 G4").unwrap(), vec![60, 64, 67]);
        assert_eq!(parse_chord("60,64, 67").unwrap(), vec![60, 64, 67]);
        assert_eq!(parse_chord("Am").unwrap(), vec![69, 72, 76]);
        // a lone token reads as a symbol first, so "C#5" is a power chord
        assert_eq!(parse_chord("C#5").unwrap(), vec![61, 68]);
        assert_eq!(parse_chord("C#4 E4").unwrap(), vec![61, 64]);
        assert!(parse_chord("").is_err());
        assert!(parse_chord("C4 X9").is_err());
    }

    #[test]
    fn test_split_key() {
        let (rest, key) = split_key("V7 in Bb").unwrap();
        assert_eq!(rest, "V7");
        assert_eq!(key, Some(KeyContext::major(10)));
        assert_eq!(split_key("ii7").unwrap(), ("ii7", None));
        assert!(split_key("V in H").is_err());
    }

    #[test]
    fn test_analysis_commands() {
        let registry = create_registry();
        let mut ctx = ctx();
        assert!(message(registry.execute("identify C4 E4 G4", &mut ctx)).contains("major"));
        assert!(message(registry.execute("symbol E4 G4 C5", &mut ctx)).contains("C/E"));
        assert!(message(registry.execute("key C E G F A C G B D", &mut ctx)).contains("C major"));
        assert!(message(registry.execute("function V7 in F", &mut ctx)).contains("C7"));
        assert!(matches!(
            registry.execute("chord Q7", &mut ctx),
            CommandResult::Error(_)
        ));
    }
}
