//! Voice-leading commands

use crate::commands::{parse_chord, split_key, CommandContext, CommandResult};
use colored::*;
use harmonist_core::analysis::analyze;
use harmonist_core::voice_leading::VoicingStyle;

/// Handle `voice <chord> [in <key>]` - voice the chord against the current assignment
pub fn cmd_voice(args: &str, ctx: &mut CommandContext) -> CommandResult {
    let (rest, key) = match split_key(args) {
        Ok(split) => split,
        Err(e) => return CommandResult::Error(e),
    };
    let pitches = match parse_chord(rest) {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(e),
    };

    let analysis = analyze(&pitches, key.as_ref());
    let mut options = ctx.voicing.with_root(analysis.root);
    if let Some(key) = key {
        options = options.with_key(key);
    }
    let voiced = ctx.optimizer.process_chord(&pitches, &options);

    let mut output = format!(
        "{}  {}",
        analysis.symbol().green().bold(),
        voiced.assignment
    );
    if !voiced.movements.is_empty() {
        output.push_str(&format!(
            "\n  {} {} semitones",
            "movement:".dimmed(),
            voiced.total_movement()
        ));
    }
    for violation in &voiced.violations {
        output.push_str(&format!("\n  {} {}", "!".yellow(), violation));
    }
    CommandResult::Message(output)
}

/// Handle `voice reset`
pub fn cmd_voice_reset(_args: &str, ctx: &mut CommandContext) -> CommandResult {
    ctx.optimizer.reset();
    CommandResult::Message("Voicing cleared".to_string())
}

/// Handle `voice style [close|open|drop2|spread[:factor]]`
pub fn cmd_voice_style(args: &str, ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Message(format!("Voicing style: {:?}", ctx.voicing.style));
    }
    match args.parse::<VoicingStyle>() {
        Ok(style) => {
            ctx.voicing.style = style;
            CommandResult::Message(format!("Voicing style set to {:?}", style).green().to_string())
        }
        Err(e) => CommandResult::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmonist_core::voice_leading::VoiceRole;

    #[test]
    fn test_voice_keeps_state_between_chords() {
        let mut ctx = CommandContext::new().unwrap();
        assert!(matches!(cmd_voice("Cmaj7", &mut ctx), CommandResult::Message(_)));
        assert!(ctx.optimizer.current().get(VoiceRole::Bass).is_some());
        match cmd_voice("Fmaj7 in C", &mut ctx) {
            CommandResult::Message(text) => assert!(text.contains("movement:")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ctx.optimizer.history().count(), 2);
    }

    #[test]
    fn test_voice_style_parsing() {
        let mut ctx = CommandContext::new().unwrap();
        cmd_voice_style("drop2", &mut ctx);
        assert_eq!(ctx.voicing.style, VoicingStyle::Drop2);
        assert!(matches!(
            cmd_voice_style("sideways", &mut ctx),
            CommandResult::Error(_)
        ));
    }
}
