//! Harmonic analysis commands

use crate::commands::{parse_chord, split_key, CommandContext, CommandResult};
use colored::*;
use harmonist_core::analysis::{
    analyze, chord_from_function, chord_from_symbol, classify_progression, detect_key,
    extract_tensions, generate_progression, identify_quality, key_scores, ProgressionConfig,
    Style,
};
use harmonist_core::types::{parse_pitch, pitch_class_name, pitch_name, KeyContext, Pitch};

fn note_list(pitches: &[Pitch]) -> String {
    pitches
        .iter()
        .map(|&p| pitch_name(p))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Handle `identify <chord>`
pub fn cmd_identify(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let pitches = match parse_chord(args) {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(e),
    };
    let quality = identify_quality(&pitches);
    let analysis = analyze(&pitches, None);
    CommandResult::Message(format!(
        "{} {}",
        pitch_class_name(analysis.root_pc()).green().bold(),
        quality
    ))
}

/// Handle `analyze <chord> [in <key>]`
pub fn cmd_analyze(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let (rest, key) = match split_key(args) {
        Ok(split) => split,
        Err(e) => return CommandResult::Error(e),
    };
    let pitches = match parse_chord(rest) {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(e),
    };
    let analysis = analyze(&pitches, key.as_ref());
    let position = match analysis.inversion {
        0 => "root position".to_string(),
        n => format!("inversion {}", n),
    };
    CommandResult::Message(format!("{}\n  {}", analysis, position.dimmed()))
}

/// Handle `symbol <notes>`
pub fn cmd_symbol(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    match parse_chord(args) {
        Ok(pitches) => CommandResult::Message(analyze(&pitches, None).symbol()),
        Err(e) => CommandResult::Error(e),
    }
}

/// Handle `chord <symbol>`
pub fn cmd_chord(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    if args.is_empty() {
        return CommandResult::Error("Usage: chord <symbol>".to_string());
    }
    match chord_from_symbol(args) {
        Some(set) => CommandResult::Message(format!(
            "{}: {}",
            args.green().bold(),
            note_list(set.pitches()).cyan()
        )),
        None => CommandResult::Error(format!("'{}' is not a chord symbol", args)),
    }
}

/// Handle `tension <chord>`
pub fn cmd_tension(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let pitches = match parse_chord(args) {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(e),
    };
    let analysis = analyze(&pitches, None);
    let (tensions, alterations) = extract_tensions(analysis.root, &pitches);

    let mut output = format!("{} tension {:.2}", analysis.symbol().green(), analysis.tension);
    if !tensions.is_empty() {
        output.push_str(&format!("\n  tensions: {}", tensions.join(", ").cyan()));
    }
    if !alterations.is_empty() {
        output.push_str(&format!("\n  alterations: {}", alterations.join(", ").magenta()));
    }
    CommandResult::Message(output)
}

/// Handle `key <notes>`
pub fn cmd_key(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let pitches: Vec<Pitch> = match args
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(parse_pitch)
        .collect()
    {
        Ok(p) => p,
        Err(e) => return CommandResult::Error(e.to_string()),
    };
    if pitches.is_empty() {
        return CommandResult::Error("Usage: key <notes>".to_string());
    }

    let key = KeyContext::major(detect_key(&pitches));
    let scores = key_scores(&pitches);
    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let runners_up: Vec<String> = ranked
        .iter()
        .skip(1)
        .take(2)
        .map(|&(pc, score)| format!("{} {:.1}", pitch_class_name(pc as u8), score))
        .collect();

    CommandResult::Message(format!(
        "Key: {}  {}",
        key.name().green().bold(),
        format!("(next: {})", runners_up.join(", ")).dimmed()
    ))
}

/// Handle `function <numeral> [in <key>]`
pub fn cmd_function(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let (numeral, key) = match split_key(args) {
        Ok(split) => split,
        Err(e) => return CommandResult::Error(e),
    };
    if numeral.is_empty() {
        return CommandResult::Error("Usage: function <numeral> [in <key>]".to_string());
    }
    let key = key.unwrap_or_default();
    match chord_from_function(numeral, &key) {
        Some(chord) => CommandResult::Message(format!(
            "{} in {}: {} [{}]",
            numeral.yellow(),
            key,
            chord.symbol().green().bold(),
            note_list(&chord.pitches)
        )),
        None => CommandResult::Error(format!("'{}' is not a function symbol", numeral)),
    }
}

/// Handle `progression [length] [style] [in <key>] [seed <n>]`
pub fn cmd_progression(args: &str, _ctx: &mut CommandContext) -> CommandResult {
    let (rest, key) = match split_key(args) {
        Ok(split) => split,
        Err(e) => return CommandResult::Error(e),
    };

    let mut length = 4;
    let mut style = Style::default();
    let mut seed = None;
    let mut tokens = rest.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "seed" {
            match tokens.next().and_then(|n| n.parse::<u64>().ok()) {
                Some(n) => seed = Some(n),
                None => return CommandResult::Error("seed needs a number".to_string()),
            }
        } else if let Ok(n) = token.parse::<usize>() {
            if n == 0 || n > 32 {
                return CommandResult::Error("Length must be between 1 and 32".to_string());
            }
            length = n;
        } else {
            match token.parse::<Style>() {
                Ok(s) => style = s,
                Err(e) => return CommandResult::Error(e.to_string()),
            }
        }
    }

    let mut config = ProgressionConfig::new(length, style).with_key(key.unwrap_or_default());
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let chords = generate_progression(&config);

    let symbols: Vec<String> = chords.iter().map(|c| c.symbol()).collect();
    let functions: Vec<&str> = chords.iter().filter_map(|c| c.function.as_deref()).collect();
    CommandResult::Message(format!(
        "{}\n{}\n{} {}",
        symbols.join(" - ").green().bold(),
        functions.join(" - ").yellow(),
        "type:".dimmed(),
        classify_progression(&functions)
    ))
}
