//! Interactive REPL: analysis commands plus live chord recognition output

use crate::commands::{create_registry, CommandContext, CommandRegistry, CommandResult};
use crate::midi::RecognizerEvent;
use anyhow::{Context, Result};
use colored::*;
use crossbeam_channel::{unbounded, Receiver, Sender};
use harmonist_core::types::pitch_class_name;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::thread;
use tracing::debug;

/// Types of events the REPL loop handles
enum ReplEvent {
    Input(Result<String, ReadlineError>),
}

pub struct Repl {
    editor: Option<DefaultEditor>,
    registry: CommandRegistry,
    ctx: CommandContext,
    tx_input: Sender<ReplEvent>,
    rx_input: Receiver<ReplEvent>,
}

impl Repl {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialize line editor")?;
        let (tx_input, rx_input) = unbounded();
        Ok(Repl {
            editor: Some(editor),
            registry: create_registry(),
            ctx: CommandContext::new()?,
            tx_input,
            rx_input,
        })
    }

    fn print_banner() {
        println!("{}", "Harmonist".bright_cyan().bold());
        println!(
            "Try: {}, {}, {}",
            "analyze Dm7 in C".cyan(),
            "voice G7".cyan(),
            "midi listen".cyan()
        );
        println!(
            "Type '{}' for more information, '{}' or {} to exit.\n",
            "help".bright_green(),
            "quit".bright_red(),
            "Ctrl+C".bright_red()
        );
    }

    fn spawn_input_thread(&mut self) -> Result<()> {
        let mut editor = self.editor.take().context("REPL is already running")?;
        let tx_input = self.tx_input.clone();

        thread::Builder::new()
            .name("repl-input".to_string())
            .spawn(move || loop {
                let prompt = format!("{} ", "harmonist>".bright_magenta().bold());
                match editor.readline(&prompt) {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        if !line.is_empty() {
                            let _ = editor.add_history_entry(&line);
                        }
                        if tx_input.send(ReplEvent::Input(Ok(line))).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = tx_input.send(ReplEvent::Input(Err(err)));
                        break;
                    }
                }
            })
            .context("failed to start input thread")?;
        Ok(())
    }

    /// Returns false when the REPL should stop
    fn handle_line(&mut self, line: &str) -> bool {
        if line.is_empty() {
            return true;
        }
        match self.registry.execute(line, &mut self.ctx) {
            CommandResult::Success => {}
            CommandResult::Message(msg) => println!("{}", msg),
            CommandResult::Exit => {
                println!("{}", "Goodbye!".bright_cyan());
                return false;
            }
            CommandResult::Error(e) => {
                println!("{} {}", "Error:".bright_red().bold(), e.red());
            }
            CommandResult::NotACommand => println!(
                "{} unknown command '{}', try {}",
                "Error:".bright_red().bold(),
                line,
                "help".bright_green()
            ),
        }
        true
    }

    fn print_recognition(event: RecognizerEvent) {
        match event {
            RecognizerEvent::ChordChanged(change) => {
                let from = change
                    .previous
                    .map(|p| format!(" (from {})", p.symbol()))
                    .unwrap_or_default();
                println!(
                    "{} {}{}",
                    "♪".bright_yellow(),
                    change.current.to_string().green().bold(),
                    from.dimmed()
                );
            }
            RecognizerEvent::Progression(progression) => {
                println!(
                    "{} {} {} in {} major",
                    "progression:".dimmed(),
                    progression.functions.join(" - ").yellow(),
                    progression.progression_type.cyan(),
                    pitch_class_name(progression.key_root)
                );
            }
        }
    }

    /// Start the REPL loop
    pub fn run(&mut self) -> Result<()> {
        Self::print_banner();
        self.spawn_input_thread()?;
        let input = self.rx_input.clone();
        let recognized = self.ctx.recognizer.events();

        loop {
            crossbeam_channel::select! {
                recv(input) -> msg => match msg {
                    Ok(ReplEvent::Input(Ok(line))) => {
                        if !self.handle_line(&line) {
                            break;
                        }
                    }
                    Ok(ReplEvent::Input(Err(ReadlineError::Interrupted)))
                    | Ok(ReplEvent::Input(Err(ReadlineError::Eof))) => {
                        println!("{}", "Goodbye!".bright_cyan());
                        break;
                    }
                    Ok(ReplEvent::Input(Err(err))) => {
                        println!(
                            "{} {}",
                            "Error reading input:".bright_red().bold(),
                            err.to_string().red()
                        );
                        break;
                    }
                    Err(_) => break,
                },
                recv(recognized) -> msg => match msg {
                    Ok(event) => Self::print_recognition(event),
                    Err(_) => {
                        debug!("recognizer event channel closed");
                        break;
                    }
                },
            }
        }

        Ok(())
    }
}

/// Convenience function to start the REPL
pub fn start() -> Result<()> {
    Repl::new()?.run()
}
