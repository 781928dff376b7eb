// Terminal front ends for both widgets. Views print; the `run_*` loops read
// lines, parse them into commands and call the controllers.

pub mod chat;
pub mod resume;

use std::io::{self, BufRead, Write};

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// What one prompt produced.
pub enum Input {
    Line(String),
    /// Ctrl-C at the prompt: discard the line, keep going.
    Interrupted,
    /// Ctrl-D: leave the loop.
    Eof,
}

/// Reads a line with `initial` pre-filled. The editor blocks, so it runs on a
/// blocking-capable worker of the multi-threaded runtime.
pub fn read_input(rl: &mut DefaultEditor, prompt: &str, initial: &str) -> rustyline::Result<Input> {
    let result = tokio::task::block_in_place(|| {
        if initial.is_empty() {
            rl.readline(prompt)
        } else {
            rl.readline_with_initial(prompt, (initial, ""))
        }
    });
    match result {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = rl.add_history_entry(line.as_str());
            }
            Ok(Input::Line(line))
        }
        Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
        Err(ReadlineError::Eof) => Ok(Input::Eof),
        Err(e) => Err(e),
    }
}

/// y/N prompt on plain stdin; anything but an explicit yes declines.
pub fn ask_yes_no(prompt: &str) -> bool {
    print!("{} {} ", prompt.bright_yellow(), "[y/N]".bright_black());
    let _ = io::stdout().flush();
    let mut answer = String::new();
    let read = tokio::task::block_in_place(|| io::stdin().lock().read_line(&mut answer));
    read.is_ok() && is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn print_error(message: &str) {
    println!("{}", message.red());
}

pub fn print_notice(message: &str) {
    println!("{}", message.yellow());
}
