//! Terminal resume interview: numbered chips, a text preview of the profile.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::resume::fields::{Field, ResumeProfile};
use crate::resume::store::LocalStore;
use crate::resume::suggestions::{chip_label, ChipSelection};
use crate::resume::{ResumeInterview, ResumeView};
use crate::ui::{print_error, print_notice, read_input, Input};

const PROMPT: &str = "you> ";
const FINISHED_PROMPT: &str = "done> ";

const HELP: &str = "\
Commands:
  /<n>              pick suggestion number n
  /upload <path>    upload an existing resume (pdf, docx, txt)
  /profile          show the collected profile
  /set <field> <v>  edit a field, e.g. /set email ada@example.com
  /submit           submit the resume
  /clear            forget the collected profile
  /help             show this help
  /quit             exit
Anything else is sent as your answer.";

#[derive(Debug, Clone, PartialEq)]
pub enum ResumeCommand {
    Send(String),
    Chip(usize),
    Upload(PathBuf),
    Set(Field, String),
    Profile,
    Submit,
    Clear,
    Help,
    Quit,
    Invalid(String),
}

impl ResumeCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return ResumeCommand::Send(line.to_string());
        };
        if let Ok(n) = rest.parse::<usize>() {
            return ResumeCommand::Chip(n);
        }
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "upload" if arg.is_empty() => {
                ResumeCommand::Invalid("Usage: /upload <path>".to_string())
            }
            "upload" => ResumeCommand::Upload(PathBuf::from(arg)),
            "set" => match parse_assignment(arg) {
                Some((field, value)) => ResumeCommand::Set(field, value),
                None => ResumeCommand::Invalid(
                    "Usage: /set <field> <value>, e.g. /set job_title Engineer".to_string(),
                ),
            },
            "profile" => ResumeCommand::Profile,
            "submit" => ResumeCommand::Submit,
            "clear" => ResumeCommand::Clear,
            "help" => ResumeCommand::Help,
            "quit" | "exit" => ResumeCommand::Quit,
            _ => ResumeCommand::Invalid(format!("Unknown command /{name}. Type /help.")),
        }
    }
}

/// Splits `job_title Engineer` or `Job Title Engineer` into field and value.
fn parse_assignment(arg: &str) -> Option<(Field, String)> {
    let words: Vec<&str> = arg.split_whitespace().collect();
    (1..=words.len().min(2)).rev().find_map(|n| {
        let field = Field::from_name(&words[..n].join(" "))?;
        let value = words[n..].join(" ");
        (!value.is_empty()).then_some((field, value))
    })
}

/// Turns `**bold**` spans into terminal bold; other text passes through.
fn render_markup(text: &str) -> String {
    text.split("**")
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 1 {
                part.bold().to_string()
            } else {
                part.to_string()
            }
        })
        .collect()
}

fn preview_lines(profile: &ResumeProfile) -> Vec<String> {
    Field::ORDER
        .iter()
        .map(|field| {
            let value = profile
                .field(*field)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or("-");
            format!("{:>16}: {value}", field.label())
        })
        .collect()
}

#[derive(Default)]
pub struct TerminalResumeView {
    preview: ResumeProfile,
    revealed: bool,
    typing: bool,
}

impl TerminalResumeView {
    pub fn print_preview(&self) {
        println!("{}", "Resume preview".bright_magenta().bold());
        if self.preview.is_empty() {
            println!("{}", "  Nothing collected yet.".bright_black());
            return;
        }
        for line in preview_lines(&self.preview) {
            println!("{line}");
        }
    }
}

impl ResumeView for TerminalResumeView {
    fn append_user_message(&mut self, text: &str) {
        println!("{} {text}", "You:".green().bold());
    }

    fn append_bot_message(&mut self, text: &str, formatted: bool) {
        let body = if formatted {
            render_markup(text)
        } else {
            text.to_string()
        };
        println!("{} {body}", "Bot:".bright_blue().bold());
    }

    fn append_error(&mut self, message: &str) {
        print_error(message);
    }

    fn show_typing(&mut self, typing: bool) {
        if typing {
            print!("{}", "Bot is typing...".bright_black());
        } else if self.typing {
            print!("\r\x1b[2K");
        }
        self.typing = typing;
        let _ = io::stdout().flush();
    }

    fn render_suggestions(&mut self, chips: &[String], selection: &ChipSelection) {
        if chips.is_empty() {
            return;
        }
        for (i, chip) in chips.iter().enumerate() {
            let label = format!("[{}] {}", i + 1, chip_label(chip));
            if selection.contains(chip) {
                println!("  {} {}", "✓".bright_green(), label.bright_green());
            } else {
                println!("    {}", label.cyan());
            }
        }
    }

    fn set_input(&mut self, value: &str) {
        if !value.is_empty() {
            println!("{} {value}", "Selected:".bright_black());
        }
    }

    fn update_preview(&mut self, profile: &ResumeProfile) {
        self.preview = profile.clone();
    }

    fn reveal_preview(&mut self) {
        if !self.revealed {
            self.revealed = true;
            self.print_preview();
        }
    }

    fn lock_input(&mut self, placeholder: &str) {
        print_notice(placeholder);
    }

    fn show_success(&mut self, message: &str) {
        println!("{}", message.bright_green().bold());
    }
}

fn report(err: &ClientError) {
    match err {
        ClientError::InterviewFinished => {
            print_notice("The interview is complete. Use /set to edit a field, /submit or /quit.")
        }
        ClientError::NoSuggestion(_) | ClientError::Store(_) => print_error(&err.to_string()),
        // Everything else was already shown by the interview.
        _ => debug!("{err}"),
    }
}

pub async fn run_resume(client: ApiClient, store: LocalStore) -> Result<()> {
    let mut interview = ResumeInterview::restore(client, TerminalResumeView::default(), store);

    println!("{}", "=== Resume Builder ===".bright_magenta().bold());
    println!("{}", "Type /help for commands.".bright_black());
    if let Err(e) = interview.start().await {
        report(&e);
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        let initial = interview.pending_input().to_string();
        let prompt = if interview.is_finished() {
            FINISHED_PROMPT
        } else {
            PROMPT
        };
        let line = match read_input(&mut rl, prompt, &initial)? {
            Input::Line(line) => line,
            Input::Interrupted => continue,
            Input::Eof => break,
        };

        let result = match ResumeCommand::parse(&line) {
            ResumeCommand::Send(text) => interview.send(&text).await,
            ResumeCommand::Chip(n) => interview.click_suggestion(n).await,
            ResumeCommand::Upload(path) => interview.upload(&path).await,
            ResumeCommand::Set(field, value) => {
                interview.edit_field(field, &value);
                interview.view().print_preview();
                Ok(())
            }
            ResumeCommand::Profile => {
                interview.view().print_preview();
                Ok(())
            }
            ResumeCommand::Submit => interview.submit().await,
            ResumeCommand::Clear => interview.clear_profile(),
            ResumeCommand::Help => {
                println!("{}", HELP.bright_black());
                Ok(())
            }
            ResumeCommand::Quit => break,
            ResumeCommand::Invalid(message) => {
                print_error(&message);
                Ok(())
            }
        };
        if let Err(e) = result {
            report(&e);
        }
    }
    Ok(())
}
