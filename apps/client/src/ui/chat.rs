//! Terminal chat: sidebar printed as a numbered list, replies streamed in place.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use rustyline::DefaultEditor;
use tracing::{debug, info};

use crate::api::types::{Conversation, Role};
use crate::api::ApiClient;
use crate::chat::{ChatSession, ChatView, StopHandle};
use crate::config::parse_temperature;
use crate::errors::ClientError;
use crate::ui::{ask_yes_no, print_error, print_notice, read_input, Input};

const PROMPT: &str = "you> ";
const IMAGE_PROMPT: &str = "you [image]> ";

const HELP: &str = "\
Commands:
  /new              start a new chat
  /list             refresh the chat list
  /open <id>        switch to a chat
  /delete [id]      delete a chat (default: the current one)
  /image <path>     attach an image to the next message
  /noimage          drop the pending attachment
  /temp [value]     show or set the temperature (0 to 1)
  /help             show this help
  /quit             exit
Anything else is sent as a message. Ctrl-C stops a reply in progress.";

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Send(String),
    New,
    List,
    Open(i64),
    Delete(Option<i64>),
    Attach(PathBuf),
    ClearImage,
    Temperature(Option<f64>),
    Help,
    Quit,
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return ChatCommand::Send(line.to_string());
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "new" => ChatCommand::New,
            "list" => ChatCommand::List,
            "open" => match arg.parse() {
                Ok(id) => ChatCommand::Open(id),
                Err(_) => ChatCommand::Invalid("Usage: /open <id>".to_string()),
            },
            "delete" if arg.is_empty() => ChatCommand::Delete(None),
            "delete" => match arg.parse() {
                Ok(id) => ChatCommand::Delete(Some(id)),
                Err(_) => ChatCommand::Invalid("Usage: /delete [id]".to_string()),
            },
            "image" if arg.is_empty() => ChatCommand::Invalid("Usage: /image <path>".to_string()),
            "image" => ChatCommand::Attach(PathBuf::from(arg)),
            "noimage" => ChatCommand::ClearImage,
            "temp" if arg.is_empty() => ChatCommand::Temperature(None),
            "temp" => match parse_temperature(arg) {
                Ok(t) => ChatCommand::Temperature(Some(t)),
                Err(e) => ChatCommand::Invalid(format!("{e:#}")),
            },
            "help" => ChatCommand::Help,
            "quit" | "exit" => ChatCommand::Quit,
            _ => ChatCommand::Invalid(format!("Unknown command /{name}. Type /help.")),
        }
    }
}

/// Prints the transcript to stdout.
#[derive(Default)]
pub struct TerminalChatView {
    /// Bytes of the open bot bubble already on screen.
    shown: usize,
    bubble_open: bool,
}

impl TerminalChatView {
    fn close_bubble(&mut self) {
        if self.bubble_open {
            println!();
            self.bubble_open = false;
        }
    }
}

/// Part of `full` not yet printed, or `None` if the snapshot no longer
/// extends what is on screen.
fn unseen_suffix(full: &str, shown: usize) -> Option<&str> {
    full.get(shown..)
}

fn describe_image(uri: &str) -> String {
    let mime = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .unwrap_or("image");
    format!("[{mime} attached]")
}

impl ChatView for TerminalChatView {
    fn render_conversations(&mut self, conversations: &[Conversation], current: Option<i64>) {
        self.close_bubble();
        println!("{}", "Chats:".bright_magenta().bold());
        for conversation in conversations {
            let line = format!("  [{}] {}", conversation.id, conversation.title);
            if Some(conversation.id) == current {
                println!("{} {}", "*".bright_green(), line.trim_start().bright_green());
            } else {
                println!("{}", line.bright_black());
            }
        }
    }

    fn clear_transcript(&mut self) {
        self.close_bubble();
        println!("{}", "─".repeat(40).bright_black());
    }

    fn append_message(&mut self, role: Role, text: &str, image: Option<&str>) {
        self.close_bubble();
        let label = match role {
            Role::User => "You:".green().bold(),
            Role::Assistant => "Bot:".bright_blue().bold(),
        };
        println!("{label} {text}");
        if let Some(uri) = image {
            println!("     {}", describe_image(uri).bright_black());
        }
    }

    fn begin_bot_message(&mut self) {
        self.close_bubble();
        print!("{} ", "Bot:".bright_blue().bold());
        let _ = io::stdout().flush();
        self.shown = 0;
        self.bubble_open = true;
    }

    fn render_bot_text(&mut self, text: &str) {
        match unseen_suffix(text, self.shown) {
            Some(suffix) => print!("{suffix}"),
            None => print!("\n{text}"),
        }
        let _ = io::stdout().flush();
        self.shown = text.len();
    }

    fn append_bot_error(&mut self, message: &str) {
        self.close_bubble();
        print_error(message);
    }

    fn set_busy(&mut self, busy: bool) {
        if !busy {
            self.close_bubble();
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.close_bubble();
        ask_yes_no(prompt)
    }

    fn notify(&mut self, message: &str) {
        self.close_bubble();
        print_notice(message);
    }
}

/// Stops the running reply on Ctrl-C. Outside a reply the editor owns the
/// terminal and sees Ctrl-C as a key press instead.
fn spawn_stop_watcher(stop: StopHandle) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if stop.stop() {
                info!("Stop requested");
            }
        }
    })
}

fn report(err: &ClientError) {
    match err {
        // Already shown by the session, or nothing to say.
        ClientError::EmptyMessage
        | ClientError::SendInFlight
        | ClientError::NoActiveConversation
        | ClientError::Image(_) => debug!("{err}"),
        other => print_error(&other.inline_message()),
    }
}

pub async fn run_chat(client: ApiClient, temperature: f64) -> Result<()> {
    let mut session = ChatSession::new(client, TerminalChatView::default(), temperature);
    let watcher = spawn_stop_watcher(session.stop_handle());

    println!("{}", "=== Chat ===".bright_magenta().bold());
    println!("{}", "Type /help for commands.".bright_black());
    if let Err(e) = session.new_chat().await {
        report(&e);
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        let prompt = if session.has_attachment() {
            IMAGE_PROMPT
        } else {
            PROMPT
        };
        let line = match read_input(&mut rl, prompt, "")? {
            Input::Line(line) => line,
            Input::Interrupted => continue,
            Input::Eof => break,
        };

        let result = match ChatCommand::parse(&line) {
            ChatCommand::Send(text) => session.send_message(&text).await.map(|_| ()),
            ChatCommand::New => session.new_chat().await.map(|_| ()),
            ChatCommand::List => session.refresh_conversations().await,
            ChatCommand::Open(id) => session.select_chat(id).await,
            ChatCommand::Delete(id) => match id.or(session.current_chat()) {
                Some(id) => session.delete_chat(id).await.map(|_| ()),
                None => Err(ClientError::NoActiveConversation),
            },
            ChatCommand::Attach(path) => session.attach_image(&path).await,
            ChatCommand::ClearImage => {
                session.clear_image();
                Ok(())
            }
            ChatCommand::Temperature(Some(t)) => {
                session.set_temperature(t);
                print_notice(&format!("Temperature set to {t}"));
                Ok(())
            }
            ChatCommand::Temperature(None) => {
                print_notice(&format!("Temperature is {}", session.temperature()));
                Ok(())
            }
            ChatCommand::Help => {
                println!("{}", HELP.bright_black());
                Ok(())
            }
            ChatCommand::Quit => break,
            ChatCommand::Invalid(message) => {
                print_error(&message);
                Ok(())
            }
        };
        if let Err(e) = result {
            report(&e);
        }
    }

    watcher.abort();
    Ok(())
}
