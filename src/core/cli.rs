//! CLI-only commands: text tools, account and backend queries.
//!
//! These run without the interactive loop and produce plain text output.

use std::error::Error;
use std::io::{self, Read};
use std::sync::Arc;

use crate::core::config::{self, Config};
use crate::core::credentials::{CredentialStore, FileCredentialStore};
use crate::core::markdown;
use crate::core::message::{ChatMessage, Sender};
use crate::core::render;
use crate::core::title;
use crate::core::transport::{ErrorKind, HttpTransport, Transport, TransportError};

const LOGIN_HINT: &str = "Run `healthchat login --access <TOKEN>` to sign in again.";

fn read_stdin() -> io::Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Normalized, reconciled and rendered text of a bot reply.
pub fn render_reply(text: &str, config: &Config, width: usize) -> String {
    let blocks = render::render(
        &markdown::normalize_response(text),
        config.site_host.as_deref(),
    );
    render::to_plain_text(&blocks, width)
}

/// Speaker label and rendered text for one message.
pub fn format_message(message: &ChatMessage, config: &Config, width: usize) -> String {
    match message.sender {
        Sender::User => format!("you> {}", message.text),
        Sender::Bot if message.is_error => format!("bot> [error] {}", message.text),
        Sender::Bot => format!("bot>\n{}", render_reply(&message.text, config, width)),
    }
}

/// `normalize`: stdin → normalized Markdown on stdout.
pub fn run_normalize() -> Result<(), Box<dyn Error>> {
    let input = read_stdin()?;
    println!("{}", markdown::normalize_response(&input));
    Ok(())
}

/// `render`: stdin → plain text on stdout.
pub fn run_render(width: usize) -> Result<(), Box<dyn Error>> {
    let config = config::load()?;
    let input = read_stdin()?;
    println!("{}", render_reply(&input, &config, width));
    Ok(())
}

/// `title`: JSON array of messages on stdin → title on stdout.
pub fn run_title() -> Result<(), Box<dyn Error>> {
    let input = read_stdin()?;
    let messages: Vec<ChatMessage> = if input.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&input)?
    };
    println!("{}", title::extract_title(&messages));
    Ok(())
}

pub fn run_login(access: &str, refresh: Option<&str>) -> Result<(), Box<dyn Error>> {
    if access.trim().is_empty() {
        return Err("access token is empty".into());
    }
    let store = FileCredentialStore::default_location()?;
    store.save_token(access, refresh)?;
    println!("Credentials saved to {}", store.path().display());
    Ok(())
}

pub fn run_logout() -> Result<(), Box<dyn Error>> {
    let store = FileCredentialStore::default_location()?;
    store.remove_token()?;
    println!("Signed out.");
    Ok(())
}

/// Build the HTTP transport with the file credential store.
pub fn http_transport(config: &Config) -> Result<HttpTransport, Box<dyn Error>> {
    let store: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::default_location()?);
    Ok(HttpTransport::new(config, store)?)
}

/// User-facing error for a failed backend call, with a sign-in hint after auth failures.
fn transport_failure(e: TransportError) -> Box<dyn Error> {
    log::warn!("{}", e);
    if e.kind == ErrorKind::Authentication {
        format!("{}\n{}", e.user_message(), LOGIN_HINT).into()
    } else {
        e.user_message().into()
    }
}

/// `history`: fetch remote history and print it under its title.
pub async fn run_history(width: usize) -> Result<(), Box<dyn Error>> {
    let config = config::load()?;
    let transport = http_transport(&config)?;
    let history = transport
        .fetch_history()
        .await
        .map_err(transport_failure)?;
    if history.is_empty() {
        println!("No conversation history.");
        return Ok(());
    }
    println!("{}\n", title::extract_title(&history));
    for message in &history {
        println!("{}\n", format_message(message, &config, width));
    }
    Ok(())
}

/// `whoami`: show the signed-in user.
pub async fn run_whoami() -> Result<(), Box<dyn Error>> {
    let config = config::load()?;
    let transport = http_transport(&config)?;
    let user = transport
        .fetch_current_user()
        .await
        .map_err(transport_failure)?;
    match user.avatar_url {
        Some(avatar) => println!("{} ({})", user.name, avatar),
        None => println!("{}", user.name),
    }
    Ok(())
}

pub fn login_hint() -> &'static str {
    LOGIN_HINT
}
