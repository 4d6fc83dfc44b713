//! Application run modes: logger init, single prompt, interactive chat.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::cli::Args;
use crate::core;
use crate::core::cli::{format_message, login_hint, render_reply};
use crate::core::config::Config;
use crate::core::credentials::{CredentialStore, FileCredentialStore};
use crate::core::notify::{Notifier, StderrNotifier};
use crate::core::session::{SendOutcome, SessionController};
use crate::core::transport::HttpTransport;

const DEFAULT_WIDTH: usize = 80;
const RETRY_HINT: &str = "This looks temporary; try sending the message again.";

/// Initialize env_logger. In interactive mode, writes to file to keep the prompt clean.
pub fn init_logger(args: &Args) {
    let log_level = args.log_level();
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));

    if args.is_interactive() {
        let log_path = core::paths::cache_dir().and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            Some(dir.join(format!("{}.log", core::app::NAME)))
        });
        if let Some(path) = log_path
            && let Ok(file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
        {
            logger.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }
    let _ = logger.try_init();
}

/// Terminal width from `COLUMNS`, falling back to 80.
fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse().ok())
        .unwrap_or(DEFAULT_WIDTH)
}

fn controller() -> Result<(SessionController, Arc<dyn CredentialStore>), Box<dyn std::error::Error>>
{
    let credentials: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::default_location()?);
    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier);
    Ok((
        SessionController::new(credentials.clone(), notifier),
        credentials,
    ))
}

/// Run single prompt mode: send one message, print the rendered reply to stdout.
pub async fn run_single_prompt(
    prompt_arg: &str,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let prompt = if prompt_arg == "-" {
        io::read_to_string(io::stdin())?
    } else {
        prompt_arg.to_string()
    };
    if prompt.trim().is_empty() {
        return Err("empty prompt".into());
    }

    let (mut session, credentials) = controller()?;
    let transport = HttpTransport::new(config, credentials)?;
    session.set_draft(prompt);
    match session.send(&transport).await {
        SendOutcome::Delivered => {
            if let Some(reply) = session.messages().last() {
                println!("{}", render_reply(&reply.text, config, terminal_width()));
            }
            Ok(())
        }
        // The notifier already printed the error message.
        SendOutcome::Failed(kind) => {
            if session.login_required() {
                eprintln!("{}", login_hint());
            } else if kind.is_retryable() {
                eprintln!("{}", RETRY_HINT);
            }
            std::process::exit(1);
        }
        SendOutcome::Ignored | SendOutcome::Stale => Err("message not sent".into()),
    }
}

fn print_recent(session: &SessionController) {
    let recent = session.recent_sessions();
    if recent.is_empty() {
        println!("No recent conversations.");
        return;
    }
    for (i, s) in recent.iter().enumerate() {
        println!("{:>3}. {} ({} messages)", i + 1, s.title, s.history.len());
    }
}

fn print_conversation(session: &SessionController, config: &Config, width: usize) {
    for message in session.messages() {
        println!("{}\n", format_message(message, config, width));
    }
}

/// Interactive chat on stdin/stdout until `/quit` or end of input.
pub async fn run_interactive(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (mut session, credentials) = controller()?;
    let transport = HttpTransport::new(config, credentials)?;
    let width = terminal_width();

    println!(
        "{} {}. Type a health question, or /new, /recent, /load N, /history, /quit.",
        core::app::NAME,
        core::app::VERSION
    );
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let input = line.trim();
        match input.split_once(' ').unwrap_or((input, "")) {
            ("/quit" | "/exit", _) => break,
            ("/new", _) => {
                if session.new_chat() {
                    println!("Conversation archived. Started a new one.");
                } else {
                    println!("Started a new conversation.");
                }
            }
            ("/recent", _) => print_recent(&session),
            ("/load", n) => {
                let loaded = match n.trim().parse::<usize>() {
                    Ok(n) if n >= 1 => session.load_session(n - 1),
                    _ => false,
                };
                if loaded {
                    print_conversation(&session, config, width);
                } else {
                    println!("Usage: /load N (see /recent)");
                }
            }
            ("/history", _) => {
                if session.load_remote_history(&transport).await {
                    print_recent(&session);
                }
            }
            _ if input.is_empty() => {}
            _ => {
                session.set_draft(input);
                match session.send(&transport).await {
                    SendOutcome::Delivered => {
                        if let Some(reply) = session.messages().last() {
                            println!("{}\n", render_reply(&reply.text, config, width));
                        }
                    }
                    SendOutcome::Failed(kind) if kind.is_retryable() => eprintln!("{}", RETRY_HINT),
                    SendOutcome::Failed(kind) => log::debug!("send failed: {}", kind),
                    SendOutcome::Ignored | SendOutcome::Stale => {}
                }
            }
        }
        if session.login_required() {
            eprintln!("{}", login_hint());
            session.acknowledge_login();
        }
    }
    session.new_chat();
    Ok(())
}
