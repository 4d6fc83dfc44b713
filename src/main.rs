//! # healthchat - healthcare chatbot client
//!
//! Entry point: parses arguments, initializes logging, and dispatches to a run mode
//! or a CLI-only command.
//!
//! ## Modes
//! - Interactive chat (default)
//! - Single message with `-p` / `--prompt`
//! - Text tools: `normalize`, `render`, `title`
//! - Account and backend: `login`, `logout`, `whoami`, `history`

mod cli;
mod core;
mod run;

use clap::{CommandFactory, Parser};
use dotenv::dotenv;

use crate::cli::{Args, Commands};

#[tokio::main]
async fn main() {
    dotenv().ok();
    let args = Args::parse();
    run::init_logger(&args);

    if let Err(e) = dispatch(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn dispatch(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Some(Commands::Normalize) => core::cli::run_normalize(),
        Some(Commands::Render { width }) => core::cli::run_render(width),
        Some(Commands::Title) => core::cli::run_title(),
        Some(Commands::History) => core::cli::run_history(80).await,
        Some(Commands::Whoami) => core::cli::run_whoami().await,
        Some(Commands::Login { access, refresh }) => {
            core::cli::run_login(&access, refresh.as_deref())
        }
        Some(Commands::Logout) => core::cli::run_logout(),
        Some(Commands::Completions { shell }) => {
            cli::generate(
                shell,
                &mut Args::command(),
                core::app::NAME,
                &mut std::io::stdout(),
            );
            Ok(())
        }
        None => {
            let config = core::config::load()?;
            match args.prompt.as_deref() {
                Some(prompt) => run::run_single_prompt(prompt, &config).await,
                None => run::run_interactive(&config).await,
            }
        }
    }
}
