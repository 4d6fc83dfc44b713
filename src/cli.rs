//! CLI definitions: argument parsing, subcommands, and help text.

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  healthchat                          Interactive chat (/new, /recent, /load N, /history, /quit)
  healthchat -p \"flu symptoms?\"       Send one message and print the reply
  healthchat -p -                     Read the message from stdin
  healthchat normalize < reply.md     Repair model Markdown
  healthchat render --width 60 < r.md Render Markdown as plain text
  healthchat title < messages.json    Title for a JSON array of messages
  healthchat login --access TOKEN     Store an access token
  healthchat completions bash         Generate bash completions

ENVIRONMENT:
  HEALTHCHAT_API_URL       Backend base URL (default http://localhost:8000/api)
  HEALTHCHAT_SITE_URL      Site whose links count as internal
  HEALTHCHAT_TIMEOUT_SECS  Request timeout in seconds (default 30)
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Command-line client for the healthcare chatbot",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Send a single message then exit
    #[arg(
        short = 'p',
        long,
        help = "Send one message and print the reply (use '-' to read from stdin)"
    )]
    pub prompt: Option<String>,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize Markdown read from stdin and print it
    Normalize,
    /// Render Markdown read from stdin as wrapped plain text
    Render {
        /// Output width in columns
        #[arg(short, long, default_value_t = 80)]
        width: usize,
    },
    /// Print the title for a JSON array of chat messages read from stdin
    Title,
    /// Fetch the conversation history from the backend
    History,
    /// Show the signed-in user
    Whoami,
    /// Store backend tokens in the config directory
    Login {
        /// Access token sent as a bearer token
        #[arg(long)]
        access: String,
        /// Refresh token, stored alongside
        #[arg(long)]
        refresh: Option<String>,
    },
    /// Remove stored tokens
    Logout,
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }

    /// Interactive mode: no subcommand and no single prompt.
    pub fn is_interactive(&self) -> bool {
        self.command.is_none() && self.prompt.is_none()
    }
}
