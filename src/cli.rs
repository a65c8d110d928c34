use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dash")]
#[command(about = "Dataset scouting chat: proxy service and terminal client", long_about = None)]
pub struct Args {
    #[arg(short = 'v', long = "verbose", global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        long = "config",
        global = true,
        env = "DASH_CONFIG",
        help = "Path to a YAML or JSON config file"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "endpoint",
        global = true,
        help = "Scouting backend URL (overrides DASH_SCOUT_ENDPOINT)"
    )]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat proxy service
    Serve {
        #[arg(long = "bind", help = "Address to listen on (e.g. 127.0.0.1:3000)")]
        bind: Option<String>,
    },

    /// Ask a single question
    Ask {
        #[arg(short = 'n', long = "new", help = "Start a new conversation")]
        new_conversation: bool,

        #[command(flatten)]
        turn: TurnArgs,

        #[arg(required = true, help = "Question to send to the scout")]
        query: Vec<String>,
    },

    /// Interactive chat
    Chat {
        #[command(flatten)]
        turn: TurnArgs,
    },

    /// Manage saved conversations
    Sessions {
        #[command(subcommand)]
        action: SessionsCommand,
    },

    /// Write an example config file
    InitConfig {
        #[arg(long = "path", help = "Destination (default: ~/.config/dash/dash.yaml)")]
        path: Option<PathBuf>,

        #[arg(long = "force", help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct TurnArgs {
    #[arg(short = 's', long = "session", help = "Continue the conversation with this id")]
    pub session: Option<String>,

    #[arg(
        long = "direct",
        help = "Call the scouting backend directly instead of a running proxy"
    )]
    pub direct: bool,

    #[arg(long = "stream", help = "Show the reply incrementally as it arrives")]
    pub stream: bool,

    #[arg(long = "server-url", help = "Chat proxy base URL (overrides DASH_SERVER_URL)")]
    pub server_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    /// List saved conversations, newest first
    List,
    /// Print one conversation
    Show { id: String },
    /// Delete one conversation
    Delete { id: String },
    /// Delete every saved conversation
    Clear,
}
