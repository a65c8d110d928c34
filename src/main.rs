use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dash_scout::api::{ProxyClient, ScoutClient};
use dash_scout::chat::{ChatBackend, ChatController, DirectBackend};
use dash_scout::cli::{Args, Command, SessionsCommand, TurnArgs};
use dash_scout::config::{Config, FileConfig};
use dash_scout::models::ChatSession;
use dash_scout::server::{self, AppState};
use dash_scout::session::{FilesystemSessionStore, SessionStore};
use dash_scout::ui::{
    display_message, display_session, display_session_list, display_streaming_update,
    print_chat_help, print_welcome_banner,
};

type Controller = ChatController<Box<dyn ChatBackend>, FilesystemSessionStore>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            process::exit(1);
        }
    };

    match args.command {
        Command::Serve { bind } => run_serve(&config, args.endpoint.clone(), bind).await,
        Command::Ask {
            new_conversation,
            turn,
            query,
        } => run_ask(&config, &turn, new_conversation, &query.join(" ")).await,
        Command::Chat { turn } => run_chat(&config, &turn).await,
        Command::Sessions { action } => run_sessions(&config, action),
        Command::InitConfig { path, force } => init_config(path, force),
    }
}

/// Initialize tracing subscriber with environment filter; logs go to stderr
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "dash_scout=debug,dash=debug"
    } else {
        "dash_scout=info,dash=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_serve(config: &Config, endpoint: Option<String>, bind: Option<String>) -> Result<()> {
    if config.proxy.endpoint.is_none() {
        warn!("no scouting endpoint configured; chat requests will fail until DASH_SCOUT_ENDPOINT is set");
    }

    let source = Arc::new(config.config_source(endpoint));
    let state = AppState::new(source, config.response_shape);
    let bind = bind.unwrap_or_else(|| config.bind.clone());

    server::serve(state, &bind).await
}

async fn run_ask(config: &Config, turn: &TurnArgs, new_conversation: bool, query: &str) -> Result<()> {
    let store = open_store(config);
    let session = match &turn.session {
        Some(id) => find_session(&store, id)?,
        None if new_conversation => ChatSession::new(),
        None => store.most_recent().unwrap_or_default(),
    };

    let mut controller = build_controller(config, turn, store, session)?;
    run_turn(&mut controller, query, turn.stream || config.stream).await
}

async fn run_chat(config: &Config, turn: &TurnArgs) -> Result<()> {
    let store = open_store(config);
    let session = match &turn.session {
        Some(id) => find_session(&store, id)?,
        None => ChatSession::new(),
    };

    let mut controller = build_controller(config, turn, store, session)?;
    let stream = turn.stream || config.stream;
    let mut rl = DefaultEditor::new()?;

    print_welcome_banner();
    for message in &controller.session().messages {
        display_message(message);
        println!();
    }

    loop {
        match rl.readline("dash> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    "/exit" | "/quit" => break,
                    "/help" => {
                        print_chat_help();
                        continue;
                    }
                    "/sessions" => {
                        display_session_list(&controller.store().list());
                        continue;
                    }
                    "/new" => {
                        controller.start_new_session()?;
                        println!("{}", "Started a new conversation.".green());
                        continue;
                    }
                    _ => {}
                }

                if let Err(e) = run_turn(&mut controller, trimmed, stream).await {
                    eprintln!("{} {:#}", "Error:".red(), e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn run_turn(controller: &mut Controller, query: &str, stream: bool) -> Result<()> {
    if stream {
        let mut printed = 0;
        controller
            .submit_streaming(query, |so_far| {
                printed = display_streaming_update(printed, so_far);
            })
            .await?;
        println!();
    } else {
        let message = controller.submit(query).await?;
        display_message(message);
    }

    info!(session = %controller.session().id, "conversation saved");
    Ok(())
}

fn build_controller(
    config: &Config,
    turn: &TurnArgs,
    store: FilesystemSessionStore,
    session: ChatSession,
) -> Result<Controller> {
    let backend: Box<dyn ChatBackend> = if turn.direct {
        let client = ScoutClient::new(config.proxy.clone())?;
        Box::new(DirectBackend::new(client))
    } else {
        let server_url = turn
            .server_url
            .clone()
            .unwrap_or_else(|| config.server_url.clone());
        Box::new(ProxyClient::with_timeout(
            server_url,
            config.proxy.fallback_message.clone(),
            config.proxy.timeout + Duration::from_secs(5),
        )?)
    };

    Ok(ChatController::with_session(
        backend,
        store,
        session,
        config.proxy.fallback_message.clone(),
    ))
}

fn open_store(config: &Config) -> FilesystemSessionStore {
    match &config.sessions_path {
        Some(path) => FilesystemSessionStore::with_path(path),
        None => FilesystemSessionStore::new(),
    }
}

fn find_session(store: &FilesystemSessionStore, id: &str) -> Result<ChatSession> {
    store
        .get(id)
        .with_context(|| format!("No saved conversation with id {}", id))
}

fn run_sessions(config: &Config, action: SessionsCommand) -> Result<()> {
    let store = open_store(config);

    match action {
        SessionsCommand::List => display_session_list(&store.list()),
        SessionsCommand::Show { id } => display_session(&find_session(&store, &id)?),
        SessionsCommand::Delete { id } => {
            if store.delete(&id) {
                println!("{}", format!("Deleted conversation {}.", id).green());
            } else {
                println!("{}", format!("Conversation {} not found.", id).yellow());
            }
        }
        SessionsCommand::Clear => {
            store.clear();
            println!("{}", "All conversation history cleared.".green());
        }
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path.or_else(FileConfig::user_config_path) {
        Some(path) => path,
        None => bail!("Could not determine a config location; pass --path"),
    };

    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(&path, FileConfig::example_yaml())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{}", format!("Wrote {}", path.display()).green());
    Ok(())
}
