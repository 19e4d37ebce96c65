use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dealboard::board::{Deal, DealField, DealId, StageFilter};
use dealboard::config::{session_cache_path, BoardConfig};
use dealboard::session::{CachedSession, SessionCache, SessionState};
use dealboard::error::describe_error_code;
use dealboard::supabase::SupabaseClient;
use dealboard::{Board, BoardError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Track deals through a fixed pipeline of stages
#[derive(Parser)]
#[command(name = "dealboard")]
#[command(about = "Stage-ordered deal tracker backed by Supabase", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and cache the session for later commands
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "DEALBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show deals in stage order
    List {
        /// Only show deals in this stage ("All" shows everything)
        #[arg(long, default_value = "All")]
        stage: StageFilter,
    },
    /// Create a new deal
    Add {
        #[arg(long)]
        company: String,
        /// Defaults to the first pipeline stage
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        sourcer: Option<String>,
        #[arg(long)]
        partner: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change one field of a deal (company, stage, sourcer, partner, notes)
    Set {
        id: String,
        field: String,
        /// New value; an empty string clears sourcer, partner and notes
        value: String,
    },
    /// Delete a deal
    Delete { id: String },
    /// List the pipeline stages in order
    Stages,
    /// List the configured sourcers and partners
    Roster,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match BoardConfig::load(cli.config.as_deref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };

    let log_level = match cli.verbose {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("dealboard started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli.command, config).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {e:#}");
        if let Some(board_err) = e.downcast_ref::<BoardError>() {
            eprintln!("  ({})", describe_error_code(board_err.code()));
        }
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: BoardConfig) -> Result<()> {
    match command {
        Commands::Stages => {
            let registry = config.stage_registry()?;
            for (idx, stage) in registry.definitions().iter().enumerate() {
                println!("{:>2}. {:<16} {:?}", idx + 1, stage.name, stage.category);
            }
            Ok(())
        }
        Commands::Roster => {
            println!("Sourcers: {}", config.roster.sourcers.join(", "));
            println!("Partners: {}", config.roster.partners.join(", "));
            Ok(())
        }
        Commands::Login { email, password } => run_login(&config, &email, &password).await,
        command => {
            let mut board = open_board(&config).await?;
            run_board_command(&mut board, command).await
        }
    }
}

async fn run_login(config: &BoardConfig, email: &str, password: &str) -> Result<()> {
    let client = Arc::new(SupabaseClient::new(&config.supabase)?);
    let mut board = Board::new(config.stage_registry()?, client.clone(), client.clone());

    let identity = board.sign_in(email, password).await?;

    let tokens = client
        .tokens()
        .await
        .context("Sign-in succeeded but no access token was issued")?;
    let cache = SessionCache::new(session_cache_path()?);
    cache
        .save(&CachedSession::new(
            tokens.access_token,
            tokens.refresh_token,
            identity.clone(),
        ))
        .await?;
    debug!("Cached session at {}", cache.path().display());

    println!(
        "Signed in as {} ({} deals)",
        identity.display_name(),
        board.deals()?.len()
    );
    Ok(())
}

/// Restore the cached session and load the board
async fn open_board(config: &BoardConfig) -> Result<Board> {
    let client = Arc::new(SupabaseClient::new(&config.supabase)?);

    let cache = SessionCache::new(session_cache_path()?);
    match cache.load().await {
        Ok(Some(cached)) => {
            let previous = cached.clone();
            match client.resume(cached).await {
                Ok(Some(session)) if session == previous => {}
                Ok(Some(session)) => {
                    cache.save(&session).await?;
                    debug!("Saved refreshed session at {}", cache.path().display());
                }
                Ok(None) => cache.clear().await?,
                // service unreachable, cache left as is
                Err(e) => warn!("Could not validate cached session: {}", e),
            }
        }
        Ok(None) => debug!("No cached session"),
        Err(e) => warn!("Ignoring unreadable session cache: {:#}", e),
    }

    let mut board = Board::new(config.stage_registry()?, client.clone(), client);
    if let SessionState::SignedOut = board.start().await? {
        return Err(BoardError::NotSignedIn).context("Run `dealboard login` first");
    }
    Ok(board)
}

async fn run_board_command(board: &mut Board, command: Commands) -> Result<()> {
    match command {
        Commands::List { stage } => {
            board.set_active_stage(stage);
            let visible = board.visible()?;
            if visible.is_empty() {
                println!("No deals in {}", board.active_stage());
            }
            for deal in visible {
                print_deal(deal);
            }
        }
        Commands::Add {
            company,
            stage,
            sourcer,
            partner,
            notes,
        } => {
            let mut draft = board.draft(company);
            if let Some(stage) = stage {
                if !board.registry().contains(&stage) {
                    warn!("'{}' is not a known stage; the deal will sort first", stage);
                }
                draft.stage = stage;
            }
            if let Some(sourcer) = sourcer {
                draft = draft.with_sourcer(sourcer);
            }
            if let Some(partner) = partner {
                draft = draft.with_partner(partner);
            }
            if let Some(notes) = notes {
                draft = draft.with_notes(notes);
            }

            for id in board.add_deal(draft).await? {
                println!("Added deal {id}");
            }
        }
        Commands::Set { id, field, value } => {
            let field: DealField = field.parse()?;
            let id = DealId::new(id);
            board.update_field(&id, field, value).await?;
            println!("Updated {field} on deal {id}");
        }
        Commands::Delete { id } => {
            let id = DealId::new(id);
            board.delete_deal(&id).await?;
            println!("Deleted deal {id}");
        }
        Commands::Login { .. } | Commands::Stages | Commands::Roster => {
            bail!("command does not operate on the board")
        }
    }
    Ok(())
}

fn print_deal(deal: &Deal) {
    let updated = deal
        .last_updated
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:>6}  {:<14}  {:<24}  {:<8}  {:<8}  {:<16}  {}",
        deal.id,
        deal.stage,
        deal.company,
        deal.sourcer.as_deref().unwrap_or("-"),
        deal.partner.as_deref().unwrap_or("-"),
        updated,
        deal.notes.as_deref().unwrap_or("")
    );
}
