//! activityfeed - GitHub profile activity feed generator
//!
//! A CLI tool, meant to run on a schedule from GitHub Actions, that
//! lists a user's recent public activity and merges it into the marked
//! region of a profile README.
//!
//! Exit codes:
//!   0 - Success (document updated, unchanged, or printed with --dry-run)
//!   1 - Any failure (credentials, fetch, malformed document, write)

mod cli;
mod config;
mod document;
mod error;
mod feed;
mod github;
mod models;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use document::DocumentOptions;
use error::FeedError;
use feed::RenderOptions;
use github::GitHubClient;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("activityfeed v{}", env!("CARGO_PKG_VERSION"));
    debug!("Dry run: {}, config: {:?}", args.dry_run, args.config);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .activityfeed.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize markers, line cap, icons, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the CLI flags when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Report a failed run. Under GitHub Actions this also emits an
/// `::error::` workflow command, which marks the step as failed.
fn report_failure(err: &anyhow::Error) {
    let kind = err
        .downcast_ref::<FeedError>()
        .map(FeedError::label)
        .unwrap_or("Error");
    error!("Run failed ({}): {:#}", kind, err);
    eprintln!("\n❌ Error: {:#}", err);

    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        println!("::error::{}", workflow_escape(&format!("{:#}", err)));
    }
}

/// Escape a message for a workflow command.
fn workflow_escape(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Run the complete fetch, render, merge, and write pipeline.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args, Path::new("."))?;
    config.merge_with_args(&args);

    let username = args.username().ok_or_else(|| {
        anyhow::anyhow!("No GitHub user given. Pass --user or set GITHUB_REPOSITORY.")
    })?;
    let token = args
        .token()
        .ok_or_else(|| FeedError::Auth("no access token provided".to_string()))?;

    let client = GitHubClient::new(&config.github, &token)?.with_progress(!args.quiet);

    // Step 1: Fetch and filter events
    let events =
        feed::fetch_relevant_events(&client, &username, config.feed.include_comments).await?;

    // Step 2: Render display lines
    let entries = feed::render_events(&events, &RenderOptions::from(&config))?;
    info!("Rendered {} activity lines", entries.len());

    // Step 3: Merge into the document
    let path = PathBuf::from(&config.document.path);
    let current = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let updated =
        document::merge_into_document(&entries, &current, &DocumentOptions::from(&config))?;

    if args.dry_run {
        print!("{}", updated);
        info!("Dry run: {} left untouched", path.display());
        return Ok(());
    }

    // Step 4: Write it back
    if updated == current {
        info!("{} is already up to date", path.display());
        return Ok(());
    }

    document::write_document(&path, &updated)?;
    info!("Updated activity in {}", path.display());
    Ok(())
}

/// Load configuration from `--config`, else `CONFIG_FILE_NAME` in `dir`,
/// else defaults. A config file that exists but fails to load is an error.
fn load_config(args: &Args, dir: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default(dir)? {
        Some(config) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
