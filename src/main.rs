use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tech_digest::{build_client, Config, Pipeline};

/// Default config path (~/.config/tech-digest/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("tech-digest")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(
    name = "tech-digest",
    about = "Post a Gemini-summarized digest of trending tech articles to Slack"
)]
struct Args {
    /// Config file (defaults to ~/.config/tech-digest/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Build the message and print it instead of posting
    #[arg(long)]
    dry_run: bool,

    /// Debug logging plus payload size diagnostics
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .and_then(Config::with_env)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    if args.verbose {
        config.diagnostics = true;
    }

    let client = build_client(&config).context("Failed to build HTTP client")?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    println!("Starting tech digest for {today}");
    let pipeline = Pipeline::new(config, client).dry_run(args.dry_run);
    match pipeline.run(&today).await {
        Ok(report) => {
            if report.failed_summaries > 0 {
                println!(
                    "{} of {} summaries could not be generated",
                    report.failed_summaries,
                    report.articles.len()
                );
            }
            if report.published {
                println!("Posted {} articles to Slack", report.articles.len());
            } else {
                let json = serde_json::to_string_pretty(&report.payload)
                    .context("Failed to serialize message payload")?;
                println!("{json}");
                println!("Dry run: nothing was posted");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error ({} stage): {e}", e.stage());
            std::process::exit(1);
        }
    }
}
