use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use redirect_hits::config::{Config, DatabaseBackend};
use redirect_hits::models::NewRedirect;
use redirect_hits::stats::DEFAULT_TOP_REDIRECTS;
use redirect_hits::storage::{PostgresStorage, SqliteStorage, Storage};
use redirect_hits::{
    ActiveRedirectSelector, CachedClassifier, HitOutcome, HitRecorder, HitStatistics,
    SignatureClassifier, StatisticsSnapshot,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "redirect-hits")]
#[command(about = "Redirect hit statistics CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables
    Init,
    /// Register a redirect
    AddRedirect {
        /// Source URL
        #[arg(long)]
        from: String,
        /// Target URL
        #[arg(long)]
        to: String,
        /// HTTP status code used when the redirect fires
        #[arg(long, default_value_t = 301)]
        status: i32,
        /// Register the redirect as disabled
        #[arg(long)]
        disabled: bool,
        /// First active day (YYYY-MM-DD)
        #[arg(long)]
        active_from: Option<NaiveDate>,
        /// Last active day (YYYY-MM-DD)
        #[arg(long)]
        active_to: Option<NaiveDate>,
    },
    /// Record a hit for a redirect at the current time
    Hit {
        redirect_id: i64,
        #[arg(long, default_value = "")]
        user_agent: String,
    },
    /// Print the statistics report as JSON
    Report {
        /// Number of top redirects to include
        #[arg(long, default_value_t = DEFAULT_TOP_REDIRECTS)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    // Table creation is idempotent, so every command can rely on it
    storage.init().await?;

    let calendar = config.stats.calendar();

    match cli.command {
        Commands::Init => {
            println!("✓ Database initialized");
        }
        Commands::AddRedirect {
            from,
            to,
            status,
            disabled,
            active_from,
            active_to,
        } => {
            if let (Some(start), Some(end)) = (active_from, active_to) {
                if start > end {
                    bail!("--active-from {start} is after --active-to {end}");
                }
            }

            let mut redirect =
                NewRedirect::new(from, to, status).active_between(active_from, active_to);
            if disabled {
                redirect = redirect.disabled();
            }

            let created = storage.insert_redirect(&redirect).await?;
            println!(
                "✓ Registered redirect #{} {} -> {} ({})",
                created.id, created.from_url, created.to_url, created.status_code
            );
        }
        Commands::Hit {
            redirect_id,
            user_agent,
        } => {
            let classifier = CachedClassifier::new(
                SignatureClassifier::with_signatures(config.classifier.signatures.clone()),
                config.classifier.cache_capacity,
            );
            let recorder = HitRecorder::new(Arc::clone(&storage), Arc::new(classifier), calendar);

            match recorder.record_hit(redirect_id, &user_agent, Utc::now()).await? {
                HitOutcome::Recorded(event) => match event.crawler_name {
                    Some(crawler) => println!(
                        "✓ Recorded crawler hit #{} ({}) for redirect #{}",
                        event.id, crawler, redirect_id
                    ),
                    None => println!("✓ Recorded hit #{} for redirect #{}", event.id, redirect_id),
                },
                HitOutcome::UnknownRedirect => {
                    println!("⚠ Redirect #{} does not exist, nothing recorded", redirect_id);
                }
            }
        }
        Commands::Report { limit } => {
            let stats = HitStatistics::new(Arc::clone(&storage), calendar);
            let selector = ActiveRedirectSelector::new(Arc::clone(&storage), calendar);

            let snapshot =
                StatisticsSnapshot::collect(&stats, &selector, Utc::now(), limit).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
