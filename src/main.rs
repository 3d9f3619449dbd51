use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use sla_watch::config::SlaConfig;
use sla_watch::database;
use sla_watch::database::PgOrderStore;
use sla_watch::notify::TelegramNotifier;
use sla_watch::sweep::SlaSweeper;

#[derive(Parser)]
#[command(name = "sla-watch", about = "Order SLA escalation engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic sweep daemon
    Run,
    /// Execute a single sweep and exit
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, TELEGRAM_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = SlaConfig::from_env()?;
    info!(
        timezone = %config.timezone,
        warning_minutes = config.warning_limit.num_minutes(),
        overdue_minutes = config.overdue_limit.num_minutes(),
        "Starting sla-watch"
    );

    let pool = database::manager::connect().await?;
    database::manager::health_check(&pool).await?;

    let store = PgOrderStore::new(pool);
    let notifier = TelegramNotifier::new(&config.bot_token, config.send_timeout)?;
    let interval = config.sweep_interval;
    let sweeper = SlaSweeper::new(store, notifier, config);

    match cli.command {
        Command::Sweep => {
            let report = sweeper.run(Utc::now()).await?;
            info!(?report, "Sweep complete");
        }
        Command::Run => {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // A store outage fails this tick only; the daemon keeps running.
                if let Err(e) = sweeper.run(Utc::now()).await {
                    error!(error = %e, "Sweep failed");
                }
            }
        }
    }

    Ok(())
}
