// src/cli.rs
use crate::auth::AuthConfig;
use crate::core::{ConfigManager, Database, EventRepository, StoredEvent};
use crate::types::JobId;
use crate::web::start_web_server;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fhe-junction")]
#[command(about = "Confidential job-matching engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Overrides database_path from config.yaml
    #[arg(long, global = true)]
    pub database_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create or migrate the event store
    Init,
    /// List indexed events of the latest run
    Events {
        #[arg(long)]
        job: Option<JobId>,
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
    /// Applicant count and evaluation flag of a job, from the event store
    Stats {
        #[arg(long)]
        job: JobId,
    },
    /// Mint a development bearer token for an address
    Token { address: String },
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let mut config = ConfigManager::load()?.with_database_path(cli.database_path);

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            config.ensure_directories().await?;
            start_web_server(config).await
        }

        Command::Init => {
            let db = Database::new(&config.environment.database_path).await?;
            db.health_check().await?;
            info!(
                "✅ Event store ready: {}",
                config.environment.database_path.display()
            );
            Ok(())
        }

        Command::Events { job, limit } => {
            let db = Database::new(&config.environment.database_path).await?;
            let repo = EventRepository::new(db.pool());
            let Some(run) = repo.latest_run().await? else {
                info!("No runs recorded yet.");
                return Ok(());
            };

            let events = match job {
                Some(job_id) => repo.events_for_job(&run.id, job_id).await?,
                None => repo.list(&run.id, limit).await?,
            };

            info!(
                "Run {} (contract {}, started {})",
                run.id,
                run.contract,
                run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if events.is_empty() {
                info!("No events found.");
            } else {
                info!("{:<6} {:<24} {:<8} {:<44}", "Seq", "Kind", "Job", "Subject");
                info!("{}", "-".repeat(84));
                for event in &events {
                    print_event(event);
                }
            }
            Ok(())
        }

        Command::Stats { job } => {
            let db = Database::new(&config.environment.database_path).await?;
            let repo = EventRepository::new(db.pool());
            let Some(run) = repo.latest_run().await? else {
                info!("No runs recorded yet.");
                return Ok(());
            };

            let applicants = repo.applicant_count(&run.id, job).await?;
            let started = repo.evaluation_started(&run.id, job).await?;
            info!("Job {} (run {})", job, run.id);
            info!("   Applicants: {}", applicants);
            info!("   Evaluation started: {}", started);
            Ok(())
        }

        Command::Token { address } => {
            let address: Address = address
                .parse()
                .with_context(|| format!("Invalid address: {}", address))?;
            let token = AuthConfig::new(&config.server.jwt_secret).issue_token(address)?;
            info!("Token issued for {}", address);
            println!("{}", token);
            Ok(())
        }
    }
}

fn print_event(event: &StoredEvent) {
    match event.record() {
        Ok(_) => info!(
            "{:<6} {:<24} {:<8} {:<44}",
            event.seq,
            event.kind,
            event
                .job_id
                .map_or_else(|| "-".to_string(), |id| id.to_string()),
            event.subject
        ),
        Err(e) => error!("Event {} could not be decoded: {:#}", event.seq, e),
    }
}
