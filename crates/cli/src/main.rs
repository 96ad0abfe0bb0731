//! Pipewright CLI - ETL jobs with data quality scoring.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pipewright_core::{JobFilter, JobId, JobSpec, JobStatus};
use pipewright_jobs::{JobManager, ManagerConfig};
use pipewright_storage::JsonFileStore;
use tracing::Level;

#[derive(Parser)]
#[command(name = "pipewright")]
#[command(about = "ETL jobs with data quality scoring", long_about = None)]
struct Cli {
    /// Data directory holding persisted jobs
    #[arg(long, default_value = ".pipewright", global = true)]
    data_dir: String,

    /// Maximum number of concurrently running jobs
    #[arg(long, default_value = "3", global = true)]
    max_concurrent: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a job from a JSON spec file
    Create {
        /// Path to the job spec
        file: String,
    },
    /// Execute a job
    Run {
        /// Job ID
        id: String,
    },
    /// List jobs
    List {
        /// Filter by status (pending/running/completed/failed/paused)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show job details
    Show {
        /// Job ID
        id: String,
    },
    /// Pause a running job
    Pause {
        /// Job ID
        id: String,
    },
    /// Resume a paused job
    Resume {
        /// Job ID
        id: String,
    },
    /// Cancel a job
    Cancel {
        /// Job ID
        id: String,
    },
    /// Delete a job
    Delete {
        /// Job ID
        id: String,
    },
    /// Tail lifecycle events
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let store = JsonFileStore::new(&cli.data_dir)
        .await
        .context("opening data directory")?;
    let manager = JobManager::new(
        store,
        ManagerConfig {
            max_concurrent_jobs: cli.max_concurrent,
        },
    )
    .await
    .context("loading persisted jobs")?;

    match cli.command {
        Commands::Create { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading spec file {}", file))?;
            let value: serde_json::Value = serde_json::from_str(&raw).context("parsing spec")?;
            let spec = JobSpec::from_value(value)
                .map_err(|violations| anyhow::anyhow!(violations.join("; ")))?;
            let job = manager.create_job(spec).await?;
            println!("created job {} ({})", job.id, job.name);
        }
        Commands::Run { id } => {
            let job = manager.execute_job(parse_id(&id)?).await?;
            println!(
                "job {} {}: {} extracted, {} loaded, {} errors",
                job.id,
                job.status,
                job.metrics.total_records,
                job.metrics.processed_records,
                job.metrics.error_records
            );
            if let Some(result) = &job.result {
                println!("overall quality score: {:.3}", result.quality.overall_score);
                for recommendation in &result.quality.recommendations {
                    println!("  [{:?}] {}", recommendation.priority, recommendation.message);
                }
            }
        }
        Commands::List { status } => {
            let filter = JobFilter {
                status: status.as_deref().map(parse_status).transpose()?,
                ..JobFilter::default()
            };
            for job in manager.list_jobs(&filter).await {
                println!("{}  {:<10}  {}  {}", job.id, job.status, job.created_at, job.name);
            }
        }
        Commands::Show { id } => {
            let job = manager
                .get_job(parse_id(&id)?)
                .await
                .ok_or_else(|| anyhow::anyhow!("job not found: {}", id))?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }
        Commands::Pause { id } => {
            let job = manager.pause_job(parse_id(&id)?).await?;
            println!("job {} paused", job.id);
        }
        Commands::Resume { id } => {
            let job = manager.resume_job(parse_id(&id)?).await?;
            println!("job {} resumed", job.id);
        }
        Commands::Cancel { id } => {
            let job = manager.cancel_job(parse_id(&id)?).await?;
            println!("job {} cancelled", job.id);
        }
        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            manager.delete_job(id).await?;
            println!("job {} deleted", id);
        }
        Commands::Watch => {
            let mut events = manager.subscribe();
            println!("watching lifecycle events (ctrl-c to stop)");
            while let Ok(event) = events.recv().await {
                match &event.message {
                    Some(message) => {
                        println!("{}  {}  {:?}  {}", event.timestamp, event.job_id, event.kind, message)
                    }
                    None => println!("{}  {}  {:?}", event.timestamp, event.job_id, event.kind),
                }
            }
        }
    }

    Ok(())
}

fn parse_id(id: &str) -> Result<JobId> {
    id.parse().map_err(|_| anyhow::anyhow!("invalid job id: {}", id))
}

fn parse_status(status: &str) -> Result<JobStatus> {
    match status {
        "pending" => Ok(JobStatus::Pending),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "paused" => Ok(JobStatus::Paused),
        other => Err(anyhow::anyhow!("unknown status: {}", other)),
    }
}
