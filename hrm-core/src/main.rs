// HRM core - local-first HR records with cloud mirroring
// Entry point and command-line surface

use anyhow::Context;
use clap::{Parser, Subcommand};
use hrm_core::app;
use hrm_core::commands::{self, Actor};
use hrm_core::config::{AppConfig, MIRROR_DRAIN_TIMEOUT_SECS};
use hrm_core::database::{Employee, SaveCaderReportRequest};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hrm-core", version, about = "Local-first HR records with cloud mirroring")]
struct Cli {
    /// Directory holding the local database
    #[arg(long, env = "HRM_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Username recorded in audit entries
    #[arg(long, default_value = "system")]
    user: String,

    /// Role recorded in audit entries
    #[arg(long)]
    role: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Employee records
    #[command(subcommand)]
    Employee(EmployeeCommand),
    /// Daily cader reports
    #[command(subcommand)]
    Report(ReportCommand),
    /// Audit trail
    #[command(subcommand)]
    Audit(AuditCommand),
    /// Headcount summary
    Dashboard,
}

#[derive(Subcommand)]
enum EmployeeCommand {
    /// Create or update from a JSON file
    Save { file: PathBuf },
    Get { epf_number: String },
    List,
    Delete { epf_number: String },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Create or overwrite from a JSON file
    Save { file: PathBuf },
    /// Report for a date (defaults to today)
    Get { date: Option<String> },
    History {
        #[arg(long)]
        limit: Option<u32>,
    },
    Delete { date: String },
}

#[derive(Subcommand)]
enum AuditCommand {
    List {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hrm_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }

    tracing::info!("Starting HRM core");

    let state = app::setup(config).await?;

    let mut actor = Actor::new(cli.user.clone());
    actor.user_role = cli.role.clone();

    let result = run(&state, &actor, cli.command).await;

    // Give in-flight mirrors a chance to land before the process exits
    let in_flight = state.dispatcher.in_flight();
    if in_flight > 0 {
        tracing::debug!("Waiting for {} mirror task(s)", in_flight);
        let drain = Duration::from_secs(MIRROR_DRAIN_TIMEOUT_SECS);
        if tokio::time::timeout(drain, state.dispatcher.settle())
            .await
            .is_err()
        {
            tracing::warn!(
                "Abandoning {} unfinished mirror task(s)",
                state.dispatcher.in_flight()
            );
        }
    }

    result
}

async fn run(state: &app::AppState, actor: &Actor, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Employee(cmd) => match cmd {
            EmployeeCommand::Save { file } => {
                let employee: Employee = read_json(&file).await?;
                print_json(&commands::save_employee(state, actor, employee).await?)
            }
            EmployeeCommand::Get { epf_number } => {
                print_json(&commands::get_employee(state, &epf_number).await?)
            }
            EmployeeCommand::List => print_json(&commands::list_employees(state).await?),
            EmployeeCommand::Delete { epf_number } => {
                commands::delete_employee(state, actor, &epf_number).await?;
                print_json(&epf_number)
            }
        },
        Command::Report(cmd) => match cmd {
            ReportCommand::Save { file } => {
                let report: SaveCaderReportRequest = read_json(&file).await?;
                print_json(&commands::save_daily_cader_report(state, actor, report).await?)
            }
            ReportCommand::Get { date } => {
                let date = date.unwrap_or_else(hrm_core::services::CaderService::today);
                print_json(&commands::get_daily_cader_report(state, &date).await?)
            }
            ReportCommand::History { limit } => {
                print_json(&commands::get_cader_report_history(state, limit).await?)
            }
            ReportCommand::Delete { date } => {
                commands::delete_daily_cader_report(state, actor, &date).await?;
                print_json(&date)
            }
        },
        Command::Audit(AuditCommand::List { limit }) => {
            print_json(&commands::list_audit_logs(state, limit).await?)
        }
        Command::Dashboard => print_json(&commands::get_dashboard_stats(state).await?),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
