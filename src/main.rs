// Svcherd - Remote Windows Service Restart Control
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use svcherd::config::{Config, Group};
use svcherd::error::SvcherdError;
use svcherd::remote::{
    AuditEvent, AuditLog, CommandExecutor, PlaybookTransport, Policy, RestartOrchestrator,
    RestartRun, RunProgress, StatusAggregator, StatusSnapshot, WorkerPool,
};
use svcherd::session::{Operator, Session};
use svcherd::version::build_info;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "svcherd")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Operator identity for authorization and audit (defaults to $USER)
    #[arg(short, long)]
    operator: Option<String>,

    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,

    /// Show detailed build information
    #[arg(long)]
    build_info: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured groups
    Groups,
    /// Query and display service status for a group
    Status {
        /// Group id
        group: String,
    },
    /// Restart every service in a group
    Restart {
        /// Group id
        group: String,
        /// One service at a time with a cooldown, instead of all at once
        #[arg(long)]
        sequential: bool,
        /// Skip the interactive confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle version flag
    if cli.version {
        println!("{}", build_info().format_display());
        return Ok(());
    }

    // Handle build info flag
    if cli.build_info {
        println!("{}", build_info().format_display());
        println!("\n{}", build_info().format_build_info());
        return Ok(());
    }

    // Initialize logging to file
    let log_file = std::fs::File::create("/tmp/svcherd.log")?;
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false) // Disable ANSI colors in log file
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("Svcherd starting, logging to /tmp/svcherd.log");

    let command = match cli.command {
        Some(command) => command,
        None => {
            eprintln!("No command given. Try 'svcherd --help'.");
            std::process::exit(2);
        }
    };

    let config = Config::load(cli.config.map(PathBuf::from))?;

    let identity = cli
        .operator
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "unknown".to_string());
    let authorized = config.settings.is_authorized(&identity);
    let session = Session::new(Operator::new(identity, authorized));

    if let Command::Groups = command {
        for group in &config.groups {
            println!(
                "{:<16} {} ({} targets, {} services)",
                group.id,
                group.name,
                group.targets.len(),
                group.service_total()
            );
        }
        return Ok(());
    }

    // Assemble the orchestration core
    let settings = &config.settings;
    let transport = Arc::new(PlaybookTransport::new(settings));
    let executor = CommandExecutor::new(
        transport,
        Duration::from_secs(settings.status_timeout_secs),
        Duration::from_secs(settings.restart_timeout_secs),
    );
    let pool = WorkerPool::new(settings.max_workers);
    let audit = Arc::new(AuditLog::open(&settings.audit_log)?);
    let aggregator = StatusAggregator::new(executor.clone(), pool.clone());
    let orchestrator = RestartOrchestrator::new(
        executor,
        pool,
        audit.clone(),
        Duration::from_secs(settings.cooldown_secs),
    );

    match command {
        Command::Groups => unreachable!("handled above"),
        Command::Status { group } => {
            let group = lookup_group(&config, &group)?;
            let operator = session.operator();
            audit.record(&AuditEvent::auth(
                &operator.identity,
                &group.name,
                operator.authorized,
            ));

            let snapshot = aggregator.refresh(group, operator).await?;
            print_status_table(group, &snapshot);
            session.store_snapshot(&group.id, snapshot);
        }
        Command::Restart {
            group,
            sequential,
            yes,
        } => {
            let group = lookup_group(&config, &group)?;
            let policy = if sequential {
                Policy::Sequential
            } else {
                Policy::Parallel
            };

            session.request_restart(&group.id, policy);
            if !yes && !confirm(group)? {
                session.consume_restart(&group.id);
                println!("Cancelled.");
                return Ok(());
            }

            let Some(policy) = session.consume_restart(&group.id) else {
                println!("No pending restart for '{}'.", group.id);
                return Ok(());
            };

            let (progress_tx, progress_rx) = mpsc::channel::<RunProgress>(32);
            let printer = tokio::spawn(print_progress(progress_rx));

            let run = orchestrator
                .run(group, policy, session.operator(), Some(progress_tx))
                .await?;
            printer.await.ok();
            print_run_summary(&run);

            // Re-query so the operator sees the post-restart state
            let snapshot = aggregator.refresh(group, session.operator()).await?;
            print_status_table(group, &snapshot);
            session.store_snapshot(&group.id, snapshot);

            if !run.fully_successful() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn lookup_group<'a>(config: &'a Config, id: &str) -> Result<&'a Group> {
    config
        .group(id)
        .ok_or_else(|| SvcherdError::Config(format!("Unknown group '{}'", id)).into())
}

/// Interactive confirmation showing the full restart scope
fn confirm(group: &Group) -> Result<bool> {
    println!(
        "{}: about to restart {} services on {} targets.",
        group.restart_label,
        group.service_total(),
        group.targets.len()
    );
    for target in &group.targets {
        for service in &target.services {
            println!("  {} -> {}", target.display_name, service.display_name);
        }
    }
    println!("This may affect connected users.");
    print!("Type 'yes' to confirm: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}

async fn print_progress(mut rx: mpsc::Receiver<RunProgress>) {
    while let Some(event) = rx.recv().await {
        match event {
            RunProgress::UnitStarted {
                target_display,
                service_display,
            } => match service_display {
                Some(service) => println!("> {} -> {}", target_display, service),
                None => println!("> {}", target_display),
            },
            RunProgress::UnitFinished {
                target_display,
                service_display,
                succeeded,
            } => {
                let mark = if succeeded { "ok" } else { "FAILED" };
                match service_display {
                    Some(service) => println!("  {} -> {}: {}", target_display, service, mark),
                    None => println!("  {}: {}", target_display, mark),
                }
            }
            RunProgress::CoolingDown {
                seconds,
                completed,
                total,
            } => {
                println!(
                    "  waiting {}s before the next restart ({}/{} done)",
                    seconds, completed, total
                );
            }
        }
    }
}

fn print_run_summary(run: &RestartRun) {
    for outcome in run.outcomes.iter().filter(|o| !o.succeeded) {
        let scope = match &outcome.service {
            Some(service) => format!("{}/{}", outcome.hostname, service),
            None => outcome.hostname.clone(),
        };
        println!(
            "Failed: {} ({})",
            scope,
            outcome.detail.as_deref().unwrap_or("no detail")
        );
    }
    if run.fully_successful() {
        println!("Restart completed: {}", run.summary());
    } else {
        println!("Restart finished with errors: {}", run.summary());
    }
}

fn print_status_table(group: &Group, snapshot: &StatusSnapshot) {
    println!("{:<24} {:<28} State", "Server", "Service");
    for target in &group.targets {
        for service in &target.services {
            let state = snapshot.state(&target.hostname, &service.name);
            println!(
                "{:<24} {:<28} {} {}",
                target.display_name,
                service.display_name,
                state.glyph(),
                state.status_text()
            );
        }
    }
    println!("Captured at {}", snapshot.captured_at.format("%H:%M:%S"));
}
