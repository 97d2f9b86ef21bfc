// SPDX-License-Identifier: MIT

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use inbox_flow::inbox::config::AppConfig;
use inbox_flow::inbox::store::{RunRecord, Stores};
use inbox_flow::inbox::workflow::builder::Builder;
use inbox_flow::inbox::workflow::graph::InvokeConfig;

use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML config file (defaults to $INBOX_FLOW_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the inbox workflow on an instruction
    Run {
        /// Instruction, e.g. "Process my inbox" or "Give me a daily summary"
        #[arg(short, long, default_value = "")]
        input: String,

        /// Resumption key; re-use it to resume an interrupted run
        #[arg(short, long)]
        thread_id: Option<String>,
    },
    /// List recent runs from the run ledger
    Runs {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one run record
    ShowRun {
        run_id: Uuid,
    },
}

fn print_record(record: &RunRecord) {
    println!(
        "{}  {:<9}  {:<13}  started {}  finished {}  thread {}",
        record.run_id,
        record.status,
        record.task.as_deref().unwrap_or("-"),
        record.started_at.to_rfc3339(),
        record
            .finished_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string()),
        record.thread_id.as_deref().unwrap_or("-"),
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    match args.command {
        Commands::Run { input, thread_id } => {
            let flow = Builder::default()
                .build(&config)
                .await
                .map_err(|e| anyhow!(e))
                .context("Failed to build workflow")?;

            let invoke = match thread_id {
                Some(thread_id) => InvokeConfig::new(thread_id),
                None => InvokeConfig::session(),
            };
            log::info!("Running thread {}", invoke.thread_id);

            let state = flow.run(&input, &invoke).await?;

            println!("Thread: {}", invoke.thread_id);
            if let Some(run_id) = state.run_id {
                println!("Run: {}", run_id);
            }
            if let Some(task) = state.task {
                println!("Task: {}", task);
            }
            println!("Result:\n{}", serde_json::to_string_pretty(&state.result)?);
            println!("Log:");
            for line in &state.log {
                println!("  - {}", line);
            }
        }
        Commands::Runs { limit } => {
            let stores = Stores::from_config(&config.storage);
            let records = stores.ledger.list_recent(limit).await?;
            if records.is_empty() {
                println!("No runs recorded");
            }
            for record in &records {
                print_record(record);
            }
        }
        Commands::ShowRun { run_id } => {
            let stores = Stores::from_config(&config.storage);
            let record = stores
                .ledger
                .get(run_id)
                .await?
                .ok_or_else(|| anyhow!("Run {} not found", run_id))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}
