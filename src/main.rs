use clap::{Parser, Subcommand};
use clusterctl::config::{headless_from_env, ClusterConfig};
use clusterctl::platform::spawner::SystemSpawner;
use clusterctl::terminator::SystemProcessTable;
use clusterctl::{Cluster, ClusterError};
use std::path::PathBuf;
use std::sync::Arc;

/// Start and stop the local booking cluster
#[derive(Parser, Debug)]
#[command(name = "clusterctl", version, about, long_about = None)]
struct Cli {
    /// Path to the cluster config file (default: ./cluster.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start every service, in order, each in its own terminal
    #[command(name = "start-cluster", alias = "start")]
    StartCluster {
        /// Run services as detached background processes
        #[arg(long)]
        headless: bool,

        /// Wait for each service's port instead of the fixed stagger delay
        #[arg(long)]
        wait_ready: bool,
    },

    /// Force-kill every running cluster service
    #[command(name = "stop-cluster", alias = "stop")]
    StopCluster,

    /// Show which services are running
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Open the interactive client in this terminal
    Client,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    clusterctl::logging::init(cli.verbose);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32, ClusterError> {
    let root = std::env::current_dir()?;

    match cli.command {
        Commands::StartCluster {
            headless,
            wait_ready,
        } => {
            let cluster = Cluster::load(&root, cli.config.as_deref())?;
            let report = cluster
                .start(headless || headless_from_env(), wait_ready)
                .await?;
            println!(
                "Started {} service(s) via {} in {:.1}s",
                report.spawned.len(),
                report.platform,
                report.elapsed.as_secs_f64()
            );
            Ok(0)
        }
        Commands::StopCluster => {
            // Stop must always sweep, even with a broken config file
            let cluster = Cluster::load(&root, cli.config.as_deref()).unwrap_or_else(|e| {
                log::warn!("{}; using default configuration", e);
                Cluster::with_spawner(&root, ClusterConfig::default(), Arc::new(SystemSpawner))
            });
            let count = cluster.stop(SystemProcessTable::new());
            println!("Stopped {} process(es)", count);
            Ok(0)
        }
        Commands::Status { json } => {
            let cluster = Cluster::load(&root, cli.config.as_deref())?;
            let statuses = cluster.status(SystemProcessTable::new())?;
            if json {
                let out = serde_json::to_string_pretty(&statuses)
                    .map_err(|e| ClusterError::Config(format!("failed to serialize status: {}", e)))?;
                println!("{}", out);
            } else {
                for status in &statuses {
                    let state = if status.running {
                        format!(
                            "running (PID {})",
                            status
                                .pids
                                .iter()
                                .map(|p| p.to_string())
                                .collect::<Vec<_>>()
                                .join(", ")
                        )
                    } else {
                        "not running".to_string()
                    };
                    println!("{:<10} {:<18} port {:<6} {}", status.name, status.title, status.port, state);
                }
            }
            Ok(0)
        }
        Commands::Client => {
            let cluster = Cluster::load(&root, cli.config.as_deref())?;
            Ok(if cluster.run_client()? { 0 } else { 1 })
        }
    }
}
