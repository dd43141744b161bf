#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use clap::{Parser, Subcommand};
#[cfg(feature = "std")]
use seabattle::{init_logging, server, simulate, ServiceConfig};
#[cfg(feature = "std")]
use std::time::Duration;

#[cfg(feature = "std")]
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "std")]
#[derive(Subcommand)]
enum Commands {
    /// Run the game server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:7878")]
        bind: String,
        /// Seconds of inactivity before a room or match is evicted.
        #[arg(long, default_value_t = seabattle::DEFAULT_IDLE_TIMEOUT_SECS)]
        idle_timeout: u64,
        /// Seconds between eviction sweeps.
        #[arg(long, default_value_t = 60)]
        cleanup_interval: u64,
    },
    /// Play agent-versus-agent games and print the results as JSON lines.
    Sim {
        #[arg(long, help = "Seed of the first game (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1)]
        games: u64,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            idle_timeout,
            cleanup_interval,
        } => {
            if cleanup_interval == 0 {
                return Err(anyhow::anyhow!("--cleanup-interval must be at least 1"));
            }
            let config = ServiceConfig {
                idle_timeout: Duration::from_secs(idle_timeout),
                cleanup_interval: Duration::from_secs(cleanup_interval),
                ..ServiceConfig::default()
            };
            server::run(&bind, config).await?;
        }
        Commands::Sim { seed, games } => {
            let first = seed.unwrap_or_else(rand::random::<u64>);
            for i in 0..games {
                let report = simulate(first.wrapping_add(i)).map_err(anyhow::Error::new)?;
                println!("{}", serde_json::to_string(&report)?);
            }
        }
    }
    Ok(())
}
