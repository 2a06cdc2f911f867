//! Binary entrypoint for the Guildhall CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `levels` - print the experience tier table
//! - `policies` - list the adventures configured in `config.toml`
//! - `simulate [--rounds <n>] [--owner <0x..>]` - run a player through back-to-back
//!   adventures on a simulated clock and print the notification log
//!
//! See the library crate docs for module-level details: `guildhall::`.
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};

use guildhall::config::Config;
use guildhall::guild::{level_floor, ManualClock, RewardAccumulator, LEVEL_THRESHOLDS, MAX_LEVEL};
use guildhall::hall::Guildhall;
use guildhall::identity::{Address, InMemoryAssetAuthority, Player};

#[derive(Parser)]
#[command(name = "guildhall")]
#[command(about = "Adventure registry: one timed adventure per player, experience on completion")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Print the experience tier table
    Levels,
    /// List configured adventures
    Policies,
    /// Run a synthetic player through consecutive adventures on a simulated clock
    Simulate {
        /// Number of adventures to start
        #[arg(short, long, default_value_t = 5)]
        rounds: u32,
        /// Owning address of the simulated player
        #[arg(long, default_value = "0x000000000000000000000000000000000000c0de")]
        owner: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            println!("Wrote default configuration to {}", cli.config);
        }
        Commands::Levels => {
            println!("{:>5}  {:>12}  {:>12}", "level", "from", "through");
            for level in 1..=MAX_LEVEL {
                let from = level_floor(level).unwrap_or(0);
                let through = LEVEL_THRESHOLDS
                    .get(usize::from(level) - 1)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:>5}  {:>12}  {:>12}", level, from, through);
            }
        }
        Commands::Policies => {
            let config = require_config(pre_config, &cli.config)?;
            for policy in &config.policies {
                let gate = match policy.min_level_above {
                    Some(level) => format!("level > {}", level),
                    None => "open".to_string(),
                };
                println!(
                    "{:<20} {}  {:>4} min  {}..={}  {}",
                    policy.name,
                    policy.address,
                    policy.duration_minutes,
                    policy.min_reward,
                    policy.max_reward,
                    gate
                );
            }
        }
        Commands::Simulate { rounds, owner } => {
            let config = require_config(pre_config, &cli.config)?;
            let owner: Address = owner.parse()?;
            simulate(&config, owner, rounds)?;
        }
    }

    Ok(())
}

fn require_config(config: Option<Config>, path: &str) -> Result<Config> {
    let config = match config {
        Some(config) => config,
        None => {
            warn!("No usable config at {}; using built-in defaults", path);
            Config::default()
        }
    };
    config.validate()?;
    Ok(config)
}

/// Each round picks the most demanding adventure the player qualifies for,
/// waits it out, and starts the next one (which settles the previous reward).
fn simulate(config: &Config, owner: Address, rounds: u32) -> Result<()> {
    let clock = ManualClock::new(Utc::now());
    let hall = Guildhall::from_config(
        config,
        Arc::new(InMemoryAssetAuthority::new()),
        Arc::new(clock.clone()),
    )
    .context("assembling guildhall")?;
    let registry = &hall.registry;
    let player = Player::synthetic(owner);
    let key = player.compact_key();

    for round in 1..=rounds {
        let mut chosen = None;
        for (_, address) in hall.catalog().iter().rev() {
            if let Some(policy) = registry.policy(*address)? {
                if policy.check_entry(&player).allowed {
                    chosen = Some(policy);
                    break;
                }
            }
        }
        let policy = chosen.ok_or_else(|| anyhow!("no adventure admits {}", owner))?;
        let pending = registry.start_task(owner, &player, policy.address())?;
        info!(
            "round {}: {} until {}",
            round,
            policy.display_name(),
            pending.unlock_time
        );
        clock.set(pending.unlock_time);
    }
    if registry.has_pending(&player)? {
        registry.collect_pending_reward(owner, &player)?;
    }

    let events = registry.events_since(0)?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    println!(
        "{} {}: {} XP, level {}",
        config.experience.name,
        key,
        hall.experience.balance_of(&key),
        hall.experience.level_of(&key)
    );
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(file) => {
            let file = std::sync::Mutex::new(file);
            // Echo to the console only when someone is watching it
            let is_tty = atty::is(atty::Stream::Stderr);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
