//! Wallgo command line.
//!
//! ## Usage
//!
//! - `wallgo` / `wallgo demo` - Engine-vs-engine match on the opening layout
//! - `wallgo console` - Interactive command loop on stdin/stdout
//! - `wallgo serve` - HTTP best-move service
//! - `wallgo selfplay` - Generate training examples
//! - `wallgo read <file>` - Print the examples in a record file

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wallgo::board::Color;
use wallgo::config::SelfPlayConfig;
use wallgo::console::{Console, EngineKind, build_engine, wall_layout};
use wallgo::constants::{DEFAULT_SIMULATIONS, SERVICE_SIMULATIONS};
use wallgo::mcts::{MoveSearch, SearchConfig, SearchEngine};
use wallgo::position::Position;
use wallgo::service::{self, ServiceConfig};
use wallgo::{record, selfplay};

/// Wallgo: MCTS for Go on small boards with walls
#[derive(Parser)]
#[command(name = "wallgo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the rollout engine against itself on the opening layout
    Demo {
        #[arg(long, default_value_t = DEFAULT_SIMULATIONS)]
        simulations: u32,
    },
    /// Start the interactive command loop
    Console {
        /// Engine playing Black
        #[arg(long, value_enum, default_value_t = EngineKind::Rollout)]
        black: EngineKind,
        /// Engine playing White
        #[arg(long, value_enum, default_value_t = EngineKind::Rollout)]
        white: EngineKind,
        #[arg(long, default_value_t = DEFAULT_SIMULATIONS)]
        simulations: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Serve best moves over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
        #[arg(long, default_value_t = SERVICE_SIMULATIONS)]
        simulations: u32,
    },
    /// Generate training examples by self-play
    Selfplay {
        /// TOML configuration file
        #[arg(long, default_value = "selfplay.toml")]
        config: PathBuf,
    },
    /// Print the examples stored in a record file
    Read { file: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wallgo=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Console {
            black,
            white,
            simulations,
            seed,
        }) => {
            let mut config = SearchConfig::default().with_simulations(simulations);
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            let black = build_engine(black, &config)?;
            if let Some(seed) = seed {
                config = config.with_seed(seed.wrapping_add(1));
            }
            let white = build_engine(white, &config)?;
            let mut console = Console::new(black, white);
            console.run(io::stdin().lock(), &mut io::stdout())?;
        }
        Some(Commands::Serve { addr, simulations }) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(service::serve(addr, ServiceConfig { simulations }))?;
        }
        Some(Commands::Selfplay { config }) => {
            let config = SelfPlayConfig::load_from_path(&config);
            let results = selfplay::run(&config)?;
            let white_wins = results.iter().filter(|&&r| r > 0.0).count();
            info!(games = results.len(), white_wins, "self-play finished");
        }
        Some(Commands::Read { file }) => {
            let reader = File::open(&file).with_context(|| format!("opening {}", file.display()))?;
            let examples = record::load(BufReader::new(reader))?;
            let mut stdout = io::stdout().lock();
            for example in &examples {
                example.display(&mut stdout)?;
                writeln!(stdout)?;
            }
        }
        Some(Commands::Demo { simulations }) => run_demo(simulations),
        None => run_demo(DEFAULT_SIMULATIONS),
    }
    Ok(())
}

fn run_demo(simulations: u32) {
    println!("Wallgo: MCTS on a walled board\n");

    let config = SearchConfig::default().with_simulations(simulations);
    let mut engine = SearchEngine::rollout(&config);
    let mut position = Box::new(Position::new_match(Color::Black, wall_layout(), Vec::new()));
    println!("{position}");

    let mut turn = 1;
    while !position.is_over() {
        let slot = engine.best_move(&mut position);
        let mv = position.move_at(slot);
        // The chosen subtree and its statistics carry over to the next turn
        position = position.take_child(slot);
        let value = engine
            .move_value(&position)
            .map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
        println!("Turn {turn}: {} plays {mv} (value {value})", position.color().opponent());
        println!("{position}");
        turn += 1;
    }

    if let Some(score) = position.end_state() {
        let outcome = if score > 0.0 {
            "White wins"
        } else if score < 0.0 {
            "Black wins"
        } else {
            "draw"
        };
        println!("Final score: {score} ({outcome})");
    }
}
