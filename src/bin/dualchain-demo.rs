#![forbid(unsafe_code)]
//! Stakes a validator, then appends pairs of blocks to a fresh chain: one
//! through the configured default consensus, one through the other
//! mechanism. Prints the resulting chain.

use clap::Parser;
use colored::*;
use dualchain::blockchain::{Block, Blockchain};
use dualchain::clock::{Clock, SystemClock};
use dualchain::config::load_config;
use dualchain::consensus::Consensus;
use dualchain::crypto::KeyPair;
use dualchain::transaction::Transaction;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults are used when it is missing)
    #[arg(long, default_value = "config.toml")]
    config: String,
    /// Proof-of-work difficulty in leading zero bytes; overrides the config
    /// when given
    #[arg(long)]
    difficulty: Option<usize>,
    /// Number of block pairs (default consensus, then the other) to append
    #[arg(long, default_value_t = 1)]
    blocks: u32,
    /// Seed for reproducible mining and validator selection
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    config.override_difficulty(cli.difficulty)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut chain = Blockchain::from_config_with(&config, clock.clone(), rng)?;

    let keypair = KeyPair::generate();
    let receiver = b"receiver_address".to_vec();

    println!("{}", "DualChain demo".bright_cyan().bold());
    println!(
        "PoW difficulty: {} leading zero bytes",
        chain.pow_validator().difficulty()
    );
    println!("Default consensus: {}\n", chain.default_consensus());

    chain.stake(b"validator_1", 1000)?;

    for _ in 0..cli.blocks {
        let other = match chain.default_consensus() {
            Consensus::ProofOfWork => Consensus::ProofOfStake,
            Consensus::ProofOfStake => Consensus::ProofOfWork,
        };
        for consensus in [None, Some(other)] {
            let tx = Transaction::new_signed(&keypair, receiver.clone(), 100, clock.now());
            let block = Block::new(
                chain.len() as u64,
                clock.now(),
                vec![tx],
                chain.tip().hash(),
                0,
            )?;
            let used = match consensus {
                Some(consensus) => {
                    chain.add_block(block, consensus).await?;
                    consensus
                }
                None => {
                    chain.append(block).await?;
                    chain.default_consensus()
                }
            };
            println!(
                "{} {} via {}",
                "appended".green(),
                chain.tip(),
                used.to_string().yellow()
            );
        }
    }

    println!();
    for block in chain.chain() {
        println!("Block {}: {}...", block.index(), &block.hash_hex()[..16]);
    }

    if let Some(avg) = chain.metrics().average_block_time() {
        println!("\nAverage block time: {:.2}s", avg.as_secs_f64());
    }
    println!(
        "Stake of validator_1: {}",
        chain.get_stake(b"validator_1")
    );
    println!(
        "Chain valid: {}",
        if chain.is_valid_chain() { "yes".green() } else { "no".red() }
    );

    Ok(())
}
