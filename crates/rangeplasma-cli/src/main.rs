//! RangePlasma CLI - replay and inspection tool for the settlement core
//!
//! Commands:
//! - `replay`: apply a JSON operation log to a fresh state and print the result
//! - `decode`: decode a hex-encoded transaction
//! - `leaf-hash`: hash a hex-encoded transaction the way block leaves do
//! - `commit`: build a block commitment from hex-encoded transactions
//!
//! Logs go to stderr and respect `RUST_LOG` (default `info`); command output
//! goes to stdout as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use rangeplasma_commitment::{BlockBuilder, decode_transaction, leaf_hash};
use rangeplasma_settlement::{Operation, PlasmaState};
use rangeplasma_types::{Coord, HostHeight, PlasmaConfig, Transaction, TransferProof};

/// RangePlasma - range-based plasma settlement core
#[derive(Parser)]
#[command(name = "rangeplasma")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Replay and inspect RangePlasma settlement state", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply an operation log and print the final snapshot
    Replay {
        /// JSON array of `{ "height": n, "op": {...} }` entries
        log: PathBuf,

        /// JSON config (`block_time`, `challenge_period`); defaults otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host height the state is deployed at
        #[arg(long, default_value_t = 0)]
        genesis: u64,
    },

    /// Decode a hex-encoded transaction
    Decode {
        /// Encoded transaction, with or without `0x`
        tx: String,
    },

    /// Leaf hash of a hex-encoded transaction
    LeafHash {
        /// Encoded transaction, with or without `0x`
        tx: String,
    },

    /// Build a block commitment and print the root and per-transfer proofs
    Commit {
        /// Encoded transactions, all for the same block
        #[arg(required = true)]
        txs: Vec<String>,
    },
}

/// One line of a replay log.
#[derive(Debug, Deserialize)]
struct LogEntry {
    height: u64,
    op: Operation,
}

#[derive(Serialize)]
struct ReplayReport {
    applied: usize,
    rejected: usize,
    halted: bool,
    state: rangeplasma_settlement::StateSnapshot,
}

#[derive(Serialize)]
struct CommitReport {
    block_number: u64,
    root: String,
    total_sum: Coord,
    leaves: Vec<LeafReport>,
}

#[derive(Serialize)]
struct LeafReport {
    leaf_hash: String,
    /// One proof per transfer, in encoded order.
    transfers: Vec<TransferProof>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Commands::Replay {
            log,
            config,
            genesis,
        } => cmd_replay(&log, config.as_deref(), genesis),
        Commands::Decode { tx } => cmd_decode(&tx),
        Commands::LeafHash { tx } => cmd_leaf_hash(&tx),
        Commands::Commit { txs } => cmd_commit(&txs),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(trimmed).with_context(|| format!("invalid hex: {input}"))
}

fn load_config(path: Option<&Path>) -> Result<PlasmaConfig> {
    let Some(path) = path else {
        return Ok(PlasmaConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    PlasmaConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn cmd_replay(log: &Path, config: Option<&Path>, genesis: u64) -> Result<()> {
    let config = load_config(config)?;
    let raw = fs::read_to_string(log)
        .with_context(|| format!("failed to read log {}", log.display()))?;
    let entries: Vec<LogEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse log {}", log.display()))?;

    let mut state = PlasmaState::new(config, HostHeight(genesis))?;
    let mut applied = 0;
    let mut rejected = 0;

    for (line, entry) in entries.iter().enumerate() {
        match state.apply(HostHeight(entry.height), &entry.op) {
            Ok(receipt) => {
                applied += 1;
                tracing::debug!(line, height = entry.height, ?receipt, "applied");
            }
            Err(err) => {
                rejected += 1;
                tracing::warn!(
                    line,
                    height = entry.height,
                    op = entry.op.kind(),
                    code = err.code(),
                    error = %err,
                    "operation rejected"
                );
            }
        }
    }

    tracing::info!(
        applied,
        rejected,
        version = state.version(),
        "replay complete"
    );

    let report = ReplayReport {
        applied,
        rejected,
        halted: state.is_halted(),
        state: state.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_decode(tx: &str) -> Result<()> {
    let raw = parse_hex(tx)?;
    let decoded = decode_transaction(&raw).context("failed to decode transaction")?;
    println!("{}", serde_json::to_string_pretty(&decoded)?);
    Ok(())
}

fn cmd_leaf_hash(tx: &str) -> Result<()> {
    let raw = parse_hex(tx)?;
    println!("0x{}", hex::encode(leaf_hash(&raw)));
    Ok(())
}

fn cmd_commit(txs: &[String]) -> Result<()> {
    let transactions = txs
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            let raw = parse_hex(tx)?;
            decode_transaction(&raw).with_context(|| format!("failed to decode transaction {i}"))
        })
        .collect::<Result<Vec<Transaction>>>()?;

    let Some(first) = transactions.first() else {
        bail!("no transactions given");
    };
    let block_number = first.block_number;

    let block = BlockBuilder::build(block_number, transactions)
        .with_context(|| format!("failed to commit block {block_number}"))?;
    if !block.verify_leaves() {
        bail!("built tree does not match its leaves");
    }

    let leaves = block
        .transactions
        .iter()
        .enumerate()
        .map(|(i, raw)| LeafReport {
            leaf_hash: format!("0x{}", hex::encode(leaf_hash(raw))),
            transfers: (0..)
                .map_while(|j| block.transfer_proof(i, j))
                .collect(),
        })
        .collect();

    let report = CommitReport {
        block_number: block_number.0,
        root: format!("0x{}", hex::encode(block.root())),
        total_sum: block.total_sum(),
        leaves,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_prefix() {
        assert_eq!(parse_hex("0x0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert_eq!(parse_hex("0a0b").unwrap(), vec![0x0a, 0x0b]);
        assert!(parse_hex("0xzz").is_err());
    }

    #[test]
    fn log_entries_parse() {
        let json = r#"[
            {"height": 1, "op": {"deposit": {"depositor": "0x0101010101010101010101010101010101010101", "start": 0, "amount": 100}}}
        ]"#;
        let entries: Vec<LogEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].height, 1);
        assert_eq!(entries[0].op.kind(), "deposit");
    }

    #[test]
    fn missing_config_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), PlasmaConfig::default());
    }
}
