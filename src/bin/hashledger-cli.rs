#![forbid(unsafe_code)]
//! Interactive command surface for HashLedger

use clap::Parser;
use colored::*;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hashledger::config::load_config;
use hashledger::{Block, LedgerNode};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "hashledger-cli",
    version,
    about = "Append entries and seal them into proof-of-work blocks"
)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "hashledger.toml")]
    config: PathBuf,

    /// Number of mining threads (overrides the configuration file)
    #[arg(long)]
    threads: Option<usize>,
}

fn format_hash(hash: &str) -> String {
    if hash.len() > 20 {
        format!("{}...{}", &hash[..10], &hash[hash.len() - 10..])
    } else {
        hash.to_string()
    }
}

fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

fn chain_table(blocks: &[Block]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Index", "Timestamp", "Entries", "Proof", "Hash", "Previous"]);
    for block in blocks {
        table.add_row(vec![
            block.index.to_string(),
            format_timestamp(block.timestamp),
            block.entries.len().to_string(),
            block.proof.to_string(),
            format_hash(&block.hash),
            format_hash(&block.previous_hash),
        ]);
    }
    table
}

fn print_block(block: &Block) {
    println!("{} #{}", "Block".bright_cyan().bold(), block.index);
    println!("  {:<14}{}", "Hash:", block.hash);
    println!("  {:<14}{}", "Previous:", block.previous_hash);
    println!("  {:<14}{}", "Timestamp:", format_timestamp(block.timestamp));
    println!("  {:<14}{}", "Proof:", block.proof);
    println!("  {:<14}{}", "Entries:", block.entries.len());
    for entry in &block.entries {
        println!("    - {}", entry);
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_green().underline());
    println!("  {:<10}{}", "new_data", "queue an entry for the next block");
    println!("  {:<10}{}", "new_block", "mine and seal the pending entries");
    println!("  {:<10}{}", "chain", "show every sealed block");
    println!("  {:<10}{}", "last", "show the most recent block");
    println!("  {:<10}{}", "pending", "show entries waiting for a block");
    println!("  {:<10}{}", "validate", "re-verify the whole chain");
    println!("  {:<10}{}", "json", "dump the chain as JSON");
    println!("  {:<10}{}", "quit", "exit");
}

fn prompt(label: &str) -> io::Result<()> {
    print!("{}", label);
    io::stdout().flush()
}

fn mine(node: &LedgerNode) -> Result<Block, Box<dyn std::error::Error>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.yellow} {msg} [{elapsed}]")?);
    spinner.set_message("Mining...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut job = node.start_seal()?;
    let result = loop {
        if let Some(result) = job.poll() {
            break result;
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    let elapsed = job.elapsed();
    spinner.finish_and_clear();

    let block = result?;
    let elapsed = Duration::from_millis(elapsed.as_millis() as u64);
    println!(
        "{} block #{} in {}",
        "Block added!".green().bold(),
        block.index,
        humantime::format_duration(elapsed)
    );
    Ok(block)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut config = load_config(&args.config)?;
    if let Some(threads) = args.threads {
        config.miner.threads = threads;
        config.validate()?;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.filter.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let node = LedgerNode::from_config(&config)?;

    println!("{}", "Welcome to the Blockchain!".bright_cyan().bold());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        prompt("Enter command (new_data, new_block, chain, help, quit): ")?;
        let Some(line) = lines.next() else { break };
        let line = line?;

        match line.trim() {
            "new_data" => {
                prompt("Enter data: ")?;
                let Some(data) = lines.next() else { break };
                let index = node.submit_entry(data?);
                println!("{} (will be sealed into block #{})", "Data added!".green(), index);
            }
            "new_block" => {
                if let Err(e) = mine(&node) {
                    println!("{} {}", "Mining failed:".red().bold(), e);
                }
            }
            "chain" => println!("{}", chain_table(&node.chain())),
            "last" => match node.last_block() {
                Ok(block) => print_block(&block),
                Err(e) => println!("{} {}", "Error:".red().bold(), e),
            },
            "pending" => {
                let pending = node.pending();
                if pending.is_empty() {
                    println!("{}", "No pending entries.".yellow());
                }
                for (i, entry) in pending.iter().enumerate() {
                    println!("  {}. {}", i + 1, entry);
                }
            }
            "validate" => match node.validate() {
                Ok(()) => println!("{} ({} blocks)", "Chain is valid.".green().bold(), node.len()),
                Err(e) => println!("{} {}", "Chain is invalid:".red().bold(), e),
            },
            "json" => println!("{}", serde_json::to_string_pretty(&node.chain())?),
            "help" => print_help(),
            "quit" => break,
            "" => {}
            _ => println!("{}", "Unknown command".yellow()),
        }
    }

    Ok(())
}
