//! semcache CLI - inspect and maintain a persisted semantic cache

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use semcache::{CacheConfig, EvictionLedger, EvictionPolicyKind, PersistentStore, StoreSnapshot};

#[derive(Parser)]
#[command(name = "semcache")]
#[command(author, version, about = "Inspect and maintain a semantic cache store", long_about = None)]
struct Cli {
    /// TOML file with the cache configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file; overrides `store_path` from the configuration
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List cached entries, oldest first
    Entries {
        /// Show at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show store statistics
    Stats,

    /// Load and validate the store
    Check,

    /// Drop the oldest entries until at most N remain
    Trim {
        /// Number of entries to keep
        #[arg(long)]
        max_responses: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CacheConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => CacheConfig::default(),
    };
    let store = PersistentStore::new(store_path(&config, cli.store.as_deref())?);
    debug!("Using store {}", store.path().display());

    match cli.command {
        Commands::Entries { limit } => {
            let snapshot = load_existing(&store).await?;
            for line in render_entries(&snapshot, limit) {
                println!("{line}");
            }
        }
        Commands::Stats => {
            let snapshot = load_existing(&store).await?;
            for line in render_stats(&snapshot) {
                println!("{line}");
            }
        }
        Commands::Check => match store.load().await? {
            Some(snapshot) => {
                if cli.config.is_some() && snapshot.dimension != config.dimension {
                    bail!(
                        "store dimension {} does not match configured dimension {}",
                        snapshot.dimension,
                        config.dimension
                    );
                }
                println!(
                    "ok: {} entries, dimension {}",
                    snapshot.entries.len(),
                    snapshot.dimension
                );
            }
            None => println!("no store at {}", store.path().display()),
        },
        Commands::Trim { max_responses } => {
            if max_responses == 0 {
                bail!("--max-responses must be positive");
            }
            let mut snapshot = load_existing(&store).await?;
            let evicted = trim(&mut snapshot, max_responses);
            if evicted.is_empty() {
                println!("nothing to trim: {} entries", snapshot.entries.len());
            } else {
                store.save_snapshot(&snapshot).await?;
                info!("Trimmed {} entries from {}", evicted.len(), store.path().display());
                println!(
                    "evicted {} entries, {} remain",
                    evicted.len(),
                    snapshot.entries.len()
                );
            }
        }
    }

    Ok(())
}

fn store_path(config: &CacheConfig, flag: Option<&Path>) -> anyhow::Result<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| config.store_path.clone())
        .or_else(CacheConfig::default_store_path)
        .context("no data directory on this platform; pass --store or set store_path")
}

async fn load_existing(store: &PersistentStore) -> anyhow::Result<StoreSnapshot> {
    store
        .load()
        .await?
        .with_context(|| format!("no store at {}", store.path().display()))
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn render_entries(snapshot: &StoreSnapshot, limit: Option<usize>) -> Vec<String> {
    snapshot
        .entries
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|entry| {
            format!(
                "{:>6}  {}  {:?} -> {:?}",
                entry.sequence_id,
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                preview(&entry.query_text, 60),
                preview(&entry.answer, 60)
            )
        })
        .collect()
}

fn render_stats(snapshot: &StoreSnapshot) -> Vec<String> {
    let mut lines = vec![
        format!("entries:          {}", snapshot.entries.len()),
        format!("dimension:        {}", snapshot.dimension),
        format!("next sequence id: {}", snapshot.next_sequence_id),
    ];
    if let (Some(first), Some(last)) = (snapshot.entries.first(), snapshot.entries.last()) {
        lines.push(format!(
            "sequence range:   {}..={}",
            first.sequence_id, last.sequence_id
        ));
        lines.push(format!("oldest entry:     {}", first.created_at.to_rfc3339()));
        lines.push(format!("newest entry:     {}", last.created_at.to_rfc3339()));
    }
    lines
}

/// Apply FIFO eviction to a loaded snapshot, returning the evicted ids.
fn trim(snapshot: &mut StoreSnapshot, max_responses: usize) -> Vec<u64> {
    let mut ledger = EvictionLedger::from_kind(EvictionPolicyKind::Fifo, Some(max_responses));
    for entry in &snapshot.entries {
        ledger.record(entry.sequence_id);
    }

    let evicted = ledger.evict();
    snapshot
        .entries
        .retain(|entry| !evicted.contains(&entry.sequence_id));
    evicted
}
