//! bestiary_init - One-time catalog initialization tool
//!
//! Creates a fresh catalog file, optionally seeded with authored creatures.

use std::path::PathBuf;

use anyhow::{bail, Result};
use bestiary::catalog::MonsterDraft;
use clap::Parser;
use figment::providers::{Format, Toml};
use figment::Figment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Bestiary catalog initialization tool
#[derive(Parser, Debug)]
#[command(
    name = "bestiary_init",
    version,
    about = "Initialize a new bestiary catalog"
)]
struct Args {
    /// Path to SQLite catalog file to create (must not exist)
    #[arg(short, long)]
    database: PathBuf,

    /// Creature draft TOML files to store (can be specified multiple times)
    #[arg(long = "creature")]
    creatures: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bestiary=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut drafts = Vec::new();
    for path in &args.creatures {
        if !path.exists() {
            bail!("Creature file not found: {}", path.display());
        }

        let draft: MonsterDraft = Figment::from(Toml::file(path))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        drafts.push(draft);
    }

    bestiary::init::init_catalog(&args.database, drafts).await?;

    Ok(())
}
