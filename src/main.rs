//! bestiary - creature catalog and encounter tracker

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use bestiary::catalog::{filter_listing, MonsterCatalog, MonsterDraft, MonsterRecord};
use bestiary::combat::PartyConfig;
use bestiary::db::Database;
use bestiary::encounter::EncounterSession;
use bestiary::images::ImageCache;
use bestiary::source::HttpSource;
use bestiary::{Config, CONFIG_FILE};
use clap::{Parser, Subcommand};
use figment::providers::{Format, Toml};
use figment::Figment;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Subcommand, Debug)]
enum Command {
    /// Mirror the reference source's creature listing into the catalog
    Sync,
    /// List catalog creatures
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a creature's stat block
    Show {
        name: String,
        /// Download the creature's images into the image cache
        #[arg(long)]
        images: bool,
        /// Print the parsed block as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a hand-authored creature from a TOML file
    Add { draft: PathBuf },
    /// Build an encounter and print its roster
    Encounter {
        /// Number of party members
        #[arg(short, long)]
        party: Option<usize>,
        /// Hit points of each party member
        #[arg(long)]
        hp: Option<i32>,
        /// Roll initiative for everyone and print the turn order
        #[arg(long)]
        roll: bool,
        /// Print the roster as JSON
        #[arg(long)]
        json: bool,
        /// Creatures as NAME or NAME:QUANTITY
        #[arg(required = true)]
        creatures: Vec<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "bestiary", version, about = "Creature catalog and encounter tracker")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// SQLite catalog file, overrides the configuration
    #[arg(short, long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
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

    let mut config = Config::load(&args.config)?;
    if args.database.is_some() {
        config.db_path = args.database;
    }

    let db = Database::new(config.db_path.as_deref()).await?;
    let catalog = MonsterCatalog::new(db.pool().clone());

    match args.command {
        Command::Sync => {
            let source = HttpSource::new(config.source.clone())?;
            let report = catalog.sync_from(&source).await?;
            println!(
                "{} rows: {} new, {} already known, {} duplicates, {} invalid",
                report.received, report.inserted, report.existing, report.duplicates, report.invalid
            );
        }
        Command::List { search } => {
            let records = catalog.load().await?;
            let term = search.unwrap_or_default();
            for record in filter_listing(&records, &term) {
                println!("{} (CR {})", record.name, record.challenge_rating);
            }
        }
        Command::Show { name, images, json } => {
            let record = lookup(&catalog, &name).await?;
            let source = HttpSource::new(config.source.clone())?;
            let block = catalog.stat_block(&record, &source).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&block)?);
            } else {
                println!("{}", block);
            }

            if images && !block.image_references.is_empty() {
                let cache =
                    ImageCache::new(config.image_cache_dir.clone(), config.source.timeout_secs)?;
                for uri in &block.image_references {
                    match cache.local_path(uri).await {
                        Some(path) => println!("Image: {}", path.display()),
                        None => println!("Image unavailable: {}", uri),
                    }
                }
            }
        }
        Command::Add { draft } => {
            if !draft.exists() {
                bail!("Draft file not found: {}", draft.display());
            }
            let draft: MonsterDraft = Figment::from(Toml::file(&draft)).extract()?;
            let record = catalog.save_draft(draft).await?;
            println!(
                "Saved {} (CR {}, {} XP)",
                record.name, record.challenge_rating, record.experience
            );
        }
        Command::Encounter {
            party,
            hp,
            roll,
            json,
            creatures,
        } => {
            let party = PartyConfig {
                size: party.unwrap_or(config.party.size),
                hit_points: hp.unwrap_or(config.party.hit_points),
            };
            let mut session = EncounterSession::new(party);
            for entry in &creatures {
                let (name, quantity) = parse_selection(entry)?;
                session.add(lookup(&catalog, name).await?, quantity)?;
            }

            let source = HttpSource::new(config.source.clone())?;
            let roster = session.start(&catalog, &source).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&roster)?);
                return Ok(());
            }

            for line in session.summary_lines() {
                println!("{}", line);
            }
            println!("\nTotal XP: {}", roster.total_xp);

            let tracker = session.tracker_mut();
            if roll {
                for index in 0..tracker.len() {
                    tracker.roll_initiative(index)?;
                }
                tracker.confirm()?;
                info!("Initiative confirmed");
            }

            println!();
            for entry in tracker.entries() {
                println!(
                    "{:>3}  {} ({}/{} HP)",
                    entry.initiative, entry.display_name, entry.current_hp, entry.max_hp
                );
            }

            let (party_up, creatures_up) = tracker.battle_report().survivors();
            println!(
                "\nStanding: {} party members, {} creatures",
                party_up, creatures_up
            );
        }
    }

    Ok(())
}

/// Exact name first, then the normalized key
async fn lookup(catalog: &MonsterCatalog, name: &str) -> Result<MonsterRecord> {
    if let Some(record) = catalog.find_by_name(name).await? {
        return Ok(record);
    }
    catalog
        .find_by_key(name)
        .await?
        .ok_or_else(|| anyhow!("No creature named {} in the catalog", name))
}

/// Split "Gobelin:3" into name and quantity; a bare name means one
fn parse_selection(entry: &str) -> Result<(&str, u32)> {
    match entry.rsplit_once(':') {
        Some((name, quantity)) => {
            let quantity = quantity
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid quantity in {}", entry))?;
            Ok((name.trim(), quantity))
        }
        None => Ok((entry.trim(), 1)),
    }
}
