//! SQLite-backed creature catalog

use std::collections::HashSet;

use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::cache::StatBlockCache;
use super::record::{AbilityScores, ChallengeRating, MonsterRecord, Origin, SizeCategory};
use super::{CatalogError, MonsterDraft};
use crate::names::normalize;
use crate::source::{MonsterSource, SourceRow};
use crate::statblock::{parse, ParsedStatBlock, RawFields};

/// Outcome of one sync batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub received: usize,
    pub inserted: usize,
    /// Keys already in the store, left untouched
    pub existing: usize,
    /// Repeats of a key seen earlier in the same batch
    pub duplicates: usize,
    /// Rows with no usable name or rating
    pub invalid: usize,
}

/// Row from the monsters table
#[derive(Debug, sqlx::FromRow)]
struct MonsterRow {
    normalized_key: String,
    name: String,
    challenge_rating: f64,
    creature_type: String,
    size: String,
    origin: String,
    armor: Option<String>,
    hit_points: Option<String>,
    speed: Option<String>,
    strength: Option<i64>,
    dexterity: Option<i64>,
    constitution: Option<i64>,
    intelligence: Option<i64>,
    wisdom: Option<i64>,
    charisma: Option<i64>,
    skills: Option<String>,
    resistances: Option<String>,
    senses: Option<String>,
    languages: Option<String>,
    traits: Option<String>,
    actions: Option<String>,
    legendary_actions: Option<String>,
}

impl MonsterRow {
    fn into_record(self) -> MonsterRecord {
        let challenge_rating = ChallengeRating::new(self.challenge_rating).unwrap_or_else(|| {
            warn!(
                "Stored challenge rating {} for {} is invalid, using 0",
                self.challenge_rating, self.name
            );
            ChallengeRating::default()
        });

        let abilities = match (
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
        ) {
            (Some(strength), Some(dexterity), Some(constitution), Some(intelligence), Some(wisdom), Some(charisma)) => {
                Some(AbilityScores {
                    strength,
                    dexterity,
                    constitution,
                    intelligence,
                    wisdom,
                    charisma,
                })
            }
            _ => None,
        };

        MonsterRecord {
            normalized_key: self.normalized_key,
            name: self.name,
            challenge_rating,
            creature_type: self.creature_type,
            size: SizeCategory::from_token(&self.size),
            experience: challenge_rating.experience(),
            origin: Origin::from_stored(&self.origin),
            armor: self.armor,
            hit_points: self.hit_points,
            speed: self.speed,
            abilities,
            skills: self.skills,
            resistances: self.resistances,
            senses: self.senses,
            languages: self.languages,
            traits: self.traits,
            actions: self.actions,
            legendary_actions: self.legendary_actions,
        }
    }
}

const SELECT_MONSTERS: &str = "SELECT normalized_key, name, challenge_rating, creature_type, size, origin, \
     armor, hit_points, speed, strength, dexterity, constitution, intelligence, wisdom, charisma, \
     skills, resistances, senses, languages, traits, actions, legendary_actions FROM monsters";

/// The creature catalog
pub struct MonsterCatalog {
    pool: SqlitePool,
    blocks: StatBlockCache,
    /// Held for the whole of a sync so batches never interleave
    sync_lock: Mutex<()>,
}

impl MonsterCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            blocks: StatBlockCache::new(),
            sync_lock: Mutex::new(()),
        }
    }

    /// Merge listing rows into the store
    ///
    /// Inserts only keys the store does not have yet. Within the batch the
    /// first row for a key wins. The batch commits as one transaction, so
    /// readers see the store either before or after it.
    pub async fn sync(&self, rows: &[SourceRow]) -> Result<SyncReport, CatalogError> {
        let _guard = self.sync_lock.lock().await;
        let mut report = SyncReport {
            received: rows.len(),
            ..Default::default()
        };
        let mut seen = HashSet::new();
        let now = chrono::Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        for row in rows {
            let name = row.name.trim();
            let key = normalize(name);
            if key.is_empty() {
                warn!("Skipping listing row with empty name");
                report.invalid += 1;
                continue;
            }
            if !seen.insert(key.clone()) {
                info!("Duplicate in listing: {} (key {}), ignored", name, key);
                report.duplicates += 1;
                continue;
            }
            let challenge_rating = match row.challenge_rating.parse::<ChallengeRating>() {
                Ok(cr) => cr,
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    report.invalid += 1;
                    continue;
                }
            };

            let record = MonsterRecord::scraped(
                name,
                challenge_rating,
                row.creature_type.trim(),
                SizeCategory::from_token(&row.size_token),
            );
            let result = sqlx::query(
                r#"
                INSERT INTO monsters (
                    normalized_key, name, challenge_rating, creature_type, size, experience, origin,
                    created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(normalized_key) DO NOTHING
                "#,
            )
            .bind(&record.normalized_key)
            .bind(&record.name)
            .bind(record.challenge_rating.value())
            .bind(&record.creature_type)
            .bind(record.size.token())
            .bind(record.experience as i64)
            .bind(Origin::Scraped.as_str())
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                info!(
                    "Added {} (key {}, CR {}, {} XP)",
                    record.name, record.normalized_key, record.challenge_rating, record.experience
                );
                report.inserted += 1;
            } else {
                debug!("Already present: {} (key {})", record.name, record.normalized_key);
                report.existing += 1;
            }
        }
        tx.commit().await?;

        info!(
            "Sync complete: {} received, {} added, {} already present, {} duplicates, {} invalid",
            report.received, report.inserted, report.existing, report.duplicates, report.invalid
        );
        Ok(report)
    }

    /// Fetch the source's listing and sync it
    pub async fn sync_from<S: MonsterSource>(&self, source: &S) -> Result<SyncReport, CatalogError> {
        let rows = source.fetch_listing().await.map_err(|e| {
            warn!("Listing fetch failed: {}", e);
            e
        })?;
        self.sync(&rows).await
    }

    /// Every record, ordered by name, one per key
    pub async fn load(&self) -> Result<Vec<MonsterRecord>, CatalogError> {
        let rows: Vec<MonsterRow> = sqlx::query_as(&format!("{} ORDER BY name", SELECT_MONSTERS))
            .fetch_all(&self.pool)
            .await?;

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            if !seen.insert(row.normalized_key.clone()) {
                warn!("Duplicate key {} in store, ignored", row.normalized_key);
                continue;
            }
            records.push(row.into_record());
        }
        debug!("Loaded {} records", records.len());
        Ok(records)
    }

    /// Exact-name lookup
    pub async fn find_by_name(&self, name: &str) -> Result<Option<MonsterRecord>, CatalogError> {
        let row: Option<MonsterRow> =
            sqlx::query_as(&format!("{} WHERE name = ? LIMIT 1", SELECT_MONSTERS))
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(MonsterRow::into_record))
    }

    /// Lookup by normalized key, accepting any spelling of the name
    pub async fn find_by_key(&self, name: &str) -> Result<Option<MonsterRecord>, CatalogError> {
        let row: Option<MonsterRow> =
            sqlx::query_as(&format!("{} WHERE normalized_key = ?", SELECT_MONSTERS))
                .bind(normalize(name))
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(MonsterRow::into_record))
    }

    /// All names, for pickers
    pub async fn names(&self) -> Result<Vec<String>, CatalogError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM monsters ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Insert or replace a hand-authored record
    ///
    /// The stored record is marked manual, which a later sync never
    /// overwrites.
    pub async fn save(&self, record: &MonsterRecord) -> Result<(), CatalogError> {
        if record.normalized_key.is_empty() {
            return Err(CatalogError::EmptyKey(record.name.clone()));
        }
        let scores = record.abilities.map(|a| a.as_array());
        let score = |i: usize| scores.map(|s| s[i]);
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO monsters (
                normalized_key, name, challenge_rating, creature_type, size, experience, origin,
                armor, hit_points, speed, strength, dexterity, constitution, intelligence, wisdom, charisma,
                skills, resistances, senses, languages, traits, actions, legendary_actions,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(normalized_key) DO UPDATE SET
                name = excluded.name,
                challenge_rating = excluded.challenge_rating,
                creature_type = excluded.creature_type,
                size = excluded.size,
                experience = excluded.experience,
                origin = excluded.origin,
                armor = excluded.armor,
                hit_points = excluded.hit_points,
                speed = excluded.speed,
                strength = excluded.strength,
                dexterity = excluded.dexterity,
                constitution = excluded.constitution,
                intelligence = excluded.intelligence,
                wisdom = excluded.wisdom,
                charisma = excluded.charisma,
                skills = excluded.skills,
                resistances = excluded.resistances,
                senses = excluded.senses,
                languages = excluded.languages,
                traits = excluded.traits,
                actions = excluded.actions,
                legendary_actions = excluded.legendary_actions,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.normalized_key)
        .bind(&record.name)
        .bind(record.challenge_rating.value())
        .bind(&record.creature_type)
        .bind(record.size.token())
        .bind(record.experience as i64)
        .bind(Origin::Manual.as_str())
        .bind(&record.armor)
        .bind(&record.hit_points)
        .bind(&record.speed)
        .bind(score(0))
        .bind(score(1))
        .bind(score(2))
        .bind(score(3))
        .bind(score(4))
        .bind(score(5))
        .bind(&record.skills)
        .bind(&record.resistances)
        .bind(&record.senses)
        .bind(&record.languages)
        .bind(&record.traits)
        .bind(&record.actions)
        .bind(&record.legendary_actions)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.blocks.remove(&record.name).await;
        info!("Saved {} (key {})", record.name, record.normalized_key);
        Ok(())
    }

    /// Validate a draft and save it
    pub async fn save_draft(&self, draft: MonsterDraft) -> Result<MonsterRecord, CatalogError> {
        let record = draft.into_record()?;
        self.save(&record).await?;
        Ok(record)
    }

    /// Combat view of a record
    ///
    /// Records with authored stats are parsed from their own fields; the
    /// rest are fetched from the source. Successful results are cached by
    /// name. A failed fetch yields an error-marked block and is not cached.
    pub async fn stat_block<S: MonsterSource>(
        &self,
        record: &MonsterRecord,
        source: &S,
    ) -> ParsedStatBlock {
        if let Some(block) = self.blocks.get(&record.name).await {
            debug!("Stat block cache hit for {}", record.name);
            return block;
        }

        let block = if record.has_authored_stats() {
            parse(RawFields::Manual(record))
        } else {
            match source.fetch_detail(&record.name).await {
                Ok(detail) => parse(RawFields::Scraped(&detail)),
                Err(e) => {
                    warn!("Could not fetch stat block for {}: {}", record.name, e);
                    return ParsedStatBlock::not_found(
                        &record.name,
                        None,
                        format!("stat block not found ({})", e),
                    );
                }
            }
        };

        self.blocks.insert(block.clone()).await;
        block
    }

    /// Forget every cached stat block
    pub async fn clear_cache(&self) {
        self.blocks.clear().await;
        debug!("Stat block cache cleared");
    }

    /// Number of cached stat blocks
    pub async fn cached_blocks(&self) -> usize {
        self.blocks.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_catalog;
    use crate::source::SourceError;
    use crate::statblock::{Fragment, ScrapedDetail};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source answering detail requests from a fixed page
    struct FixedSource {
        hit_points: Option<&'static str>,
        detail_calls: AtomicUsize,
    }

    impl FixedSource {
        fn new(hit_points: Option<&'static str>) -> Self {
            Self {
                hit_points,
                detail_calls: AtomicUsize::new(0),
            }
        }
    }

    impl MonsterSource for FixedSource {
        async fn fetch_listing(&self) -> Result<Vec<SourceRow>, SourceError> {
            Ok(vec![SourceRow::new("Orque", "1/2", "Humanoïde", "3")])
        }

        async fn fetch_detail(&self, name: &str) -> Result<ScrapedDetail, SourceError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            let hit_points = self
                .hit_points
                .ok_or_else(|| SourceError::NotFound(name.to_string()))?;
            Ok(ScrapedDetail {
                name: name.to_string(),
                stats: vec![("Points de vie".to_string(), hit_points.to_string())],
                fragments: vec![Fragment::Entry {
                    title: "Hache".to_string(),
                    body: "Attaque".to_string(),
                }],
                ..Default::default()
            })
        }
    }

    fn rows() -> Vec<SourceRow> {
        vec![
            SourceRow::new("Gobelin", "1/4", "Humanoïde", "2"),
            SourceRow::new("Orque", "0.5", "Humanoïde", "3"),
            SourceRow::new("GOBELIN ", "1", "Humanoïde", "2"),
            SourceRow::new("Élémentaire de feu", "5", "Élémentaire", "4"),
            SourceRow::new("Chose", "beaucoup", "Aberration", "3"),
        ]
    }

    #[tokio::test]
    async fn test_sync_inserts_new_keys() {
        let catalog = test_catalog().await;
        let report = catalog.sync(&rows()).await.unwrap();

        assert_eq!(
            report,
            SyncReport {
                received: 5,
                inserted: 3,
                existing: 0,
                duplicates: 1,
                invalid: 1,
            }
        );

        let records = catalog.load().await.unwrap();
        assert_eq!(records.len(), 3);
        let goblin = catalog.find_by_name("Gobelin").await.unwrap().unwrap();
        // First occurrence in the batch wins
        assert_eq!(goblin.challenge_rating.value(), 0.25);
        assert_eq!(goblin.experience, 50);
        assert_eq!(goblin.size, SizeCategory::Small);
        assert_eq!(goblin.origin, Origin::Scraped);
        assert!(!goblin.has_authored_stats());
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let catalog = test_catalog().await;
        catalog.sync(&rows()).await.unwrap();
        let report = catalog.sync(&rows()).await.unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(report.existing, 3);
        assert_eq!(catalog.load().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sync_keeps_manual_record() {
        let catalog = test_catalog().await;
        let manual = catalog
            .save_draft(MonsterDraft {
                name: "Gobelin".to_string(),
                challenge_rating: 3.0,
                hit_points: "22 (4d8 + 4)".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        catalog.sync(&rows()).await.unwrap();
        catalog.sync(&rows()).await.unwrap();

        let stored = catalog.find_by_key("gobelin").await.unwrap().unwrap();
        assert_eq!(stored, manual);
        assert_eq!(stored.origin, Origin::Manual);
        assert_eq!(stored.experience, 700);
    }

    #[tokio::test]
    async fn test_save_updates_existing() {
        let catalog = test_catalog().await;
        catalog.sync(&rows()).await.unwrap();

        let mut draft = MonsterDraft {
            name: "Orque".to_string(),
            challenge_rating: 1.0,
            hit_points: "15 (2d8+6)".to_string(),
            ..Default::default()
        };
        draft.abilities.strength = 16;
        catalog.save_draft(draft).await.unwrap();

        let orc = catalog.find_by_name("Orque").await.unwrap().unwrap();
        assert_eq!(orc.origin, Origin::Manual);
        assert_eq!(orc.abilities.unwrap().strength, 16);
        assert_eq!(catalog.load().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_save_rejects_empty_name() {
        let catalog = test_catalog().await;
        let result = catalog.save_draft(MonsterDraft::default()).await;
        assert!(matches!(result, Err(CatalogError::EmptyName)));
        assert!(catalog.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keyless_names_do_not_replace_each_other() {
        let catalog = test_catalog().await;
        let dragon = MonsterDraft {
            name: "竜".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            catalog.save_draft(dragon).await,
            Err(CatalogError::EmptyKey(_))
        ));

        let mut record = MonsterRecord::scraped(
            "鬼",
            ChallengeRating::new(1.0).unwrap(),
            "Fiélon",
            SizeCategory::Medium,
        );
        record.origin = Origin::Manual;
        assert!(matches!(
            catalog.save(&record).await,
            Err(CatalogError::EmptyKey(_))
        ));
        assert!(catalog.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookups() {
        let catalog = test_catalog().await;
        catalog.sync(&rows()).await.unwrap();

        assert!(catalog.find_by_name("Gobelin").await.unwrap().is_some());
        // Exact lookup does not fall back to the key
        assert!(catalog.find_by_name("gobelin").await.unwrap().is_none());
        assert!(catalog.find_by_key("  gobelin").await.unwrap().is_some());
        assert!(catalog.find_by_key("elementaire de feu").await.unwrap().is_some());

        assert_eq!(
            catalog.names().await.unwrap(),
            vec!["Gobelin", "Orque", "Élémentaire de feu"]
        );
    }

    #[tokio::test]
    async fn test_sync_from_source() {
        let catalog = test_catalog().await;
        let report = catalog.sync_from(&FixedSource::new(None)).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert!(catalog.find_by_name("Orque").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stat_block_scraped_is_cached() {
        let catalog = test_catalog().await;
        catalog.sync(&rows()).await.unwrap();
        let orc = catalog.find_by_name("Orque").await.unwrap().unwrap();
        let source = FixedSource::new(Some("15 (2d8 + 6)"));

        let block = catalog.stat_block(&orc, &source).await;
        assert_eq!(block.average_hp, 15);
        assert!(!block.is_error());

        catalog.stat_block(&orc, &source).await;
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 1);
        assert_eq!(catalog.cached_blocks().await, 1);

        catalog.clear_cache().await;
        assert_eq!(catalog.cached_blocks().await, 0);
        catalog.stat_block(&orc, &source).await;
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stat_block_manual_skips_source() {
        let catalog = test_catalog().await;
        let record = catalog
            .save_draft(MonsterDraft {
                name: "Gardien".to_string(),
                hit_points: "27 (5d8 + 5)".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let source = FixedSource::new(None);

        let block = catalog.stat_block(&record, &source).await;
        assert_eq!(block.average_hp, 27);
        assert_eq!(source.detail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stat_block_fetch_failure() {
        let catalog = test_catalog().await;
        catalog.sync(&rows()).await.unwrap();
        let orc = catalog.find_by_name("Orque").await.unwrap().unwrap();

        let block = catalog.stat_block(&orc, &FixedSource::new(None)).await;
        assert!(block.is_error());
        assert_eq!(block.average_hp, 1);
        assert_eq!(catalog.cached_blocks().await, 0);
    }
}
