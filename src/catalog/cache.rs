//! Parsed stat block cache

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::statblock::ParsedStatBlock;

/// Stat blocks already parsed this session, by creature name
///
/// Owned by the catalog and emptied when the encounter returns to
/// configuration.
#[derive(Debug, Default)]
pub struct StatBlockCache {
    blocks: RwLock<HashMap<String, ParsedStatBlock>>,
}

impl StatBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<ParsedStatBlock> {
        self.blocks.read().await.get(name).cloned()
    }

    pub async fn insert(&self, block: ParsedStatBlock) {
        self.blocks.write().await.insert(block.name.clone(), block);
    }

    pub async fn remove(&self, name: &str) {
        self.blocks.write().await.remove(name);
    }

    pub async fn clear(&self) {
        self.blocks.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.blocks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blocks.read().await.is_empty()
    }
}
