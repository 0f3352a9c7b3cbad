//! Common test utilities - in-memory reference source and catalog setup

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use bestiary::catalog::MonsterCatalog;
use bestiary::db::Database;
use bestiary::source::markup::{parse_detail, parse_listing};
use bestiary::source::{MonsterSource, SourceError, SourceRow};
use bestiary::statblock::ScrapedDetail;

pub const ASSET_BASE: &str = "https://bestiary.test";

pub const LISTING: &str = r#"
<html><body>
<table id="liste">
<thead><tr><th></th><th>Nom</th><th>VO</th><th>Src</th><th>FP</th><th>Type</th><th>Taille</th><th>Al</th></tr></thead>
<tbody>
<tr><td></td><td><a href="?vf=gobelin">Gobelin</a></td><td>Goblin</td><td>MM</td>
<td data-sort-value="0.25">1/4</td><td>Humanoïde</td><td data-sort-value="2">P</td><td>NM</td></tr>
<tr><td></td><td><a href="?vf=orque">Orque</a></td><td>Orc</td><td>MM</td>
<td data-sort-value="0.5">1/2</td><td>Humanoïde</td><td data-sort-value="3">M</td><td>CM</td></tr>
<tr><td></td><td><a href="?vf=gobelin">GOBELIN</a></td><td>Goblin</td><td>VGM</td>
<td data-sort-value="1">1</td><td>Humanoïde</td><td data-sort-value="2">P</td><td>NM</td></tr>
<tr><td></td><td><a href="?vf=dragon-rouge-adulte">Dragon rouge, adulte</a></td><td>Adult Red Dragon</td><td>MM</td>
<td data-sort-value="17">17</td><td>Dragon</td><td data-sort-value="5">TG</td><td>CM</td></tr>
</tbody>
</table>
</body></html>"#;

pub const ORC_PAGE: &str = r#"
<div class="picture"><img src="/dnd/images/orque.jpg" alt="Orque"></div>
<div class="jaune">
  <h1>Orque</h1>
  <div class="type">Humanoïde (orc) de taille M, chaotique mauvais</div>
  <div class="red">
    <strong>Classe d'armure</strong> 13 (armure de peau)<br>
    <strong>Points de vie</strong> 15 (2d8 + 6)<br>
    <strong>Vitesse</strong> 9 m
    <div class="carac"><strong>FOR</strong><br>16 (+3)</div>
    <div class="carac"><strong>CON</strong><br>16 (+3)</div>
  </div>
  <p><strong>Langues</strong> commun, orc</p>
  <p><strong><em>Agressif</em></strong>. Par une action bonus, l'orque se déplace vers un ennemi.</p>
  <div class="rub">Actions</div>
  <p><strong><em>Hache à deux mains</em></strong>. Attaque au corps à corps : +5 au toucher.</p>
</div>"#;

pub const GOBLIN_PAGE: &str = r#"
<div class="jaune">
  <h1>Gobelin</h1>
  <div class="type">Humanoïde (gobelinoïde) de taille P, neutre mauvais</div>
  <div class="red">
    <strong>Classe d'armure</strong> 15<br>
    <strong>Points de vie</strong> 7 (2d6)<br>
    <strong>Vitesse</strong> 9 m
  </div>
  <div class="rub">Actions</div>
  <p><strong><em>Cimeterre</em></strong>. Attaque au corps à corps : +4 au toucher.</p>
</div>"#;

/// Reference source serving fixed markup pages
pub struct PageSource {
    listing: String,
    pages: HashMap<String, String>,
    pub listing_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl PageSource {
    pub fn new(listing: &str) -> Self {
        Self {
            listing: listing.to_string(),
            pages: HashMap::new(),
            listing_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }

    /// Listing plus the orc and goblin pages
    pub fn standard() -> Self {
        Self::new(LISTING)
            .with_page("Orque", ORC_PAGE)
            .with_page("Gobelin", GOBLIN_PAGE)
    }

    pub fn with_page(mut self, name: &str, page: &str) -> Self {
        self.pages.insert(name.to_string(), page.to_string());
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

impl MonsterSource for PageSource {
    async fn fetch_listing(&self) -> Result<Vec<SourceRow>, SourceError> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        parse_listing(&self.listing)
    }

    async fn fetch_detail(&self, name: &str) -> Result<ScrapedDetail, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let url = format!("{}/monstres/{}", ASSET_BASE, name);
        let page = self
            .pages
            .get(name)
            .ok_or(SourceError::Status(404))?;
        parse_detail(page, name, &url, ASSET_BASE)
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }
}

/// Empty catalog over a fresh in-memory database
pub async fn memory_catalog() -> MonsterCatalog {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    MonsterCatalog::new(db.pool().clone())
}
