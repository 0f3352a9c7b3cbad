//! End-to-end encounter tests: catalog, session and tracker together

mod common;

use bestiary::catalog::MonsterCatalog;
use bestiary::combat::{Condition, HealthBand, PartyConfig, TrackerError, TrackerPhase};
use bestiary::encounter::EncounterSession;
use common::{memory_catalog, PageSource};

async fn started_session() -> (EncounterSession, MonsterCatalog, PageSource) {
    let catalog = memory_catalog().await;
    let source = PageSource::standard();
    catalog.sync_from(&source).await.unwrap();

    let mut session = EncounterSession::new(PartyConfig {
        size: 2,
        hit_points: 30,
    });
    let goblin = catalog.find_by_name("Gobelin").await.unwrap().unwrap();
    let orc = catalog.find_by_name("Orque").await.unwrap().unwrap();
    session.add(goblin, 2).unwrap();
    session.add(orc, 1).unwrap();
    session.start(&catalog, &source).await.unwrap();

    (session, catalog, source)
}

#[tokio::test]
async fn test_roster_from_scraped_pages() {
    let (session, _catalog, source) = started_session().await;

    assert_eq!(session.total_xp(), 200);
    let tracker = session.tracker();
    let names: Vec<_> = tracker
        .entries()
        .iter()
        .map(|e| (e.display_name.as_str(), e.max_hp))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Party-member 1", 30),
            ("Party-member 2", 30),
            ("Gobelin 1", 7),
            ("Gobelin 2", 7),
            ("Orque 1", 15),
        ]
    );
    // One page per distinct creature
    assert_eq!(source.detail_calls(), 2);
}

#[tokio::test]
async fn test_full_round_of_combat() {
    let (mut session, _catalog, _source) = started_session().await;
    let tracker = session.tracker_mut();

    assert_eq!(
        tracker.advance_turn(),
        Err(TrackerError::WrongPhase(TrackerPhase::InitiativeEntry))
    );

    for (index, score) in [12, 18, 5, 18, 9].into_iter().enumerate() {
        tracker.set_initiative(index, score).unwrap();
    }
    tracker.confirm().unwrap();

    // Ties keep roster order
    let order: Vec<_> = tracker
        .entries()
        .iter()
        .map(|e| e.display_name.as_str())
        .collect();
    assert_eq!(
        order,
        vec!["Party-member 2", "Gobelin 2", "Party-member 1", "Orque 1", "Gobelin 1"]
    );
    assert_eq!(tracker.current().unwrap().display_name, "Party-member 2");

    // Party-member 2 hits the orc hard
    tracker.apply_damage(0, 12, Some("Orque 1")).unwrap();
    let orc = tracker.find("Orque 1").unwrap();
    assert_eq!(tracker.entry(orc).unwrap().current_hp, 3);
    assert_eq!(tracker.entry(orc).unwrap().health_band(), HealthBand::Critical);

    tracker.toggle_condition(orc, Condition::Poisoned).unwrap();
    tracker.toggle_concentration(0).unwrap();

    for _ in 0..tracker.len() {
        tracker.advance_turn().unwrap();
    }
    assert_eq!(tracker.current_turn(), 0);
    assert_eq!(tracker.round_count(), 1);

    tracker.retreat_turn().unwrap();
    assert_eq!(tracker.round_count(), 0);
    assert_eq!(tracker.current().unwrap().display_name, "Gobelin 1");

    // The goblin heals its ally
    tracker.apply_healing(4, 5, Some("Orque 1")).unwrap();
    assert_eq!(tracker.entry(orc).unwrap().current_hp, 8);

    let report = tracker.battle_report();
    assert_eq!(report.total_damage_dealt, 12);
    assert_eq!(report.total_damage_taken, 12);
    assert_eq!(report.total_healing, 5);
    assert_eq!(report.party.len(), 2);
    assert_eq!(report.others.len(), 3);
    assert_eq!(report.survivors(), (2, 3));
}

#[tokio::test]
async fn test_return_to_configuration_and_restart() {
    let (mut session, catalog, source) = started_session().await;
    assert_eq!(catalog.cached_blocks().await, 2);

    session.return_to_configuration(&catalog).await;
    assert_eq!(session.tracker().phase(), TrackerPhase::Setup);
    assert_eq!(catalog.cached_blocks().await, 0);

    session.clear();
    let orc = catalog.find_by_name("Orque").await.unwrap().unwrap();
    session.add(orc, 3).unwrap();
    session.start(&catalog, &source).await.unwrap();
    assert_eq!(session.tracker().len(), 5);
    assert_eq!(session.total_xp(), 300);
    assert_eq!(source.detail_calls(), 3);
}

#[tokio::test]
async fn test_combatant_summary_for_creatures_only() {
    let (session, catalog, source) = started_session().await;

    assert!(session.combatant_summary(0, &catalog, &source).await.is_none());
    let block = session
        .combatant_summary(4, &catalog, &source)
        .await
        .unwrap();
    assert_eq!(block.name, "Orque");
    assert!(block.to_string().contains("Hache à deux mains"));
}
