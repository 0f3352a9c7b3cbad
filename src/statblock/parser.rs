//! Stat block parser for authored and scraped input

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::ability::{format_score, table_modifier, Ability};
use super::hp::average_hit_points;
use super::raw::{Fragment, RawFields, ScrapedDetail};
use super::section::{Section, SectionKind};
use super::{ParseIssue, ParsedStatBlock};
use crate::catalog::MonsterRecord;
use crate::names::normalize;

/// "9 m" or "9 m, vol 18 m, nage 6 m"
static SPEED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s*m(?:,\s*\w+\s*\d+\s*m)*$").unwrap());

static LEADING_SCORE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)").unwrap());

/// Labels the source uses for the hit point line
const HIT_POINT_LABELS: &[&str] = &["points de vie", "hit points"];

/// Parse either input shape into a stat block
pub fn parse(raw: RawFields<'_>) -> ParsedStatBlock {
    let block = match raw {
        RawFields::Manual(record) => parse_manual(record),
        RawFields::Scraped(detail) => parse_scraped(detail),
    };

    for issue in &block.issues {
        warn!("{}: {}", block.name, issue);
    }
    debug!(
        "Parsed stat block for {} with {} HP from {:?}",
        block.name, block.average_hp, block.hp_formula
    );
    block
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One entry per non-blank line, title only
fn line_entries(kind: SectionKind, text: &Option<String>) -> Vec<Section> {
    non_empty(text)
        .map(|t| {
            t.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|l| Section::new(kind, l, ""))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_manual(record: &MonsterRecord) -> ParsedStatBlock {
    let mut block = ParsedStatBlock::new(&record.name);
    block.creature_type = record.creature_type.clone();

    for (label, value) in [
        ("Armor Class", &record.armor),
        ("Hit Points", &record.hit_points),
        ("Speed", &record.speed),
    ] {
        if let Some(v) = non_empty(value) {
            block.stats.push((label.to_string(), v.to_string()));
        }
    }

    block.hp_formula = non_empty(&record.hit_points).unwrap_or_default().to_string();
    block.average_hp = average_hit_points(&block.hp_formula, &mut block.issues);

    if let Some(speed) = non_empty(&record.speed) {
        if !SPEED_REGEX.is_match(speed) {
            block.issues.push(ParseIssue::UnusualSpeed(speed.to_string()));
        }
    }

    if let Some(scores) = &record.abilities {
        for (ability, score) in Ability::all().iter().zip(scores.as_array()) {
            if table_modifier(score).is_none() {
                block.issues.push(ParseIssue::AbilityOffTable {
                    ability: *ability,
                    score,
                });
            }
            block.abilities.insert(*ability, format_score(score));
        }
    }

    for (label, value) in [
        ("Skills", &record.skills),
        ("Damage Resistances", &record.resistances),
        ("Senses", &record.senses),
        ("Languages", &record.languages),
    ] {
        if let Some(v) = non_empty(value) {
            block.details.push(format!("{}: {}", label, v));
        }
    }

    block.sections.extend(line_entries(SectionKind::Traits, &record.traits));
    block.sections.extend(line_entries(SectionKind::Actions, &record.actions));
    block.sections.extend(line_entries(
        SectionKind::LegendaryActions,
        &record.legendary_actions,
    ));

    block
}

fn parse_scraped(detail: &ScrapedDetail) -> ParsedStatBlock {
    let mut block = ParsedStatBlock::new(&detail.name);
    block.creature_type = detail.creature_type.clone();
    block.source_url = detail.url.clone();
    block.stats = detail.stats.clone();
    block.details = detail.details.clone();
    block.image_references = detail.image_uris.clone();

    block.hp_formula = detail
        .stats
        .iter()
        .find(|(label, _)| HIT_POINT_LABELS.contains(&normalize(label).as_str()))
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default();
    block.average_hp = average_hit_points(&block.hp_formula, &mut block.issues);

    for (label, value) in &detail.abilities {
        let Some(ability) = Ability::from_label(label) else {
            block
                .issues
                .push(ParseIssue::UnrecognizedAbilityLabel(label.clone()));
            continue;
        };

        let score = LEADING_SCORE_REGEX
            .captures(value)
            .and_then(|c| c[1].parse::<i64>().ok());
        match score {
            Some(score) => {
                if table_modifier(score).is_none() {
                    block
                        .issues
                        .push(ParseIssue::AbilityOffTable { ability, score });
                }
                block.abilities.insert(ability, format_score(score));
            }
            None => {
                block.issues.push(ParseIssue::UnparsedAbility {
                    ability,
                    value: value.clone(),
                });
                block.abilities.insert(ability, value.trim().to_string());
            }
        }
    }

    // Entries ahead of the first recognized heading are actions
    let mut current = SectionKind::Actions;
    for fragment in &detail.fragments {
        match fragment {
            Fragment::Heading(heading) => match SectionKind::from_heading(heading) {
                Some(kind) => current = kind,
                None => block
                    .issues
                    .push(ParseIssue::UnrecognizedHeading(heading.clone())),
            },
            Fragment::Entry { title, body } => {
                block.sections.push(Section::new(current, title, body));
            }
        }
    }

    block
}
