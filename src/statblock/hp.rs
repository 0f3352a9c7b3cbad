//! Hit point formula extraction

use regex::Regex;
use std::sync::LazyLock;

use super::ParseIssue;
use crate::combat::parse_dice;

/// Leading integer, optionally followed by a parenthesized dice expression
static HP_FORMULA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\s*\((.*)\))?").unwrap());

/// Average hit points taken from a formula like "15 (2d8 + 6)"
///
/// Never fails: anything that does not yield a positive integer becomes 1,
/// with the reason pushed onto `issues`.
pub fn average_hit_points(formula: &str, issues: &mut Vec<ParseIssue>) -> u32 {
    let formula = formula.trim();
    if formula.is_empty() {
        issues.push(ParseIssue::MissingHitPoints);
        return 1;
    }

    let Some(caps) = HP_FORMULA_REGEX.captures(formula) else {
        issues.push(ParseIssue::UnparsedHitPoints(formula.to_string()));
        return 1;
    };

    let Ok(value) = caps[1].parse::<u32>() else {
        issues.push(ParseIssue::UnparsedHitPoints(formula.to_string()));
        return 1;
    };

    if value == 0 {
        issues.push(ParseIssue::NonPositiveHitPoints(formula.to_string()));
        return 1;
    }

    if let Some(dice) = caps.get(2) {
        match parse_dice(dice.as_str()) {
            Ok(roll) if roll.average() != value as i32 => {
                issues.push(ParseIssue::HitPointsMismatch {
                    stated: value,
                    dice_average: roll.average(),
                });
            }
            Ok(_) => {}
            Err(_) => issues.push(ParseIssue::InvalidDiceExpression(dice.as_str().to_string())),
        }
    }

    value
}
