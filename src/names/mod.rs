//! Name canonicalization
//!
//! Every component that needs to decide whether two spellings refer to the
//! same creature goes through [`normalize`]. The key it produces is:
//! - accent-free (canonical decomposition, combining marks dropped)
//! - ASCII only
//! - lower-case
//! - single-spaced and trimmed

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters that decomposition alone does not reduce to ASCII in the
/// source material, or that appear precomposed in legacy data.
const FOLD_TABLE: &[(char, &str)] = &[
    ('é', "e"),
    ('è', "e"),
    ('ê', "e"),
    ('ë', "e"),
    ('à', "a"),
    ('â', "a"),
    ('ä', "a"),
    ('î', "i"),
    ('ï', "i"),
    ('ô', "o"),
    ('ö', "o"),
    ('û', "u"),
    ('ü', "u"),
    ('ç', "c"),
    ('œ', "oe"),
    ('æ', "ae"),
    ('ß', "ss"),
    ('’', "'"),
];

/// Fold a single character through the fallback table
fn fold_char(c: char, out: &mut String) -> bool {
    match FOLD_TABLE.iter().find(|(from, _)| *from == c) {
        Some((_, to)) => {
            out.push_str(to);
            true
        }
        None => false,
    }
}

/// Derive the canonical lookup key for a display name
pub fn normalize(name: &str) -> String {
    let mut folded = String::with_capacity(name.len());

    for c in name.nfd() {
        if c.is_ascii() {
            folded.push(c.to_ascii_lowercase());
        } else if is_combining_mark(c) {
            continue;
        } else {
            let lower: String = c.to_lowercase().collect();
            for lc in lower.chars() {
                if lc.is_ascii() {
                    folded.push(lc);
                } else if !fold_char(lc, &mut folded) && lc.is_whitespace() {
                    folded.push(' ');
                }
            }
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the reference source's URL slug for a creature name
///
/// Same folding as [`normalize`], then spaces become dashes and commas are
/// dropped ("Dragon rouge, adulte" -> "dragon-rouge-adulte").
pub fn source_slug(name: &str) -> String {
    normalize(name).replace(',', "").replace(' ', "-")
}
