//! Markup extraction for the reference source's pages
//!
//! The pages are scanned as text rather than parsed into a tree: blocks are
//! located by tag name plus class or id attribute, case-insensitively, and
//! reduced to plain text. Only ASCII is lower-cased so byte offsets found
//! in the lowered copy stay valid in the page text.

use regex::Regex;
use std::sync::LazyLock;

use super::{SourceError, SourceRow};
use crate::statblock::{Fragment, ScrapedDetail};

/// Paragraphs holding one of these words are skill/sense/language lines
const DETAIL_KEYWORDS: &[&str] = &[
    "Compétences",
    "Résistances",
    "Immunités",
    "Sens",
    "Langues",
    "Puissance",
];

static ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z][a-z0-9_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});

fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&rsquo;", "’")
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain text of a markup fragment
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&normalize_entities(&out))
}

/// Value of `name` in an opening tag
fn attr_value(open_tag: &str, name: &str) -> Option<String> {
    ATTR_REGEX
        .captures_iter(open_tag)
        .find(|c| c[1].eq_ignore_ascii_case(name))
        .and_then(|c| c.get(2).or(c.get(3)).or(c.get(4)))
        .map(|m| normalize_entities(m.as_str()))
}

fn has_class(open_tag: &str, class: &str) -> bool {
    attr_value(open_tag, "class")
        .is_some_and(|v| v.split_whitespace().any(|c| c.eq_ignore_ascii_case(class)))
}

/// Page text alongside its ASCII-lowered copy, lowered once per page.
/// Both share byte offsets, so one range slices either.
#[derive(Debug, Clone, Copy)]
struct Text<'a> {
    raw: &'a str,
    lc: &'a str,
}

impl<'a> Text<'a> {
    fn new(raw: &'a str, lc: &'a str) -> Self {
        debug_assert_eq!(raw.len(), lc.len());
        Self { raw, lc }
    }

    fn slice(&self, from: usize, to: usize) -> Text<'a> {
        Text {
            raw: &self.raw[from..to],
            lc: &self.lc[from..to],
        }
    }

    fn len(&self) -> usize {
        self.raw.len()
    }
}

/// An element located in a document
#[derive(Debug, Clone, Copy)]
struct Element<'a> {
    start: usize,
    open_tag: &'a str,
    inner: Text<'a>,
    end: usize,
}

/// Position of `pat` at or after `from` that is a whole tag name
/// ("<p" must not match "<pre")
fn find_tag(lc: &str, pat: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    loop {
        let at = lc.get(pos..)?.find(pat)? + pos;
        let after = at + pat.len();
        if !lc[after..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            return Some(at);
        }
        pos = after;
    }
}

/// Next `<tag ...>` element at or after `from` matching `accept`, with its
/// matching close tag found by counting nested tags of the same name.
/// Elements without a close tag end at the end of their opening tag.
fn next_element<'a>(
    doc: Text<'a>,
    tag: &str,
    from: usize,
    accept: impl Fn(&str) -> bool,
) -> Option<Element<'a>> {
    let open_pat = format!("<{}", tag);
    let close_pat = format!("</{}", tag);

    let mut pos = from;
    loop {
        let start = find_tag(doc.lc, &open_pat, pos)?;
        let open_end = doc.raw[start..].find('>')? + start + 1;
        let open_tag = &doc.raw[start..open_end];
        if !accept(open_tag) {
            pos = open_end;
            continue;
        }

        let mut depth = 1usize;
        let mut cursor = open_end;
        loop {
            let next_open = find_tag(doc.lc, &open_pat, cursor);
            let Some(next_close) = find_tag(doc.lc, &close_pat, cursor) else {
                return Some(Element {
                    start,
                    open_tag,
                    inner: doc.slice(open_end, open_end),
                    end: open_end,
                });
            };
            match next_open {
                Some(o) if o < next_close => {
                    depth += 1;
                    cursor = o + open_pat.len();
                }
                _ => {
                    depth -= 1;
                    if depth == 0 {
                        let close_end = doc.lc[next_close..]
                            .find('>')
                            .map(|i| i + next_close + 1)
                            .unwrap_or(doc.len());
                        return Some(Element {
                            start,
                            open_tag,
                            inner: doc.slice(open_end, next_close),
                            end: close_end,
                        });
                    }
                    cursor = next_close + close_pat.len();
                }
            }
        }
    }
}

fn all_elements<'a>(doc: Text<'a>, tag: &str, accept: impl Fn(&str) -> bool) -> Vec<Element<'a>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(el) = next_element(doc, tag, pos, &accept) {
        pos = el.end;
        out.push(el);
    }
    out
}

fn first_with_class<'a>(doc: Text<'a>, tag: &str, class: &str) -> Option<Element<'a>> {
    next_element(doc, tag, 0, |open| has_class(open, class))
}

/// Catalog rows from the listing page's `table#liste`
///
/// Rows with fewer than eight cells are skipped. A missing table is an
/// error; an empty table is not.
pub fn parse_listing(doc: &str) -> Result<Vec<SourceRow>, SourceError> {
    let lc = to_lower(doc);
    let doc = Text::new(doc, &lc);

    let table = next_element(doc, "table", 0, |open| {
        attr_value(open, "id").is_some_and(|id| id == "liste")
    })
    .ok_or_else(|| SourceError::Markup("listing table not found".to_string()))?;

    let body = next_element(table.inner, "tbody", 0, |_| true)
        .map(|b| b.inner)
        .unwrap_or(table.inner);

    let rows = all_elements(body, "tr", |_| true)
        .into_iter()
        .filter_map(|tr| {
            let cells = all_elements(tr.inner, "td", |_| true);
            if cells.len() < 8 {
                return None;
            }
            let sort_or_text = |cell: &Element<'_>| {
                attr_value(cell.open_tag, "data-sort-value")
                    .map(|v| v.trim().to_string())
                    .unwrap_or_else(|| strip_tags(cell.inner.raw))
            };
            Some(SourceRow {
                name: strip_tags(cells[1].inner.raw),
                challenge_rating: sort_or_text(&cells[4]),
                creature_type: strip_tags(cells[5].inner.raw),
                size_token: attr_value(cells[6].open_tag, "data-sort-value")
                    .map(|v| v.trim().to_string())
                    .unwrap_or_else(|| "3".to_string()),
            })
        })
        .filter(|row| !row.name.is_empty())
        .collect();

    Ok(rows)
}

/// Make a site-relative URI absolute
fn absolute_uri(src: &str, asset_base: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_string()
    } else if let Some(rest) = src.strip_prefix("//") {
        format!("https://{}", rest)
    } else if src.starts_with('/') {
        format!("{}{}", asset_base.trim_end_matches('/'), src)
    } else {
        format!("{}/{}", asset_base.trim_end_matches('/'), src)
    }
}

/// The block's markup with nested `tag` elements cut out
fn without_nested(inner: Text<'_>, tag: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut pos = 0;
    for el in all_elements(inner, tag, |_| true) {
        out.push_str(&inner.raw[pos..el.start]);
        pos = el.end;
    }
    out.push_str(&inner.raw[pos..]);
    out
}

/// Split a block into (label, value) pairs at each `<strong>` label
fn strong_labeled(inner: Text<'_>) -> Vec<(String, String)> {
    let labels = all_elements(inner, "strong", |_| true);
    labels
        .iter()
        .enumerate()
        .filter_map(|(i, label)| {
            let value_end = labels.get(i + 1).map(|l| l.start).unwrap_or(inner.len());
            let key = strip_tags(label.inner.raw);
            let value = strip_tags(&inner.raw[label.end..value_end]);
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect()
}

/// Entry body without the separator that follows its title
fn entry_body(s: &str) -> String {
    strip_tags(s)
        .trim_start_matches(['.', ':'])
        .trim()
        .to_string()
}

/// Labeled fragments from a creature's detail page
///
/// Returns None when the page has no creature block at all.
pub fn parse_detail(doc: &str, name: &str, url: &str, asset_base: &str) -> Option<ScrapedDetail> {
    let lc = to_lower(doc);
    let doc = Text::new(doc, &lc);

    let block = first_with_class(doc, "div", "jaune").or_else(|| first_with_class(doc, "div", "col1"))?;

    let mut detail = ScrapedDetail {
        name: name.to_string(),
        url: Some(url.to_string()),
        ..Default::default()
    };

    if let Some(picture) = first_with_class(doc, "div", "picture") {
        if let Some(src) = next_element(picture.inner, "img", 0, |_| true)
            .and_then(|img| attr_value(img.open_tag, "src"))
            .filter(|s| !s.is_empty())
        {
            detail.image_uris.push(absolute_uri(&src, asset_base));
        }
    }

    detail.creature_type = first_with_class(doc, "div", "type")
        .map(|t| strip_tags(t.inner.raw))
        .unwrap_or_default();

    if let Some(red) = first_with_class(block.inner, "div", "red") {
        let stats = without_nested(red.inner, "div");
        let stats_lc = to_lower(&stats);
        detail.stats = strong_labeled(Text::new(&stats, &stats_lc));
    }

    detail.abilities = all_elements(doc, "div", |open| has_class(open, "carac"))
        .into_iter()
        .filter_map(|carac| strong_labeled(carac.inner).into_iter().next())
        .collect();

    // Headings and paragraphs in document order. A found heading is kept
    // until the paragraphs pass it.
    let text_block = block.inner;
    let mut pos = 0;
    let mut next_rub = next_element(text_block, "div", 0, |open| has_class(open, "rub"));
    loop {
        if next_rub.is_some_and(|r| r.start < pos) {
            next_rub = next_element(text_block, "div", pos, |open| has_class(open, "rub"));
        }
        let next_p = next_element(text_block, "p", pos, |_| true);
        let take_rub = match (next_rub.map(|r| r.start), next_p.map(|p| p.start)) {
            (None, None) => break,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(r), Some(p)) => r < p,
        };

        if take_rub {
            let Some(rub) = next_rub else { break };
            let heading = strip_tags(rub.inner.raw);
            if !heading.is_empty() {
                detail.fragments.push(Fragment::Heading(heading));
            }
            pos = rub.end;
            continue;
        }

        let Some(p) = next_p else { break };
        pos = p.end;
        let text = strip_tags(p.inner.raw);
        if text.is_empty() {
            continue;
        }
        if DETAIL_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            detail.details.push(text);
            continue;
        }
        match next_element(p.inner, "strong", 0, |_| true) {
            Some(title) => {
                let title_text = strip_tags(title.inner.raw);
                let body = entry_body(&p.inner.raw[title.end..]);
                detail.fragments.push(Fragment::Entry {
                    title: title_text.trim_end_matches('.').trim().to_string(),
                    body,
                });
            }
            None => detail.fragments.push(Fragment::Entry {
                title: String::new(),
                body: text,
            }),
        }
    }

    Some(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
<html><body>
<table id="liste" class="display">
<thead><tr><th></th><th>Nom</th><th>VO</th><th>Src</th><th>FP</th><th>Type</th><th>Taille</th><th>Al</th></tr></thead>
<tbody>
<tr><td><input type="checkbox"></td><td><a href="monstres.php?vf=gobelin">Gobelin</a></td><td>Goblin</td><td>MM</td>
<td data-sort-value="0.25">1/4</td><td>Humanoïde</td><td data-sort-value="2">P</td><td>NM</td></tr>
<tr><td></td><td><a href="monstres.php?vf=orque">Orque</a></td><td>Orc</td><td>MM</td>
<td>1/2</td><td>Humanoïde</td><td data-sort-value='3'>M</td><td>CM</td></tr>
<tr><td colspan="8">publicité</td></tr>
</tbody>
</table>
</body></html>"#;

    const DETAIL: &str = r#"
<div class="picture"><img src="/dnd/images/gobelin.jpg" alt="Gobelin"></div>
<div class="jaune">
  <h1>Gobelin</h1>
  <div class="type">Humanoïde (gobelinoïde) de taille P, neutre mauvais</div>
  <div class="red">
    <strong>Classe d'armure</strong> 15 (armure de cuir, bouclier)<br>
    <strong>Points de vie</strong> 7 (2d6)<br>
    <strong>Vitesse</strong> 9 m
    <div class="carac"><strong>FOR</strong><br>8 (-1)</div>
    <div class="carac"><strong>DEX</strong><br>14 (+2)</div>
  </div>
  <p><strong>Compétences</strong> Discrétion +6</p>
  <p><strong>Sens</strong> vision dans le noir 18 m</p>
  <p><strong><em>Fuite agile</em></strong>. Le gobelin peut se désengager.</p>
  <div class="rub">Actions</div>
  <p><strong><em>Cimeterre</em></strong>. Attaque au corps à corps&nbsp;: +4 au toucher.</p>
</div>"#;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>Orque</b>&nbsp;<i>chef</i>"), "Orque chef");
        assert_eq!(strip_tags("  a \n\t b "), "a b");
    }

    #[test]
    fn test_attr_value() {
        let tag = r#"<td class="x y" data-sort-value='0.125'>"#;
        assert_eq!(attr_value(tag, "data-sort-value").as_deref(), Some("0.125"));
        assert!(has_class(tag, "y"));
        assert!(!has_class(tag, "z"));
    }

    #[test]
    fn test_parse_listing() {
        let rows = parse_listing(LISTING).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].name, "Gobelin");
        assert_eq!(rows[0].challenge_rating, "0.25");
        assert_eq!(rows[0].creature_type, "Humanoïde");
        assert_eq!(rows[0].size_token, "2");

        // No sort value falls back to the cell text
        assert_eq!(rows[1].challenge_rating, "1/2");
        assert_eq!(rows[1].size_token, "3");
    }

    #[test]
    fn test_listing_without_table() {
        assert!(matches!(
            parse_listing("<html></html>"),
            Err(SourceError::Markup(_))
        ));
    }

    #[test]
    fn test_parse_large_listing() {
        let mut doc = String::from(r#"<table id="liste"><tbody>"#);
        for i in 0..3000 {
            doc.push_str(&format!(
                r#"<tr><td></td><td><a href="?vf=c{i}">Créature {i}</a></td><td>C</td><td>MM</td><td data-sort-value="1">1</td><td>Bête</td><td data-sort-value="3">M</td><td>N</td></tr>"#
            ));
        }
        doc.push_str("</tbody></table>");

        let rows = parse_listing(&doc).unwrap();
        assert_eq!(rows.len(), 3000);
        assert_eq!(rows[0].name, "Créature 0");
        assert_eq!(rows[2999].name, "Créature 2999");
        assert_eq!(rows[2999].creature_type, "Bête");
    }

    #[test]
    fn test_mixed_case_tags_with_multibyte_text() {
        let doc = r#"<DIV class="jaune"><Div Class="Type">Élémentaire de taille G</DIV><P><STRONG>Écrasement</STRONG>. Dégâts</P></DIV>"#;
        let detail = parse_detail(doc, "Élémentaire", "u", "https://www.aidedd.org").unwrap();
        assert_eq!(detail.creature_type, "Élémentaire de taille G");
        assert_eq!(
            detail.fragments,
            vec![Fragment::Entry {
                title: "Écrasement".to_string(),
                body: "Dégâts".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_detail() {
        let detail = parse_detail(
            DETAIL,
            "Gobelin",
            "https://www.aidedd.org/dnd/monstres.php?vf=gobelin",
            "https://www.aidedd.org",
        )
        .unwrap();

        assert_eq!(
            detail.image_uris,
            vec!["https://www.aidedd.org/dnd/images/gobelin.jpg".to_string()]
        );
        assert!(detail.creature_type.starts_with("Humanoïde"));
        assert_eq!(
            detail.stats,
            vec![
                ("Classe d'armure".to_string(), "15 (armure de cuir, bouclier)".to_string()),
                ("Points de vie".to_string(), "7 (2d6)".to_string()),
                ("Vitesse".to_string(), "9 m".to_string()),
            ]
        );
        assert_eq!(
            detail.abilities,
            vec![
                ("FOR".to_string(), "8 (-1)".to_string()),
                ("DEX".to_string(), "14 (+2)".to_string()),
            ]
        );
        assert_eq!(detail.details.len(), 2);
        assert_eq!(
            detail.fragments,
            vec![
                Fragment::Entry {
                    title: "Fuite agile".to_string(),
                    body: "Le gobelin peut se désengager.".to_string(),
                },
                Fragment::Heading("Actions".to_string()),
                Fragment::Entry {
                    title: "Cimeterre".to_string(),
                    body: "Attaque au corps à corps : +4 au toucher.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_detail_without_block() {
        assert!(parse_detail("<html><p>404</p></html>", "X", "u", "https://www.aidedd.org").is_none());
    }

    #[test]
    fn test_absolute_uri() {
        let base = "https://www.aidedd.org";
        assert_eq!(absolute_uri("/a.jpg", base), "https://www.aidedd.org/a.jpg");
        assert_eq!(absolute_uri("https://x/a.jpg", base), "https://x/a.jpg");
        assert_eq!(absolute_uri("//cdn/a.jpg", base), "https://cdn/a.jpg");
    }
}
