//! Stat block text sections

use serde::{Deserialize, Serialize};

use crate::names::normalize;

/// Which part of a stat block a text entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Traits,
    Actions,
    LegendaryActions,
}

impl SectionKind {
    /// Classify a heading from the reference source
    ///
    /// Legendary keywords are checked before the generic "action" keyword
    /// since "Actions légendaires" contains both. Returns None for headings
    /// that name no known section.
    pub fn from_heading(heading: &str) -> Option<SectionKind> {
        let key = normalize(heading);
        if key.contains("legendaire") || key.contains("legendary") {
            Some(SectionKind::LegendaryActions)
        } else if key.contains("action") {
            Some(SectionKind::Actions)
        } else if key.contains("trait") || key.contains("capacite") {
            Some(SectionKind::Traits)
        } else {
            None
        }
    }

    /// Display heading
    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Traits => "Traits",
            SectionKind::Actions => "Actions",
            SectionKind::LegendaryActions => "Legendary Actions",
        }
    }
}

/// One titled entry of a stat block section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub body: String,
}

impl Section {
    pub fn new(kind: SectionKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_classification() {
        assert_eq!(SectionKind::from_heading("ACTIONS"), Some(SectionKind::Actions));
        assert_eq!(
            SectionKind::from_heading("Actions légendaires"),
            Some(SectionKind::LegendaryActions)
        );
        assert_eq!(
            SectionKind::from_heading("Legendary Actions"),
            Some(SectionKind::LegendaryActions)
        );
        assert_eq!(SectionKind::from_heading("Réactions"), Some(SectionKind::Actions));
        assert_eq!(SectionKind::from_heading("Capacités"), Some(SectionKind::Traits));
        assert_eq!(SectionKind::from_heading("Repaire"), None);
    }
}
