//! Static knowledge base bundled into the binary and its explorer filter.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{FanyError, Result};

/// Label used by the explorer for "no category filter".
pub const ALL_CATEGORIES: &str = "Todas";

const BUNDLED_JSON: &str = include_str!("../data/knowledge_base.json");

static BUNDLED: OnceLock<KnowledgeBase> = OnceLock::new();

/// One static topic record.
///
/// Serialized with the Spanish keys; the same JSON is embedded into
/// the model's system instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "contenido")]
    pub content: String,
    #[serde(rename = "categoria")]
    pub category: String,
    /// Comma-separated tags.
    #[serde(rename = "etiquetas")]
    pub tags: String,
}

impl KnowledgeItem {
    /// Individual tags, trimmed, empty entries skipped.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty())
    }

    /// Whether title, content or tags contain `needle` (already lowercased).
    fn contains_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
            || self.tags.to_lowercase().contains(needle)
    }
}

/// Category restriction applied by the explorer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact, case-sensitive category match.
    Only(String),
}

impl CategoryFilter {
    /// Map an explorer label to a filter. `"Todas"` and blank mean no filter.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES,
            CategoryFilter::Only(name) => name,
        }
    }

    fn accepts(&self, item: &KnowledgeItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(name) => item.category == *name,
        }
    }
}

/// The full knowledge base: a general description plus its topic records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(rename = "descripcion_general")]
    pub overview: String,
    #[serde(rename = "conocimientos")]
    pub items: Vec<KnowledgeItem>,
}

impl KnowledgeBase {
    /// Parse a knowledge base from its JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let kb: KnowledgeBase = serde_json::from_str(json)?;
        if kb.items.is_empty() {
            return Err(FanyError::Knowledge("no entries".to_string()));
        }
        Ok(kb)
    }

    /// The knowledge base compiled into the binary.
    ///
    /// Parsed once. A malformed bundle is logged and yields an empty base.
    pub fn bundled() -> &'static KnowledgeBase {
        BUNDLED.get_or_init(|| {
            Self::from_json(BUNDLED_JSON).unwrap_or_else(|e| {
                tracing::error!(error = %e, "Bundled knowledge base is invalid");
                KnowledgeBase::default()
            })
        })
    }

    /// `"Todas"` followed by every category in first-appearance order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut out = vec![ALL_CATEGORIES];
        for item in &self.items {
            if seen.insert(item.category.as_str()) {
                out.push(item.category.as_str());
            }
        }
        out
    }

    /// Items whose title, content or tags contain `term` (case-insensitive)
    /// and whose category passes `category`. A blank term matches everything.
    pub fn filter(&self, term: &str, category: &CategoryFilter) -> Vec<&KnowledgeItem> {
        let needle = term.to_lowercase();
        self.items
            .iter()
            .filter(|item| item.contains_lowercase(&needle) && category.accepts(item))
            .collect()
    }

    /// Compact JSON array of every item, as embedded in the system instruction.
    pub fn items_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.items)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, content: &str, category: &str, tags: &str) -> KnowledgeItem {
        KnowledgeItem {
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            tags: tags.to_string(),
        }
    }

    fn sample() -> KnowledgeBase {
        KnowledgeBase {
            overview: "test".to_string(),
            items: vec![
                item("Rust", "Lenguaje de sistemas", "Programación", "rust, memoria"),
                item("Router", "Equipo de red", "Redes", "wifi"),
                item("Python", "Lenguaje interpretado", "Programación", "scripts"),
                item("Firewall", "Filtra tráfico de RED", "Ciberseguridad", "seguridad"),
            ],
        }
    }

    #[test]
    fn test_bundled_loads() {
        let kb = KnowledgeBase::bundled();
        assert!(!kb.items.is_empty());
        assert!(!kb.overview.is_empty());
    }

    #[test]
    fn test_blank_term_matches_all() {
        let kb = sample();
        assert_eq!(kb.filter("", &CategoryFilter::All).len(), 4);
    }

    #[test]
    fn test_term_is_case_insensitive_across_fields() {
        let kb = sample();
        // "red" appears in content of Router and (uppercased) Firewall.
        let titles: Vec<&str> = kb
            .filter("Red", &CategoryFilter::All)
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Router", "Firewall"]);

        // Tag-only match.
        let hits = kb.filter("SCRIPTS", &CategoryFilter::All);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Python");
    }

    #[test]
    fn test_every_result_contains_term() {
        let kb = KnowledgeBase::bundled();
        for term in ["api", "Red", "seguridad", "ia", "x"] {
            let needle = term.to_lowercase();
            for hit in kb.filter(term, &CategoryFilter::All) {
                assert!(
                    hit.title.to_lowercase().contains(&needle)
                        || hit.content.to_lowercase().contains(&needle)
                        || hit.tags.to_lowercase().contains(&needle),
                    "{} does not contain {}",
                    hit.title,
                    term
                );
            }
        }
    }

    #[test]
    fn test_category_filter_exact() {
        let kb = sample();
        let hits = kb.filter("", &CategoryFilter::Only("Programación".into()));
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|i| i.category == "Programación"));

        // Case-sensitive equality.
        assert!(kb
            .filter("", &CategoryFilter::Only("programación".into()))
            .is_empty());
    }

    #[test]
    fn test_term_and_category_combined() {
        let kb = sample();
        let hits = kb.filter("lenguaje", &CategoryFilter::Only("Redes".into()));
        assert!(hits.is_empty());
        let hits = kb.filter("lenguaje", &CategoryFilter::Only("Programación".into()));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_categories_unique_in_order() {
        let kb = sample();
        assert_eq!(
            kb.categories(),
            vec!["Todas", "Programación", "Redes", "Ciberseguridad"]
        );
    }

    #[test]
    fn test_category_filter_from_label() {
        assert_eq!(CategoryFilter::from_label("Todas"), CategoryFilter::All);
        assert_eq!(CategoryFilter::from_label("  "), CategoryFilter::All);
        assert_eq!(
            CategoryFilter::from_label("Redes"),
            CategoryFilter::Only("Redes".into())
        );
        assert_eq!(CategoryFilter::Only("Redes".into()).label(), "Redes");
        assert_eq!(CategoryFilter::All.label(), "Todas");
    }

    #[test]
    fn test_api_question_finds_api_entry() {
        let kb = KnowledgeBase::bundled();
        let hits = kb.filter("¿Qué es una API?", &CategoryFilter::All);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].tag_list().any(|t| t == "api"));
    }

    #[test]
    fn test_items_json_uses_spanish_keys() {
        let kb = sample();
        let json = kb.items_json().unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"titulo\":\"Rust\""));
        assert!(json.contains("\"etiquetas\""));
    }

    #[test]
    fn test_from_json_rejects_empty() {
        let err = KnowledgeBase::from_json(r#"{"descripcion_general":"x","conocimientos":[]}"#);
        assert!(matches!(err, Err(FanyError::Knowledge(_))));
        assert!(KnowledgeBase::from_json("not json").is_err());
    }
}
