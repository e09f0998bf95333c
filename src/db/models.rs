// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so the ternary pipeline can use them without
// depending on rusqlite directly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A loosely-typed value as it comes out of storage.
///
/// SQLite columns carry whatever was inserted, so count columns can hold
/// integers, reals, text, or NULL. `as_number` is the single coercion rule
/// every numeric consumer goes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    /// Coerce to a number. Text is parsed when it looks numeric; anything
    /// else (NULL, unparseable text) is missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Null => None,
            Cell::Int(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Real(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

/// The declared representation of a join key for one data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Integer,
    Text,
}

impl KeyKind {
    /// Convert a stored cell into a key of this kind.
    ///
    /// Integer keys accept integral reals and numeric text; text keys accept
    /// anything non-null and render numbers without a fractional part.
    pub fn coerce(&self, cell: &Cell) -> Option<Key> {
        match (self, cell) {
            (_, Cell::Null) => None,
            (KeyKind::Integer, Cell::Int(v)) => Some(Key::Int(*v)),
            (KeyKind::Integer, Cell::Real(v)) if v.fract() == 0.0 && v.is_finite() => {
                Some(Key::Int(*v as i64))
            }
            (KeyKind::Integer, Cell::Real(_)) => None,
            (KeyKind::Integer, Cell::Text(s)) => s.trim().parse::<i64>().ok().map(Key::Int),
            (KeyKind::Text, Cell::Int(v)) => Some(Key::Text(v.to_string())),
            (KeyKind::Text, Cell::Real(v)) if v.fract() == 0.0 && v.is_finite() => {
                Some(Key::Text((*v as i64).to_string()))
            }
            (KeyKind::Text, Cell::Real(v)) => Some(Key::Text(v.to_string())),
            (KeyKind::Text, Cell::Text(s)) => Some(Key::Text(s.clone())),
        }
    }
}

/// A join-key value: item ids and category ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl Key {
    pub fn kind(&self) -> KeyKind {
        match self {
            Key::Int(_) => KeyKind::Integer,
            Key::Text(_) => KeyKind::Text,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(v) => write!(f, "{v}"),
            Key::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}

/// One analytic unit (an n-gram or a topic) with its raw per-community counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: Key,
    pub label: String,
    /// Raw numeric columns keyed by their storage name (count_A, count_G, ...)
    pub columns: BTreeMap<String, Cell>,
}

impl ItemRecord {
    pub fn new(id: impl Into<Key>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column setter, mostly for tests and imports.
    pub fn with(mut self, column: &str, value: impl Into<Cell>) -> Self {
        self.columns.insert(column.to_string(), value.into());
        self
    }

    /// Numeric value of a column, if present and coercible.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.columns.get(column).and_then(Cell::as_number)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }
}

/// How much one category (a country) used one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub item_id: Key,
    pub category_id: Key,
    pub weight: f64,
}

/// Side-table row describing a category (a country): display name and the
/// voting community it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: Key,
    pub name: Option<String>,
    pub grouping: Option<String>,
}

/// JSON import file: one array per table, all optional.
///
/// Stats rows carry their count columns inline (`count_A`, `count_G`, ...);
/// values may be numbers, numeric strings or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub ngrams: Vec<StatsRow>,
    #[serde(default)]
    pub ai_topics: Vec<StatsRow>,
    #[serde(default)]
    pub bert_topics: Vec<StatsRow>,
    #[serde(default)]
    pub countries: Vec<CountryRow>,
    #[serde(default)]
    pub interventions: Vec<InterventionRow>,
    #[serde(default)]
    pub sentences: Vec<SentenceRow>,
    #[serde(default)]
    pub ngrams_to_use: Vec<NgramToUseRow>,
    #[serde(default)]
    pub sentence_ngrams: Vec<SentenceNgramRow>,
}

impl Dataset {
    /// Total rows across every table, for progress reporting.
    pub fn row_count(&self) -> u64 {
        (self.ngrams.len()
            + self.ai_topics.len()
            + self.bert_topics.len()
            + self.countries.len()
            + self.interventions.len()
            + self.sentences.len()
            + self.ngrams_to_use.len()
            + self.sentence_ngrams.len()) as u64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsRow {
    pub id: Cell,
    pub label: Option<String>,
    /// BERTopic model run; required for bert topics only
    #[serde(default)]
    pub model_id: Option<i64>,
    #[serde(flatten)]
    pub counts: BTreeMap<String, Cell>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRow {
    pub id: String,
    pub name: Option<String>,
    /// Voting community label (A..G)
    pub community: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionRow {
    pub id: i64,
    pub speaker: Option<String>,
    #[serde(default)]
    pub speaker_type: Option<String>,
    #[serde(default)]
    pub meeting: Option<String>,
    #[serde(default)]
    pub speech: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceRow {
    pub id: i64,
    pub intervention_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgramToUseRow {
    pub id: i64,
    pub ngram: String,
    #[serde(default)]
    pub is_filtered_out: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceNgramRow {
    pub sentence_id: i64,
    pub ngram_id: i64,
}

/// Rows written per table by an import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub tables: Vec<(&'static str, usize)>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.tables.iter().map(|(_, n)| n).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_coercion() {
        assert_eq!(Cell::Int(3).as_number(), Some(3.0));
        assert_eq!(Cell::Text(" 4.5 ".into()).as_number(), Some(4.5));
        assert_eq!(Cell::Text("n/a".into()).as_number(), None);
        assert_eq!(Cell::Null.as_number(), None);
    }

    #[test]
    fn test_integer_key_coercion() {
        let kind = KeyKind::Integer;
        assert_eq!(kind.coerce(&Cell::Int(7)), Some(Key::Int(7)));
        assert_eq!(kind.coerce(&Cell::Real(7.0)), Some(Key::Int(7)));
        assert_eq!(kind.coerce(&Cell::Text("7".into())), Some(Key::Int(7)));
        assert_eq!(kind.coerce(&Cell::Real(7.5)), None);
        assert_eq!(kind.coerce(&Cell::Text("seven".into())), None);
    }

    #[test]
    fn test_text_key_coercion() {
        let kind = KeyKind::Text;
        assert_eq!(kind.coerce(&Cell::Int(12)), Some(Key::Text("12".into())));
        assert_eq!(kind.coerce(&Cell::Real(12.0)), Some(Key::Text("12".into())));
        assert_eq!(kind.coerce(&Cell::Null), None);
    }

    #[test]
    fn test_dataset_parses_loose_counts() {
        let json = r#"{
            "ngrams": [{"id": 1, "label": "capacity building", "count_A": 3, "count_G": "2", "count_BCDE": null}],
            "countries": [{"id": "USA", "name": "United States", "community": "A"}]
        }"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.row_count(), 2);
        let row = &dataset.ngrams[0];
        assert_eq!(row.id, Cell::Int(1));
        assert_eq!(row.counts.get("count_A"), Some(&Cell::Int(3)));
        assert_eq!(row.counts.get("count_G").and_then(Cell::as_number), Some(2.0));
        assert_eq!(row.counts.get("count_BCDE"), Some(&Cell::Null));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::Int(42).to_string(), "42");
        assert_eq!(Key::from("USA").to_string(), "USA");
    }
}
