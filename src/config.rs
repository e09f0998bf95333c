// Configuration: typed settings loaded from environment variables.
//
// Everything is validated here, once, at startup. Group definitions, the
// community colour map and the legend buckets are compiled-in defaults;
// only sources, model ids, sizes, power and country lists come from env.

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::db::models::{Key, KeyKind};
use crate::ternary::bubbles::BubbleSizing;
use crate::ternary::centroids::{CategoryCentroidStyle, GroupDefinition};
use crate::ternary::colors::ColorMap;
use crate::ternary::proportions::CountColumns;
use crate::ternary::Bloc;

/// Which item table an analysis runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Filtered n-grams (default), the only source with per-country weights
    Ngrams,
    /// Topics labelled by an LLM
    Ai,
    /// BERTopic topics, one set per model run
    Bert,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Ngrams => "ngrams",
            DataSource::Ai => "ai",
            DataSource::Bert => "bert",
        }
    }

    /// Storage layout for this source.
    pub fn layout(&self) -> SourceLayout {
        match self {
            DataSource::Ngrams => SourceLayout {
                table: "analysis_ngram_community_stats",
                id_column: "ngram_id",
                label_column: "ngram",
                key_kind: KeyKind::Integer,
                model_id_column: None,
                entity_label: "Ngram",
                has_category_weights: true,
            },
            DataSource::Ai => SourceLayout {
                table: "analysis_ai_labelled_topic_community_stats",
                id_column: "topic_id",
                label_column: "topic_short_description",
                key_kind: KeyKind::Text,
                model_id_column: None,
                entity_label: "AI Topic",
                has_category_weights: false,
            },
            DataSource::Bert => SourceLayout {
                table: "analysis_bert_labelled_topic_community_stats",
                id_column: "topic_id",
                label_column: "topic_short_description",
                key_kind: KeyKind::Integer,
                model_id_column: Some("bert_model_id"),
                entity_label: "BERT Topic",
                has_category_weights: false,
            },
        }
    }
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ngrams" => Ok(DataSource::Ngrams),
            "ai" => Ok(DataSource::Ai),
            "bert" => Ok(DataSource::Bert),
            other => anyhow::bail!("Unknown data source '{other}' (expected ngrams, ai or bert)"),
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Table and column names backing one data source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceLayout {
    pub table: &'static str,
    pub id_column: &'static str,
    pub label_column: &'static str,
    pub key_kind: KeyKind,
    /// Column used to pick one model run, for sources that have several
    pub model_id_column: Option<&'static str>,
    /// Human-readable name for the items ("Ngram", "AI Topic", ...)
    pub entity_label: &'static str,
    /// Whether `vw_country_ngram_sentence_counts` applies to this source
    pub has_category_weights: bool,
}

impl SourceLayout {
    /// Every community count column shares the same names across sources.
    pub const NUMERIC_COLUMNS: [&'static str; 5] = [
        "count_A",
        "count_BCDE",
        "count_F",
        "count_G",
        "count_all_communities",
    ];

    pub fn count_columns(&self) -> CountColumns {
        CountColumns::new("count_A", "count_G", "count_BCDE")
    }
}

/// Item plot settings.
#[derive(Debug, Clone)]
pub struct ItemPlotSettings {
    pub source: DataSource,
    pub model_id: Option<i64>,
    /// Restrict the plot to these item ids (raw strings, converted per source)
    pub items_to_display: Option<Vec<String>>,
    pub prepend_id_hover: bool,
    pub sizing: BubbleSizing,
}

/// Centroid plot settings.
#[derive(Debug, Clone)]
pub struct CentroidPlotSettings {
    pub source: DataSource,
    pub model_id: Option<i64>,
    pub amplification_power: f64,
    /// Countries to plot when the caller selects none; `None` means all
    pub default_countries: Option<Vec<Key>>,
    /// Voting-group centroids, each bound to a bloc's count column
    pub groups: Vec<GroupTemplate>,
    pub country_style: CategoryCentroidStyle,
    pub color_map: ColorMap,
    pub default_color_key: String,
    pub legend: Vec<LegendBucket>,
}

/// A group centroid declared against a bloc rather than a concrete column.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTemplate {
    pub name: String,
    pub bloc: Option<Bloc>,
    pub label: String,
    pub marker_symbol: Option<String>,
    pub marker_color: Option<String>,
}

impl GroupTemplate {
    /// Bind the template to a source's count columns, filling display defaults.
    pub fn resolve(&self, columns: &CountColumns) -> GroupDefinition {
        GroupDefinition {
            name: self.name.clone(),
            weight_column: self.bloc.map(|b| columns.column(b).to_string()),
            label: self.label.clone(),
            marker_symbol: self.marker_symbol.clone().unwrap_or_else(|| "diamond".to_string()),
            marker_color: self.marker_color.clone().unwrap_or_else(|| "grey".to_string()),
        }
    }
}

/// One legend section for country centroids.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendBucket {
    pub name: String,
    pub communities: Vec<String>,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
/// Malformed values fail here, before any data is loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub item_plot: ItemPlotSettings,
    pub centroid_plot: CentroidPlotSettings,
    /// Default port for `serve` (PORT env var)
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let item_plot = ItemPlotSettings {
            source: env_parse("ITEM_PLOT_DATA_SOURCE_KEY", DataSource::Ngrams)?,
            model_id: env_model_id("ITEM_PLOT_MODEL_ID_TO_ANALYZE")?,
            items_to_display: env_list("ITEM_PLOT_ITEMS_TO_DISPLAY"),
            prepend_id_hover: env_bool("ITEM_PLOT_PREPEND_ID_HOVER", true)?,
            sizing: BubbleSizing {
                min_size: env_parse("ITEM_PLOT_MIN_BUBBLE_SIZE", 1.0)?,
                max_size: env_parse("ITEM_PLOT_MAX_BUBBLE_SIZE", 75.0)?,
                scaling_power: env_parse("ITEM_PLOT_BUBBLE_SCALING_POWER", 3.0)?,
            },
        };

        let mut centroid_plot = CentroidPlotSettings::default();
        centroid_plot.source = env_parse("CENTROID_PLOT_DATA_SOURCE_KEY", DataSource::Ngrams)?;
        centroid_plot.model_id = env_model_id("CENTROID_PLOT_MODEL_ID_TO_ANALYZE")?;
        centroid_plot.amplification_power = env_parse("CENTROID_PLOT_AMP_POWER", 2.0)?;
        if let Ok(prefix) = env::var("CENTROID_PLOT_COUNTRY_LABEL_PREFIX") {
            centroid_plot.country_style.label_prefix = prefix;
        }
        centroid_plot.default_countries = env_list("CENTROID_PLOT_COUNTRIES")
            .map(|ids| ids.into_iter().map(Key::Text).collect());

        Ok(Self {
            db_path: env::var("OEWG_DB_PATH")
                .unwrap_or_else(|_| "./data/oewg_analysis.db".to_string()),
            item_plot,
            centroid_plot,
            port: env_parse("PORT", 3000)?,
        })
    }

    /// Check that the database file exists.
    /// Call this before any command that reads analysis tables.
    pub fn require_database(&self) -> Result<()> {
        if !std::path::Path::new(&self.db_path).exists() {
            anyhow::bail!(
                "Database not found at {}. Run `oewg-ternary init` and \
                 `oewg-ternary import <file>` first, or set OEWG_DB_PATH.",
                self.db_path
            );
        }
        Ok(())
    }
}

impl Default for CentroidPlotSettings {
    fn default() -> Self {
        let group = |name: &str, bloc, label: &str, color: &str| GroupTemplate {
            name: name.to_string(),
            bloc: Some(bloc),
            label: label.to_string(),
            marker_symbol: Some("diamond".to_string()),
            marker_color: Some(color.to_string()),
        };
        let bucket = |name: &str, communities: &[&str]| LegendBucket {
            name: name.to_string(),
            communities: communities.iter().map(|c| c.to_string()).collect(),
        };

        Self {
            source: DataSource::Ngrams,
            model_id: None,
            amplification_power: 2.0,
            default_countries: None,
            groups: vec![
                group("US_Focus", Bloc::Us, "US Centroid (Amplified)", "blue"),
                group("Russia_Focus", Bloc::Russia, "Russia Centroid (Amplified)", "red"),
                group("Middle_Focus", Bloc::Middle, "Middle Ground Centroid (Amplified)", "green"),
            ],
            country_style: CategoryCentroidStyle {
                label_prefix: "Centroid: ".to_string(),
                marker_symbol: "circle".to_string(),
                marker_color: "grey".to_string(),
            },
            color_map: ColorMap::from([
                ("A", "blue"),
                ("G", "red"),
                ("B", "green"),
                ("C", "green"),
                ("D", "green"),
                ("E", "green"),
                ("F", "grey"),
                ("DEFAULT", "darkgrey"),
            ]),
            default_color_key: "DEFAULT".to_string(),
            legend: vec![
                bucket("US-like-voting countries", &["A"]),
                bucket("Russia-like-voting countries", &["G"]),
                bucket("Middle-ground countries", &["B", "C", "D", "E"]),
                bucket("Other countries (edge cases)", &["F"]),
            ],
        }
    }
}

impl Default for ItemPlotSettings {
    fn default() -> Self {
        Self {
            source: DataSource::Ngrams,
            model_id: None,
            items_to_display: None,
            prepend_id_hover: true,
            sizing: BubbleSizing::default(),
        }
    }
}

/// Parse an env var, falling back to `default` when it is unset or empty.
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {name}: '{raw}'")),
        _ => Ok(default),
    }
}

fn env_bool(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "" => Ok(default),
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => anyhow::bail!("Invalid value for {name}: '{raw}' (expected true or false)"),
        },
        Err(_) => Ok(default),
    }
}

/// Model ids are an integer or the literal "None".
fn env_model_id(name: &str) -> Result<Option<i64>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() && !raw.trim().eq_ignore_ascii_case("none") => {
            let id = raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid value for {name}: '{raw}' (expected an integer or None)"))?;
            Ok(Some(id))
        }
        _ => Ok(None),
    }
}

/// A JSON array of strings/numbers, or a comma-separated list.
fn env_list(name: &str) -> Option<Vec<String>> {
    let raw = env::var(name).ok()?;
    parse_list(&raw)
}

pub(crate) fn parse_list(raw: &str) -> Option<Vec<String>> {
    if raw.trim().is_empty() {
        return None;
    }
    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        return Some(
            values
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        );
    }
    Some(
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
