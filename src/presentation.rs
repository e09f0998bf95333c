// Presentation helpers shared by the terminal output and the JSON API.
//
// None of these touch ternary math; they decide what gets shown and how
// it is labelled.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::LegendBucket;
use crate::db::models::{CategoryInfo, CategoryWeight, ItemRecord, Key};
use crate::ternary::colors::ColoredCentroid;
use crate::ternary::ItemRow;

/// Case-insensitive substring match over an item's label or id.
/// A blank term matches everything.
pub fn matches_search(record: &ItemRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    record.label.to_lowercase().contains(&term) || record.id.to_string().to_lowercase().contains(&term)
}

/// Hover text for an item: "<id>: <label>" or just the label.
pub fn hover_text(record: &ItemRecord, prepend_id: bool) -> String {
    if prepend_id {
        format!("{}: {}", record.id, record.label)
    } else {
        record.label.clone()
    }
}

/// Colour-scale range over TotalMentions.
///
/// Equal min and max are widened by 0.5 each way (never below 0) so the
/// scale has a non-zero span; an empty table gives (0, 1).
pub fn mentions_range(rows: &[ItemRow]) -> (f64, f64) {
    let values = rows.iter().map(|r| r.total_mentions).filter(|v| v.is_finite());
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return ((min - 0.5).max(0.0), max + 0.5);
    }
    (min, max)
}

/// One entry of the country picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOption {
    pub label: String,
    pub value: Key,
    /// True when the country never used any item
    pub disabled: bool,
    pub total_weight: f64,
}

/// Build the country picker: one option per named country, sorted by name.
pub fn category_options(info: &[CategoryInfo], weights: &[CategoryWeight]) -> Vec<CategoryOption> {
    let mut totals: HashMap<&Key, f64> = HashMap::new();
    for w in weights {
        if w.weight.is_finite() {
            *totals.entry(&w.category_id).or_default() += w.weight;
        }
    }

    let mut options: Vec<CategoryOption> = info
        .iter()
        .filter_map(|c| {
            let name = c.name.as_ref()?;
            let total_weight = totals.get(&c.id).copied().unwrap_or(0.0);
            Some(CategoryOption {
                label: name.clone(),
                value: c.id.clone(),
                disabled: total_weight < 1.0,
                total_weight,
            })
        })
        .collect();
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

/// Country centroids grouped for the legend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LegendGroup {
    pub name: String,
    pub centroids: Vec<ColoredCentroid>,
}

/// Legend layout for country centroids.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Legend {
    /// Configured buckets, in order, only those with members
    pub groups: Vec<LegendGroup>,
    /// Grouping present but not named by any bucket
    pub uncategorized: Vec<ColoredCentroid>,
    /// No grouping at all (no metadata row, or a null community)
    pub ungrouped: Vec<ColoredCentroid>,
}

impl Legend {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.uncategorized.is_empty() && self.ungrouped.is_empty()
    }
}

/// Route each country centroid to its legend bucket.
pub fn legend_buckets(centroids: &[ColoredCentroid], buckets: &[LegendBucket]) -> Legend {
    let mut legend = Legend::default();
    let mut groups: Vec<LegendGroup> = buckets
        .iter()
        .map(|b| LegendGroup {
            name: b.name.clone(),
            centroids: Vec::new(),
        })
        .collect();

    for c in centroids {
        let Some(grouping) = c.grouping.as_deref() else {
            legend.ungrouped.push(c.clone());
            continue;
        };
        match buckets.iter().position(|b| b.communities.iter().any(|x| x == grouping)) {
            Some(i) => groups[i].centroids.push(c.clone()),
            None => legend.uncategorized.push(c.clone()),
        }
    }

    legend.groups = groups.into_iter().filter(|g| !g.centroids.is_empty()).collect();
    legend
}
