// Weighted centroids in amplified ternary space.
//
// Two flavours share the same averaging rule:
// - group centroids weight every item by one of its own columns
//   (e.g. the US-like count for the "US focus" centroid)
// - categorical centroids weight items by an external (item, category,
//   weight) table, giving one centroid per category (per country)
//
// A centroid with no qualifying items sits at the geometric centre with
// total_weight = 0. Callers must use `has_data()` to tell that sentinel
// apart from a real centroid that happens to land on the centre.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{non_negative, ItemRow, Ternary};
use crate::db::models::{CategoryWeight, Key};

/// A named group whose centroid is weighted by one item column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub name: String,
    /// Item column holding each item's weight for this group
    pub weight_column: Option<String>,
    pub label: String,
    pub marker_symbol: String,
    pub marker_color: String,
}

/// Display defaults for categorical centroids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCentroidStyle {
    pub label_prefix: String,
    pub marker_symbol: String,
    pub marker_color: String,
}

impl Default for CategoryCentroidStyle {
    fn default() -> Self {
        Self {
            label_prefix: "Centroid: ".to_string(),
            marker_symbol: "circle".to_string(),
            marker_color: "purple".to_string(),
        }
    }
}

/// The weighted-average position of a set of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub name: String,
    /// Raw category id for categorical centroids
    pub category_id: Option<Key>,
    pub position: Ternary,
    pub label: String,
    pub marker_symbol: String,
    pub marker_color: String,
    pub total_weight: f64,
}

impl Centroid {
    /// False for the "no data" sentinel.
    pub fn has_data(&self) -> bool {
        self.total_weight > 0.0
    }
}

/// Weighted mean of `(weight, point)` pairs, skipping non-positive weights.
/// Returns the centre and 0 when nothing qualifies.
fn weighted_mean<I>(points: I) -> (Ternary, f64)
where
    I: IntoIterator<Item = (f64, Ternary)>,
{
    let mut total = 0.0;
    let mut acc = Ternary::ZERO;
    for (w, p) in points {
        if w <= 0.0 {
            continue;
        }
        total += w;
        acc = Ternary::new(acc.us + w * p.us, acc.russia + w * p.russia, acc.middle + w * p.middle);
    }
    if total > 0.0 {
        (acc.scale(total), total)
    } else {
        (Ternary::CENTER, 0.0)
    }
}

/// Compute one centroid per group definition, in definition order.
///
/// Groups with no bound weight column, or whose column is absent from the
/// table, are skipped with a warning.
pub fn group_centroids(rows: &[ItemRow], groups: &[GroupDefinition]) -> Vec<Centroid> {
    let mut centroids = Vec::with_capacity(groups.len());

    for group in groups {
        let Some(weight_column) = group.weight_column.as_deref() else {
            warn!(group = %group.name, "No weight column bound for group, skipping centroid");
            continue;
        };
        if !rows.is_empty() && !rows.iter().any(|r| r.record.has_column(weight_column)) {
            warn!(
                group = %group.name,
                column = weight_column,
                "Weight column not found in items, skipping centroid"
            );
            continue;
        }

        let (position, total_weight) = weighted_mean(rows.iter().filter_map(|r| {
            let point = r.amplified?;
            Some((non_negative(r.record.number(weight_column)), point))
        }));

        if total_weight == 0.0 {
            warn!(
                group = %group.name,
                "No valid items with positive weight, centroid set to geometric centre"
            );
        }

        centroids.push(Centroid {
            name: group.name.clone(),
            category_id: None,
            position,
            label: group.label.clone(),
            marker_symbol: group.marker_symbol.clone(),
            marker_color: group.marker_color.clone(),
            total_weight,
        });
    }

    info!(centroids = centroids.len(), "Calculated weighted group centroids");
    centroids
}

/// Compute one centroid per category from an external weights table.
///
/// `categories` restricts (and orders) the output; `None` means every
/// category that survives the join, in join order.
pub fn categorical_centroids(
    rows: &[ItemRow],
    weights: &[CategoryWeight],
    categories: Option<&[Key]>,
    style: &CategoryCentroidStyle,
) -> Vec<Centroid> {
    if rows.is_empty() {
        warn!("Item table is empty, no categorical centroids calculated");
        return Vec::new();
    }
    if weights.is_empty() {
        warn!("Category weights table is empty, no categorical centroids calculated");
        return Vec::new();
    }

    let mut weights_by_item: HashMap<&Key, Vec<&CategoryWeight>> = HashMap::new();
    for w in weights {
        weights_by_item.entry(&w.item_id).or_default().push(w);
    }

    // Inner join, ordered by the item table first, then by weight-table order.
    let joined: Vec<(&ItemRow, &CategoryWeight)> = rows
        .iter()
        .flat_map(|row| {
            weights_by_item
                .get(&row.record.id)
                .into_iter()
                .flatten()
                .map(move |w| (row, *w))
        })
        .collect();

    if joined.is_empty() {
        let item_kind = rows[0].record.id.kind();
        let weight_kind = weights[0].item_id.kind();
        if item_kind != weight_kind {
            warn!(
                items = ?item_kind,
                weights = ?weight_kind,
                "Item id kinds differ between items and category weights, join is empty"
            );
        } else {
            warn!("No common items found between items and category weights");
        }
        return Vec::new();
    }

    let mut present: Vec<&Key> = Vec::new();
    let mut seen: HashSet<&Key> = HashSet::new();
    for (_, w) in &joined {
        if seen.insert(&w.category_id) {
            present.push(&w.category_id);
        }
    }

    let selected: Vec<&Key> = match categories {
        Some(allow) => {
            let chosen: Vec<&Key> = allow.iter().filter(|c| seen.contains(c)).collect();
            if chosen.is_empty() {
                info!("None of the requested categories were found in the data");
                return Vec::new();
            }
            chosen
        }
        None => present,
    };

    let centroids: Vec<Centroid> = selected
        .into_iter()
        .map(|category| {
            let (position, total_weight) = weighted_mean(
                joined
                    .iter()
                    .filter(|(_, w)| &w.category_id == category)
                    .filter_map(|(row, w)| Some((non_negative(Some(w.weight)), row.amplified?))),
            );
            if total_weight == 0.0 {
                warn!(
                    category = %category,
                    "No valid items or zero total weight, centroid set to geometric centre"
                );
            }
            Centroid {
                name: category.to_string(),
                category_id: Some(category.clone()),
                position,
                label: format!("{}{}", style.label_prefix, category),
                marker_symbol: style.marker_symbol.clone(),
                marker_color: style.marker_color.clone(),
                total_weight,
            }
        })
        .collect();

    info!(centroids = centroids.len(), "Calculated categorical item centroids");
    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ItemRecord;

    fn amplified_row(id: i64, p: Ternary, weight: i64) -> ItemRow {
        let mut row = ItemRow::new(ItemRecord::new(id, format!("i{id}")).with("w", weight));
        row.amplified = Some(p);
        row
    }

    fn group(weight_column: Option<&str>) -> GroupDefinition {
        GroupDefinition {
            name: "G".into(),
            weight_column: weight_column.map(str::to_string),
            label: "Group".into(),
            marker_symbol: "diamond".into(),
            marker_color: "blue".into(),
        }
    }

    #[test]
    fn test_group_weighted_mean() {
        let rows = vec![
            amplified_row(1, Ternary::new(1.0, 0.0, 0.0), 1),
            amplified_row(2, Ternary::new(0.0, 1.0, 0.0), 3),
        ];
        let c = group_centroids(&rows, &[group(Some("w"))]);
        assert_eq!(c.len(), 1);
        assert!((c[0].position.us - 0.25).abs() < 1e-12);
        assert!((c[0].position.russia - 0.75).abs() < 1e-12);
        assert_eq!(c[0].total_weight, 4.0);
        assert!(c[0].has_data());
    }

    #[test]
    fn test_group_all_zero_weights_is_sentinel() {
        let rows = vec![
            amplified_row(1, Ternary::new(0.9, 0.05, 0.05), 0),
            amplified_row(2, Ternary::new(0.1, 0.8, 0.1), 0),
            amplified_row(3, Ternary::new(0.0, 0.0, 1.0), 0),
        ];
        let c = group_centroids(&rows, &[group(Some("w"))]);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].position, Ternary::CENTER);
        assert_eq!(c[0].total_weight, 0.0);
        assert!(!c[0].has_data());
    }

    #[test]
    fn test_group_unbound_or_missing_column_skipped() {
        let rows = vec![amplified_row(1, Ternary::CENTER, 1)];
        let c = group_centroids(&rows, &[group(None), group(Some("nope")), group(Some("w"))]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_group_ignores_rows_without_coordinates() {
        let mut rows = vec![
            amplified_row(1, Ternary::new(0.0, 0.0, 1.0), 2),
            amplified_row(2, Ternary::new(1.0, 0.0, 0.0), 5),
        ];
        rows[1].amplified = None;
        let c = group_centroids(&rows, &[group(Some("w"))]);
        assert_eq!(c[0].position, Ternary::new(0.0, 0.0, 1.0));
        assert_eq!(c[0].total_weight, 2.0);
    }

    #[test]
    fn test_categorical_allow_list_order() {
        let rows = vec![amplified_row(1, Ternary::new(0.5, 0.5, 0.0), 0)];
        let weights = vec![
            CategoryWeight { item_id: Key::Int(1), category_id: "USA".into(), weight: 1.0 },
            CategoryWeight { item_id: Key::Int(1), category_id: "RUS".into(), weight: 1.0 },
        ];
        let allow = vec![Key::from("RUS"), Key::from("XXX"), Key::from("USA")];
        let c = categorical_centroids(&rows, &weights, Some(&allow), &CategoryCentroidStyle::default());
        let names: Vec<&str> = c.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["RUS", "USA"]);
        assert_eq!(c[0].label, "Centroid: RUS");
    }

    #[test]
    fn test_categorical_allow_list_absent_is_empty() {
        let rows = vec![amplified_row(1, Ternary::CENTER, 0)];
        let weights = vec![CategoryWeight { item_id: Key::Int(1), category_id: "USA".into(), weight: 1.0 }];
        let allow = vec![Key::from("FRA")];
        let c = categorical_centroids(&rows, &weights, Some(&allow), &CategoryCentroidStyle::default());
        assert!(c.is_empty());
    }

    #[test]
    fn test_categorical_zero_weight_category_is_sentinel() {
        let rows = vec![amplified_row(1, Ternary::new(1.0, 0.0, 0.0), 0)];
        let weights = vec![CategoryWeight { item_id: Key::Int(1), category_id: "USA".into(), weight: 0.0 }];
        let c = categorical_centroids(&rows, &weights, None, &CategoryCentroidStyle::default());
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].position, Ternary::CENTER);
        assert!(!c[0].has_data());
    }

    #[test]
    fn test_categorical_key_kind_mismatch_is_empty() {
        let rows = vec![amplified_row(1, Ternary::CENTER, 0)];
        let weights = vec![CategoryWeight { item_id: Key::from("1"), category_id: "USA".into(), weight: 1.0 }];
        let c = categorical_centroids(&rows, &weights, None, &CategoryCentroidStyle::default());
        assert!(c.is_empty());
    }
}
