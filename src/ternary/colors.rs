// Colour assignment for country centroids.
//
// Each country centroid takes the colour of its voting community via the
// country metadata table. Anything that can't be resolved falls back to the
// default colour; this step never drops a centroid.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use super::centroids::Centroid;
use crate::db::models::{CategoryInfo, Key};

/// Grouping value (community label) to display colour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorMap(pub BTreeMap<String, String>);

impl ColorMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The colour used when a grouping is missing or unmapped:
    /// the map's entry for `default_key`, or the key itself.
    pub fn default_color(&self, default_key: &str) -> String {
        self.get(default_key).unwrap_or(default_key).to_string()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for ColorMap {
    fn from(entries: [(&str, &str); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// A centroid with its resolved community and display colour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColoredCentroid {
    #[serde(flatten)]
    pub centroid: Centroid,
    pub grouping: Option<String>,
    pub color: String,
}

/// Attach a grouping and colour to every centroid, preserving order.
pub fn assign_colors(
    centroids: Vec<Centroid>,
    info: &[CategoryInfo],
    color_map: &ColorMap,
    default_key: &str,
) -> Vec<ColoredCentroid> {
    let default_color = color_map.default_color(default_key);

    if centroids.is_empty() {
        return Vec::new();
    }
    if info.is_empty() {
        warn!("Category metadata is empty, all centroids get the default colour");
    }

    // First occurrence of each id wins.
    let mut by_id: HashMap<&Key, &CategoryInfo> = HashMap::with_capacity(info.len());
    for row in info {
        by_id.entry(&row.id).or_insert(row);
    }

    centroids
        .into_iter()
        .map(|centroid| {
            let grouping = centroid
                .category_id
                .as_ref()
                .and_then(|id| by_id.get(id))
                .and_then(|meta| meta.grouping.clone());

            let color = match grouping.as_deref().and_then(|g| color_map.get(g)) {
                Some(c) => c.to_string(),
                None => {
                    debug!(centroid = %centroid.name, ?grouping, "Using default colour");
                    default_color.clone()
                }
            };

            ColoredCentroid {
                centroid,
                grouping,
                color,
            }
        })
        .collect()
}
