// Centroid plot: where each voting group and each country "sits" once item
// positions are amplified.
//
// Steps: proportions -> drop undefined -> amplify -> drop undefined ->
// group centroids -> country centroids -> colours -> legend.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::DataSource;
use crate::context::AppContext;
use crate::db::models::Key;
use crate::pipeline::item_plot::silent_note;
use crate::presentation::{legend_buckets, Legend};
use crate::ternary::amplify::amplify;
use crate::ternary::centroids::{categorical_centroids, group_centroids, Centroid, GroupDefinition};
use crate::ternary::colors::{assign_colors, ColoredCentroid};
use crate::ternary::proportions::calculate_base_attributes;
use crate::ternary::Bloc;

/// Allowed range for the amplification slider.
pub const POWER_RANGE: (f64, f64) = (1.0, 3.0);

/// User controls for the centroid plot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CentroidPlotRequest {
    pub power: Option<f64>,
    /// Country ids to plot; empty means the configured default selection
    #[serde(default)]
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CentroidPlotView {
    pub entity_label: String,
    pub power: f64,
    /// Items that contributed (defined amplified coordinates)
    pub items_used: usize,
    pub group_centroids: Vec<Centroid>,
    pub country_centroids: Vec<ColoredCentroid>,
    pub legend: Legend,
    /// Blocs with no mentions anywhere in the corpus
    pub silent_blocs: Vec<Bloc>,
    pub status: String,
}

impl CentroidPlotView {
    fn empty(entity_label: String, power: f64, status: &str) -> Self {
        error!(status, "Centroid plot unavailable");
        Self {
            entity_label,
            power,
            items_used: 0,
            group_centroids: Vec::new(),
            country_centroids: Vec::new(),
            legend: Legend::default(),
            silent_blocs: Vec::new(),
            status: status.to_string(),
        }
    }
}

/// Clamp a requested power into the slider range; missing or non-finite
/// values use the configured default.
pub fn clamp_power(requested: Option<f64>, default: f64) -> f64 {
    let power = requested.filter(|p| p.is_finite()).unwrap_or(default);
    let power = if power.is_finite() { power } else { POWER_RANGE.0 };
    power.clamp(POWER_RANGE.0, POWER_RANGE.1)
}

/// Build the centroid plot for one request.
pub fn run(ctx: &AppContext, request: &CentroidPlotRequest) -> CentroidPlotView {
    let settings = &ctx.config.centroid_plot;
    let layout = settings.source.layout();
    let entity_label = layout.entity_label.to_string();
    let power = clamp_power(request.power, settings.amplification_power);

    if ctx.centroid_items.is_empty() {
        return CentroidPlotView::empty(
            entity_label,
            power,
            "Error: Base item data is missing or empty for centroid calculation.",
        );
    }

    let columns = layout.count_columns();
    let table = calculate_base_attributes(&ctx.centroid_items, &columns);
    let silent_blocs = table.silent_blocs.clone();
    let mut rows = table.into_defined();
    if rows.is_empty() {
        return CentroidPlotView::empty(
            entity_label,
            power,
            "Error: No items with valid proportions after base attribute calculation.",
        );
    }

    amplify(&mut rows, power);
    rows.retain(|r| r.amplified.is_some());
    if rows.is_empty() {
        return CentroidPlotView::empty(
            entity_label,
            power,
            "Error: No items with valid amplified coordinates.",
        );
    }

    let definitions: Vec<GroupDefinition> = settings.groups.iter().map(|g| g.resolve(&columns)).collect();
    let groups = group_centroids(&rows, &definitions);

    let mut status = String::new();
    if settings.source != DataSource::Ngrams {
        status.push_str(" Note: Country centroids are typically for 'ngrams'.");
    }

    let selected: Vec<Key> = request
        .countries
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(Key::from)
        .collect();

    let mut country_centroids = Vec::new();
    if ctx.country_weights.is_empty() || ctx.country_info.is_empty() {
        status.push_str(" Country weight or info data missing. Cannot plot country centroids.");
    } else {
        let allow: Option<&[Key]> = if !selected.is_empty() {
            Some(selected.as_slice())
        } else {
            settings.default_countries.as_deref()
        };

        let centroids = match allow {
            Some([]) => {
                info!("No countries selected or defaulted for centroid calculation");
                Vec::new()
            }
            _ => categorical_centroids(&rows, &ctx.country_weights, allow, &settings.country_style),
        };

        if centroids.is_empty() && (!selected.is_empty() || settings.default_countries.is_none()) {
            status.push_str(" No country centroids calculated for selected/available countries.");
        }
        country_centroids = assign_colors(
            centroids,
            &ctx.country_info,
            &settings.color_map,
            &settings.default_color_key,
        );
    }

    let legend = legend_buckets(&country_centroids, &settings.legend);

    if groups.is_empty() && country_centroids.is_empty() {
        status = "No centroid data to display for current settings.".to_string();
    }
    if status.is_empty() {
        status = format!("Plot updated. Power: {power}.");
        if !selected.is_empty() {
            status.push_str(&format!(" Selected countries: {}.", selected.len()));
        } else if let Some(defaults) = &settings.default_countries {
            status.push_str(&format!(
                " Displaying default list of {} country centroids.",
                defaults.len()
            ));
        } else {
            status.push_str(" Displaying all available country centroids.");
        }
    }

    let no_data: Vec<&str> = groups
        .iter()
        .chain(country_centroids.iter().map(|c| &c.centroid))
        .filter(|c| !c.has_data())
        .map(|c| c.name.as_str())
        .collect();
    if !no_data.is_empty() {
        status.push_str(&format!(" No data for: {}.", no_data.join(", ")));
    }
    status.push_str(&silent_note(&silent_blocs));

    info!(
        power,
        items = rows.len(),
        groups = groups.len(),
        countries = country_centroids.len(),
        "Centroid plot built"
    );

    CentroidPlotView {
        entity_label,
        power,
        items_used: rows.len(),
        group_centroids: groups,
        country_centroids,
        legend,
        silent_blocs,
        status: status.trim().to_string(),
    }
}
