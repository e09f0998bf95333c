// Item plot: every item as a bubble at its (unamplified) ternary position.
//
// Sizes are computed over the whole table before the search filter, so a
// bubble keeps its size no matter what else is visible.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::AppContext;
use crate::db::models::Key;
use crate::presentation::{hover_text, matches_search};
use crate::ternary::bubbles::{size_bubbles, BubbleSizing};
use crate::ternary::{Bloc, Ternary};

/// User controls for the item plot. Missing values use the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPlotRequest {
    pub search: Option<String>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub scaling_power: Option<f64>,
}

/// One bubble.
#[derive(Debug, Clone, Serialize)]
pub struct PlottedItem {
    pub id: Key,
    pub label: String,
    pub hover_text: String,
    pub total_mentions: f64,
    pub proportions: Ternary,
    pub size_px: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemPlotView {
    pub entity_label: String,
    pub items: Vec<PlottedItem>,
    /// Items shown (matched and with defined proportions)
    pub displayed: usize,
    /// Items matching the search term
    pub matched: usize,
    /// Items available in the app
    pub total: usize,
    /// Colour-scale range, fixed across searches
    pub mentions_range: (f64, f64),
    pub sizing: BubbleSizing,
    /// Blocs with no mentions anywhere in the corpus
    pub silent_blocs: Vec<Bloc>,
    pub status: String,
}

/// Build the item plot for one request.
pub fn run(ctx: &AppContext, request: &ItemPlotRequest) -> ItemPlotView {
    let settings = &ctx.config.item_plot;
    let sizing = BubbleSizing::clamped(
        request.min_size.unwrap_or(settings.sizing.min_size),
        request.max_size.unwrap_or(settings.sizing.max_size),
        request.scaling_power.unwrap_or(settings.sizing.scaling_power),
    );
    let entity_label = settings.source.layout().entity_label.to_string();
    let total = ctx.item_table.rows.len();

    if total == 0 {
        return ItemPlotView {
            entity_label,
            items: Vec::new(),
            displayed: 0,
            matched: 0,
            total: 0,
            mentions_range: ctx.mentions_range,
            sizing,
            silent_blocs: Vec::new(),
            status: "No data available to display.".to_string(),
        };
    }

    let mut rows = ctx.item_table.rows.clone();
    size_bubbles(&mut rows, &sizing);

    let search = request.search.as_deref().unwrap_or("").trim();
    let matched_rows: Vec<_> = rows
        .into_iter()
        .filter(|r| matches_search(&r.record, search))
        .collect();
    let matched = matched_rows.len();

    let items: Vec<PlottedItem> = matched_rows
        .into_iter()
        .filter_map(|r| {
            Some(PlottedItem {
                proportions: r.proportions?,
                size_px: r.size_px.unwrap_or(sizing.min_size),
                hover_text: hover_text(&r.record, settings.prepend_id_hover),
                total_mentions: r.total_mentions,
                id: r.record.id,
                label: r.record.label,
            })
        })
        .collect();
    let displayed = items.len();

    let mut status = format!(
        "Displaying {displayed} of {total} items {}(Total available in app: {total} items).",
        if search.is_empty() { "" } else { "matching search " }
    );
    let silent_blocs = ctx.item_table.silent_blocs.clone();
    status.push_str(&silent_note(&silent_blocs));
    debug!(displayed, matched, total, "Item plot built");

    ItemPlotView {
        entity_label,
        items,
        displayed,
        matched,
        total,
        mentions_range: ctx.mentions_range,
        sizing,
        silent_blocs,
        status,
    }
}

/// Status suffix naming blocs whose count column is zero across the corpus.
pub fn silent_note(blocs: &[Bloc]) -> String {
    if blocs.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = blocs.iter().map(Bloc::as_str).collect();
    format!(" Note: no mentions in the corpus for the {} bloc(s).", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CentroidPlotSettings, Config, ItemPlotSettings};
    use crate::db::models::ItemRecord;

    fn config() -> Config {
        Config {
            db_path: ":memory:".into(),
            item_plot: ItemPlotSettings::default(),
            centroid_plot: CentroidPlotSettings::default(),
            port: 3000,
        }
    }

    fn ctx() -> AppContext {
        let item = |id: i64, label: &str, a: i64, g: i64, m: i64| {
            ItemRecord::new(id, label)
                .with("count_A", a)
                .with("count_G", g)
                .with("count_BCDE", m)
        };
        AppContext::from_tables(
            config(),
            vec![
                item(1, "capacity building", 10, 2, 5),
                item(2, "sovereignty", 1, 12, 3),
                item(3, "silence", 0, 0, 0),
                item(4, "capacity gaps", 3, 3, 3),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_drops_undefined_rows() {
        let view = run(&ctx(), &ItemPlotRequest::default());
        assert_eq!(view.total, 4);
        assert_eq!(view.matched, 4);
        assert_eq!(view.displayed, 3);
        assert!(view.items.iter().all(|i| i.id != Key::Int(3)));
        assert_eq!(view.items[0].hover_text, "1: capacity building");
    }

    #[test]
    fn test_search_filters_but_keeps_global_sizes() {
        let ctx = ctx();
        let all = run(&ctx, &ItemPlotRequest::default());
        let filtered = run(
            &ctx,
            &ItemPlotRequest {
                search: Some("CAPACITY".into()),
                ..Default::default()
            },
        );
        assert_eq!(filtered.matched, 2);
        assert_eq!(filtered.displayed, 2);
        assert_eq!(filtered.items[0].size_px, all.items[0].size_px);
        assert_eq!(
            filtered.status,
            "Displaying 2 of 4 items matching search (Total available in app: 4 items)."
        );
    }

    #[test]
    fn test_silent_bloc_reported_in_status() {
        let ctx = AppContext::from_tables(
            config(),
            vec![
                ItemRecord::new(1, "a").with("count_A", 0).with("count_G", 2).with("count_BCDE", 1),
                ItemRecord::new(2, "b").with("count_A", 0).with("count_G", 1).with("count_BCDE", 4),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let view = run(&ctx, &ItemPlotRequest::default());
        assert_eq!(view.silent_blocs, vec![Bloc::Us]);
        assert!(view.status.ends_with("Note: no mentions in the corpus for the US bloc(s)."));
    }

    #[test]
    fn test_controls_are_clamped() {
        let view = run(
            &ctx(),
            &ItemPlotRequest {
                min_size: Some(-5.0),
                max_size: Some(-10.0),
                scaling_power: Some(100.0),
                ..Default::default()
            },
        );
        assert_eq!(view.sizing.min_size, 1.0);
        assert_eq!(view.sizing.max_size, 2.0);
        assert_eq!(view.sizing.scaling_power, 5.0);
        assert!(view.items.iter().all(|i| (1.0..=2.0).contains(&i.size_px)));
    }
}
