// Application context: the read-only tables every request works from.
//
// Built once at startup and shared as Arc<AppContext>. Requests clone only
// the rows they transform; nothing here is mutated after `load`.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::models::{CategoryInfo, CategoryWeight, Cell, ItemRecord, Key};
use crate::db::Database;
use crate::presentation::{self, CategoryOption};
use crate::ternary::proportions::{calculate_base_attributes, ProportionTable};

pub struct AppContext {
    pub config: Config,
    /// Item plot rows with TotalMentions and proportions already computed
    pub item_table: ProportionTable,
    /// Global TotalMentions range, fixed so the colour scale doesn't shift
    /// while the user searches
    pub mentions_range: (f64, f64),
    /// Raw centroid-plot items; proportions are recomputed per request
    pub centroid_items: Vec<ItemRecord>,
    pub country_weights: Vec<CategoryWeight>,
    pub country_info: Vec<CategoryInfo>,
    pub country_options: Vec<CategoryOption>,
}

impl AppContext {
    /// Load both plot sources and the country tables from the database.
    pub async fn load(db: &dyn Database, config: Config) -> Result<Self> {
        let item_plot = &config.item_plot;
        let item_records = db
            .load_items(item_plot.source, item_plot.model_id)
            .await
            .with_context(|| format!("Failed to load item plot data ({})", item_plot.source))?;

        let centroid_plot = &config.centroid_plot;
        let centroid_items = db
            .load_items(centroid_plot.source, centroid_plot.model_id)
            .await
            .with_context(|| format!("Failed to load centroid plot data ({})", centroid_plot.source))?;
        let country_weights = db.load_category_weights(centroid_plot.source).await?;
        let country_info = db.load_category_info().await?;

        Ok(Self::from_tables(
            config,
            item_records,
            centroid_items,
            country_weights,
            country_info,
        ))
    }

    /// Build the context from already-loaded tables.
    pub fn from_tables(
        config: Config,
        item_records: Vec<ItemRecord>,
        centroid_items: Vec<ItemRecord>,
        country_weights: Vec<CategoryWeight>,
        country_info: Vec<CategoryInfo>,
    ) -> Self {
        let layout = config.item_plot.source.layout();
        if item_records.is_empty() {
            warn!(source = %config.item_plot.source, "No data loaded for the item plot");
        }
        let mut item_table = calculate_base_attributes(&item_records, &layout.count_columns());

        if let Some(ids) = &config.item_plot.items_to_display {
            let mut wanted: Vec<Key> = Vec::with_capacity(ids.len());
            for raw in ids {
                match layout.key_kind.coerce(&Cell::Text(raw.clone())) {
                    Some(key) => wanted.push(key),
                    None => warn!(
                        id = %raw,
                        kind = ?layout.key_kind,
                        "Ignoring ITEM_PLOT_ITEMS_TO_DISPLAY id that does not match the item key kind"
                    ),
                }
            }
            let before = item_table.rows.len();
            item_table.rows.retain(|r| wanted.contains(&r.record.id));
            if item_table.rows.is_empty() && before > 0 {
                warn!("No items matched ITEM_PLOT_ITEMS_TO_DISPLAY");
            }
        }

        let mentions_range = presentation::mentions_range(&item_table.rows);
        info!(
            min = mentions_range.0,
            max = mentions_range.1,
            "Item plot global TotalMentions range"
        );

        if centroid_items.is_empty() {
            warn!(source = %config.centroid_plot.source, "No data loaded for the centroid plot");
        }
        let country_options = presentation::category_options(&country_info, &country_weights);
        info!(
            weights = country_weights.len(),
            countries = country_info.len(),
            options = country_options.len(),
            "Centroid plot country data ready"
        );

        Self {
            config,
            item_table,
            mentions_range,
            centroid_items,
            country_weights,
            country_info,
            country_options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CentroidPlotSettings, ItemPlotSettings};

    fn config(items_to_display: Option<Vec<String>>) -> Config {
        Config {
            db_path: ":memory:".into(),
            item_plot: ItemPlotSettings {
                items_to_display,
                ..ItemPlotSettings::default()
            },
            centroid_plot: CentroidPlotSettings::default(),
            port: 3000,
        }
    }

    fn item(id: i64, a: i64, g: i64, m: i64) -> ItemRecord {
        ItemRecord::new(id, format!("item {id}"))
            .with("count_A", a)
            .with("count_G", g)
            .with("count_BCDE", m)
    }

    #[test]
    fn test_items_to_display_filter() {
        let items = vec![item(1, 1, 2, 3), item(2, 4, 5, 6), item(3, 0, 1, 0)];
        let ctx = AppContext::from_tables(
            config(Some(vec!["3".into(), "1".into(), "x".into()])),
            items,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let ids: Vec<Key> = ctx.item_table.rows.iter().map(|r| r.record.id.clone()).collect();
        assert_eq!(ids, vec![Key::Int(1), Key::Int(3)]);
        assert_eq!(ctx.mentions_range, (1.0, 6.0));
    }

    #[test]
    fn test_items_to_display_with_only_mismatched_ids_keeps_nothing() {
        let items = vec![item(1, 1, 2, 3), item(2, 4, 5, 6)];
        let ctx = AppContext::from_tables(
            config(Some(vec!["x".into(), "1.5".into()])),
            items,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        assert!(ctx.item_table.rows.is_empty());
        assert_eq!(ctx.mentions_range, (0.0, 1.0));
    }

    #[test]
    fn test_empty_tables() {
        let ctx = AppContext::from_tables(config(None), Vec::new(), Vec::new(), Vec::new(), Vec::new());
        assert!(ctx.item_table.rows.is_empty());
        assert_eq!(ctx.mentions_range, (0.0, 1.0));
        assert!(ctx.country_options.is_empty());
    }
}
