// GET /api/settings: defaults and ranges the front end needs to draw its
// controls before the first plot request.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::pipeline::centroid_plot::POWER_RANGE;
use crate::web::AppState;

pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.ctx.config;
    Json(serde_json::json!({
        "item_plot": {
            "source": config.item_plot.source.as_str(),
            "entity_label": config.item_plot.source.layout().entity_label,
            "min_size": config.item_plot.sizing.min_size,
            "max_size": config.item_plot.sizing.max_size,
            "scaling_power": config.item_plot.sizing.scaling_power,
            "mentions_range": state.ctx.mentions_range,
            "total_items": state.ctx.item_table.rows.len(),
        },
        "centroid_plot": {
            "source": config.centroid_plot.source.as_str(),
            "entity_label": config.centroid_plot.source.layout().entity_label,
            "power": config.centroid_plot.amplification_power,
            "power_range": POWER_RANGE,
            "default_countries": config.centroid_plot.default_countries,
        },
    }))
}
