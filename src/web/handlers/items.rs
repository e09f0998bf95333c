// GET /api/items: the item plot.
//
// Query: ?search=&min_size=&max_size=&scaling_power=
// Missing or blank controls fall back to the configured defaults;
// out-of-range values are clamped rather than rejected.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::blank_as_none;
use crate::pipeline::item_plot::{self, ItemPlotRequest};
use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct ItemQuery {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_size: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub max_size: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub scaling_power: Option<f64>,
}

impl From<ItemQuery> for ItemPlotRequest {
    fn from(q: ItemQuery) -> Self {
        ItemPlotRequest {
            search: q.search,
            min_size: q.min_size,
            max_size: q.max_size,
            scaling_power: q.scaling_power,
        }
    }
}

pub async fn get_item_plot(
    State(state): State<AppState>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Response {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.body_text()),
    };
    let request = ItemPlotRequest::from(params);
    Json(item_plot::run(&state.ctx, &request)).into_response()
}
