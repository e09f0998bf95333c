// GET /api/centroids: the amplified centroid plot.
//
// Query: ?power=2.5&countries=USA,RUS (countries may also be a JSON array)

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::blank_as_none;
use crate::config::parse_list;
use crate::pipeline::centroid_plot::{self, CentroidPlotRequest};
use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct CentroidQuery {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub power: Option<f64>,
    pub countries: Option<String>,
}

impl From<CentroidQuery> for CentroidPlotRequest {
    fn from(q: CentroidQuery) -> Self {
        CentroidPlotRequest {
            power: q.power,
            countries: q.countries.as_deref().and_then(parse_list).unwrap_or_default(),
        }
    }
}

pub async fn get_centroid_plot(
    State(state): State<AppState>,
    query: Result<Query<CentroidQuery>, QueryRejection>,
) -> Response {
    let Query(params) = match query {
        Ok(q) => q,
        Err(e) => return api_error(StatusCode::BAD_REQUEST, &e.body_text()),
    };
    let request = CentroidPlotRequest::from(params);
    Json(centroid_plot::run(&state.ctx, &request)).into_response()
}
