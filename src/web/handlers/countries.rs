// GET /api/countries: options for the country picker.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::web::AppState;

pub async fn list_countries(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ctx.country_options.clone())
}
