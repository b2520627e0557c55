use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use posterflow_store::{NewPoster, Poster};

use crate::app::AppState;
use crate::http::{store_error, ApiError};

/// POST /posters — register poster template metadata. Image bytes live in
/// external storage keyed by the poster ID.
pub async fn create_poster(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewPoster>,
) -> Result<(StatusCode, Json<Poster>), ApiError> {
    let poster = state.posters.insert(&new).map_err(store_error)?;
    tracing::info!(poster_id = %poster.id, "poster registered");
    Ok((StatusCode::CREATED, Json(poster)))
}

/// GET /posters
pub async fn list_posters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Poster>>, ApiError> {
    let posters = state.posters.list().map_err(store_error)?;
    Ok(Json(posters))
}
