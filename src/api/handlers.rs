use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::{Query, QueryRejection};
use std::sync::Arc;
use std::time::Instant;

use crate::data_models::{SearchResult, ShakespeareWork, Title};
use crate::query_engine::{QueryEngine, SearchOptions};

use super::models::ApiError;

pub async fn search_handler(
    State(query_engine): State<Arc<QueryEngine>>,
    options: Result<Query<SearchOptions>, QueryRejection>,
) -> Result<Json<SearchResult>, ApiError> {
    let start = Instant::now();
    let Query(options) = options.map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = query_engine.search(&options).await?;

    log::info!(
        "search q={:?} fuzziness={} -> {} results in {} ms",
        options.query,
        options.fuzziness,
        result.meta.total_results,
        start.elapsed().as_millis()
    );
    Ok(Json(result))
}

pub async fn titles_handler(State(query_engine): State<Arc<QueryEngine>>) -> Json<Vec<Title>> {
    Json(query_engine.store().list_titles().await)
}

pub async fn work_handler(
    State(query_engine): State<Arc<QueryEngine>>,
    Path(id): Path<String>,
) -> Result<Json<ShakespeareWork>, ApiError> {
    let not_found = || ApiError::NotFound(format!("work not found: {}", id));
    let work_id: u32 = id.parse().map_err(|_| not_found())?;
    let work = query_engine.store().get_work(work_id).await?;
    Ok(Json(work))
}
