use crate::dtos::{ImageRequest, ImageResponse, RootResponse};
use crate::services::HISTORY_LIMIT;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::extract::AppJson;

pub async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: state.converter.variant().service_name().to_string(),
    })
}

pub async fn pixelify(
    State(state): State<AppState>,
    AppJson(request): AppJson<ImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    let record = state.converter.convert(&request.image_base64).await?;

    state.store.insert(&record).await.map_err(|e| {
        tracing::error!(id = %record.id, "Failed to store conversion: {}", e);
        e
    })?;

    tracing::info!(id = %record.id, "Conversion stored");
    Ok(Json(record))
}

pub async fn history(State(state): State<AppState>) -> Result<Json<Vec<ImageResponse>>, AppError> {
    let records = state.store.recent(HISTORY_LIMIT).await.map_err(|e| {
        tracing::error!("Error fetching history: {}", e);
        e
    })?;

    Ok(Json(records))
}
