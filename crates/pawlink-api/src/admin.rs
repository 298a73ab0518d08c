use axum::response::IntoResponse;
use axum::{Json, extract::State};
use tracing::warn;

use pawlink_types::api::{AnimalResponse, UserResponse};
use pawlink_types::models::Role;

use crate::animals::animal_response;
use crate::error::ApiError;
use crate::{AppState, parse_timestamp, parse_uuid};

/// Moderation view: every account, including its role.
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || Ok::<_, ApiError>(db.db.list_users()?))
        .await
        .map_err(ApiError::from_join)??;

    let users: Vec<UserResponse> = rows
        .iter()
        .map(|row| UserResponse {
            id: parse_uuid(&row.id, "user"),
            username: row.username.clone(),
            role: row.role.parse().unwrap_or_else(|e| {
                warn!("Corrupt role on user '{}': {}", row.id, e);
                Role::Regular
            }),
            created_at: parse_timestamp(&row.created_at, "user"),
        })
        .collect();

    Ok(Json(users))
}

/// Moderation view: every registered animal.
pub async fn list_animals(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || Ok::<_, ApiError>(db.db.list_animals()?))
        .await
        .map_err(ApiError::from_join)??;

    let animals: Vec<AnimalResponse> = rows.iter().map(animal_response).collect();
    Ok(Json(animals))
}
