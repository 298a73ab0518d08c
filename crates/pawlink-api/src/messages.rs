use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use pawlink_db::Database;
use pawlink_db::models::{MatchRow, MessageRow};
use pawlink_types::api::{MessageResponse, SendMessageRequest};

use crate::error::ApiError;
use crate::gate::AuthContext;
use crate::{AppState, parse_timestamp, parse_uuid};

const MAX_MESSAGE_LEN: usize = 2000;

/// Only an owner of one of the match's two pets may touch its messages.
pub fn assert_participant(
    db: &Database,
    match_row: &MatchRow,
    user_id: Uuid,
) -> Result<(), ApiError> {
    let owned = db.animals_owned_by(&user_id.to_string())?;
    let participant = owned
        .iter()
        .any(|animal| animal.id == match_row.pet_a || animal.id == match_row.pet_b);

    if participant {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

fn send_message_sync(
    db: &Database,
    match_id: Uuid,
    user_id: Uuid,
    content: &str,
) -> Result<MessageRow, ApiError> {
    let match_row = db
        .get_match(&match_id.to_string())?
        .ok_or(ApiError::NotFound("match"))?;
    assert_participant(db, &match_row, user_id)?;

    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::InvalidInput("message content is empty".into()));
    }
    if content.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::InvalidInput(format!(
            "message content exceeds {MAX_MESSAGE_LEN} bytes"
        )));
    }

    Ok(db.insert_message(
        &Uuid::new_v4().to_string(),
        &match_row.id,
        &user_id.to_string(),
        content,
    )?)
}

fn list_messages_sync(
    db: &Database,
    match_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<MessageRow>, ApiError> {
    let match_row = db
        .get_match(&match_id.to_string())?
        .ok_or(ApiError::NotFound("match"))?;
    assert_participant(db, &match_row, user_id)?;

    Ok(db.messages_for_match(&match_row.id)?)
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        send_message_sync(&db.db, match_id, ctx.user_id, &req.content)
    })
    .await
    .map_err(ApiError::from_join)??;

    Ok((StatusCode::CREATED, Json(message_response(&row))))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows =
        tokio::task::spawn_blocking(move || list_messages_sync(&db.db, match_id, ctx.user_id))
            .await
            .map_err(ApiError::from_join)??;

    let messages: Vec<MessageResponse> = rows.iter().map(message_response).collect();
    Ok(Json(messages))
}

fn message_response(row: &MessageRow) -> MessageResponse {
    MessageResponse {
        id: parse_uuid(&row.id, "message"),
        match_id: parse_uuid(&row.match_id, "message match"),
        sender_id: parse_uuid(&row.sender_id, "message sender"),
        content: row.content.clone(),
        created_at: parse_timestamp(&row.created_at, "message"),
    }
}
