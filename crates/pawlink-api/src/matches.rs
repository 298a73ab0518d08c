use axum::response::IntoResponse;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use pawlink_db::models::{MatchRow, MatchSummaryRow};
use pawlink_types::api::{MatchResponse, MatchSummaryResponse, MatchedPet};

use crate::error::ApiError;
use crate::gate::AuthContext;
use crate::{AppState, parse_timestamp, parse_uuid};

/// All matches the animal participates in, on either side of the stored
/// pair, with both pets' display fields denormalized for the client.
/// Storage order of the pair carries no meaning; callers get it as-is.
pub async fn list_matches(
    State(state): State<AppState>,
    Path(animal_id): Path<Uuid>,
    Extension(_ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let animal = animal_id.to_string();
        if db.db.get_animal(&animal)?.is_none() {
            return Err(ApiError::NotFound("animal"));
        }
        Ok(db.db.matches_for_animal(&animal)?)
    })
    .await
    .map_err(ApiError::from_join)??;

    let matches: Vec<MatchSummaryResponse> = rows.iter().map(summary_response).collect();
    Ok(Json(matches))
}

pub(crate) fn match_response(row: &MatchRow) -> MatchResponse {
    MatchResponse {
        id: parse_uuid(&row.id, "match"),
        pet1: parse_uuid(&row.pet_a, "match pet"),
        pet2: parse_uuid(&row.pet_b, "match pet"),
        created_at: parse_timestamp(&row.created_at, "match"),
    }
}

fn summary_response(row: &MatchSummaryRow) -> MatchSummaryResponse {
    MatchSummaryResponse {
        id: parse_uuid(&row.id, "match"),
        pet1: MatchedPet {
            id: parse_uuid(&row.pet_a, "match pet"),
            name: row.pet_a_name.clone(),
            image_url: row.pet_a_image_url.clone(),
        },
        pet2: MatchedPet {
            id: parse_uuid(&row.pet_b, "match pet"),
            name: row.pet_b_name.clone(),
            image_url: row.pet_b_image_url.clone(),
        },
        created_at: parse_timestamp(&row.created_at, "match"),
    }
}
