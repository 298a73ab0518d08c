use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use pawlink_db::Database;
use pawlink_db::models::{MatchRow, SwipeRow};
use pawlink_types::api::{SubmitSwipeRequest, SwipeOutcomeResponse, SwipeResponse};
use pawlink_types::models::{SwipeDirection, SwipeKind};

use crate::error::ApiError;
use crate::gate::AuthContext;
use crate::matches::match_response;
use crate::{AppState, parse_timestamp, parse_uuid};

/// Result of running a swipe through the detector: the recorded (possibly
/// overwritten) ledger entry, plus the match when both sides are positive.
#[derive(Debug)]
pub struct SwipeEvaluation {
    pub swipe: SwipeRow,
    pub match_created: bool,
    pub match_row: Option<MatchRow>,
}

/// Record a swipe and detect a mutual match.
///
/// The ledger upsert comes first, so a crash between the two steps loses
/// nothing: the next reciprocal swipe re-runs detection. A negative swipe
/// ends evaluation; it overwrites the ledger entry but never deletes a
/// match formed earlier. Match creation goes through the storage-level
/// create-if-absent, so losing a race to a concurrent reciprocal swipe
/// just reports the existing match instead of failing.
pub fn evaluate_swipe(
    db: &Database,
    swiper_id: Uuid,
    swiped_id: Uuid,
    action: SwipeKind,
) -> Result<SwipeEvaluation, ApiError> {
    if swiper_id == swiped_id {
        return Err(ApiError::InvalidInput(
            "an animal cannot swipe on itself".into(),
        ));
    }

    let swiper = swiper_id.to_string();
    let swiped = swiped_id.to_string();

    if db.get_animal(&swiper)?.is_none() || db.get_animal(&swiped)?.is_none() {
        return Err(ApiError::NotFound("animal"));
    }

    let swipe = db.upsert_swipe(&Uuid::new_v4().to_string(), &swiper, &swiped, action.as_str())?;

    if !action.is_positive() {
        return Ok(SwipeEvaluation {
            swipe,
            match_created: false,
            match_row: None,
        });
    }

    if !db.has_reciprocal_positive(&swiper, &swiped)? {
        return Ok(SwipeEvaluation {
            swipe,
            match_created: false,
            match_row: None,
        });
    }

    let (match_row, created) =
        db.create_match_if_absent(&Uuid::new_v4().to_string(), &swiper, &swiped)?;

    Ok(SwipeEvaluation {
        swipe,
        match_created: created,
        match_row: Some(match_row),
    })
}

/// Ownership check plus evaluation, as one blocking unit of work.
fn submit_swipe_sync(
    db: &Database,
    user_id: Uuid,
    req: &SubmitSwipeRequest,
) -> Result<SwipeEvaluation, ApiError> {
    let swiper = db
        .get_animal(&req.swiper_id.to_string())?
        .ok_or(ApiError::NotFound("animal"))?;
    if swiper.owner_id != user_id.to_string() {
        return Err(ApiError::Forbidden);
    }

    evaluate_swipe(db, req.swiper_id, req.swiped_id, req.action)
}

pub async fn submit_swipe(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<SubmitSwipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let evaluation =
        tokio::task::spawn_blocking(move || submit_swipe_sync(&db.db, ctx.user_id, &req))
            .await
            .map_err(ApiError::from_join)??;

    Ok((
        StatusCode::CREATED,
        Json(SwipeOutcomeResponse {
            swipe: swipe_response(&evaluation.swipe),
            match_created: evaluation.match_created,
            match_record: evaluation.match_row.as_ref().map(match_response),
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SwipeQuery {
    #[serde(default = "default_direction")]
    pub direction: SwipeDirection,
    pub action: Option<SwipeKind>,
}

fn default_direction() -> SwipeDirection {
    SwipeDirection::Sent
}

pub async fn list_swipes(
    State(state): State<AppState>,
    Path(animal_id): Path<Uuid>,
    Query(query): Query<SwipeQuery>,
    Extension(_ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let animal = animal_id.to_string();
        if db.db.get_animal(&animal)?.is_none() {
            return Err(ApiError::NotFound("animal"));
        }
        let action = query.action.map(|a| a.as_str());
        Ok(db.db.swipes_for_animal(&animal, query.direction, action)?)
    })
    .await
    .map_err(ApiError::from_join)??;

    let swipes: Vec<SwipeResponse> = rows.iter().map(swipe_response).collect();
    Ok(Json(swipes))
}

fn swipe_response(row: &SwipeRow) -> SwipeResponse {
    SwipeResponse {
        swiper_id: parse_uuid(&row.swiper_id, "swiper"),
        swiped_id: parse_uuid(&row.swiped_id, "swiped"),
        action: row.action.parse().unwrap_or_else(|e| {
            warn!("Corrupt swipe action on '{}': {}", row.id, e);
            SwipeKind::Ignore
        }),
        created_at: parse_timestamp(&row.created_at, "swipe"),
        updated_at: parse_timestamp(&row.updated_at, "swipe"),
    }
}
