use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, SwipeKind};

// -- JWT Claims --

/// JWT claims issued by the external identity service and verified by the
/// auth gate. Canonical definition lives here in pawlink-types so the gate
/// and tests share one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

// -- Animals --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterAnimalRequest {
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnimalResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub species: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Swipes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitSwipeRequest {
    pub swiper_id: Uuid,
    pub swiped_id: Uuid,
    pub action: SwipeKind,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub swiper_id: Uuid,
    pub swiped_id: Uuid,
    pub action: SwipeKind,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of a swipe submission. `match` is present whenever both sides
/// have a positive swipe on record; `match_created` tells whether this
/// submission was the one that materialized it.
#[derive(Debug, Serialize)]
pub struct SwipeOutcomeResponse {
    pub swipe: SwipeResponse,
    pub match_created: bool,
    #[serde(rename = "match")]
    pub match_record: Option<MatchResponse>,
}

// -- Matches --

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub id: Uuid,
    pub pet1: Uuid,
    pub pet2: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Match listing entry with the display fields a client needs to render a
/// match card without extra round trips.
#[derive(Debug, Serialize)]
pub struct MatchSummaryResponse {
    pub id: Uuid,
    pub pet1: MatchedPet,
    pub pet2: MatchedPet,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct MatchedPet {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Users (admin surface) --

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
