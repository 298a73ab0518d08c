/// Database row types, mapping directly to SQLite rows.
/// Distinct from pawlink-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug)]
pub struct AnimalRow {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct SwipeRow {
    pub id: String,
    pub swiper_id: String,
    pub swiped_id: String,
    pub action: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug)]
pub struct MatchRow {
    pub id: String,
    pub pet_a: String,
    pub pet_b: String,
    pub created_at: String,
}

/// Match row joined with both animals' display fields for listing.
pub struct MatchSummaryRow {
    pub id: String,
    pub pet_a: String,
    pub pet_a_name: String,
    pub pet_a_image_url: Option<String>,
    pub pet_b: String,
    pub pet_b_name: String,
    pub pet_b_image_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct MessageRow {
    pub id: String,
    pub match_id: String,
    pub sender_id: String,
    pub content: String,
    pub created_at: String,
}
