use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use pawlink_db::Database;
use pawlink_db::models::AnimalRow;
use pawlink_types::api::{AnimalResponse, RegisterAnimalRequest};

use crate::error::ApiError;
use crate::gate::AuthContext;
use crate::{AppState, parse_timestamp, parse_uuid};

const MAX_NAME_LEN: usize = 64;
const MAX_SPECIES_LEN: usize = 32;
const MAX_BIO_LEN: usize = 1000;

fn register_animal_sync(
    db: &Database,
    owner_id: Uuid,
    req: &RegisterAnimalRequest,
) -> Result<AnimalRow, ApiError> {
    let name = req.name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(ApiError::InvalidInput(format!(
            "name must be 1..={MAX_NAME_LEN} characters"
        )));
    }
    let species = req.species.trim();
    if species.is_empty() || species.len() > MAX_SPECIES_LEN {
        return Err(ApiError::InvalidInput(format!(
            "species must be 1..={MAX_SPECIES_LEN} characters"
        )));
    }
    if req.bio.as_deref().is_some_and(|b| b.len() > MAX_BIO_LEN) {
        return Err(ApiError::InvalidInput(format!(
            "bio exceeds {MAX_BIO_LEN} characters"
        )));
    }

    // The identity service mints the token; the account row must already be
    // mirrored here before it can own animals.
    if db.get_user_by_id(&owner_id.to_string())?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    Ok(db.create_animal(
        &Uuid::new_v4().to_string(),
        &owner_id.to_string(),
        name,
        species,
        req.bio.as_deref(),
        req.image_url.as_deref(),
    )?)
}

pub async fn register_animal(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(req): Json<RegisterAnimalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || register_animal_sync(&db.db, ctx.user_id, &req))
        .await
        .map_err(ApiError::from_join)??;

    Ok((StatusCode::CREATED, Json(animal_response(&row))))
}

pub async fn get_animal(
    State(state): State<AppState>,
    Path(animal_id): Path<Uuid>,
    Extension(_ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = tokio::task::spawn_blocking(move || {
        Ok::<_, ApiError>(db.db.get_animal(&animal_id.to_string())?)
    })
    .await
    .map_err(ApiError::from_join)??
    .ok_or(ApiError::NotFound("animal"))?;

    Ok(Json(animal_response(&row)))
}

/// Roster for the provider surface: every animal registered under the
/// calling account.
pub async fn provider_roster(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        Ok::<_, ApiError>(db.db.animals_owned_by(&ctx.user_id.to_string())?)
    })
    .await
    .map_err(ApiError::from_join)??;

    let animals: Vec<AnimalResponse> = rows.iter().map(animal_response).collect();
    Ok(Json(animals))
}

pub(crate) fn animal_response(row: &AnimalRow) -> AnimalResponse {
    AnimalResponse {
        id: parse_uuid(&row.id, "animal"),
        owner_id: parse_uuid(&row.owner_id, "animal owner"),
        name: row.name.clone(),
        species: row.species.clone(),
        bio: row.bio.clone(),
        image_url: row.image_url.clone(),
        created_at: parse_timestamp(&row.created_at, "animal"),
    }
}

#[cfg(test)]
mod tests {
    use pawlink_types::models::Role;

    use super::*;
    use crate::test_util::{seed_user, test_state};

    fn request(name: &str, species: &str) -> RegisterAnimalRequest {
        RegisterAnimalRequest {
            name: name.into(),
            species: species.into(),
            bio: None,
            image_url: None,
        }
    }

    #[test]
    fn registration_requires_a_known_account() {
        let state = test_state();

        let err = register_animal_sync(&state.db, Uuid::new_v4(), &request("Rex", "dog"))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("user")));
    }

    #[test]
    fn registration_validates_fields() {
        let state = test_state();
        let owner = seed_user(&state.db, Role::Regular);

        let err = register_animal_sync(&state.db, owner, &request("  ", "dog")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err =
            register_animal_sync(&state.db, owner, &request("Rex", &"x".repeat(33))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let row = register_animal_sync(&state.db, owner, &request(" Rex ", "dog")).unwrap();
        assert_eq!(row.name, "Rex");
        assert_eq!(row.owner_id, owner.to_string());
    }
}
