use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use pawlink_api::gate::{self, require_role};
use pawlink_api::{AppState, AppStateInner, admin, animals, matches, messages, swipes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawlink=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("PAWLINK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("PAWLINK_DB_PATH").unwrap_or_else(|_| "pawlink.db".into());
    let host = std::env::var("PAWLINK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PAWLINK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = pawlink_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes. Each route class gets exactly one gate layer with its entry
    // from the role table; nothing below the gate re-checks credentials.
    let public_routes = Router::new().route("/health", get(health));

    let general_routes = Router::new()
        .route("/animals", post(animals::register_animal))
        .route("/animals/{animal_id}", get(animals::get_animal))
        .route("/animals/{animal_id}/swipes", get(swipes::list_swipes))
        .route("/animals/{animal_id}/matches", get(matches::list_matches))
        .route("/swipes", post(swipes::submit_swipe))
        .route("/matches/{match_id}/messages", get(messages::list_messages))
        .route("/matches/{match_id}/messages", post(messages::send_message))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, req: Request, next: Next| {
                require_role(state, gate::AUTHENTICATED, req, next)
            },
        ))
        .with_state(state.clone());

    let provider_routes = Router::new()
        .route("/provider/animals", get(animals::provider_roster))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, req: Request, next: Next| {
                require_role(state, gate::PROVIDER_ROUTES, req, next)
            },
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/animals", get(admin::list_animals))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            |state: State<AppState>, req: Request, next: Next| {
                require_role(state, gate::ADMIN_ROUTES, req, next)
            },
        ))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(general_routes)
        .merge(provider_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Pawlink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
