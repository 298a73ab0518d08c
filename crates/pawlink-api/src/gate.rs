use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use pawlink_types::api::Claims;
use pawlink_types::models::Role;

use crate::AppState;
use crate::error::ApiError;

/// Trusted headers carrying the verified identity. Whatever the client sent
/// under these names is stripped before the credential is even looked at.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Static route-class → allowed-roles table. Routers attach exactly one of
/// these per route class; handlers never compare role strings themselves.
pub const ADMIN_ROUTES: &[Role] = &[Role::Admin];
pub const PROVIDER_ROUTES: &[Role] = &[Role::Provider, Role::Admin];
pub const AUTHENTICATED: &[Role] = &[Role::Regular, Role::Provider, Role::Admin];

/// Verified identity for one request. Built here once the token checks out
/// and threaded to handlers through request extensions; downstream code
/// never re-derives identity from raw client input.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

/// Extract and validate the bearer JWT, then enforce the role allowlist.
///
/// Verification happens on every request; there is no caching of results
/// across requests. Missing or invalid credentials are terminal (401), a
/// valid credential with a role outside the allowlist is denied (403)
/// without ever reaching the handler.
pub async fn require_role(
    State(state): State<AppState>,
    allowed: &'static [Role],
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    req.headers_mut().remove(USER_ID_HEADER);
    req.headers_mut().remove(USER_ROLE_HEADER);

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthenticated)?;

    let claims = token_data.claims;
    if !allowed.contains(&claims.role) {
        return Err(ApiError::Forbidden);
    }

    let ctx = AuthContext {
        user_id: claims.sub,
        role: claims.role,
    };

    let user_id_value = HeaderValue::from_str(&ctx.user_id.to_string())
        .map_err(|e| ApiError::Storage(anyhow::anyhow!("unrepresentable user id header: {e}")))?;
    req.headers_mut()
        .insert(HeaderName::from_static(USER_ID_HEADER), user_id_value);
    req.headers_mut().insert(
        HeaderName::from_static(USER_ROLE_HEADER),
        HeaderValue::from_static(ctx.role.as_str()),
    );
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware;
    use axum::routing::get;
    use axum::{Extension, Router};
    use http_body_util::BodyExt;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use tower::ServiceExt;

    use super::*;
    use crate::test_util::{TEST_SECRET, test_state};

    async fn whoami(
        headers: axum::http::HeaderMap,
        Extension(ctx): Extension<AuthContext>,
    ) -> String {
        let header_id = headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("missing");
        format!("{}|{}|{}", ctx.user_id, ctx.role, header_id)
    }

    fn app(state: AppState, allowed: &'static [Role]) -> Router {
        Router::new().route("/probe", get(whoami)).layer(
            middleware::from_fn_with_state(
                state,
                move |state: State<AppState>, req: Request, next: Next| {
                    require_role(state, allowed, req, next)
                },
            ),
        )
    }

    fn token_for(secret: &str, sub: Uuid, role: Role, exp_offset_secs: i64) -> String {
        let claims = Claims {
            sub,
            role,
            exp: (chrono::Utc::now().timestamp() + exp_offset_secs) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn request(token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/probe");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn admin_token_passes_admin_routes_with_trusted_headers() {
        let user_id = Uuid::new_v4();
        let token = token_for(TEST_SECRET, user_id, Role::Admin, 3600);

        let response = app(test_state(), ADMIN_ROUTES)
            .oneshot(request(Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, format!("{user_id}|admin|{user_id}"));
    }

    #[tokio::test]
    async fn provider_is_denied_on_admin_routes() {
        let token = token_for(TEST_SECRET, Uuid::new_v4(), Role::Provider, 3600);

        let response = app(test_state(), ADMIN_ROUTES)
            .oneshot(request(Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn provider_passes_provider_routes() {
        let token = token_for(TEST_SECRET, Uuid::new_v4(), Role::Provider, 3600);

        let response = app(test_state(), PROVIDER_ROUTES)
            .oneshot(request(Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_credential_is_rejected() {
        let response = app(test_state(), AUTHENTICATED)
            .oneshot(request(None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_rejected_even_with_admin_claim() {
        let token = token_for(TEST_SECRET, Uuid::new_v4(), Role::Admin, -3600);

        let response = app(test_state(), ADMIN_ROUTES)
            .oneshot(request(Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn token_signed_with_wrong_secret_is_rejected() {
        let token = token_for("some-other-secret", Uuid::new_v4(), Role::Admin, 3600);

        let response = app(test_state(), ADMIN_ROUTES)
            .oneshot(request(Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn client_supplied_trusted_headers_are_stripped() {
        let user_id = Uuid::new_v4();
        let token = token_for(TEST_SECRET, user_id, Role::Regular, 3600);

        let forged = Uuid::new_v4();
        let request = HttpRequest::builder()
            .uri("/probe")
            .header("authorization", format!("Bearer {token}"))
            .header(USER_ID_HEADER, forged.to_string())
            .header(USER_ROLE_HEADER, "admin")
            .body(Body::empty())
            .unwrap();

        let response = app(test_state(), AUTHENTICATED)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, format!("{user_id}|regular|{user_id}"));
    }
}
