use axum::{
    extract::Request,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    database::Database,
    metrics::AppMetrics,
    services::{AuthService, ServiceContainer, UserService},
    web::{
        handlers::{auth_handlers, health_handlers, metrics_handlers, user_handlers},
        middleware::{auth_middleware, metrics_middleware, request_id_middleware},
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_service: Arc<dyn UserService>,
    pub auth_service: Arc<dyn AuthService>,
    pub metrics: AppMetrics,
    /// Probed by the readiness check; absent when running without a pool
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        services: &ServiceContainer,
        metrics: AppMetrics,
        database: Option<Database>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            user_service: services.user_service(),
            auth_service: services.auth_service(),
            metrics,
            database,
        }
    }
}

/// Request ID generator using UUID v4
#[derive(Clone, Default)]
pub struct UuidMakeRequestId;

impl MakeRequestId for UuidMakeRequestId {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

/// Create the main application router with middleware stack
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        .nest("/api/v1", create_api_routes(state.clone()))
        .route("/health", get(health_handlers::health))
        .route("/health/live", get(health_handlers::liveness))
        .route("/health/ready", get(health_handlers::readiness))
        .route("/metrics", get(metrics_handlers::metrics))
        .fallback(not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(SetRequestIdLayer::x_request_id(UuidMakeRequestId))
                .layer(middleware::from_fn(request_id_middleware))
                .layer(NewSentryLayer::<Request>::new_from_top())
                .layer(SentryHttpLayer::with_transaction())
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), metrics_middleware))
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

fn create_api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth_handlers::login))
        .nest("/users", create_user_routes(state))
}

/// Every user route sits behind the bearer-token check
fn create_user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/create", post(user_handlers::create_user))
        .route("/update", put(user_handlers::update_user))
        .route("/remove/:id", delete(user_handlers::remove_user))
        .route("/get/:id", get(user_handlers::get_user))
        .route("/get-all", get(user_handlers::get_all_users))
        .route("/get-by-email", get(user_handlers::get_user_by_email))
        .route("/search-by-name", get(user_handlers::search_users_by_name))
        .route("/search-by-email", get(user_handlers::search_users_by_email))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Fallback handler for 404 responses
pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "The requested resource was not found",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CurrentUser, UserView};
    use crate::repository::memory::InMemoryUserRepository;
    use crate::services::{AuthError, MockAuthService, MockUserService};
    use crate::web::handlers::user_handlers::{
        NO_USER_WITH_NAME_MATCH_MESSAGE, USERS_FOUND_MESSAGE, USER_FOUND_MESSAGE,
    };
    use crate::web::responses::{INVALID_TOKEN_MESSAGE, UNAUTHORIZED_MESSAGE};
    use axum::http::{header, HeaderName, HeaderValue};
    use axum_test::TestServer;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::Value;

    fn in_memory_state(config: AppConfig) -> AppState {
        let services =
            ServiceContainer::with_repository(Arc::new(InMemoryUserRepository::new()), &config);
        AppState::new(config, &services, AppMetrics::new().unwrap(), None)
    }

    fn mocked_state(user_service: MockUserService, auth_service: MockAuthService) -> AppState {
        AppState {
            config: Arc::new(AppConfig::default()),
            user_service: Arc::new(user_service),
            auth_service: Arc::new(auth_service),
            metrics: AppMetrics::new().unwrap(),
            database: None,
        }
    }

    fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        )
    }

    /// Create a user straight through the service and log in as them
    async fn seeded_login(server: &TestServer, state: &AppState) -> String {
        state
            .user_service
            .create(crate::models::UserDto {
                id: None,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "login": "alice", "email": "ALICE@example.com", "password": "secret1" }))
            .await;
        response.assert_status_ok();

        response.json::<Value>()["data"]["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_login_issues_token_with_configured_expiry() {
        let mut config = AppConfig::default();
        config.jwt.hours_to_expire = 3;
        let state = in_memory_state(config);
        let server = TestServer::new(create_router(state.clone())).unwrap();

        state
            .user_service
            .create(crate::models::UserDto {
                id: None,
                name: "Alice".to_string(),
                email: "Alice@Example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({
                "login": "alice",
                "email": "alice@example.com",
                "password": "whatever",
            }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], auth_handlers::LOGIN_SUCCESS_MESSAGE);
        assert_eq!(body["data"]["user"]["email"], "Alice@Example.com");
        assert!(!body["data"]["token"].as_str().unwrap().is_empty());

        let expiry: chrono::DateTime<Utc> =
            serde_json::from_value(body["data"]["tokenExpiry"].clone()).unwrap();
        let expected = Utc::now() + ChronoDuration::hours(3);
        assert!((expiry - expected).num_seconds().abs() <= 5);
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_401() {
        let server = TestServer::new(create_router(in_memory_state(AppConfig::default()))).unwrap();

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "login": "ghost", "email": "ghost@example.com", "password": "x" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], UNAUTHORIZED_MESSAGE);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_login_with_empty_fields_is_400() {
        let mut auth = MockAuthService::new();
        auth.expect_login().never();
        let server =
            TestServer::new(create_router(mocked_state(MockUserService::new(), auth))).unwrap();

        let response = server
            .post("/api/v1/auth/login")
            .json(&json!({ "login": "", "email": "", "password": "x" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400_envelope() {
        let server = TestServer::new(create_router(in_memory_state(AppConfig::default()))).unwrap();

        let response = server
            .post("/api/v1/auth/login")
            .content_type("application/json")
            .bytes("{not json".into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_protected_route_without_token_never_reaches_service() {
        let mut users = MockUserService::new();
        users.expect_get_all().never();
        users.expect_create().never();
        let mut auth = MockAuthService::new();
        auth.expect_validate_token().never();
        let server = TestServer::new(create_router(mocked_state(users, auth))).unwrap();

        let response = server.get("/api/v1/users/get-all").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], INVALID_TOKEN_MESSAGE);

        let response = server
            .post("/api/v1/users/create")
            .json(&json!({ "name": "Bob", "email": "bob@example.com", "password": "secret1" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_never_reaches_service() {
        let mut users = MockUserService::new();
        users.expect_get_all().never();
        let mut auth = MockAuthService::new();
        auth.expect_validate_token()
            .times(1)
            .returning(|_| Err(AuthError::InvalidToken));
        let server = TestServer::new(create_router(mocked_state(users, auth))).unwrap();

        let (name, value) = bearer("forged");
        let response = server.get("/api/v1/users/get-all").add_header(name, value).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_all_on_empty_store_returns_empty_list() {
        let mut users = MockUserService::new();
        users.expect_get_all().times(1).returning(|| Ok(Vec::new()));
        let mut auth = MockAuthService::new();
        auth.expect_validate_token().returning(|_| {
            Ok(CurrentUser {
                id: 1,
                email: "alice@example.com".to_string(),
            })
        });
        let server = TestServer::new(create_router(mocked_state(users, auth))).unwrap();

        let (name, value) = bearer("valid");
        let response = server.get("/api/v1/users/get-all").add_header(name, value).await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], USERS_FOUND_MESSAGE);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_search_by_name_without_match_returns_null() {
        let state = in_memory_state(AppConfig::default());
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = seeded_login(&server, &state).await;

        let (name, value) = bearer(&token);
        let response = server
            .get("/api/v1/users/search-by-name")
            .add_query_param("name", "nonexistent")
            .add_header(name, value)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], NO_USER_WITH_NAME_MATCH_MESSAGE);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_search_by_email_matches_substring() {
        let state = in_memory_state(AppConfig::default());
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = seeded_login(&server, &state).await;

        let (name, value) = bearer(&token);
        let response = server
            .get("/api/v1/users/search-by-email")
            .add_query_param("email", "EXAMPLE")
            .add_header(name, value)
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["message"], USER_FOUND_MESSAGE);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_create_is_400_without_touching_storage() {
        let mut users = MockUserService::new();
        users.expect_create().never();
        let mut auth = MockAuthService::new();
        auth.expect_validate_token().returning(|_| {
            Ok(CurrentUser {
                id: 1,
                email: "alice@example.com".to_string(),
            })
        });
        let server = TestServer::new(create_router(mocked_state(users, auth))).unwrap();

        let (name, value) = bearer("valid");
        let response = server
            .post("/api/v1/users/create")
            .add_header(name, value)
            .json(&json!({ "name": "", "email": "", "password": "" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert!(!body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dto_rules_reject_short_name_with_field_errors() {
        let state = in_memory_state(AppConfig::default());
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = seeded_login(&server, &state).await;

        let (name, value) = bearer(&token);
        let response = server
            .post("/api/v1/users/create")
            .add_header(name, value)
            .json(&json!({ "name": "Al", "email": "not-an-email", "password": "secret1" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(state.user_service.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let state = in_memory_state(AppConfig::default());
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = seeded_login(&server, &state).await;

        let (name, value) = bearer(&token);
        let created = server
            .post("/api/v1/users/create")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "name": "Bob Builder",
                "email": "bob@example.com",
                "password": "secret1",
            }))
            .await;
        created.assert_status_ok();
        let created: UserView =
            serde_json::from_value(created.json::<Value>()["data"].clone()).unwrap();

        let fetched = server
            .get(&format!("/api/v1/users/get/{}", created.id))
            .add_header(name, value)
            .await;

        fetched.assert_status_ok();
        let body = fetched.json::<Value>();
        assert_eq!(body["message"], USER_FOUND_MESSAGE);
        let fetched: UserView = serde_json::from_value(body["data"].clone()).unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_and_remove_flow() {
        let state = in_memory_state(AppConfig::default());
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = seeded_login(&server, &state).await;
        let (name, value) = bearer(&token);

        let updated = server
            .put("/api/v1/users/update")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "id": 1,
                "name": "Alice Liddell",
                "email": "alice@example.com",
                "password": "secret2",
            }))
            .await;
        updated.assert_status_ok();
        assert_eq!(updated.json::<Value>()["data"]["name"], "Alice Liddell");

        let removed = server
            .delete("/api/v1/users/remove/1")
            .add_header(name.clone(), value.clone())
            .await;
        removed.assert_status_ok();
        let body = removed.json::<Value>();
        assert_eq!(body["message"], user_handlers::USER_REMOVED_MESSAGE);
        assert!(body["data"].is_null());

        let again = server
            .delete("/api/v1/users/remove/1")
            .add_header(name.clone(), value.clone())
            .await;
        again.assert_status(StatusCode::BAD_REQUEST);

        let missing = server.get("/api/v1/users/get/1").add_header(name, value).await;
        missing.assert_status_ok();
        let body = missing.json::<Value>();
        assert_eq!(body["message"], user_handlers::NO_USER_WITH_ID_MESSAGE);
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_400() {
        let state = in_memory_state(AppConfig::default());
        let server = TestServer::new(create_router(state.clone())).unwrap();
        let token = seeded_login(&server, &state).await;

        let (name, value) = bearer(&token);
        let response = server.get("/api/v1/users/get/abc").add_header(name, value).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }

    #[tokio::test]
    async fn test_storage_failure_is_generic_500() {
        let mut users = MockUserService::new();
        users.expect_get_by_email().returning(|_| {
            Err(crate::services::ServiceError::Repository(
                crate::repository::RepositoryError::Database(sqlx::Error::PoolTimedOut),
            ))
        });
        let mut auth = MockAuthService::new();
        auth.expect_validate_token().returning(|_| {
            Ok(CurrentUser {
                id: 1,
                email: "alice@example.com".to_string(),
            })
        });
        let server = TestServer::new(create_router(mocked_state(users, auth))).unwrap();

        let (name, value) = bearer("valid");
        let response = server
            .get("/api/v1/users/get-by-email")
            .add_query_param("email", "alice@example.com")
            .add_header(name, value)
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json::<Value>();
        assert_eq!(body["message"], crate::web::responses::APPLICATION_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_unreadable_query_is_400_envelope() {
        let mut users = MockUserService::new();
        users.expect_search_by_name().never();
        let mut auth = MockAuthService::new();
        auth.expect_validate_token().returning(|_| {
            Ok(CurrentUser {
                id: 1,
                email: "alice@example.com".to_string(),
            })
        });
        let server = TestServer::new(create_router(mocked_state(users, auth))).unwrap();

        let (name, value) = bearer("valid");
        let response = server
            .get("/api/v1/users/search-by-name")
            .add_query_param("name", "a")
            .add_query_param("name", "b")
            .add_header(name, value)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], crate::web::extractors::MALFORMED_QUERY_MESSAGE);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_health_metrics_and_fallback() {
        let state = in_memory_state(AppConfig::default());
        let server = TestServer::new(create_router(state.clone())).unwrap();

        server.get("/health/live").await.assert_status_ok();
        server.get("/health/ready").await.assert_status_ok();
        assert_eq!(server.get("/health").await.json::<Value>()["status"], "healthy");

        server
            .post("/api/v1/auth/login")
            .json(&json!({ "login": "x", "email": "nobody@example.com", "password": "x" }))
            .await;

        let metrics = server.get("/metrics").await;
        metrics.assert_status_ok();
        assert!(metrics.text().contains("login_attempts_total"));

        server
            .get("/does-not-exist")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
