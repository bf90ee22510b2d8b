use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use fitness_api::create_router;
use fitness_api::domains::auth::models::*;
use fitness_api::shared::config::AppConfig;
use fitness_api::shared::database::Database;
use fitness_api::shared::logging::init_tracing;
use fitness_api::shared::services::AppState;

// OpenAPI 스키마 정의: Swagger 문서 자동 생성
#[derive(OpenApi)]
#[openapi(
    paths(
        fitness_api::domains::auth::handlers::auth_handler::register,
        fitness_api::domains::auth::handlers::auth_handler::login,
        fitness_api::domains::auth::handlers::auth_handler::refresh,
        fitness_api::domains::auth::handlers::auth_handler::logout,
        fitness_api::domains::auth::handlers::auth_handler::logout_all,
        fitness_api::domains::auth::handlers::auth_handler::change_password,
        fitness_api::domains::auth::handlers::auth_handler::get_me,
        fitness_api::routes::health
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        RefreshTokenRequest,
        RefreshTokenResponse,
        LogoutRequest,
        LogoutAllResponse,
        ChangePasswordRequest,
        UserResponse,
        Role
    )),
    modifiers(
        &SecurityAddon
    ),
    tags(
        (name = "Auth", description = "Authentication and session endpoints"),
        (name = "Health", description = "Liveness probe")
    ),
    info(
        title = "Fitness API Server",
        description = "Authentication and session-token lifecycle for the fitness backend",
        version = "1.0.0"
    )
)]
struct ApiDoc;

// Security scheme 정의: Swagger UI에서 "Authorize" 버튼 추가
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 설정 로드 (.env 지원)
    let config = AppConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    // DB 연결 + 마이그레이션
    let db = Database::new(&config.database_url).await?;
    db.initialize().await?;

    // AppState 생성 (모든 Service 초기화)
    let app_state = AppState::new(&db, &config).context("Failed to initialize AppState")?;

    // 만료 세션 정리 스케줄러
    let _cleanup = app_state.session_cleanup_scheduler(&config).start();

    // CORS 설정
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .context("Invalid CORS_ORIGIN")?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    // Router 생성
    let app = Router::new()
        .merge(create_router())
        .merge(SwaggerUi::new("/api").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(app_state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(%address, "server running");
    info!("Swagger UI available at http://{}/api", address);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
