// Fitness API: 인증 및 세션 토큰 수명주기
// Authentication and session-token lifecycle for the fitness backend
pub mod domains;
pub mod routes;
pub mod shared;

pub use routes::create_router;
