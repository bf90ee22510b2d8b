// Auth domain services
pub mod auth_service;
pub mod cleanup_scheduler;
pub mod jwt_service;
pub mod password_service;
pub mod state;

pub use auth_service::*;
pub use cleanup_scheduler::*;
pub use jwt_service::*;
pub use password_service::*;
pub use state::*;
