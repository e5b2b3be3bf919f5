pub mod auth_service;
pub mod client_service;
pub mod employee_service;
pub mod game_service;
pub mod hydration;
pub mod store_service;

pub use auth_service::*;
pub use client_service::*;
pub use employee_service::*;
pub use game_service::*;
pub use hydration::*;
pub use store_service::*;
