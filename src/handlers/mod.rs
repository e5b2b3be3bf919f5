pub mod client;
pub mod code;
pub mod employee;
pub mod game;
pub mod status;
pub mod store;
pub mod user;

pub use client::client_config;
pub use code::code_config;
pub use employee::employee_config;
pub use game::game_config;
pub use status::status_config;
pub use store::store_config;
pub use user::user_config;
