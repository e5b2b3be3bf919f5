pub mod client;
pub mod common;
pub mod employee;
pub mod store;
pub mod ticket;
pub mod user;

pub use client::*;
pub use common::*;
pub use employee::*;
pub use store::*;
pub use ticket::*;
pub use user::*;
