pub mod email;
pub mod jwt;
pub mod luhn;
pub mod password;

pub use email::*;
pub use jwt::*;
pub use luhn::*;
pub use password::*;
