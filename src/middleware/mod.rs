pub mod auth;
pub mod error_handling;

pub use auth::*;
pub use error_handling::*;
