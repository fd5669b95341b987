pub mod audit_service;
pub mod inquiry_service;
pub mod inquiry_validator;

pub use audit_service::*;
pub use inquiry_service::*;
pub use inquiry_validator::*;
