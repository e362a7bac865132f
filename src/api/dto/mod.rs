//! Data Transfer Objects for REST response serialization.

pub mod device_dto;
pub mod system_dto;

pub use device_dto::*;
pub use system_dto::*;
