//! Data Transfer Objects for REST request/response serialization.
//!
//! Money amounts are integers in minor currency units.

pub mod campaign_dto;
pub mod common_dto;
pub mod donation_dto;

pub use campaign_dto::*;
pub use common_dto::*;
pub use donation_dto::*;
