//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod fares;
pub mod health;
pub mod rules;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod zones;

pub use error::ApiResult;
