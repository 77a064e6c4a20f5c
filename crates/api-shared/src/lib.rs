//! # API Shared
//!
//! Shared utilities and definitions for the refiner APIs.
//!
//! Contains:
//! - Wire types (`wire` module) with serde and OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the `refiner` CLI for common functionality.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
