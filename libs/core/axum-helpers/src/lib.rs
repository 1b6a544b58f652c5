//! # Axum Helpers
//!
//! Shared HTTP plumbing for the platform's axum services.
//!
//! ## Modules
//!
//! - **[`errors`]**: structured error responses with a stable JSON envelope
//! - **[`health`]**: liveness/readiness router
//! - **[`shutdown`]**: graceful shutdown signal handling

pub mod errors;
pub mod health;
pub mod shutdown;

pub use errors::{AppError, ErrorResponse};
pub use health::{health_router, HealthResponse};
pub use shutdown::shutdown_signal;
