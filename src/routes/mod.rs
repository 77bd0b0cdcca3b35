/**
 * Routes Module
 * API route handlers
 */

pub mod artists;
pub mod error;
pub mod health;
pub mod portfolios;
pub mod uploads;

pub use error::{ApiError, ApiJson, ApiQuery, ErrorResponse};
