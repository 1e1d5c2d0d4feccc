//! Typed client for the blog REST API.

mod client;

pub use client::{ApiClient, ApiConfig, ApiError};
