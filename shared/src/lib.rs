//! Shared types for the storefront
//!
//! Data models used by the storefront engine and by the UI layers that call
//! into it, plus small utilities.

pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
