//! Utility module for common helper functions.
//!
//! This module provides:
//! - JSON helper functions for serde_json::Value
//! - Serde adapters for floats that may be NaN

pub mod float;
pub mod json;

pub use json::{finite_number, get_f64, merge_into};
