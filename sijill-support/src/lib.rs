//! # Sijill Support
//!
//! Shared utilities for the Sijill container crates.
//!
//! This crate provides:
//! - Service name canonicalization (`normalize_name`, `underscore`)
//! - Text rendering for error messages

pub mod naming;
pub mod rendering;

pub use naming::{normalize_name, slot_key, underscore};
