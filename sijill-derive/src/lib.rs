//! Derive macros for Sijill DI.

pub use sijill_macros::{Autowire, Injectable};
