//! # Sijill: Dependency Injection Container for Rust
//!
//! A named service container with type, tag and constructor based
//! resolution, and a compiler that turns a configured container into
//! Rust source.
//!
//! ```rust
//! use sijill::prelude::*;
//! use std::sync::Arc;
//!
//! struct Clock;
//!
//! #[derive(Autowire)]
//! struct Scheduler {
//!     clock: Arc<Clock>,
//!     #[autowire(default = 4)]
//!     workers: usize,
//! }
//!
//! let container = Container::builder()
//!     .service::<Clock, _>("clock", |_| Ok(Clock))
//!     .build()
//!     .unwrap();
//!
//! let resolver = AutowireResolver::new(TypeResolver::new(&container));
//! let scheduler: Scheduler = resolver.get_object().unwrap();
//! assert_eq!(scheduler.workers, 4);
//! ```

extern crate self as sijill;

pub use sijill_codegen::Compiler;
pub use sijill_container::*;
pub use sijill_derive::*;
pub use sijill_support::*;

/// Container compilation.
pub mod codegen {
    pub use sijill_codegen::compiler::*;
}

/// Everything needed to declare and resolve services.
pub mod prelude {
    pub use sijill_codegen::Compiler;
    pub use sijill_container::autowire::{Arguments, Autowire, AutowireResolver, Parameter};
    pub use sijill_container::object_builder::{Injectable, ObjectBuilder, Property};
    pub use sijill_container::prelude::*;
    pub use sijill_container::tag_resolver::TagResolver;
    pub use sijill_container::type_resolver::{ResolveByType, TypeResolver};
    pub use sijill_derive::{Autowire, Injectable};
}
