//! Core container implementation for Sijill DI.

pub mod autowire;
pub mod cache;
pub mod catalog;
pub mod container;
pub mod definition;
pub mod error;
pub mod inspector;
pub mod key;
pub mod manifest;
pub mod object_builder;
pub mod provider;
pub mod service;
pub mod settings;
pub mod tag_resolver;
pub mod type_resolver;

pub use container::{Container, ContainerBuilder, Entry, prelude};
pub use error::{Result, SijillError};
pub use key::TypeKey;
pub use service::Service;

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
