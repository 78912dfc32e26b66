//! Procedural macros for Sijill DI.
//!
//! Provides derive macros:
//! - `#[derive(Autowire)]` - constructor parameters resolved by type
//! - `#[derive(Injectable)]` - property injection for the object builder
//!
//! Generated code refers to the runtime through `::sijill`.

use proc_macro::TokenStream;

/// Autowire derive macro implementation.
mod autowire;
mod fields;
/// Injectable derive macro implementation.
mod injectable;

/// Derives `sijill::autowire::Autowire` for a struct with named fields.
///
/// Field types decide how each parameter resolves:
/// - `Arc<T>` - resolved by the type `T`
/// - `Service` - resolved by the field name
///
/// Attributes:
/// - `#[autowire(default)]` - optional, falls back to `Default::default()`
/// - `#[autowire(default = expr)]` - optional, falls back to `expr`
///
/// ```ignore
/// #[derive(Autowire)]
/// struct Scheduler {
///     clock: Arc<Clock>,
///     #[autowire(default = 4)]
///     workers: usize,
/// }
/// ```
#[proc_macro_derive(Autowire, attributes(autowire))]
pub fn derive_autowire(input: TokenStream) -> TokenStream {
    autowire::derive_autowire(input)
}

/// Derives `sijill::object_builder::Injectable`.
///
/// Fields marked `#[inject]` are injectable properties and start as
/// `None`; they must be `Option<Arc<T>>` or `Option<Service>`.
/// `#[inject("id")]` names the service to inject. Every other field is
/// a constructor argument taken in declaration order, with its
/// `Default` value when the argument is missing.
///
/// ```ignore
/// #[derive(Injectable)]
/// struct SignupHandler {
///     greeting: String,
///     #[inject("mailer")]
///     mailer: Option<Arc<Mailer>>,
///     #[inject]
///     clock: Option<Arc<Clock>>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
