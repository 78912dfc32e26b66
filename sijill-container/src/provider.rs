//! Provider trait: a module of related service definitions.
//!
//! Providers group related definitions and parameters so an application
//! can assemble its container from independent parts.
//!
//! # Examples
//! ```rust,ignore
//! struct MailProvider;
//!
//! impl Provider for MailProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) {
//!         registry.set_parameter("mail.host", "smtp.local".into());
//!         registry.define(sijill::service!("mailer" => Mailer, make_mailer).tagged("mail"));
//!     }
//! }
//!
//! let container = Container::builder().add_provider(&MailProvider).build()?;
//! ```

use serde_json::Value;

use crate::definition::ServiceDefinition;

/// A module that registers related services into a container.
pub trait Provider: Send + Sync {
    /// Register definitions and parameters.
    ///
    /// Called once during container construction.
    fn register(&self, registry: &mut dyn ProviderRegistry);

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Interface that providers use to register services.
///
/// The subset of [`ContainerBuilder`](crate::container::ContainerBuilder)
/// a provider needs, so providers can be tested on their own.
pub trait ProviderRegistry {
    /// Add a service definition.
    fn define(&mut self, definition: ServiceDefinition);

    /// Set a parameter.
    fn set_parameter(&mut self, name: &str, value: Value);
}
