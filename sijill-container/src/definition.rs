//! Service definitions, the declared and introspectable services of a
//! container.
//!
//! A definition is what the inspector enumerates: a name, the type the
//! service declares, an optional tag and the factory that builds it.
//! Definitions made through the [`service!`](crate::service) and
//! [`interface!`](crate::interface) macros also remember the source text
//! of their factory path and types, which is what the compiler re-emits.

use std::fmt;
use std::sync::Arc;

use sijill_support::naming::{normalize_name, slot_key, underscore};

use crate::container::Container;
use crate::error::Result;
use crate::key::TypeKey;
use crate::service::Service;

/// Type alias for factory functions.
///
/// A factory receives the container (to resolve its own dependencies)
/// and returns the built service.
pub type FactoryFn = Arc<dyn Fn(&Container) -> Result<Service> + Send + Sync>;

/// Accessor names that can never be service definitions.
pub const RESERVED_METHODS: [&str; 2] = ["", "Parameter"];

/// Source text a definition was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorySource {
    /// Path of the factory function, e.g. `services::make_mailer`
    pub factory: &'static str,
    /// The declared type, e.g. `Mailer` or `dyn Transport`
    pub declared: &'static str,
    /// Implementation type of an interface definition
    pub concrete: Option<&'static str>,
}

impl FactorySource {
    pub const fn new(factory: &'static str, declared: &'static str) -> Self {
        Self {
            factory,
            declared,
            concrete: None,
        }
    }

    pub const fn with_concrete(mut self, concrete: &'static str) -> Self {
        self.concrete = Some(concrete);
        self
    }
}

/// A declared service.
#[derive(Clone)]
pub struct ServiceDefinition {
    method: String,
    declared: Option<TypeKey>,
    tag: Option<String>,
    factory: FactoryFn,
    source: Option<FactorySource>,
}

impl ServiceDefinition {
    /// Declares a service of concrete type `T`.
    pub fn new<T, F>(name: &str, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Self::with_factory(
            name,
            Some(TypeKey::of::<T>()),
            Arc::new(move |container: &Container| Ok(Service::new(factory(container)?))),
        )
    }

    /// Declares a service whose factory already returns an `Arc<T>`.
    pub fn shared<T, F>(name: &str, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Container) -> Result<Arc<T>> + Send + Sync + 'static,
    {
        Self::with_factory(
            name,
            Some(TypeKey::of::<T>()),
            Arc::new(move |container: &Container| Ok(Service::from_arc(factory(container)?))),
        )
    }

    /// Declares a service exposed as interface `I`, built as `C`.
    ///
    /// The built value is stored as `Arc<I>`; `C` is recorded as the
    /// runtime type of the instance.
    pub fn interface<I, C, F>(name: &str, factory: F, upcast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
        F: Fn(&Container) -> Result<C> + Send + Sync + 'static,
    {
        Self::with_factory(
            name,
            Some(TypeKey::of::<I>()),
            Arc::new(move |container: &Container| {
                Ok(Service::with_concrete(Arc::new(factory(container)?), upcast))
            }),
        )
    }

    /// Declares a service without a declared type.
    ///
    /// Such services are enumerated and tagged like any other but never
    /// appear in the type map.
    pub fn untyped<F>(name: &str, factory: F) -> Self
    where
        F: Fn(&Container) -> Result<Service> + Send + Sync + 'static,
    {
        Self::with_factory(name, None, Arc::new(factory))
    }

    fn with_factory(name: &str, declared: Option<TypeKey>, factory: FactoryFn) -> Self {
        Self {
            method: normalize_name(name),
            declared,
            tag: None,
            factory,
            source: None,
        }
    }

    /// Attaches a tag. Empty tags are ignored.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = (!tag.is_empty()).then_some(tag);
        self
    }

    /// Records the source text the definition was declared with.
    pub fn with_source(mut self, source: FactorySource) -> Self {
        self.source = Some(source);
        self
    }

    /// The PascalCase accessor name (`FooService`).
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The introspected service id (`foo_service`).
    pub fn service_id(&self) -> String {
        underscore(&self.method)
    }

    pub(crate) fn slot_key(&self) -> String {
        slot_key(&self.method)
    }

    pub fn is_reserved(&self) -> bool {
        RESERVED_METHODS.contains(&self.method.as_str())
    }

    pub fn declared(&self) -> Option<TypeKey> {
        self.declared
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn source(&self) -> Option<&FactorySource> {
        self.source.as_ref()
    }

    /// Runs the factory.
    pub(crate) fn instantiate(&self, container: &Container) -> Result<Service> {
        (self.factory)(container)
    }
}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("method", &self.method)
            .field("declared", &self.declared.map(|key| key.type_name()))
            .field("tag", &self.tag)
            .field("source", &self.source)
            .finish()
    }
}

/// Declares a concrete service and records its source for the compiler.
///
/// ```rust,ignore
/// fn make_mailer(_: &Container) -> Result<Mailer> { Ok(Mailer::default()) }
///
/// let definition = sijill_container::service!("mailer" => Mailer, make_mailer);
/// ```
#[macro_export]
macro_rules! service {
    ($name:expr => $ty:ty, $factory:path) => {
        $crate::definition::ServiceDefinition::new::<$ty, _>($name, $factory).with_source(
            $crate::definition::FactorySource::new(stringify!($factory), stringify!($ty)),
        )
    };
}

/// Declares an interface service and records its source for the compiler.
///
/// ```rust,ignore
/// let definition = sijill_container::interface!("transport" => dyn Transport, SmtpTransport, make_smtp);
/// ```
#[macro_export]
macro_rules! interface {
    ($name:expr => $iface:ty, $concrete:ty, $factory:path) => {
        $crate::definition::ServiceDefinition::interface::<$iface, $concrete, _>(
            $name,
            $factory,
            |value: ::std::sync::Arc<$concrete>| -> ::std::sync::Arc<$iface> { value },
        )
        .with_source(
            $crate::definition::FactorySource::new(stringify!($factory), stringify!($iface))
                .with_concrete(stringify!($concrete)),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mailer;

    trait Transport: Send + Sync {}
    struct Smtp;
    impl Transport for Smtp {}

    fn make_mailer(_: &Container) -> Result<Mailer> {
        Ok(Mailer)
    }

    fn make_smtp(_: &Container) -> Result<Smtp> {
        Ok(Smtp)
    }

    #[test]
    fn derives_method_and_id() {
        let definition = ServiceDefinition::new::<Mailer, _>("foo_service", make_mailer);
        assert_eq!(definition.method(), "FooService");
        assert_eq!(definition.service_id(), "foo_service");
    }

    #[test]
    fn camel_case_name_gives_same_id() {
        let definition = ServiceDefinition::new::<Mailer, _>("fooService", make_mailer);
        assert_eq!(definition.service_id(), "foo_service");
    }

    #[test]
    fn macro_records_source() {
        let definition = crate::service!("mailer" => Mailer, make_mailer).tagged("mail");

        let source = definition.source().unwrap();
        assert!(source.factory.contains("make_mailer"));
        assert_eq!(source.declared, "Mailer");
        assert_eq!(definition.tag(), Some("mail"));
        assert!(definition.declared().unwrap().type_name().ends_with("Mailer"));
    }

    #[test]
    fn interface_macro_records_both_types() {
        let definition = crate::interface!("transport" => dyn Transport, Smtp, make_smtp);

        let source = definition.source().unwrap();
        assert_eq!(source.concrete, Some("Smtp"));
        assert!(definition.declared().unwrap().is_interface());

        let service = definition.instantiate(&Container::new()).unwrap();
        assert!(service.downcast::<dyn Transport>().is_some());
        assert!(service.type_name().ends_with("Smtp"));
    }

    #[test]
    fn reserved_names() {
        assert!(ServiceDefinition::new::<Mailer, _>("parameter", make_mailer).is_reserved());
        assert!(ServiceDefinition::new::<Mailer, _>("", make_mailer).is_reserved());
        assert!(!ServiceDefinition::new::<Mailer, _>("mailer", make_mailer).is_reserved());
    }

    #[test]
    fn empty_tag_is_ignored() {
        let definition = ServiceDefinition::new::<Mailer, _>("mailer", make_mailer).tagged("");
        assert_eq!(definition.tag(), None);
    }

    #[test]
    fn debug_output_names_type() {
        let definition = ServiceDefinition::new::<Mailer, _>("mailer", make_mailer);
        assert!(format!("{definition:?}").contains("Mailer"));
    }
}
