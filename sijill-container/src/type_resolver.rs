//! Resolution of services by declared type.
//!
//! A [`TypeResolver`] answers "give me the service providing type `T`":
//!
//! 1. the inspector's type map, loaded once per resolver;
//! 2. a factory resolver registered for an interface the type implements;
//! 3. the container itself, treating the type name as a service name.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use sijill_support::rendering::suggest_similar;

use crate::catalog;
use crate::container::Container;
use crate::error::{Result, SijillError};
use crate::inspector::{ContainerInspector, Inspector, TypeMap};
use crate::service::Service;

/// Fallback building a service for any type implementing an interface.
///
/// Receives the requested type name and the container.
pub type FactoryResolverFn = Arc<dyn Fn(&str, &Container) -> Result<Service> + Send + Sync>;

/// Anything that can resolve a service from a type name.
pub trait ResolveByType {
    fn get_service_by_type(&self, type_name: &str) -> Result<Service>;
}

impl<R: ResolveByType + ?Sized> ResolveByType for &R {
    fn get_service_by_type(&self, type_name: &str) -> Result<Service> {
        (**self).get_service_by_type(type_name)
    }
}

/// Resolves services by type name.
///
/// # Examples
/// ```rust
/// use sijill_container::prelude::*;
/// use sijill_container::type_resolver::TypeResolver;
/// use std::sync::Arc;
///
/// struct Clock;
///
/// let container = Container::builder()
///     .service::<Clock, _>("clock", |_| Ok(Clock))
///     .build()
///     .unwrap();
///
/// let resolver = TypeResolver::new(&container);
/// let clock: Arc<Clock> = resolver.get_by_type().unwrap();
/// ```
pub struct TypeResolver<'a, I: Inspector = ContainerInspector<'a>> {
    container: &'a Container,
    inspector: I,
    types: OnceCell<TypeMap>,
    resolvers: IndexMap<String, FactoryResolverFn>,
    implementations: Vec<(String, String)>,
}

impl<'a> TypeResolver<'a> {
    /// Resolver over a live inspector of `container`.
    pub fn new(container: &'a Container) -> Self {
        Self::with_inspector(container, ContainerInspector::new(container))
    }
}

impl<'a, I: Inspector> TypeResolver<'a, I> {
    /// Resolver reading its type map from `inspector`, e.g. a
    /// [`CachedInspector`](crate::inspector::CachedInspector).
    pub fn with_inspector(container: &'a Container, inspector: I) -> Self {
        Self {
            container,
            inspector,
            types: OnceCell::new(),
            resolvers: IndexMap::new(),
            implementations: Vec::new(),
        }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// Registers a fallback for every type implementing `interface`.
    ///
    /// Registering the same interface again replaces the factory but
    /// keeps its place in the lookup order.
    pub fn add_factory_resolver<F>(&mut self, interface: &str, factory: F) -> &mut Self
    where
        F: Fn(&str, &Container) -> Result<Service> + Send + Sync + 'static,
    {
        debug!(interface, "Adding factory resolver");
        self.resolvers.insert(interface.to_string(), Arc::new(factory));
        self
    }

    /// Typed form of [`add_factory_resolver`](Self::add_factory_resolver).
    pub fn add_factory_resolver_for<Iface, F>(&mut self, factory: F) -> &mut Self
    where
        Iface: ?Sized + 'static,
        F: Fn(&str, &Container) -> Result<Service> + Send + Sync + 'static,
    {
        self.add_factory_resolver(type_name::<Iface>(), factory)
    }

    /// Declares, for this resolver only, that `C` implements `Iface`.
    pub fn add_implementation<Iface: ?Sized + 'static, C: ?Sized + 'static>(&mut self) -> &mut Self {
        self.implementations
            .push((type_name::<C>().to_string(), type_name::<Iface>().to_string()));
        self
    }

    /// Resolves the service providing `T` and downcasts it.
    pub fn get_by_type<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.get_service_by_type(type_name::<T>())?
            .require::<T>(type_name::<T>())
    }

    /// The type map, loaded on first use.
    pub fn types(&self) -> Result<&TypeMap> {
        self.types.get_or_try_init(|| self.inspector.typed_service_ids())
    }

    fn resolver_for(&self, requested: &str) -> Option<(&str, &FactoryResolverFn)> {
        self.resolvers
            .iter()
            .find(|(interface, _)| self.implements(requested, interface))
            .map(|(interface, factory)| (interface.as_str(), factory))
    }

    fn implements(&self, concrete: &str, interface: &str) -> bool {
        self.implementations
            .iter()
            .any(|(c, i)| c == concrete && i == interface)
            || catalog::implements(concrete, interface)
    }
}

impl<I: Inspector> ResolveByType for TypeResolver<'_, I> {
    /// # Errors
    /// [`SijillError::NotFound`] if no step yields a service; errors of
    /// the container or factory resolver otherwise.
    fn get_service_by_type(&self, requested: &str) -> Result<Service> {
        let types = self.types()?;

        if let Some(id) = types.get(requested) {
            trace!(requested, service = %id, "Resolved from type map");
            return self.container.get(id);
        }

        if let Some((interface, factory)) = self.resolver_for(requested) {
            debug!(requested, interface, "Resolving through factory resolver");
            return factory(requested, self.container);
        }

        trace!(requested, "Falling back to service name");
        match self.container.get(requested) {
            Err(err) if err.is_not_found() => {
                let known: Vec<&str> = types.keys().map(String::as_str).collect();
                Err(SijillError::type_not_found(
                    requested,
                    suggest_similar(requested, &known, 3),
                ))
            }
            other => other,
        }
    }
}

impl<I: Inspector> fmt::Debug for TypeResolver<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeResolver")
            .field("loaded", &self.types.get().is_some())
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    trait Repository: Send + Sync {
        fn table(&self) -> &str;
    }

    struct UserRepository;
    impl Repository for UserRepository {
        fn table(&self) -> &str {
            "users"
        }
    }

    struct OrderRepository;
    impl Repository for OrderRepository {
        fn table(&self) -> &str {
            "orders"
        }
    }

    crate::implements!(OrderRepository: dyn Repository);

    struct Clock;

    fn container() -> Container {
        Container::builder()
            .service::<Clock, _>("clock", |_| Ok(Clock))
            .interface::<dyn Repository, UserRepository, _>(
                "user_repository",
                |_| Ok(UserRepository),
                |r| r as Arc<dyn Repository>,
            )
            .build()
            .unwrap()
    }

    #[test]
    fn resolves_from_type_map() {
        let container = container();
        let resolver = TypeResolver::new(&container);

        let clock = resolver.get_service_by_type(type_name::<Clock>()).unwrap();
        assert!(clock.ptr_eq(&container.get("clock").unwrap()));

        let repository: Arc<dyn Repository> = resolver.get_by_type().unwrap();
        assert_eq!(repository.table(), "users");
    }

    #[test]
    fn concrete_type_of_interface_resolves() {
        let container = container();
        let resolver = TypeResolver::new(&container);

        let service = resolver
            .get_service_by_type(type_name::<UserRepository>())
            .unwrap();
        assert!(service.is::<dyn Repository>());
    }

    #[test]
    fn factory_resolver_for_declared_implementation() {
        let container = container();
        let mut resolver = TypeResolver::new(&container);
        resolver.add_factory_resolver_for::<dyn Repository, _>(|requested, _| {
            assert!(requested.ends_with("OrderRepository"));
            Ok(Service::from_arc(Arc::new(OrderRepository) as Arc<dyn Repository>))
        });

        let service = resolver
            .get_service_by_type(type_name::<OrderRepository>())
            .unwrap();
        assert_eq!(service.downcast::<dyn Repository>().unwrap().table(), "orders");
    }

    #[test]
    fn factory_resolver_with_local_implementation() {
        struct AuditRepository;
        impl Repository for AuditRepository {
            fn table(&self) -> &str {
                "audit"
            }
        }

        let container = container();
        let mut resolver = TypeResolver::new(&container);
        resolver
            .add_implementation::<dyn Repository, AuditRepository>()
            .add_factory_resolver_for::<dyn Repository, _>(|_, _| {
                Ok(Service::new(AuditRepository))
            });

        let audit = resolver.get_by_type::<AuditRepository>().unwrap();
        assert_eq!(audit.table(), "audit");
    }

    #[test]
    fn last_factory_resolver_for_interface_wins() {
        let container = container();
        let mut resolver = TypeResolver::new(&container);
        resolver
            .add_factory_resolver_for::<dyn Repository, _>(|_, _| Ok(Service::new(1u8)))
            .add_factory_resolver("other::Interface", |_, _| Ok(Service::new(3u8)))
            .add_factory_resolver_for::<dyn Repository, _>(|_, _| Ok(Service::new(2u8)));

        let service = resolver
            .get_service_by_type(type_name::<OrderRepository>())
            .unwrap();
        assert_eq!(*service.downcast::<u8>().unwrap(), 2);
        assert_eq!(resolver.resolvers.get_index_of(type_name::<dyn Repository>()), Some(0));
    }

    #[test]
    fn falls_back_to_service_name() {
        let container = container();
        container.set_value("legacy_mailer", Arc::new(String::from("sendmail")));
        let resolver = TypeResolver::new(&container);

        let mailer = resolver.get_service_by_type("LegacyMailer").unwrap();
        assert_eq!(*mailer.downcast::<String>().unwrap(), "sendmail");
    }

    #[test]
    fn unknown_type_is_not_found() {
        let container = container();
        let resolver = TypeResolver::new(&container);

        let err = resolver.get_service_by_type("app::Unknown").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("No service resolves type app::Unknown"));
    }

    #[test]
    fn type_map_is_loaded_once() {
        struct CountingInspector(Cell<u32>);

        impl Inspector for CountingInspector {
            fn service_ids(&self) -> Result<Vec<String>> {
                Ok(Vec::new())
            }

            fn typed_service_ids(&self) -> Result<TypeMap> {
                self.0.set(self.0.get() + 1);
                Ok(TypeMap::from([("app::Clock".to_string(), "clock".to_string())]))
            }

            fn tagged_service_ids(&self) -> Result<crate::inspector::TagMap> {
                Ok(Default::default())
            }
        }

        let container = container();
        let resolver = TypeResolver::with_inspector(&container, CountingInspector(Cell::new(0)));

        resolver.get_service_by_type("app::Clock").unwrap();
        resolver.get_service_by_type("app::Clock").unwrap();
        assert_eq!(resolver.inspector.0.get(), 1);
    }
}
