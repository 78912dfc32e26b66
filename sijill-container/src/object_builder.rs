//! Object construction with property injection.
//!
//! [`ObjectBuilder`] instantiates an [`Injectable`] type from
//! caller-supplied constructor arguments, then fills each of its
//! injectable properties with a service from the container. The
//! property → service id map of a type is computed once and kept in a
//! [`CacheStore`] unless the builder runs in debug mode.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace};

use crate::autowire::Arguments;
use crate::cache::{self, CacheKey, CacheStore};
use crate::catalog;
use crate::container::Container;
use crate::error::{InvalidConfigurationError, Result, SijillError};
use crate::key::TypeKey;
use crate::service::Service;

const CACHE_PREFIX: &str = "sijill::ObjectBuilder";

/// Property name → service id.
pub type PropertyMap = IndexMap<String, String>;

/// An injectable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub name: &'static str,
    /// Explicit service id.
    pub service: Option<&'static str>,
    pub declared: Option<TypeKey>,
}

impl Property {
    /// A property resolved by its own name.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            service: None,
            declared: None,
        }
    }

    /// A property of type `T`, resolved by type name.
    pub fn typed<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            declared: Some(TypeKey::of::<T>()),
            ..Self::new(name)
        }
    }

    /// Resolve from `service` instead.
    pub fn with_service(mut self, service: &'static str) -> Self {
        self.service = Some(service);
        self
    }

    /// The id to resolve: explicit id, else declared type, else name.
    pub fn service_id(&self) -> &'static str {
        self.service
            .or_else(|| self.declared.map(|key| key.type_name()))
            .unwrap_or(self.name)
    }
}

/// A type built from constructor arguments and completed by property
/// injection.
pub trait Injectable: Sized {
    /// Builds the value from caller-supplied arguments.
    fn instantiate(arguments: Arguments) -> Result<Self>;

    /// Properties to inject after construction.
    fn properties() -> Vec<Property>;

    /// Stores `service` into `property`.
    fn inject(&mut self, property: &str, service: Service) -> Result<()>;
}

type BuildFn = fn(&ObjectBuilder<'_>, Arguments, Option<&str>) -> Result<Service>;

/// Builds [`Injectable`] types.
pub struct ObjectBuilder<'a> {
    container: &'a Container,
    cache: Arc<dyn CacheStore>,
    debug: bool,
    classes: HashMap<String, BuildFn>,
}

impl<'a> ObjectBuilder<'a> {
    pub fn new(container: &'a Container, cache: Arc<dyn CacheStore>, debug: bool) -> Self {
        Self {
            container,
            cache,
            debug,
            classes: HashMap::new(),
        }
    }

    /// Builder using the container's cache directory and debug flag.
    pub fn from_settings(container: &'a Container) -> Self {
        let settings = container.settings();
        Self::new(container, settings.cache_store(), settings.debug)
    }

    pub fn get_object<T: Injectable + 'static>(&self, arguments: Arguments) -> Result<T> {
        self.get_object_checked(arguments, None)
    }

    /// Builds a `T` that must be, or implement, `expected`.
    ///
    /// # Errors
    /// - [`SijillError::InvalidArgument`] if `T` does not satisfy `expected`
    /// - [`SijillError::InvalidConfiguration`] if a property names an
    ///   unknown service
    #[instrument(skip(self, arguments), fields(class = type_name::<T>()), level = "debug")]
    pub fn get_object_checked<T: Injectable + 'static>(
        &self,
        arguments: Arguments,
        expected: Option<&str>,
    ) -> Result<T> {
        let class = type_name::<T>();
        let mut object = T::instantiate(arguments)?;

        if let Some(expected) = expected {
            if class != expected && !catalog::implements(class, expected) {
                return Err(SijillError::invalid_argument(
                    class,
                    format!("Class {class} must be an instanceof {expected}"),
                ));
            }
        }

        for (property, id) in self.properties::<T>()? {
            if !self.container.has(&id) {
                return Err(SijillError::InvalidConfiguration(InvalidConfigurationError {
                    class: class.to_string(),
                    property,
                    service: id,
                }));
            }

            trace!(property = %property, service = %id, "Injecting");
            let service = self.container.get(&id)?;
            object.inject(&property, service)?;
        }

        Ok(object)
    }

    /// The property map of `T`, cached unless in debug mode.
    pub fn properties<T: Injectable + 'static>(&self) -> Result<PropertyMap> {
        if self.debug {
            return Ok(property_map::<T>());
        }

        let key = CacheKey::new(&format!("{CACHE_PREFIX}{}", type_name::<T>()));
        if let Some(properties) = cache::load(&*self.cache, &key)? {
            return Ok(properties);
        }

        let properties = property_map::<T>();
        cache::save(&*self.cache, &key, &properties)?;
        Ok(properties)
    }

    /// Makes `T` buildable by its type name.
    pub fn register<T: Injectable + Send + Sync + 'static>(&mut self) -> &mut Self {
        debug!(class = type_name::<T>(), "Registered injectable class");
        self.classes.insert(type_name::<T>().to_string(), build_service::<T>);
        self
    }

    /// Builds a registered class by name.
    pub fn get_object_by_name(
        &self,
        class: &str,
        arguments: Arguments,
        expected: Option<&str>,
    ) -> Result<Service> {
        let build = self.classes.get(class).ok_or_else(|| {
            SijillError::invalid_argument(class, format!("Provided class {class} does not exist"))
        })?;
        build(self, arguments, expected)
    }
}

fn property_map<T: Injectable>() -> PropertyMap {
    T::properties()
        .into_iter()
        .map(|property| (property.name.to_string(), property.service_id().to_string()))
        .collect()
}

fn build_service<T: Injectable + Send + Sync + 'static>(
    builder: &ObjectBuilder<'_>,
    arguments: Arguments,
    expected: Option<&str>,
) -> Result<Service> {
    Ok(Service::new(builder.get_object_checked::<T>(arguments, expected)?))
}

impl fmt::Debug for ObjectBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBuilder")
            .field("debug", &self.debug)
            .field("classes", &self.classes.len())
            .finish()
    }
}
