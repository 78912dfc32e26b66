//! # The Container: named service registry
//!
//! Holds materialized services, deferred factories, declared service
//! definitions and plain parameters. Names are canonicalized, so
//! `foo_bar`, `fooBar` and `FooBar` all address the same slot.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container ──get(name)──> Service
//!                                   │
//!                     materialized → factory → definition
//! ```
//!
//! # Examples
//! ```rust
//! use sijill_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::builder()
//!     .parameter("database_url", "postgres://localhost")
//!     .service::<Database, _>("database", |c| {
//!         let url = c.get_parameter("database_url")?;
//!         Ok(Database { url: url.as_str().unwrap_or_default().to_string() })
//!     })
//!     .service::<UserService, _>("user_service", |c| {
//!         Ok(UserService { db: c.get_typed("database")? })
//!     })
//!     .build()
//!     .expect("Failed to build container");
//!
//! let users: Arc<UserService> = container.get_typed("userService").unwrap();
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, instrument, trace, warn};

use sijill_support::naming::{normalize_name, slot_key};
use sijill_support::rendering::suggest_similar;

use crate::definition::{FactoryFn, ServiceDefinition};
use crate::error::{Result, SijillError};
use crate::manifest::Manifest;
use crate::provider::{Provider, ProviderRegistry};
use crate::service::Service;
use crate::settings::Settings;

/// What [`Container::set`] stores in a slot.
#[derive(Clone)]
pub enum Entry {
    /// An already built service.
    Value(Service),
    /// A factory, run on first [`get`](Container::get).
    Factory(FactoryFn),
    /// Clears the slot's value and factory.
    Empty,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Value(service) => f.debug_tuple("Value").field(service).finish(),
            Entry::Factory(_) => f.write_str("Factory"),
            Entry::Empty => f.write_str("Empty"),
        }
    }
}

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] from service definitions and parameters.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .service::<Mailer, _>("mailer", make_mailer)
///     .define(sijill::service!("logger" => Logger, make_logger).tagged("infra"))
///     .build()?;
/// ```
pub struct ContainerBuilder {
    definitions: Vec<ServiceDefinition>,
    parameters: Vec<(String, Value)>,
    manifest: Option<&'static Manifest>,
    settings: Settings,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            definitions: Vec::new(),
            parameters: Vec::new(),
            manifest: None,
            settings: Settings::default(),
        }
    }

    /// Allow a later definition to replace an earlier one of the same name.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.settings.allow_override = allow;
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Attaches the manifest of a compiled container.
    pub fn manifest(mut self, manifest: &'static Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    // ── Definitions ──

    /// Declares a service of type `T`.
    pub fn service<T, F>(self, name: &str, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.define(ServiceDefinition::new::<T, F>(name, factory))
    }

    /// Declares a service exposed as interface `I` and built as `C`.
    pub fn interface<I, C, F>(self, name: &str, factory: F, upcast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
        F: Fn(&Container) -> Result<C> + Send + Sync + 'static,
    {
        self.define(ServiceDefinition::interface::<I, C, F>(name, factory, upcast))
    }

    /// Adds a prepared definition.
    pub fn define(mut self, definition: ServiceDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Sets a parameter.
    pub fn parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.push((name.to_lowercase(), value.into()));
        self
    }

    // ── Provider modules ──

    /// Add a [`Provider`] module.
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(&mut self);
        self
    }

    // ── Build ──

    /// Build the container, validating its definitions.
    ///
    /// Reserved names are rejected. A name defined twice is rejected
    /// unless overriding is allowed, in which case the later definition
    /// takes the earlier one's place.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(self) -> Result<Container> {
        info!(definitions = self.definitions.len(), "Building container");

        let allow_override = self.settings.allow_override;
        let mut definitions: Vec<ServiceDefinition> = Vec::with_capacity(self.definitions.len());
        for definition in self.definitions {
            admit(&mut definitions, definition, allow_override)?;
        }

        let container = Container::from_parts(definitions, self.manifest, self.settings);
        {
            let mut parameters = container.parameters.write();
            parameters.extend(self.parameters);
        }

        info!("Container built successfully ✓");
        Ok(container)
    }
}

impl ProviderRegistry for ContainerBuilder {
    fn define(&mut self, definition: ServiceDefinition) {
        self.definitions.push(definition);
    }

    fn set_parameter(&mut self, name: &str, value: Value) {
        self.parameters.push((name.to_lowercase(), value));
    }
}

/// Validates `definition` and adds it to `definitions`.
fn admit(
    definitions: &mut Vec<ServiceDefinition>,
    definition: ServiceDefinition,
    allow_override: bool,
) -> Result<()> {
    if definition.is_reserved() {
        return Err(SijillError::invalid_argument(
            definition.method(),
            "name is reserved for container accessors",
        ));
    }

    let slot = definition.slot_key();
    match definitions.iter().position(|existing| existing.slot_key() == slot) {
        Some(_) if !allow_override => Err(SijillError::invalid_argument(
            definition.method(),
            "service is already defined",
        )),
        Some(index) => {
            warn!(service = definition.method(), "Overriding service definition");
            definitions[index] = definition;
            Ok(())
        }
        None => {
            debug!(
                service = definition.method(),
                declared = definition.declared().map(|key| key.type_name()),
                "Defined service"
            );
            definitions.push(definition);
            Ok(())
        }
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Thread-safe named service registry.
///
/// Lookups through [`get`](Container::get) check, in order, the
/// materialized services, the factories set with [`set`](Container::set)
/// and the declared definitions. Whatever runs is cached, so each slot is
/// built at most once.
pub struct Container {
    services: RwLock<HashMap<String, Service>>,
    factories: RwLock<HashMap<String, FactoryFn>>,
    parameters: RwLock<HashMap<String, Value>>,
    definitions: RwLock<Vec<ServiceDefinition>>,
    manifest: Option<&'static Manifest>,
    settings: Settings,
}

impl Container {
    /// An empty container.
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), None, Settings::default())
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    fn from_parts(
        definitions: Vec<ServiceDefinition>,
        manifest: Option<&'static Manifest>,
        settings: Settings,
    ) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            factories: RwLock::new(HashMap::new()),
            parameters: RwLock::new(HashMap::new()),
            definitions: RwLock::new(definitions),
            manifest,
            settings,
        }
    }

    // ── Services ──

    /// Stores a value or factory under `name`, or clears the slot.
    pub fn set(&self, name: &str, entry: Entry) {
        let slot = slot_key(name);
        trace!(service = name, entry = ?entry, "Setting slot");

        match entry {
            Entry::Value(service) => {
                self.services.write().insert(slot, service);
            }
            Entry::Factory(factory) => {
                self.factories.write().insert(slot, factory);
            }
            Entry::Empty => {
                self.services.write().remove(&slot);
                self.factories.write().remove(&slot);
            }
        }
    }

    /// Stores an already built value.
    pub fn set_value<T: ?Sized + Send + Sync + 'static>(&self, name: &str, value: Arc<T>) {
        self.set(name, Entry::Value(Service::from_arc(value)));
    }

    /// Stores a factory building a `T`.
    pub fn set_factory<T, F>(&self, name: &str, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move |container: &Container| {
            Ok(Service::new(factory(container)?))
        });
        self.set(name, Entry::Factory(factory));
    }

    /// Resolves a service by name.
    ///
    /// # Errors
    /// [`SijillError::NotFound`] if no value, factory or definition
    /// exists for `name`; any error of the factory that builds it.
    #[instrument(skip(self), level = "trace")]
    pub fn get(&self, name: &str) -> Result<Service> {
        let slot = slot_key(name);

        if let Some(service) = self.services.read().get(&slot) {
            trace!(service = name, "Using materialized service");
            return Ok(service.clone());
        }

        let factory = self.factories.read().get(&slot).cloned();
        if let Some(factory) = factory {
            debug!(service = name, "Running factory");
            let service = factory(self)?;
            return Ok(self.materialize(slot, service));
        }

        let definition = self
            .definitions
            .read()
            .iter()
            .rev()
            .find(|definition| definition.slot_key() == slot)
            .cloned();
        if let Some(definition) = definition {
            debug!(service = definition.method(), "Building defined service");
            let service = definition.instantiate(self)?;
            return Ok(self.materialize(slot, service));
        }

        Err(SijillError::service_not_found(
            normalize_name(name),
            self.find_suggestions(name),
        ))
    }

    /// Resolves a service and downcasts it to `T`.
    ///
    /// ```rust,ignore
    /// let mailer: Arc<Mailer> = container.get_typed("mailer")?;
    /// let transport: Arc<dyn Transport> = container.get_typed("transport")?;
    /// ```
    pub fn get_typed<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get(name)?.require::<T>(&normalize_name(name))
    }

    /// Returns `true` if `name` has a value, factory or definition.
    pub fn has(&self, name: &str) -> bool {
        let slot = slot_key(name);

        self.services.read().contains_key(&slot)
            || self.factories.read().contains_key(&slot)
            || self
                .definitions
                .read()
                .iter()
                .any(|definition| definition.slot_key() == slot)
    }

    /// Returns `true` if `name` holds a materialized service.
    pub fn initialized(&self, name: &str) -> bool {
        self.services.read().contains_key(&slot_key(name))
    }

    // ── Definitions ──

    /// Adds a definition after construction.
    ///
    /// Follows the same rules as [`ContainerBuilder::build`].
    pub fn define(&self, definition: ServiceDefinition) -> Result<()> {
        let mut definitions = self.definitions.write();
        admit(&mut definitions, definition, self.settings.allow_override)
    }

    /// All definitions in declaration order.
    pub fn definitions(&self) -> Vec<ServiceDefinition> {
        self.definitions.read().clone()
    }

    pub fn manifest(&self) -> Option<&'static Manifest> {
        self.manifest
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Parameters ──

    /// Sets a parameter. Names are case-insensitive; `Null` unsets.
    pub fn set_parameter(&self, name: &str, value: impl Into<Value>) {
        self.parameters.write().insert(name.to_lowercase(), value.into());
    }

    /// Reads a parameter.
    ///
    /// # Errors
    /// [`SijillError::NotFound`] if the parameter is unset.
    pub fn get_parameter(&self, name: &str) -> Result<Value> {
        let name = name.to_lowercase();

        match self.parameters.read().get(&name) {
            Some(value) if !value.is_null() => Ok(value.clone()),
            _ => Err(SijillError::parameter_not_found(name)),
        }
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters
            .read()
            .get(&name.to_lowercase())
            .is_some_and(|value| !value.is_null())
    }

    // ── Internal ──

    /// Caches a freshly built service. A concurrent build that finished
    /// first wins.
    fn materialize(&self, slot: String, service: Service) -> Service {
        self.services.write().entry(slot).or_insert(service).clone()
    }

    fn find_suggestions(&self, name: &str) -> Vec<String> {
        let mut available: Vec<String> = self
            .definitions
            .read()
            .iter()
            .map(ServiceDefinition::service_id)
            .collect();
        available.extend(self.services.read().keys().cloned());
        available.extend(self.factories.read().keys().cloned());
        available.sort();
        available.dedup();

        let available: Vec<&str> = available.iter().map(String::as_str).collect();
        suggest_similar(name, &available, 3)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.services.read().len())
            .field("factories", &self.factories.read().len())
            .field("definitions", &self.definitions.read().len())
            .field("parameters", &self.parameters.read().len())
            .field("compiled", &self.manifest.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, Entry};
    pub use crate::definition::{FactorySource, ServiceDefinition};
    pub use crate::error::{Result, SijillError};
    pub use crate::inspector::{CachedInspector, ContainerInspector, Inspector};
    pub use crate::provider::{Provider, ProviderRegistry};
    pub use crate::service::Service;
    pub use crate::settings::{ConflictPolicy, Settings};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
