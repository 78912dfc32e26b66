//! Introspection of a container's declared services.
//!
//! An [`Inspector`] answers three questions about a container: which
//! service ids it declares, which service provides a given type, and which
//! services carry a given tag. [`ContainerInspector`] derives the answers
//! from the container's definitions (or its compiled manifest);
//! [`CachedInspector`] memoizes any inspector in a [`CacheStore`](crate::cache::CacheStore).

mod cached;

pub use cached::CachedInspector;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace, warn};

use crate::container::Container;
use crate::definition::ServiceDefinition;
use crate::error::{Result, SijillError, TypeConflictError};
use crate::settings::ConflictPolicy;

/// Type name → service id, in discovery order.
pub type TypeMap = IndexMap<String, String>;

/// Tag → service ids carrying it, in discovery order.
pub type TagMap = IndexMap<String, Vec<String>>;

/// Read access to a container's id, type and tag maps.
pub trait Inspector {
    /// Sorted, de-duplicated service ids.
    fn service_ids(&self) -> Result<Vec<String>>;

    /// Type name → id of the service providing it.
    fn typed_service_ids(&self) -> Result<TypeMap>;

    /// Tag → ids of the services carrying it.
    fn tagged_service_ids(&self) -> Result<TagMap>;
}

impl<I: Inspector + ?Sized> Inspector for &I {
    fn service_ids(&self) -> Result<Vec<String>> {
        (**self).service_ids()
    }

    fn typed_service_ids(&self) -> Result<TypeMap> {
        (**self).typed_service_ids()
    }

    fn tagged_service_ids(&self) -> Result<TagMap> {
        (**self).tagged_service_ids()
    }
}

// ═══════════════════════════════════════════
// ContainerInspector
// ═══════════════════════════════════════════

/// Inspector reading a live container.
///
/// A container built with a compiled manifest is answered from the
/// manifest without looking at its definitions.
///
/// # Examples
/// ```rust
/// use sijill_container::prelude::*;
///
/// struct Mailer;
///
/// let container = Container::builder()
///     .service::<Mailer, _>("mailer", |_| Ok(Mailer))
///     .define(ServiceDefinition::new::<u32, _>("retry_limit", |_| Ok(3)).tagged("config"))
///     .build()
///     .unwrap();
///
/// let inspector = ContainerInspector::new(&container);
/// assert_eq!(inspector.service_ids().unwrap(), ["mailer", "retry_limit"]);
/// assert_eq!(inspector.tagged_service_ids().unwrap()["config"], ["retry_limit"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContainerInspector<'a> {
    container: &'a Container,
}

impl<'a> ContainerInspector<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// Service id → definition, in declaration order.
    ///
    /// Reserved accessor names are skipped. When two definitions map to
    /// the same id the later one replaces the earlier one in place.
    pub fn service_methods(&self) -> IndexMap<String, ServiceDefinition> {
        let mut methods = IndexMap::new();
        for definition in self.container.definitions() {
            if definition.is_reserved() {
                continue;
            }
            methods.insert(definition.service_id(), definition);
        }
        methods
    }
}

impl Inspector for ContainerInspector<'_> {
    fn service_ids(&self) -> Result<Vec<String>> {
        if let Some(manifest) = self.container.manifest() {
            trace!("Service ids from manifest");
            return Ok(manifest.service_ids());
        }

        let mut ids: Vec<String> = self.service_methods().into_keys().collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    #[instrument(skip(self), level = "debug")]
    fn typed_service_ids(&self) -> Result<TypeMap> {
        if let Some(manifest) = self.container.manifest() {
            trace!("Type map from manifest");
            return Ok(manifest.type_map());
        }

        let policy = self.container.settings().conflict_policy;
        let mut types = TypeMap::new();

        for (id, definition) in self.service_methods() {
            let Some(declared) = definition.declared() else {
                trace!(service = %id, "No declared type");
                continue;
            };

            record_type(&mut types, declared.type_name(), &id, policy)?;

            if declared.is_interface() {
                match self.container.get(&id) {
                    Ok(service) if service.type_name() != declared.type_name() => {
                        record_type(&mut types, service.type_name(), &id, policy)?;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(service = %id, error = %err, "Cannot resolve instance for its concrete type");
                    }
                }
            }
        }

        debug!(types = types.len(), "Derived type map");
        Ok(types)
    }

    fn tagged_service_ids(&self) -> Result<TagMap> {
        if let Some(manifest) = self.container.manifest() {
            trace!("Tag map from manifest");
            return Ok(manifest.tag_map());
        }

        let mut tags = TagMap::new();
        for (id, definition) in self.service_methods() {
            if let Some(tag) = definition.tag() {
                tags.entry(tag.to_string()).or_default().push(id);
            }
        }
        Ok(tags)
    }
}

/// Maps `type_name` to `id`, applying `policy` if another service
/// already owns the type.
fn record_type(types: &mut TypeMap, type_name: &str, id: &str, policy: ConflictPolicy) -> Result<()> {
    let existing = match types.get(type_name) {
        Some(existing) if existing != id => existing.clone(),
        _ => {
            types.insert(type_name.to_string(), id.to_string());
            return Ok(());
        }
    };

    match policy {
        ConflictPolicy::Override => {
            warn!(type_name, existing = %existing, incoming = id, "Type declared twice, later service wins");
            types.insert(type_name.to_string(), id.to_string());
            Ok(())
        }
        ConflictPolicy::KeepFirst => {
            warn!(type_name, existing = %existing, incoming = id, "Type declared twice, keeping first service");
            Ok(())
        }
        ConflictPolicy::Reject => Err(SijillError::TypeConflict(TypeConflictError {
            type_name: type_name.to_string(),
            existing,
            incoming: id.to_string(),
        })),
    }
}
