//! Lazy lookup of tagged services.

use tracing::trace;

use crate::container::Container;
use crate::error::Result;
use crate::inspector::{ContainerInspector, Inspector};
use crate::service::Service;

/// Resolves every service carrying a tag.
#[derive(Debug)]
pub struct TagResolver<'a, I: Inspector = ContainerInspector<'a>> {
    container: &'a Container,
    inspector: I,
}

impl<'a> TagResolver<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self::with_inspector(container, ContainerInspector::new(container))
    }
}

impl<'a, I: Inspector> TagResolver<'a, I> {
    pub fn with_inspector(container: &'a Container, inspector: I) -> Self {
        Self { container, inspector }
    }

    /// Services tagged `tag`, in tag map order.
    ///
    /// Each service is resolved only when the iterator reaches it. An
    /// unknown tag yields an empty iterator.
    ///
    /// ```rust
    /// use sijill_container::prelude::*;
    /// use sijill_container::tag_resolver::TagResolver;
    ///
    /// let container = Container::builder()
    ///     .define(ServiceDefinition::new::<u8, _>("first", |_| Ok(1)).tagged("numbers"))
    ///     .define(ServiceDefinition::new::<u8, _>("second", |_| Ok(2)).tagged("numbers"))
    ///     .build()
    ///     .unwrap();
    ///
    /// let numbers: Vec<u8> = TagResolver::new(&container)
    ///     .services_by_tag("numbers")
    ///     .unwrap()
    ///     .map(|service| *service.unwrap().downcast::<u8>().unwrap())
    ///     .collect();
    /// assert_eq!(numbers, [1, 2]);
    /// ```
    pub fn services_by_tag(&self, tag: &str) -> Result<impl Iterator<Item = Result<Service>> + 'a> {
        let ids = self
            .inspector
            .tagged_service_ids()?
            .swap_remove(tag)
            .unwrap_or_default();
        trace!(tag, services = ids.len(), "Resolving tagged services");

        let container = self.container;
        Ok(ids.into_iter().map(move |id| container.get(&id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ServiceDefinition;
    use crate::error::SijillError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn unknown_tag_is_empty() {
        let container = Container::new();
        let resolver = TagResolver::new(&container);

        assert_eq!(resolver.services_by_tag("nothing").unwrap().count(), 0);
    }

    #[test]
    fn services_are_resolved_lazily() {
        let built = Arc::new(AtomicU32::new(0));
        let counter = |value: u32| {
            let built = built.clone();
            move |_: &Container| -> Result<u32> {
                built.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
        };

        let container = Container::builder()
            .define(ServiceDefinition::new::<u32, _>("a", counter(1)).tagged("t"))
            .define(ServiceDefinition::new::<u32, _>("b", counter(2)).tagged("t"))
            .build()
            .unwrap();

        let resolver = TagResolver::new(&container);
        let mut services = resolver.services_by_tag("t").unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 0);

        let first = services.next().unwrap().unwrap();
        assert_eq!(*first.downcast::<u32>().unwrap(), 1);
        assert_eq!(built.load(Ordering::SeqCst), 1);

        assert!(services.next().is_some());
        assert!(services.next().is_none());
    }

    #[test]
    fn failing_service_surfaces_in_sequence() {
        let container = Container::builder()
            .define(
                ServiceDefinition::new::<u32, _>("broken", |_| {
                    Err(SijillError::construction("broken", "offline"))
                })
                .tagged("t"),
            )
            .build()
            .unwrap();

        let resolver = TagResolver::new(&container);
        let results: Vec<_> = resolver.services_by_tag("t").unwrap().collect();

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
