//! Type-erased service handles.
//!
//! Everything the container hands out is a [`Service`]: a cheap, clonable
//! handle around an `Arc<T>` (where `T` may be a trait object) plus the
//! name of the concrete type the value was built from.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SijillError};

/// A resolved service instance.
///
/// Clones share the same instance; [`Service::ptr_eq`] tells whether two
/// handles came from the same resolution.
///
/// # Examples
/// ```
/// use sijill_container::service::Service;
/// use std::sync::Arc;
///
/// let service = Service::new(String::from("hello"));
/// let value: Arc<String> = service.downcast().unwrap();
/// assert_eq!(*value, "hello");
/// ```
#[derive(Clone)]
pub struct Service {
    handle: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Service {
    /// Wraps a plain value.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an existing `Arc<T>`; `T` may be a trait object.
    ///
    /// The recorded concrete type is `T` itself. Use
    /// [`Service::with_concrete`] when `T` is an interface and the
    /// implementation type is known.
    pub fn from_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            handle: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Builds an interface handle from a concrete value.
    ///
    /// The value is stored as `Arc<I>` and `C` is recorded as its runtime
    /// type.
    pub fn with_concrete<I, C>(value: Arc<C>, upcast: fn(Arc<C>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
    {
        Self {
            handle: Arc::new(upcast(value)),
            type_name: type_name::<C>(),
        }
    }

    /// Returns the shared value if it was stored as `Arc<T>`.
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.handle.downcast_ref::<Arc<T>>().cloned()
    }

    /// Like [`downcast`](Service::downcast), but a mismatch is an
    /// [`SijillError::InvalidArgument`] about `subject`.
    pub fn require<T: ?Sized + Send + Sync + 'static>(&self, subject: &str) -> Result<Arc<T>> {
        self.downcast::<T>().ok_or_else(|| {
            SijillError::invalid_argument(
                subject,
                format!(
                    "Type mismatch: expected {}, found {}",
                    type_name::<T>(),
                    self.type_name
                ),
            )
        })
    }

    /// Returns `true` if the value was stored as `Arc<T>`.
    pub fn is<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.handle.is::<Arc<T>>()
    }

    /// Name of the concrete type this service was built from.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Service) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("type", &self.type_name)
            .finish()
    }
}
