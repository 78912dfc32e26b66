//! Constructor autowiring.
//!
//! A type implementing [`Autowire`] lists its constructor parameters;
//! [`AutowireResolver`] resolves each required one by type and hands the
//! collected [`Arguments`] to [`Autowire::construct`]. Optional
//! parameters receive [`Argument::Default`] and are never resolved.
//!
//! `#[derive(Autowire)]` writes both halves from a struct's fields.

use std::any::type_name;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::error::{Result, SijillError};
use crate::key::TypeKey;
use crate::service::Service;
use crate::type_resolver::ResolveByType;

/// A constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    /// Declared type; parameters without one resolve by name.
    pub declared: Option<TypeKey>,
    /// Optional parameters take their default value.
    pub optional: bool,
}

impl Parameter {
    /// A parameter of type `T`.
    pub fn typed<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            declared: Some(TypeKey::of::<T>()),
            optional: false,
        }
    }

    /// A parameter resolved by its own name.
    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            declared: None,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The type name, or the parameter name when no type is declared.
    pub fn lookup_key(&self) -> &'static str {
        match self.declared {
            Some(key) => key.type_name(),
            None => self.name,
        }
    }
}

/// One constructor argument.
#[derive(Debug, Clone)]
pub enum Argument {
    Resolved(Service),
    /// Use the parameter's default value.
    Default,
}

/// Ordered constructor arguments, consumed front to back.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: VecDeque<Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, argument: Argument) -> Self {
        self.values.push_back(argument);
        self
    }

    pub fn with_service(self, service: Service) -> Self {
        self.with(Argument::Resolved(service))
    }

    /// Appends a plain value.
    pub fn with_value<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.with_service(Service::new(value))
    }

    pub fn push(&mut self, argument: Argument) {
        self.values.push_back(argument);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the next argument as a resolved service.
    pub fn raw(&mut self, parameter: &str) -> Result<Service> {
        match self.values.pop_front() {
            Some(Argument::Resolved(service)) => Ok(service),
            Some(Argument::Default) => Err(SijillError::invalid_argument(
                parameter,
                "required parameter received no value",
            )),
            None => Err(SijillError::invalid_argument(
                parameter,
                "missing constructor argument",
            )),
        }
    }

    /// Takes the next argument as a shared `T`.
    pub fn service<T: ?Sized + Send + Sync + 'static>(&mut self, parameter: &str) -> Result<Arc<T>> {
        self.raw(parameter)?.require::<T>(parameter)
    }

    /// Takes the next argument as an owned `T`, or `default()` if it is
    /// absent or [`Argument::Default`].
    pub fn value_or<T, F>(&mut self, parameter: &str, default: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        match self.values.pop_front() {
            Some(Argument::Resolved(service)) => {
                service.require::<T>(parameter).map(|value| (*value).clone())
            }
            Some(Argument::Default) | None => Ok(default()),
        }
    }

    /// [`value_or`](Self::value_or) with `T::default()`.
    pub fn value_or_default<T>(&mut self, parameter: &str) -> Result<T>
    where
        T: Clone + Default + Send + Sync + 'static,
    {
        self.value_or(parameter, T::default)
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<It: IntoIterator<Item = Argument>>(iter: It) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// A type constructible from resolved constructor arguments.
pub trait Autowire: Sized {
    /// Constructor parameters in declaration order.
    fn parameters() -> Vec<Parameter>;

    /// Builds the value. `arguments` holds one entry per parameter.
    fn construct(arguments: Arguments) -> Result<Self>;
}

type BuildFn<R> = fn(&AutowireResolver<R>) -> Result<Service>;

/// Builds [`Autowire`] types, resolving their parameters by type.
///
/// # Examples
/// ```rust
/// use sijill_container::autowire::{Arguments, Autowire, AutowireResolver, Parameter};
/// use sijill_container::prelude::*;
/// use sijill_container::type_resolver::TypeResolver;
/// use std::sync::Arc;
///
/// struct Clock;
///
/// struct Scheduler {
///     clock: Arc<Clock>,
///     workers: usize,
/// }
///
/// impl Autowire for Scheduler {
///     fn parameters() -> Vec<Parameter> {
///         vec![Parameter::typed::<Clock>("clock"), Parameter::named("workers").optional()]
///     }
///
///     fn construct(mut args: Arguments) -> Result<Self> {
///         Ok(Scheduler {
///             clock: args.service("clock")?,
///             workers: args.value_or("workers", || 4)?,
///         })
///     }
/// }
///
/// let container = Container::builder()
///     .service::<Clock, _>("clock", |_| Ok(Clock))
///     .build()
///     .unwrap();
///
/// let resolver = AutowireResolver::new(TypeResolver::new(&container));
/// let scheduler: Scheduler = resolver.get_object().unwrap();
/// assert_eq!(scheduler.workers, 4);
/// ```
pub struct AutowireResolver<R> {
    resolver: R,
    classes: HashMap<String, BuildFn<R>>,
}

impl<R: ResolveByType> AutowireResolver<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            classes: HashMap::new(),
        }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Builds a `T`, resolving every required parameter.
    #[instrument(skip(self), fields(class = type_name::<T>()), level = "debug")]
    pub fn get_object<T: Autowire>(&self) -> Result<T> {
        let parameters = T::parameters();
        let mut arguments = Arguments::new();

        for parameter in &parameters {
            if parameter.optional {
                trace!(parameter = parameter.name, "Using default value");
                arguments.push(Argument::Default);
                continue;
            }

            let service = self.resolver.get_service_by_type(parameter.lookup_key())?;
            arguments.push(Argument::Resolved(service));
        }

        T::construct(arguments)
    }

    /// Makes `T` buildable by its type name through
    /// [`get_object_by_name`](Self::get_object_by_name).
    pub fn register<T: Autowire + Send + Sync + 'static>(&mut self) -> &mut Self {
        self.register_as::<T>(type_name::<T>())
    }

    /// Makes `T` buildable under `class`.
    pub fn register_as<T: Autowire + Send + Sync + 'static>(&mut self, class: &str) -> &mut Self {
        debug!(class, "Registered autowired class");
        self.classes.insert(class.to_string(), build_service::<T, R>);
        self
    }

    /// Builds a registered class by name.
    ///
    /// # Errors
    /// [`SijillError::InvalidArgument`] if `class` was never registered.
    pub fn get_object_by_name(&self, class: &str) -> Result<Service> {
        let build = self.classes.get(class).ok_or_else(|| {
            SijillError::invalid_argument(class, format!("Provided class {class} does not exist"))
        })?;
        build(self)
    }
}

fn build_service<T, R>(resolver: &AutowireResolver<R>) -> Result<Service>
where
    T: Autowire + Send + Sync + 'static,
    R: ResolveByType,
{
    Ok(Service::new(resolver.get_object::<T>()?))
}

impl<R> fmt::Debug for AutowireResolver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutowireResolver")
            .field("classes", &self.classes.len())
            .finish()
    }
}
