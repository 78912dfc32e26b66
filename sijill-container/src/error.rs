//! Error types for Sijill container operations.
//!
//! Every failure names the service, parameter, type or class it is
//! about and, where it helps, a hint on how to fix it.

use std::fmt;

use sijill_support::rendering::render_list;

/// Main error type for all Sijill operations.
#[derive(Debug, thiserror::Error)]
pub enum SijillError {
    /// A service, parameter, type or class has no resolvable entry.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// A property marked for injection names a service the container
    /// cannot satisfy.
    #[error("{}", .0)]
    InvalidConfiguration(InvalidConfigurationError),

    /// An object failed an expected interface check, or a class could
    /// not be looked up.
    #[error("Invalid argument {subject}: {reason}")]
    InvalidArgument { subject: String, reason: String },

    /// The compiler could not emit source for a container.
    #[error("{}", .0)]
    CompilationFailure(CompilationFailureError),

    /// Two services declare the same type and the conflict policy
    /// rejects it.
    #[error("{}", .0)]
    TypeConflict(TypeConflictError),

    /// A factory returned an error during construction.
    #[error("Failed to construct {name}: {source}")]
    ConstructionFailed {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Reading or writing a cache entry failed.
    #[error("Cache entry {key} could not be used: {source}")]
    Cache {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SijillError {
    /// Shorthand for a missing service.
    pub fn service_not_found(name: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::NotFound(NotFoundError {
            kind: LookupKind::Service,
            requested: name.into(),
            suggestions,
        })
    }

    /// Shorthand for a missing parameter.
    pub fn parameter_not_found(name: impl Into<String>) -> Self {
        Self::NotFound(NotFoundError {
            kind: LookupKind::Parameter,
            requested: name.into(),
            suggestions: Vec::new(),
        })
    }

    /// Shorthand for a type nothing resolves to.
    pub fn type_not_found(type_name: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::NotFound(NotFoundError {
            kind: LookupKind::Type,
            requested: type_name.into(),
            suggestions,
        })
    }

    pub fn invalid_argument(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    pub fn compilation(service: Option<&str>, reason: impl Into<String>) -> Self {
        Self::CompilationFailure(CompilationFailureError {
            service: service.map(str::to_string),
            reason: reason.into(),
        })
    }

    /// Wraps any error raised by a user factory.
    pub fn construction(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ConstructionFailed {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn cache(
        key: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Cache {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns `true` for [`SijillError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// What kind of lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Service,
    Parameter,
    Type,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Service => write!(f, "Service"),
            LookupKind::Parameter => write!(f, "Parameter"),
            LookupKind::Type => write!(f, "Type"),
        }
    }
}

/// Error when a lookup has no entry.
#[derive(Debug)]
pub struct NotFoundError {
    pub kind: LookupKind,
    /// The name or type that was requested
    pub requested: String,
    /// Registered names close to the requested one
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LookupKind::Parameter => write!(f, "Parameter {} not set", self.requested)?,
            LookupKind::Service => write!(f, "Service {} not defined", self.requested)?,
            LookupKind::Type => write!(f, "No service resolves type {}", self.requested)?,
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        if self.kind == LookupKind::Type {
            write!(
                f,
                "\n  Hint: register a service declaring this type, or add a factory resolver for one of its interfaces"
            )?;
        }

        Ok(())
    }
}

/// Error when a property wants a service that does not exist.
#[derive(Debug)]
pub struct InvalidConfigurationError {
    pub class: String,
    pub property: String,
    pub service: String,
}

impl fmt::Display for InvalidConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trying to inject a not existing service {} into {}::{}",
            self.service, self.class, self.property,
        )?;
        write!(
            f,
            "\n  Hint: register {} or point the property at another service with #[inject(\"id\")]",
            self.service,
        )
    }
}

/// Error when source for a compiled container cannot be produced.
#[derive(Debug)]
pub struct CompilationFailureError {
    /// Service id being compiled, if the failure is specific to one
    pub service: Option<String>,
    pub reason: String,
}

impl fmt::Display for CompilationFailureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.service {
            Some(ref service) => write!(f, "Cannot compile service {service}: {}", self.reason),
            None => write!(f, "Cannot compile container: {}", self.reason),
        }
    }
}

/// Error when two services declare the same type.
#[derive(Debug)]
pub struct TypeConflictError {
    pub type_name: String,
    pub existing: String,
    pub incoming: String,
}

impl fmt::Display for TypeConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type {} is declared by more than one service: {}",
            self.type_name,
            render_list(&[&self.existing, &self.incoming]),
        )?;
        write!(
            f,
            "\n  Hint: resolve one of them by name, or use ConflictPolicy::Override / KeepFirst"
        )
    }
}

/// Convenient Result type for Sijill operations.
pub type Result<T> = std::result::Result<T, SijillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_not_found_display() {
        let err = SijillError::service_not_found("FooBar", vec!["foo_baz".to_string()]);

        let msg = format!("{err}");
        assert!(msg.contains("Service FooBar not defined"));
        assert!(msg.contains("foo_baz"));
        assert!(err.is_not_found());
    }

    #[test]
    fn parameter_not_found_display() {
        let msg = SijillError::parameter_not_found("foobar").to_string();
        assert_eq!(msg, "Parameter foobar not set");
    }

    #[test]
    fn invalid_configuration_display() {
        let err = SijillError::InvalidConfiguration(InvalidConfigurationError {
            class: "app::FooService".into(),
            property: "bar".into(),
            service: "foo_bar".into(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("not existing service foo_bar"));
        assert!(msg.contains("app::FooService::bar"));
    }

    #[test]
    fn type_conflict_display() {
        let err = SijillError::TypeConflict(TypeConflictError {
            type_name: "app::Logger".into(),
            existing: "file_logger".into(),
            incoming: "console_logger".into(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("app::Logger"));
        assert!(msg.contains("file_logger, console_logger"));
    }

    #[test]
    fn compilation_failure_display() {
        let msg = SijillError::compilation(Some("foo_service"), "no factory source").to_string();
        assert_eq!(msg, "Cannot compile service foo_service: no factory source");
    }
}
