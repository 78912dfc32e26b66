//! Implementation catalog: which concrete types implement which
//! interfaces.
//!
//! Rust has no runtime query for "does type X implement trait Y", so the
//! facts are declared next to the `impl` blocks with [`implements!`] and
//! collected at link time through `inventory`.
//!
//! ```rust,ignore
//! pub trait Repository: Send + Sync {}
//! pub struct UserRepository;
//! impl Repository for UserRepository {}
//!
//! sijill::implements!(UserRepository: dyn Repository);
//!
//! assert!(sijill::catalog::implements(
//!     std::any::type_name::<UserRepository>(),
//!     std::any::type_name::<dyn Repository>(),
//! ));
//! ```

use std::any::type_name;
use std::fmt;

/// One "concrete implements interface" fact.
pub struct Implementation {
    interface: fn() -> &'static str,
    concrete: fn() -> &'static str,
}

impl Implementation {
    /// Pass `std::any::type_name::<I>` and `std::any::type_name::<C>`.
    pub const fn new(interface: fn() -> &'static str, concrete: fn() -> &'static str) -> Self {
        Self { interface, concrete }
    }

    pub fn interface(&self) -> &'static str {
        (self.interface)()
    }

    pub fn concrete(&self) -> &'static str {
        (self.concrete)()
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.concrete(), self.interface())
    }
}

inventory::collect!(Implementation);

/// Returns `true` if `concrete` was declared to implement `interface`.
pub fn implements(concrete: &str, interface: &str) -> bool {
    inventory::iter::<Implementation>
        .into_iter()
        .any(|fact| fact.concrete() == concrete && fact.interface() == interface)
}

/// Typed form of [`implements`].
pub fn implements_type<C: ?Sized + 'static, I: ?Sized + 'static>() -> bool {
    implements(type_name::<C>(), type_name::<I>())
}

/// Every interface `concrete` was declared to implement.
pub fn interfaces_of(concrete: &str) -> Vec<&'static str> {
    inventory::iter::<Implementation>
        .into_iter()
        .filter(|fact| fact.concrete() == concrete)
        .map(Implementation::interface)
        .collect()
}

/// Declares that a concrete type implements one or more interfaces.
///
/// Fails to compile unless `&concrete` coerces to `&interface`.
///
/// ```rust,ignore
/// sijill::implements!(SmtpTransport: dyn Transport, dyn HealthCheck);
/// ```
#[macro_export]
macro_rules! implements {
    ($concrete:ty : $($interface:ty),+ $(,)?) => {
        $(
            const _: () = {
                fn coerce(concrete: &$concrete) -> &$interface {
                    concrete
                }
            };

            $crate::__private::inventory::submit! {
                $crate::catalog::Implementation::new(
                    ::std::any::type_name::<$interface>,
                    ::std::any::type_name::<$concrete>,
                )
            }
        )+
    };
}
