//! The resolution surface.
//!
//! Split in two, like the rest of the crate splits erased plumbing from typed
//! sugar: [`ResolverCore`] is object-safe and works on [`Service`] values and
//! erased payloads; [`Resolver`] layers the generic convenience methods on top
//! and is blanket-implemented for every `ResolverCore`.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::internal::unerase;
use crate::params::Parameter;
use crate::service::{Service, ServiceKey};
use crate::SharedInstance;

/// Object-safe resolution primitives.
///
/// Implemented by [`Container`](crate::Container),
/// [`LifetimeScope`](crate::LifetimeScope), and
/// [`ResolveContext`](crate::ResolveContext). The context implementation joins
/// nested requests to the in-flight operation so circular graphs are detected
/// across the whole chain.
pub trait ResolverCore {
    /// Resolves the default registration for a service.
    fn resolve_service(
        &self,
        service: &Service,
        parameters: Vec<Parameter>,
    ) -> DiResult<SharedInstance>;

    /// Resolves every visible registration for a service, in registration
    /// order (ancestor registries first).
    fn resolve_all_service(&self, service: &Service) -> DiResult<Vec<SharedInstance>>;

    /// Whether any registration (direct or source-producible) exists.
    fn is_registered_service(&self, service: &Service) -> bool;
}

/// Typed resolution sugar over [`ResolverCore`].
///
/// # Examples
///
/// ```rust
/// use graft_di::{ContainerBuilder, Resolver};
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(|_| 42u32);
/// let container = builder.build();
///
/// let n = container.resolve::<u32>().unwrap();
/// assert_eq!(*n, 42);
/// assert!(container.is_registered::<u32>());
/// assert!(container.try_resolve::<String>().unwrap().is_none());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the default registration for `T`.
    fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        unerase(self.resolve_service(&Service::typed::<T>(), Vec::new())?)
    }

    /// Like [`resolve`](Resolver::resolve), but an unregistered service yields
    /// `Ok(None)` instead of an error. Every other failure still propagates.
    fn try_resolve<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        match self.resolve::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(DiError::NotRegistered(_)) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// Resolves the registration of `T` under a key.
    fn resolve_keyed<T: ?Sized + Send + Sync + 'static>(
        &self,
        key: impl Into<ServiceKey>,
    ) -> DiResult<Arc<T>> {
        unerase(self.resolve_service(&Service::keyed::<T>(key), Vec::new())?)
    }

    /// Resolves the registration of `T` under a name.
    fn resolve_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &'static str,
    ) -> DiResult<Arc<T>> {
        self.resolve_keyed::<T>(ServiceKey::Name(name))
    }

    /// Resolves `T` with caller-supplied parameters for this request only.
    fn resolve_with<T: ?Sized + Send + Sync + 'static>(
        &self,
        parameters: Vec<Parameter>,
    ) -> DiResult<Arc<T>> {
        unerase(self.resolve_service(&Service::typed::<T>(), parameters)?)
    }

    /// Resolves all visible registrations of `T`, in registration order.
    fn resolve_all<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<T>>> {
        self.resolve_all_service(&Service::typed::<T>())?
            .into_iter()
            .map(unerase)
            .collect()
    }

    /// Whether `T` has any registration, without resolving it.
    fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.is_registered_service(&Service::typed::<T>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
