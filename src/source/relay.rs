//! Wrapper adapters.
//!
//! For every type `T` that gets registered, the builder installs relay hooks
//! that let consumers resolve `Vec<Arc<T>>`, [`Lazy<T>`], [`Factory<T>`],
//! [`Meta<T>`], and [`Owned<T>`] without anyone registering those shapes.
//! Installation happens generically at registration time, while `T` is still
//! a concrete type parameter; at resolve time only erased lookups remain.
//!
//! [`Factory<T>`]: crate::Factory

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::activator::FactoryActivator;
use crate::error::{DiError, DiResult};
use crate::internal::unerase;
use crate::lifetime::{Lifetime, Ownership, Sharing};
use crate::metadata::Metadata;
use crate::registration::ComponentRegistration;
use crate::scope::LifetimeScope;
use crate::service::Service;
use crate::source::factory::{Factory, ParameterMapping};
use crate::source::{RegistrationSource, ServiceAccessor};
use crate::traits::{Resolver, ResolverCore};

pub(crate) type RelayFn =
    Arc<dyn Fn(&dyn ServiceAccessor) -> Vec<Arc<ComponentRegistration>> + Send + Sync>;

/// Source backing the wrapper adapters; one per builder.
pub(crate) struct RelaySource {
    entries: HashMap<Service, RelayFn>,
}

impl RelaySource {
    pub(crate) fn new(entries: HashMap<Service, RelayFn>) -> Self {
        RelaySource { entries }
    }
}

impl RegistrationSource for RelaySource {
    fn registrations_for(
        &self,
        service: &Service,
        accessor: &dyn ServiceAccessor,
    ) -> Vec<Arc<ComponentRegistration>> {
        match self.entries.get(service) {
            Some(relay) => relay(accessor),
            None => Vec::new(),
        }
    }

    fn is_adapter_for_individual_components(&self) -> bool {
        true
    }

    fn description(&self) -> &str {
        "wrapper relay source"
    }
}

/// Installs the wrapper relays for `T`. Idempotent per type.
pub(crate) fn install<T>(entries: &mut HashMap<Service, RelayFn>)
where
    T: ?Sized + Send + Sync + 'static,
{
    entries
        .entry(Service::typed::<Vec<Arc<T>>>())
        .or_insert_with(collection_relay::<T>);
    entries
        .entry(Service::typed::<Lazy<T>>())
        .or_insert_with(lazy_relay::<T>);
    entries
        .entry(Service::typed::<Factory<T>>())
        .or_insert_with(factory_relay::<T>);
    entries
        .entry(Service::typed::<Meta<T>>())
        .or_insert_with(meta_relay::<T>);
    entries
        .entry(Service::typed::<Owned<T>>())
        .or_insert_with(owned_relay::<T>);
}

fn adapter<T, F>(factory: F) -> Vec<Arc<ComponentRegistration>>
where
    T: ?Sized + Send + Sync + 'static,
    F: for<'a> Fn(&crate::ResolveContext<'a>) -> DiResult<Arc<T>> + Send + Sync + 'static,
{
    vec![Arc::new(ComponentRegistration::new(
        [Service::typed::<T>()],
        Arc::new(FactoryActivator::new::<T, F>(factory)),
        Lifetime::CurrentScope,
        Sharing::None,
        Ownership::ExternallyOwned,
    ))]
}

fn collection_relay<T: ?Sized + Send + Sync + 'static>() -> RelayFn {
    Arc::new(|_accessor| {
        adapter::<Vec<Arc<T>>, _>(|ctx| {
            let items = ctx
                .resolve_all_service(&Service::typed::<T>())?
                .into_iter()
                .map(unerase::<T>)
                .collect::<DiResult<Vec<Arc<T>>>>()?;
            Ok(Arc::new(items))
        })
    })
}

fn lazy_relay<T: ?Sized + Send + Sync + 'static>() -> RelayFn {
    Arc::new(|accessor| {
        if !accessor.is_registered(&Service::typed::<T>()) {
            return Vec::new();
        }
        adapter::<Lazy<T>, _>(|ctx| Ok(Arc::new(Lazy::new(ctx.scope().clone()))))
    })
}

fn factory_relay<T: ?Sized + Send + Sync + 'static>() -> RelayFn {
    Arc::new(|accessor| {
        if !accessor.is_registered(&Service::typed::<T>()) {
            return Vec::new();
        }
        adapter::<Factory<T>, _>(|ctx| {
            Ok(Arc::new(Factory::new(
                ctx.scope().clone(),
                ParameterMapping::ByType,
            )))
        })
    })
}

fn meta_relay<T: ?Sized + Send + Sync + 'static>() -> RelayFn {
    Arc::new(|accessor| {
        if !accessor.is_registered(&Service::typed::<T>()) {
            return Vec::new();
        }
        adapter::<Meta<T>, _>(|ctx| {
            let service = Service::typed::<T>();
            let registration = ctx
                .scope()
                .registry()
                .default_registration_for(&service)
                .ok_or_else(|| DiError::NotRegistered(service.description()))?;
            let value = unerase::<T>(ctx.resolve_service(&service, Vec::new())?)?;
            Ok(Arc::new(Meta {
                value,
                metadata: registration.metadata().clone(),
            }))
        })
    })
}

fn owned_relay<T: ?Sized + Send + Sync + 'static>() -> RelayFn {
    Arc::new(|accessor| {
        if !accessor.is_registered(&Service::typed::<T>()) {
            return Vec::new();
        }
        adapter::<Owned<T>, _>(|ctx| {
            let child = ctx.scope().begin_scope()?;
            let value = child.resolve::<T>()?;
            Ok(Arc::new(Owned {
                value,
                scope: Some(child),
            }))
        })
    })
}

/// Deferred resolution of `T`.
///
/// The inner resolve runs on first access, in a fresh operation, which makes
/// `Lazy` the supported way to break a legitimate circular dependency between
/// shared components. Holds its origin scope alive until dropped.
pub struct Lazy<T: ?Sized + Send + Sync + 'static> {
    scope: LifetimeScope,
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Lazy<T> {
    pub(crate) fn new(scope: LifetimeScope) -> Self {
        Lazy {
            scope,
            cell: OnceCell::new(),
        }
    }

    /// The value, resolving it on first call.
    pub fn value(&self) -> DiResult<Arc<T>> {
        if let Some(value) = self.cell.get() {
            return Ok(value.clone());
        }
        let value = self.scope.resolve::<T>()?;
        Ok(self.cell.get_or_init(|| value).clone())
    }

    /// Whether the value has been resolved yet.
    pub fn is_created(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// An instance of `T` together with the metadata of the registration that
/// produced it.
pub struct Meta<T: ?Sized + Send + Sync + 'static> {
    value: Arc<T>,
    metadata: Metadata,
}

impl<T: ?Sized + Send + Sync + 'static> Meta<T> {
    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// An instance of `T` resolved inside a private child scope.
///
/// Dropping (or [`release`](Owned::release)-ing) the `Owned` disposes that
/// scope, and with it everything the instance pulled in, independently of the
/// scope the `Owned` was resolved from.
pub struct Owned<T: ?Sized + Send + Sync + 'static> {
    value: Arc<T>,
    scope: Option<LifetimeScope>,
}

impl<T: ?Sized + Send + Sync + 'static> Owned<T> {
    pub fn value(&self) -> &Arc<T> {
        &self.value
    }

    /// Disposes the private scope now.
    pub fn release(mut self) {
        if let Some(scope) = self.scope.take() {
            scope.dispose();
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Drop for Owned<T> {
    fn drop(&mut self) {
        if let Some(scope) = self.scope.take() {
            scope.dispose();
        }
    }
}
