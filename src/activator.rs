//! Instantiation strategies.
//!
//! An [`Activator`] produces the raw (undecorated, unshared) instance for a
//! registration. Construction is always an explicit factory closure or a
//! pre-built instance; the container never guesses constructors.

use std::any::type_name;
use std::sync::Arc;

use crate::error::DiResult;
use crate::internal::erase;
use crate::operation::ResolveContext;
use crate::SharedInstance;

/// Strategy for producing instances of a component.
pub trait Activator: Send + Sync {
    /// Produces one instance. Parameters for the request are available on the
    /// context via [`ResolveContext::parameter`] and
    /// [`ResolveContext::argument`].
    fn activate(&self, ctx: &ResolveContext<'_>) -> DiResult<SharedInstance>;

    /// The concrete type this activator produces, for diagnostics and
    /// decorator contexts.
    fn description(&self) -> &'static str;
}

pub(crate) type ErasedFactory =
    Arc<dyn for<'a> Fn(&ResolveContext<'a>) -> DiResult<SharedInstance> + Send + Sync>;

/// Delegate-based activator: calls a user factory on every activation.
pub struct FactoryActivator {
    factory: ErasedFactory,
    type_name: &'static str,
}

impl FactoryActivator {
    /// Wraps a fallible factory producing `Arc<T>`.
    pub fn new<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        FactoryActivator {
            factory: Arc::new(move |ctx| Ok(erase(factory(ctx)?))),
            type_name: type_name::<T>(),
        }
    }
}

impl Activator for FactoryActivator {
    fn activate(&self, ctx: &ResolveContext<'_>) -> DiResult<SharedInstance> {
        (self.factory)(ctx)
    }

    fn description(&self) -> &'static str {
        self.type_name
    }
}

/// Activator that hands out a pre-built instance.
pub struct InstanceActivator {
    instance: SharedInstance,
    type_name: &'static str,
}

impl InstanceActivator {
    pub fn new<T: ?Sized + Send + Sync + 'static>(instance: Arc<T>) -> Self {
        InstanceActivator {
            instance: erase(instance),
            type_name: type_name::<T>(),
        }
    }
}

impl Activator for InstanceActivator {
    fn activate(&self, _ctx: &ResolveContext<'_>) -> DiResult<SharedInstance> {
        Ok(self.instance.clone())
    }

    fn description(&self) -> &'static str {
        self.type_name
    }
}
