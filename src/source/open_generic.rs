//! Open-generic bindings.
//!
//! Rust has no runtime reflection over type constructors, so "register
//! `Repo<X>` for every `X`" is expressed the other way round: the user writes
//! one generic binder function and instantiates it per closed type, each
//! instantiation checked against the generic's bounds at compile time. The
//! bindings live in an [`OpenGenericSource`], so closed registrations are
//! synthesized on demand and each may carry a runtime predicate; when the
//! predicate fails the source simply produces no registrations.
//!
//! # Examples
//!
//! ```rust
//! use graft_di::{ContainerBuilder, OpenGenericSource, Resolver};
//! use std::fmt::Debug;
//! use std::sync::Arc;
//!
//! struct Repo<X> {
//!     seed: X,
//! }
//!
//! fn bind_repo<X: Default + Debug + Send + Sync + 'static>(source: &mut OpenGenericSource) {
//!     source.bind(|_ctx| Ok(Arc::new(Repo { seed: X::default() })));
//! }
//!
//! let mut source = OpenGenericSource::new("repositories");
//! bind_repo::<u32>(&mut source);
//! bind_repo::<String>(&mut source);
//!
//! let mut builder = ContainerBuilder::new();
//! builder.register_source(source);
//! let container = builder.build();
//!
//! assert_eq!(container.resolve::<Repo<u32>>().unwrap().seed, 0);
//! assert_eq!(container.resolve::<Repo<String>>().unwrap().seed, "");
//! ```

use std::sync::Arc;

use crate::activator::FactoryActivator;
use crate::error::DiResult;
use crate::lifetime::{Lifetime, Ownership, Sharing};
use crate::operation::ResolveContext;
use crate::registration::ComponentRegistration;
use crate::service::Service;
use crate::source::{RegistrationSource, ServiceAccessor};

type BuildFn = Arc<dyn Fn() -> Arc<ComponentRegistration> + Send + Sync>;
type PredicateFn = Arc<dyn Fn() -> bool + Send + Sync>;

struct GenericBinding {
    service: Service,
    predicate: Option<PredicateFn>,
    build: BuildFn,
}

/// A table of closed-type bindings produced from one open-generic template.
pub struct OpenGenericSource {
    description: String,
    bindings: Vec<GenericBinding>,
}

impl OpenGenericSource {
    pub fn new(description: impl Into<String>) -> Self {
        OpenGenericSource {
            description: description.into(),
            bindings: Vec::new(),
        }
    }

    /// Binds a transient closed type.
    pub fn bind<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind_with(Lifetime::CurrentScope, Sharing::None, factory)
    }

    /// Binds a closed type shared as a root-scope singleton.
    pub fn bind_shared<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind_with(Lifetime::RootScope, Sharing::Shared, factory)
    }

    /// Binds a closed type with explicit lifetime and sharing.
    pub fn bind_with<T, F>(&mut self, lifetime: Lifetime, sharing: Sharing, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        self.bindings.push(GenericBinding {
            service: Service::typed::<T>(),
            predicate: None,
            build: Arc::new(move || {
                let factory = factory.clone();
                Arc::new(ComponentRegistration::new(
                    [Service::typed::<T>()],
                    Arc::new(FactoryActivator::new::<T, _>(move |ctx| (*factory)(ctx))),
                    lifetime,
                    sharing,
                    Ownership::OwnedByScope,
                ))
            }),
        });
        self
    }

    /// Attaches a runtime predicate to the most recent binding, consulted
    /// when the closed type is first requested; a false result leaves the
    /// type unregistered.
    pub fn when(&mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> &mut Self {
        if let Some(binding) = self.bindings.last_mut() {
            binding.predicate = Some(Arc::new(predicate));
        }
        self
    }
}

impl RegistrationSource for OpenGenericSource {
    fn registrations_for(
        &self,
        service: &Service,
        _accessor: &dyn ServiceAccessor,
    ) -> Vec<Arc<ComponentRegistration>> {
        self.bindings
            .iter()
            .filter(|binding| binding.service == *service)
            .filter(|binding| binding.predicate.as_ref().map_or(true, |p| p()))
            .map(|binding| (binding.build)())
            .collect()
    }

    fn is_adapter_for_individual_components(&self) -> bool {
        true
    }

    fn description(&self) -> &str {
        &self.description
    }
}
