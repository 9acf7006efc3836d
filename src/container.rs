//! Container construction.
//!
//! All registration happens on a [`ContainerBuilder`] before the container
//! exists; once [`build`](ContainerBuilder::build) runs, the registry is
//! frozen. Registration methods return a [`RegistrationBuilder`] whose fluent
//! methods refine the registration; it commits when it goes out of scope, so
//! plain statement-position chaining is all that is needed.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::activator::{Activator, FactoryActivator, InstanceActivator};
use crate::decorator::{DecoratorBuilder, DecoratorContext, DecoratorRegistration};
use crate::error::DiResult;
use crate::internal::{erase, unerase};
use crate::lifetime::{Lifetime, Ownership, Sharing};
use crate::metadata::{Metadata, MetadataValue};
use crate::operation::ResolveContext;
use crate::params::Parameter;
use crate::pipeline::ResolveMiddleware;
use crate::registration::{
    ActivatedFn, ActivatingFn, ComponentRegistration, PreparingFn, ReleaseFn,
};
use crate::registry::ComponentRegistry;
use crate::scope::LifetimeScope;
use crate::service::{Service, ServiceKey};
use crate::source::relay::{self, RelayFn};
use crate::source::RegistrationSource;
use crate::tracer::{ResolveTracer, Tracers};
use crate::traits::{Dispose, ResolverCore};
use crate::SharedInstance;

/// Collects registrations, sources, decorators, and tracers, then builds a
/// [`Container`].
///
/// # Examples
///
/// ```rust
/// use graft_di::{ContainerBuilder, Resolver};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock(u64);
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         self.0
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register_arc::<dyn Clock, _>(|_| Arc::new(FixedClock(7)))
///     .single_instance();
/// let container = builder.build();
///
/// let clock = container.resolve::<dyn Clock>().unwrap();
/// assert_eq!(clock.now(), 7);
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    pending: Vec<(ComponentRegistration, bool)>,
    relay_entries: HashMap<Service, RelayFn>,
    sources: Vec<Arc<dyn RegistrationSource>>,
    decorators: Vec<DecoratorRegistration>,
    tracers: Vec<Arc<dyn ResolveTracer>>,
    registered: Vec<Arc<dyn Fn(&ComponentRegistration) + Send + Sync>>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component produced by an infallible factory. Transient by
    /// default; refine through the returned builder.
    pub fn register<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> T + Send + Sync + 'static,
    {
        self.try_register_arc(move |ctx| Ok(Arc::new(factory(ctx))))
    }

    /// Registers a component produced by a fallible factory.
    pub fn try_register<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.try_register_arc(move |ctx| Ok(Arc::new(factory(ctx)?)))
    }

    /// Registers a component whose factory already produces an `Arc`; the
    /// form to use for trait-object services.
    pub fn register_arc<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> Arc<T> + Send + Sync + 'static,
    {
        self.try_register_arc(move |ctx| Ok(factory(ctx)))
    }

    /// Fallible `Arc` factory registration; the primitive the other
    /// `register*` methods funnel into.
    pub fn try_register_arc<T, F>(&mut self, factory: F) -> RegistrationBuilder<'_, T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(&ResolveContext<'a>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        RegistrationBuilder::new(
            self,
            Arc::new(FactoryActivator::new::<T, F>(factory)),
            Lifetime::CurrentScope,
            Sharing::None,
        )
    }

    /// Registers an existing instance. Shared in the root scope and
    /// externally owned by default.
    pub fn register_instance<T: Send + Sync + 'static>(
        &mut self,
        instance: T,
    ) -> RegistrationBuilder<'_, T> {
        self.register_arc_instance(Arc::new(instance))
    }

    /// Registers an existing `Arc`-held instance.
    pub fn register_arc_instance<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        instance: Arc<T>,
    ) -> RegistrationBuilder<'_, T> {
        let mut builder = RegistrationBuilder::new(
            self,
            Arc::new(InstanceActivator::new(instance)),
            Lifetime::RootScope,
            Sharing::Shared,
        );
        builder.ownership = Ownership::ExternallyOwned;
        builder
    }

    /// Registers a decorator around the service `T`. Decorators apply in
    /// registration order, innermost first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use graft_di::{ContainerBuilder, Resolver};
    /// use std::sync::Arc;
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register(|_| String::from("x"));
    /// builder.register_decorator::<String, _>(|inner, _ctx, _dc| Arc::new(format!("[{inner}]")));
    /// let container = builder.build();
    ///
    /// assert_eq!(*container.resolve::<String>().unwrap(), "[x]");
    /// ```
    pub fn register_decorator<T, F>(&mut self, decorate: F) -> DecoratorBuilder<'_>
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(Arc<T>, &ResolveContext<'a>, &DecoratorContext) -> Arc<T>
            + Send
            + Sync
            + 'static,
    {
        self.decorators.push(DecoratorRegistration::new::<T, _>(
            move |inner, ctx, decoration| Ok(decorate(inner, ctx, decoration)),
        ));
        let index = self.decorators.len() - 1;
        DecoratorBuilder::new(&mut self.decorators[index])
    }

    /// Adds a registration source, consulted in registration order when no
    /// direct registration matches a request.
    pub fn register_source(&mut self, source: impl RegistrationSource + 'static) -> &mut Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Adds a resolution tracer. Effective when this builder builds the root
    /// container; child-scope builders inherit the root's tracers.
    pub fn register_tracer(&mut self, tracer: impl ResolveTracer + 'static) -> &mut Self {
        self.tracers.push(Arc::new(tracer));
        self
    }

    /// Runs for every registration committed by this builder, at build time.
    pub fn on_registered(
        &mut self,
        callback: impl Fn(&ComponentRegistration) + Send + Sync + 'static,
    ) -> &mut Self {
        self.registered.push(Arc::new(callback));
        self
    }

    /// Freezes the registrations into a container.
    pub fn build(mut self) -> Container {
        let tracers = Tracers::new(mem::take(&mut self.tracers));
        let registry = self.into_registry(None);
        Container {
            root: LifetimeScope::new_root(registry, tracers),
        }
    }

    pub(crate) fn into_registry(
        self,
        parent: Option<Arc<ComponentRegistry>>,
    ) -> Arc<ComponentRegistry> {
        let ContainerBuilder {
            pending,
            relay_entries,
            sources,
            decorators,
            tracers: _,
            registered,
        } = self;
        let mut registry = ComponentRegistry::new(parent);
        for (registration, preserve_defaults) in pending {
            let registration = Arc::new(registration);
            for callback in &registered {
                callback(&registration);
            }
            registry.register(registration, preserve_defaults);
        }
        for decorator in decorators {
            registry.register_decorator(decorator);
        }
        if !relay_entries.is_empty() {
            registry.add_source(Arc::new(relay::RelaySource::new(relay_entries)));
        }
        for source in sources {
            registry.add_source(source);
        }
        Arc::new(registry)
    }
}

/// Fluent refinement of one registration; commits when dropped.
pub struct RegistrationBuilder<'b, T: ?Sized + Send + Sync + 'static> {
    builder: &'b mut ContainerBuilder,
    services: SmallVec<[Service; 2]>,
    activator: Option<Arc<dyn Activator>>,
    lifetime: Lifetime,
    sharing: Sharing,
    ownership: Ownership,
    metadata: Metadata,
    preparing: Vec<PreparingFn>,
    activating: Vec<ActivatingFn>,
    activated: Vec<ActivatedFn>,
    release: Option<ReleaseFn>,
    extra_middleware: Vec<Arc<dyn ResolveMiddleware>>,
    preserve_defaults: bool,
    _marker: PhantomData<fn(Arc<T>) -> Arc<T>>,
}

impl<'b, T: ?Sized + Send + Sync + 'static> RegistrationBuilder<'b, T> {
    fn new(
        builder: &'b mut ContainerBuilder,
        activator: Arc<dyn Activator>,
        lifetime: Lifetime,
        sharing: Sharing,
    ) -> Self {
        let mut services = SmallVec::new();
        services.push(Service::typed::<T>());
        RegistrationBuilder {
            builder,
            services,
            activator: Some(activator),
            lifetime,
            sharing,
            ownership: Ownership::OwnedByScope,
            metadata: Metadata::new(),
            preparing: Vec::new(),
            activating: Vec::new(),
            activated: Vec::new(),
            release: None,
            extra_middleware: Vec::new(),
            preserve_defaults: false,
            _marker: PhantomData,
        }
    }

    /// One shared instance for the whole container.
    pub fn single_instance(mut self) -> Self {
        self.lifetime = Lifetime::RootScope;
        self.sharing = Sharing::Shared;
        self
    }

    /// One shared instance per resolving scope.
    pub fn instance_per_scope(mut self) -> Self {
        self.lifetime = Lifetime::CurrentScope;
        self.sharing = Sharing::Shared;
        self
    }

    /// A fresh instance per resolve. The default.
    pub fn instance_per_dependency(mut self) -> Self {
        self.lifetime = Lifetime::CurrentScope;
        self.sharing = Sharing::None;
        self
    }

    /// One shared instance per nearest enclosing scope tagged `tag`.
    pub fn instance_per_matching_scope(mut self, tag: &'static str) -> Self {
        self.lifetime = Lifetime::MatchingScope(tag);
        self.sharing = Sharing::Shared;
        self
    }

    /// Exposes the component under a key instead of as the default typed
    /// service.
    pub fn keyed(mut self, key: impl Into<ServiceKey>) -> Self {
        self.services.clear();
        self.services.push(Service::keyed::<T>(key));
        self
    }

    /// Exposes the component under a name instead of as the default typed
    /// service.
    pub fn named(self, name: &'static str) -> Self {
        self.keyed(ServiceKey::Name(name))
    }

    /// The caller keeps disposal responsibility; the owning scope never
    /// tracks instances.
    pub fn externally_owned(mut self) -> Self {
        self.ownership = Ownership::ExternallyOwned;
        self
    }

    /// Keeps an earlier registration as the default for the same services.
    pub fn preserve_existing_defaults(mut self) -> Self {
        self.preserve_defaults = true;
        self
    }

    /// Attaches one metadata entry.
    pub fn with_metadata(mut self, key: &'static str, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Hook run before activation; may inspect and edit the request's
    /// parameters.
    pub fn on_preparing(
        mut self,
        hook: impl for<'a> Fn(&ResolveContext<'a>, &mut Vec<Parameter>) + Send + Sync + 'static,
    ) -> Self {
        self.preparing.push(Arc::new(hook));
        self
    }

    /// Hook run right after activation; returning a different `Arc<T>`
    /// substitutes the instance for this request.
    pub fn on_activating(
        mut self,
        hook: impl for<'a> Fn(&ResolveContext<'a>, Arc<T>) -> DiResult<Arc<T>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.activating.push(Arc::new(
            move |ctx: &ResolveContext<'_>, instance: &mut SharedInstance| {
                let current = unerase::<T>(instance.clone())?;
                *instance = erase(hook(ctx, current)?);
                Ok(())
            },
        ));
        self
    }

    /// Hook run once the instance is final for the request.
    pub fn on_activated(
        mut self,
        hook: impl for<'a> Fn(&ResolveContext<'a>, &Arc<T>) -> DiResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.activated.push(Arc::new(
            move |ctx: &ResolveContext<'_>, instance: &SharedInstance| {
                let current = unerase::<T>(instance.clone())?;
                hook(ctx, &current)
            },
        ));
        self
    }

    /// Release hook run by the owning scope at disposal, in reverse creation
    /// order. Only [`Ownership::OwnedByScope`] components are tracked.
    pub fn on_release(mut self, hook: impl Fn(Arc<T>) + Send + Sync + 'static) -> Self {
        self.release = Some(Arc::new(move |instance: SharedInstance| {
            if let Ok(value) = unerase::<T>(instance) {
                hook(value);
            }
        }));
        self
    }

    /// Splices a custom middleware stage into this registration's pipeline.
    pub fn with_middleware(mut self, middleware: impl ResolveMiddleware + 'static) -> Self {
        self.extra_middleware.push(Arc::new(middleware));
        self
    }
}

impl<'b, T: ?Sized + Send + Sync + Dispose + 'static> RegistrationBuilder<'b, T> {
    /// Tracks instances for disposal via [`Dispose::dispose`] when the owning
    /// scope is disposed.
    pub fn with_dispose(self) -> Self {
        self.on_release(|instance| instance.dispose())
    }
}

impl<'b, T: ?Sized + Send + Sync + 'static> Drop for RegistrationBuilder<'b, T> {
    fn drop(&mut self) {
        let activator = match self.activator.take() {
            Some(activator) => activator,
            None => return,
        };
        let mut registration = ComponentRegistration::new(
            mem::take(&mut self.services),
            activator,
            self.lifetime,
            self.sharing,
            self.ownership,
        );
        registration.metadata = mem::take(&mut self.metadata);
        registration.preparing = mem::take(&mut self.preparing);
        registration.activating = mem::take(&mut self.activating);
        registration.activated = mem::take(&mut self.activated);
        registration.release = self.release.take();
        registration.extra_middleware = mem::take(&mut self.extra_middleware);
        relay::install::<T>(&mut self.builder.relay_entries);
        self.builder
            .pending
            .push((registration, self.preserve_defaults));
    }
}

/// The built container: owner of the root [`LifetimeScope`].
///
/// Implements [`Resolver`](crate::Resolver) by delegating to the root scope.
/// Disposing the container disposes the whole scope tree; dropping the last
/// handle does the same.
pub struct Container {
    root: LifetimeScope,
}

impl Container {
    /// The root scope.
    pub fn root_scope(&self) -> &LifetimeScope {
        &self.root
    }

    /// Opens a child of the root scope.
    pub fn begin_scope(&self) -> DiResult<LifetimeScope> {
        self.root.begin_scope()
    }

    /// Opens a tagged child of the root scope.
    pub fn begin_tagged_scope(&self, tag: &'static str) -> DiResult<LifetimeScope> {
        self.root.begin_tagged_scope(tag)
    }

    /// Opens a child of the root scope with additional registrations.
    pub fn begin_scope_with(
        &self,
        configure: impl FnOnce(&mut ContainerBuilder),
    ) -> DiResult<LifetimeScope> {
        self.root.begin_scope_with(configure)
    }

    /// Tagged variant of [`begin_scope_with`](Container::begin_scope_with).
    pub fn begin_tagged_scope_with(
        &self,
        tag: &'static str,
        configure: impl FnOnce(&mut ContainerBuilder),
    ) -> DiResult<LifetimeScope> {
        self.root.begin_tagged_scope_with(tag, configure)
    }

    /// Disposes the root scope and everything under it. Idempotent.
    pub fn dispose(&self) {
        self.root.dispose();
    }
}

impl ResolverCore for Container {
    fn resolve_service(
        &self,
        service: &Service,
        parameters: Vec<Parameter>,
    ) -> DiResult<SharedInstance> {
        self.root.resolve_service(service, parameters)
    }

    fn resolve_all_service(&self, service: &Service) -> DiResult<Vec<SharedInstance>> {
        self.root.resolve_all_service(service)
    }

    fn is_registered_service(&self, service: &Service) -> bool {
        self.root.is_registered_service(service)
    }
}
