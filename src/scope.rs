//! Lifetime scopes.
//!
//! Scopes form a tree rooted at the container. Each scope owns the shared
//! instances whose lifetime selected it and a LIFO bag of release hooks for
//! the components it tracks. Disposal cascades to children first, then runs
//! the scope's own hooks in reverse creation order; it is idempotent, and
//! dropping the last handle to a scope disposes it as well.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;

use crate::container::ContainerBuilder;
use crate::error::{DiError, DiResult};
use crate::internal::disposer::DisposeBag;
use crate::operation::{execute_request, ResolveContext, ResolveOperation};
use crate::params::Parameter;
use crate::registration::RegistrationId;
use crate::registry::ComponentRegistry;
use crate::service::Service;
use crate::tracer::Tracers;
use crate::traits::ResolverCore;
use crate::SharedInstance;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// A node in the scope tree. Cheap to clone; all clones refer to the same
/// scope.
///
/// # Examples
///
/// ```rust
/// use graft_di::{ContainerBuilder, Resolver};
/// use std::sync::Arc;
///
/// let mut builder = ContainerBuilder::new();
/// builder.register(|_| String::from("hello")).instance_per_scope();
/// let container = builder.build();
///
/// let scope = container.begin_scope().unwrap();
/// let a = scope.resolve::<String>().unwrap();
/// let b = scope.resolve::<String>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let other = container.begin_scope().unwrap();
/// let c = other.resolve::<String>().unwrap();
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
#[derive(Clone)]
pub struct LifetimeScope {
    inner: Arc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    id: u64,
    tag: Option<&'static str>,
    registry: Arc<ComponentRegistry>,
    parent: Option<Weak<ScopeInner>>,
    instances: InstanceStore,
    disposer: Mutex<DisposeBag>,
    children: Mutex<Vec<Weak<ScopeInner>>>,
    disposed: AtomicBool,
    tracers: Tracers,
}

impl LifetimeScope {
    pub(crate) fn new_root(registry: Arc<ComponentRegistry>, tracers: Tracers) -> Self {
        LifetimeScope {
            inner: Arc::new(ScopeInner {
                id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
                tag: None,
                registry,
                parent: None,
                instances: InstanceStore::default(),
                disposer: Mutex::new(DisposeBag::default()),
                children: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
                tracers,
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    /// The tag given at [`begin_tagged_scope`](LifetimeScope::begin_tagged_scope),
    /// if any.
    pub fn tag(&self) -> Option<&'static str> {
        self.inner.tag
    }

    /// The registry this scope resolves against.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.inner.registry
    }

    pub(crate) fn instances(&self) -> &InstanceStore {
        &self.inner.instances
    }

    pub(crate) fn tracers(&self) -> &Tracers {
        &self.inner.tracers
    }

    /// Whether the scope has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    fn ensure_alive(&self) -> DiResult<()> {
        if self.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }
        Ok(())
    }

    /// Opens an untagged child scope.
    pub fn begin_scope(&self) -> DiResult<LifetimeScope> {
        self.begin_scope_inner(None, None)
    }

    /// Opens a child scope carrying a tag for
    /// [`Lifetime::MatchingScope`](crate::Lifetime::MatchingScope) components.
    pub fn begin_tagged_scope(&self, tag: &'static str) -> DiResult<LifetimeScope> {
        self.begin_scope_inner(Some(tag), None)
    }

    /// Opens a child scope with additional registrations. The child's
    /// registry layers over this scope's; its registrations shadow the
    /// parent's defaults for the same services within the child.
    pub fn begin_scope_with(
        &self,
        configure: impl FnOnce(&mut ContainerBuilder),
    ) -> DiResult<LifetimeScope> {
        self.begin_scope_inner(None, Some(Box::new(configure)))
    }

    /// Tagged variant of [`begin_scope_with`](LifetimeScope::begin_scope_with).
    pub fn begin_tagged_scope_with(
        &self,
        tag: &'static str,
        configure: impl FnOnce(&mut ContainerBuilder),
    ) -> DiResult<LifetimeScope> {
        self.begin_scope_inner(Some(tag), Some(Box::new(configure)))
    }

    fn begin_scope_inner(
        &self,
        tag: Option<&'static str>,
        configure: Option<Box<dyn FnOnce(&mut ContainerBuilder) + '_>>,
    ) -> DiResult<LifetimeScope> {
        self.ensure_alive()?;
        // An unconfigured child shares the parent registry outright; only a
        // configured one pays for a layered registry.
        let registry = match configure {
            None => self.inner.registry.clone(),
            Some(configure) => {
                let mut builder = ContainerBuilder::new();
                configure(&mut builder);
                builder.into_registry(Some(self.inner.registry.clone()))
            }
        };
        let child = Arc::new(ScopeInner {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            tag,
            registry,
            parent: Some(Arc::downgrade(&self.inner)),
            instances: InstanceStore::default(),
            disposer: Mutex::new(DisposeBag::default()),
            children: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
            tracers: self.inner.tracers.clone(),
        });
        self.inner.children.lock().push(Arc::downgrade(&child));
        Ok(LifetimeScope { inner: child })
    }

    /// The root of this scope's tree.
    pub(crate) fn root_scope(&self) -> DiResult<LifetimeScope> {
        let mut current = self.inner.clone();
        loop {
            let parent = match current.parent.as_ref() {
                None => break,
                Some(weak) => weak.upgrade().ok_or(DiError::ScopeDisposed)?,
            };
            current = parent;
        }
        Ok(LifetimeScope { inner: current })
    }

    /// The nearest scope (starting here) carrying the tag.
    pub(crate) fn find_tagged(&self, tag: &'static str) -> Option<LifetimeScope> {
        let mut current = self.inner.clone();
        loop {
            if current.tag == Some(tag) {
                return Some(LifetimeScope { inner: current });
            }
            let parent = current.parent.as_ref()?.upgrade()?;
            current = parent;
        }
    }

    pub(crate) fn track_disposal(&self, hook: Box<dyn FnOnce() + Send>) {
        self.inner.disposer.lock().push(hook);
    }

    /// Disposes this scope: children first (transitively), then this scope's
    /// tracked instances in reverse creation order. Idempotent. Resolving or
    /// opening scopes afterwards fails with
    /// [`ScopeDisposed`](crate::DiError::ScopeDisposed).
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl ScopeInner {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.into_iter().rev() {
            if let Some(child) = child.upgrade() {
                child.dispose();
            }
        }
        let mut bag = std::mem::take(&mut *self.disposer.lock());
        bag.run_reverse();
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl ResolverCore for LifetimeScope {
    fn resolve_service(
        &self,
        service: &Service,
        parameters: Vec<Parameter>,
    ) -> DiResult<SharedInstance> {
        self.ensure_alive()?;
        let registration = self
            .registry()
            .default_registration_for(service)
            .ok_or_else(|| DiError::NotRegistered(service.description()))?;
        let tracers = self.inner.tracers.clone();
        let operation = ResolveOperation::new(tracers.clone());
        if tracers.has_tracers() {
            tracers.operation_start(service);
            let started = Instant::now();
            let result =
                execute_request(&operation, self, registration, service.clone(), parameters);
            match &result {
                Ok(_) => tracers.operation_success(service, started.elapsed()),
                Err(error) => tracers.operation_failure(service, error),
            }
            result
        } else {
            execute_request(&operation, self, registration, service.clone(), parameters)
        }
    }

    fn resolve_all_service(&self, service: &Service) -> DiResult<Vec<SharedInstance>> {
        self.ensure_alive()?;
        let tracers = self.inner.tracers.clone();
        let operation = ResolveOperation::new(tracers.clone());
        let resolve = |operation: &ResolveOperation| {
            self.registry()
                .registrations_for(service)
                .into_iter()
                .map(|registration| {
                    execute_request(operation, self, registration, service.clone(), Vec::new())
                })
                .collect::<DiResult<Vec<SharedInstance>>>()
        };
        if tracers.has_tracers() {
            tracers.operation_start(service);
            let started = Instant::now();
            let result = resolve(&operation);
            match &result {
                Ok(_) => tracers.operation_success(service, started.elapsed()),
                Err(error) => tracers.operation_failure(service, error),
            }
            result
        } else {
            resolve(&operation)
        }
    }

    fn is_registered_service(&self, service: &Service) -> bool {
        self.registry().is_registered(service)
    }
}

/// Per-scope shared-instance slots.
///
/// Each registration gets its own slot mutex, held for the whole first
/// activation: concurrent first resolves of the same registration block on
/// that slot only, then observe the created instance, while resolves of
/// unrelated registrations never contend.
#[derive(Default)]
pub(crate) struct InstanceStore {
    slots: Mutex<HashMap<RegistrationId, Arc<Mutex<Option<SharedInstance>>>>>,
}

impl InstanceStore {
    pub(crate) fn get_or_create<'op>(
        &self,
        id: RegistrationId,
        ctx: &mut ResolveContext<'op>,
        create: impl FnOnce(&mut ResolveContext<'op>) -> DiResult<SharedInstance>,
    ) -> DiResult<SharedInstance> {
        let slot = self.slots.lock().entry(id).or_default().clone();
        let mut guard = slot.lock();
        if let Some(existing) = guard.as_ref() {
            return Ok(existing.clone());
        }
        let created = create(ctx)?;
        *guard = Some(created.clone());
        Ok(created)
    }
}
