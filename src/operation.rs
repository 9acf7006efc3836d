//! Per-call resolve operations.
//!
//! One [`ResolveOperation`] spans a whole top-level resolve, including every
//! nested dependency request. It carries the request stack used for circular
//! detection: re-entering the same service, or the same registration under
//! any of its services, in the same scope within one operation is a cycle and
//! fails with the full path. Operations are confined to the
//! calling thread; a [`Lazy<T>`](crate::Lazy) wrapper starts a fresh operation
//! and is the sanctioned way to break legitimate cycles.

use std::cell::RefCell;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::params::Parameter;
use crate::registration::{ComponentRegistration, RegistrationId};
use crate::scope::LifetimeScope;
use crate::service::Service;
use crate::tracer::Tracers;
use crate::traits::{Resolver, ResolverCore};
use crate::SharedInstance;

const MAX_RESOLVE_DEPTH: usize = 512;

struct Frame {
    service: Service,
    registration: RegistrationId,
    scope_id: u64,
}

/// State shared by all requests of one top-level resolve.
pub struct ResolveOperation {
    stack: RefCell<Vec<Frame>>,
    tracers: Tracers,
}

impl ResolveOperation {
    pub(crate) fn new(tracers: Tracers) -> Self {
        ResolveOperation {
            stack: RefCell::new(Vec::new()),
            tracers,
        }
    }

    pub(crate) fn tracers(&self) -> &Tracers {
        &self.tracers
    }

    fn push(
        &self,
        service: &Service,
        registration: RegistrationId,
        scope_id: u64,
    ) -> DiResult<()> {
        let mut stack = self.stack.borrow_mut();
        // Re-entering a registration through any of its services is a cycle
        // too: a multi-service registration resolving a sibling alias of
        // itself would otherwise re-enter its own sharing slot.
        if stack.iter().any(|frame| {
            frame.scope_id == scope_id
                && (frame.service == *service || frame.registration == registration)
        }) {
            let mut path: Vec<String> =
                stack.iter().map(|frame| frame.service.description()).collect();
            path.push(service.description());
            return Err(DiError::Circular(path));
        }
        if stack.len() >= MAX_RESOLVE_DEPTH {
            return Err(DiError::DepthExceeded(stack.len()));
        }
        stack.push(Frame {
            service: service.clone(),
            registration,
            scope_id,
        });
        Ok(())
    }

    fn pop(&self) {
        self.stack.borrow_mut().pop();
    }
}

/// Runs one registration's pipeline as part of an operation.
pub(crate) fn execute_request(
    operation: &ResolveOperation,
    scope: &LifetimeScope,
    registration: Arc<ComponentRegistration>,
    service: Service,
    parameters: Vec<Parameter>,
) -> DiResult<SharedInstance> {
    operation.push(&service, registration.id(), scope.id())?;
    let tracers = operation.tracers().clone();
    if tracers.has_tracers() {
        tracers.request_start(&service, registration.id());
    }
    let mut ctx = ResolveContext {
        operation,
        scope: scope.clone(),
        registration: registration.clone(),
        service: service.clone(),
        parameters,
        selected_scope: None,
    };
    let result = registration.pipeline().invoke(&mut ctx);
    operation.pop();
    let result = result.map_err(|error| error.wrap(&service));
    if tracers.has_tracers() {
        match &result {
            Ok(_) => tracers.request_success(&service, registration.id()),
            Err(error) => tracers.request_failure(&service, registration.id(), error),
        }
    }
    result
}

/// The context handed to activators, hooks, middleware, and decorators.
///
/// It is itself a [`Resolver`]: dependencies resolved through it join the
/// current operation, so cycles anywhere in the graph are detected.
pub struct ResolveContext<'op> {
    operation: &'op ResolveOperation,
    scope: LifetimeScope,
    registration: Arc<ComponentRegistration>,
    service: Service,
    parameters: Vec<Parameter>,
    selected_scope: Option<LifetimeScope>,
}

impl<'op> ResolveContext<'op> {
    /// The service being resolved by this request.
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// The registration being resolved.
    pub fn registration(&self) -> &ComponentRegistration {
        &self.registration
    }

    pub(crate) fn registration_arc(&self) -> Arc<ComponentRegistration> {
        self.registration.clone()
    }

    /// The scope the resolve was issued against.
    pub fn scope(&self) -> &LifetimeScope {
        &self.scope
    }

    /// The scope that owns the instance: the lifetime-selected scope once
    /// scope selection has run, otherwise the issuing scope.
    pub fn owning_scope(&self) -> LifetimeScope {
        self.selected_scope
            .clone()
            .unwrap_or_else(|| self.scope.clone())
    }

    pub(crate) fn set_selected_scope(&mut self, scope: LifetimeScope) {
        self.selected_scope = Some(scope);
    }

    // Shared components are assembled against their owning scope: their
    // dependencies and decorators must come from the owner's registry, not
    // from whichever scope happened to issue the first resolve.
    pub(crate) fn rebase_scope(&mut self, scope: LifetimeScope) {
        self.scope = scope;
    }

    pub(crate) fn tracers(&self) -> &Tracers {
        self.operation.tracers()
    }

    pub(crate) fn take_parameters(&mut self) -> Vec<Parameter> {
        std::mem::take(&mut self.parameters)
    }

    pub(crate) fn put_parameters(&mut self, parameters: Vec<Parameter>) {
        self.parameters = parameters;
    }

    /// The request's parameters.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// First by-type parameter matching `T`.
    pub fn parameter<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.parameters.iter().find_map(|p| match p {
            Parameter::Typed { .. } => p.downcast::<T>(),
            _ => None,
        })
    }

    /// Named parameter matching `name` and `T`.
    pub fn parameter_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Option<Arc<T>> {
        self.parameters.iter().find_map(|p| match p {
            Parameter::Named { name: n, .. } if *n == name => p.downcast::<T>(),
            _ => None,
        })
    }

    /// Positional parameter at `index` matching `T`.
    pub fn parameter_at<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Option<Arc<T>> {
        self.parameters.iter().find_map(|p| match p {
            Parameter::Positional { index: i, .. } if *i == index => p.downcast::<T>(),
            _ => None,
        })
    }

    /// Parameter-else-resolve: a by-type parameter takes precedence over the
    /// container's own registration for `T`.
    pub fn argument<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        if let Some(value) = self.parameter::<T>() {
            return Ok(value);
        }
        self.resolve::<T>()
    }
}

impl ResolverCore for ResolveContext<'_> {
    fn resolve_service(
        &self,
        service: &Service,
        parameters: Vec<Parameter>,
    ) -> DiResult<SharedInstance> {
        let registration = self
            .scope
            .registry()
            .default_registration_for(service)
            .ok_or_else(|| DiError::NotRegistered(service.description()))?;
        execute_request(
            self.operation,
            &self.scope,
            registration,
            service.clone(),
            parameters,
        )
    }

    fn resolve_all_service(&self, service: &Service) -> DiResult<Vec<SharedInstance>> {
        self.scope
            .registry()
            .registrations_for(service)
            .into_iter()
            .map(|registration| {
                execute_request(
                    self.operation,
                    &self.scope,
                    registration,
                    service.clone(),
                    Vec::new(),
                )
            })
            .collect()
    }

    fn is_registered_service(&self, service: &Service) -> bool {
        self.scope.registry().default_registration_for(service).is_some()
    }
}
