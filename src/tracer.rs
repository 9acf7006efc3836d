//! Resolution diagnostics.
//!
//! Tracers observe resolution at three granularities: the top-level operation,
//! each request (one registration's pipeline run), and individual middleware
//! stages. All methods have empty defaults; implement only what you need.
//! When no tracer is registered every emit site is skipped via a single
//! [`has_tracers`](Tracers::has_tracers) branch.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::pipeline::PipelinePhase;
use crate::registration::RegistrationId;
use crate::service::Service;

/// Observer of resolution events. Register with
/// [`ContainerBuilder::register_tracer`](crate::ContainerBuilder::register_tracer).
#[allow(unused_variables)]
pub trait ResolveTracer: Send + Sync {
    /// A top-level resolve began.
    fn operation_start(&self, service: &Service) {}
    /// A top-level resolve finished successfully.
    fn operation_success(&self, service: &Service, elapsed: Duration) {}
    /// A top-level resolve failed.
    fn operation_failure(&self, service: &Service, error: &DiError) {}
    /// One registration's pipeline run began.
    fn request_start(&self, service: &Service, registration: RegistrationId) {}
    /// One registration's pipeline run succeeded.
    fn request_success(&self, service: &Service, registration: RegistrationId) {}
    /// One registration's pipeline run failed.
    fn request_failure(&self, service: &Service, registration: RegistrationId, error: &DiError) {}
    /// A middleware stage was entered.
    fn middleware_enter(&self, service: &Service, phase: PipelinePhase) {}
    /// A middleware stage returned.
    fn middleware_exit(&self, service: &Service, phase: PipelinePhase, succeeded: bool) {}
}

/// Fan-out over all registered tracers.
#[derive(Clone, Default)]
pub(crate) struct Tracers {
    inner: Arc<Vec<Arc<dyn ResolveTracer>>>,
}

impl Tracers {
    pub(crate) fn new(tracers: Vec<Arc<dyn ResolveTracer>>) -> Self {
        Self {
            inner: Arc::new(tracers),
        }
    }

    #[inline]
    pub(crate) fn has_tracers(&self) -> bool {
        !self.inner.is_empty()
    }

    pub(crate) fn operation_start(&self, service: &Service) {
        for t in self.inner.iter() {
            t.operation_start(service);
        }
    }

    pub(crate) fn operation_success(&self, service: &Service, elapsed: Duration) {
        for t in self.inner.iter() {
            t.operation_success(service, elapsed);
        }
    }

    pub(crate) fn operation_failure(&self, service: &Service, error: &DiError) {
        for t in self.inner.iter() {
            t.operation_failure(service, error);
        }
    }

    pub(crate) fn request_start(&self, service: &Service, registration: RegistrationId) {
        for t in self.inner.iter() {
            t.request_start(service, registration);
        }
    }

    pub(crate) fn request_success(&self, service: &Service, registration: RegistrationId) {
        for t in self.inner.iter() {
            t.request_success(service, registration);
        }
    }

    pub(crate) fn request_failure(
        &self,
        service: &Service,
        registration: RegistrationId,
        error: &DiError,
    ) {
        for t in self.inner.iter() {
            t.request_failure(service, registration, error);
        }
    }

    pub(crate) fn middleware_enter(&self, service: &Service, phase: PipelinePhase) {
        for t in self.inner.iter() {
            t.middleware_enter(service, phase);
        }
    }

    pub(crate) fn middleware_exit(&self, service: &Service, phase: PipelinePhase, succeeded: bool) {
        for t in self.inner.iter() {
            t.middleware_exit(service, phase, succeeded);
        }
    }
}

/// Reference tracer that writes resolution events to stderr.
pub struct LoggingTracer;

impl ResolveTracer for LoggingTracer {
    fn operation_start(&self, service: &Service) {
        eprintln!("[graft-di] resolve {service}");
    }

    fn operation_success(&self, service: &Service, elapsed: Duration) {
        eprintln!("[graft-di] resolved {service} in {elapsed:?}");
    }

    fn operation_failure(&self, service: &Service, error: &DiError) {
        eprintln!("[graft-di] failed {service}: {error}");
    }

    fn request_failure(&self, service: &Service, registration: RegistrationId, error: &DiError) {
        eprintln!("[graft-di] request {service} ({registration:?}) failed: {error}");
    }
}
