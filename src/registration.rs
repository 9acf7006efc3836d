//! Component registrations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use smallvec::SmallVec;

use crate::activator::Activator;
use crate::error::DiResult;
use crate::lifetime::{Lifetime, Ownership, Sharing};
use crate::metadata::Metadata;
use crate::operation::ResolveContext;
use crate::params::Parameter;
use crate::pipeline::{ResolveMiddleware, ResolvePipeline};
use crate::service::Service;
use crate::SharedInstance;

static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);

/// Process-monotonic identity of one registration.
///
/// Instance stores are keyed by this, so two registrations never share a
/// singleton slot even when they expose the same service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    pub(crate) fn next() -> Self {
        RegistrationId(NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Hook run before activation; may edit the request's parameters.
pub type PreparingFn =
    Arc<dyn for<'a> Fn(&ResolveContext<'a>, &mut Vec<Parameter>) + Send + Sync>;
/// Hook run after activation; may substitute the instance.
pub type ActivatingFn =
    Arc<dyn for<'a> Fn(&ResolveContext<'a>, &mut SharedInstance) -> DiResult<()> + Send + Sync>;
/// Hook run once the instance is final for this request.
pub type ActivatedFn =
    Arc<dyn for<'a> Fn(&ResolveContext<'a>, &SharedInstance) -> DiResult<()> + Send + Sync>;
/// Release hook run by the owning scope at disposal.
pub type ReleaseFn = Arc<dyn Fn(SharedInstance) + Send + Sync>;

/// Immutable description of how to produce and manage one component.
///
/// Built by [`ContainerBuilder`](crate::ContainerBuilder) (or synthesized by a
/// registration source) and frozen; resolution only reads it. The resolve
/// pipeline for the registration is assembled lazily on first use and reused.
pub struct ComponentRegistration {
    pub(crate) id: RegistrationId,
    pub(crate) services: SmallVec<[Service; 2]>,
    pub(crate) activator: Arc<dyn Activator>,
    pub(crate) lifetime: Lifetime,
    pub(crate) sharing: Sharing,
    pub(crate) ownership: Ownership,
    pub(crate) metadata: Metadata,
    pub(crate) preparing: Vec<PreparingFn>,
    pub(crate) activating: Vec<ActivatingFn>,
    pub(crate) activated: Vec<ActivatedFn>,
    pub(crate) release: Option<ReleaseFn>,
    pub(crate) extra_middleware: Vec<Arc<dyn ResolveMiddleware>>,
    pipeline: OnceCell<ResolvePipeline>,
}

impl ComponentRegistration {
    /// Creates a registration directly; the entry point for custom
    /// [`RegistrationSource`](crate::RegistrationSource) implementations.
    /// Builder-registered components go through
    /// [`ContainerBuilder`](crate::ContainerBuilder) instead.
    pub fn new(
        services: impl IntoIterator<Item = Service>,
        activator: Arc<dyn Activator>,
        lifetime: Lifetime,
        sharing: Sharing,
        ownership: Ownership,
    ) -> Self {
        ComponentRegistration {
            id: RegistrationId::next(),
            services: services.into_iter().collect(),
            activator,
            lifetime,
            sharing,
            ownership,
            metadata: Metadata::new(),
            preparing: Vec::new(),
            activating: Vec::new(),
            activated: Vec::new(),
            release: None,
            extra_middleware: Vec::new(),
            pipeline: OnceCell::new(),
        }
    }

    pub fn id(&self) -> RegistrationId {
        self.id
    }

    /// All services this registration is exposed under.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn sharing(&self) -> Sharing {
        self.sharing
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Replaces the metadata; useful when synthesizing registrations in a
    /// custom source.
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    /// The concrete type produced, per the activator.
    pub fn implementation_type(&self) -> &'static str {
        self.activator.description()
    }

    pub fn provides(&self, service: &Service) -> bool {
        self.services.iter().any(|s| s == service)
    }

    pub(crate) fn pipeline(&self) -> &ResolvePipeline {
        self.pipeline
            .get_or_init(|| ResolvePipeline::build(&self.extra_middleware))
    }
}
