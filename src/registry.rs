//! The component registry.
//!
//! Maps services to registrations. A registry is frozen once built; the only
//! post-build mutation is the per-service cache of source-synthesized
//! registrations, which is idempotent. Child scopes configured with extra
//! registrations get their own registry with a parent pointer; unconfigured
//! children share the parent's registry `Arc` outright.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::decorator::DecoratorRegistration;
use crate::registration::ComponentRegistration;
use crate::service::Service;
use crate::source::{RegistrationSource, ServiceAccessor};

thread_local! {
    // Services whose source synthesis is in flight on this thread. A source
    // asking the registry about the service it is currently being asked for
    // would otherwise recurse forever.
    static IN_FLIGHT: RefCell<HashSet<Service>> = RefCell::new(HashSet::new());
}

pub struct ComponentRegistry {
    parent: Option<Arc<ComponentRegistry>>,
    direct: HashMap<Service, Vec<Arc<ComponentRegistration>>>,
    defaults: HashMap<Service, Arc<ComponentRegistration>>,
    decorators: HashMap<Service, Vec<Arc<DecoratorRegistration>>>,
    sources: Vec<Arc<dyn RegistrationSource>>,
    synthesized: RwLock<HashMap<Service, Vec<Arc<ComponentRegistration>>>>,
}

impl ComponentRegistry {
    pub(crate) fn new(parent: Option<Arc<ComponentRegistry>>) -> Self {
        ComponentRegistry {
            parent,
            direct: HashMap::new(),
            defaults: HashMap::new(),
            decorators: HashMap::new(),
            sources: Vec::new(),
            synthesized: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a registration under each of its services. The newest
    /// registration becomes the default unless `preserve_defaults` is set and
    /// a default already exists in this registry.
    pub(crate) fn register(
        &mut self,
        registration: Arc<ComponentRegistration>,
        preserve_defaults: bool,
    ) {
        for service in registration.services().to_vec() {
            self.direct
                .entry(service.clone())
                .or_default()
                .push(registration.clone());
            if !preserve_defaults || !self.defaults.contains_key(&service) {
                self.defaults.insert(service, registration.clone());
            }
        }
    }

    pub(crate) fn register_decorator(&mut self, decorator: DecoratorRegistration) {
        let marker = Service::decorator_for(decorator.target, decorator.target_name);
        self.decorators
            .entry(marker)
            .or_default()
            .push(Arc::new(decorator));
    }

    pub(crate) fn add_source(&mut self, source: Arc<dyn RegistrationSource>) {
        self.sources.push(source);
        self.synthesized.write().clear();
    }

    /// Every registration visible for the service: direct registrations along
    /// the parent chain (oldest ancestor first, registration order within each
    /// level), then source-synthesized ones.
    pub fn registrations_for(&self, service: &Service) -> Vec<Arc<ComponentRegistration>> {
        let mut out = Vec::new();
        self.collect_direct(service, &mut out);
        out.extend(self.source_registrations(service));
        out
    }

    fn collect_direct(&self, service: &Service, out: &mut Vec<Arc<ComponentRegistration>>) {
        if let Some(parent) = &self.parent {
            parent.collect_direct(service, out);
        }
        if let Some(regs) = self.direct.get(service) {
            out.extend(regs.iter().cloned());
        }
    }

    /// The registration a plain resolve uses: this registry's default, else
    /// the nearest ancestor's, else the first source-synthesized one.
    pub fn default_registration_for(&self, service: &Service) -> Option<Arc<ComponentRegistration>> {
        if let Some(default) = self.direct_default(service) {
            return Some(default);
        }
        self.source_registrations(service).into_iter().next()
    }

    fn direct_default(&self, service: &Service) -> Option<Arc<ComponentRegistration>> {
        if let Some(default) = self.defaults.get(service) {
            return Some(default.clone());
        }
        self.parent.as_ref()?.direct_default(service)
    }

    pub fn is_registered(&self, service: &Service) -> bool {
        self.default_registration_for(service).is_some()
    }

    /// Decorators targeting a type, ancestors' first. Keyed by the
    /// [`Service::Decorator`] marker for the target type.
    pub(crate) fn decorators_for(&self, marker: &Service) -> Vec<Arc<DecoratorRegistration>> {
        let mut out = Vec::new();
        self.collect_decorators(marker, &mut out);
        out
    }

    fn collect_decorators(&self, marker: &Service, out: &mut Vec<Arc<DecoratorRegistration>>) {
        if let Some(parent) = &self.parent {
            parent.collect_decorators(marker, out);
        }
        if let Some(decorators) = self.decorators.get(marker) {
            out.extend(decorators.iter().cloned());
        }
    }

    fn chain_sources(&self) -> Vec<Arc<dyn RegistrationSource>> {
        let mut out = Vec::new();
        self.collect_sources(&mut out);
        out
    }

    fn collect_sources(&self, out: &mut Vec<Arc<dyn RegistrationSource>>) {
        if let Some(parent) = &self.parent {
            parent.collect_sources(out);
        }
        out.extend(self.sources.iter().cloned());
    }

    /// Source-synthesized registrations for a service, cached per service in
    /// the queried registry. A query re-entered for the same service on the
    /// same thread yields nothing and is never cached, so sources may consult
    /// the registry freely.
    fn source_registrations(&self, service: &Service) -> Vec<Arc<ComponentRegistration>> {
        if self.sources.is_empty() && self.parent.is_none() {
            return Vec::new();
        }
        if let Some(cached) = self.synthesized.read().get(service) {
            return cached.clone();
        }
        let entered = IN_FLIGHT.with(|guard| guard.borrow_mut().insert(service.clone()));
        if !entered {
            return Vec::new();
        }
        let mut out = Vec::new();
        let accessor = RegistryAccessor { registry: self };
        for source in self.chain_sources() {
            out.extend(source.registrations_for(service, &accessor));
        }
        IN_FLIGHT.with(|guard| {
            guard.borrow_mut().remove(service);
        });
        self.synthesized
            .write()
            .insert(service.clone(), out.clone());
        out
    }
}

struct RegistryAccessor<'r> {
    registry: &'r ComponentRegistry,
}

impl ServiceAccessor for RegistryAccessor<'_> {
    fn registrations_for(&self, service: &Service) -> Vec<Arc<ComponentRegistration>> {
        self.registry.registrations_for(service)
    }

    fn default_registration_for(&self, service: &Service) -> Option<Arc<ComponentRegistration>> {
        self.registry.default_registration_for(service)
    }

    fn is_registered(&self, service: &Service) -> bool {
        self.registry.is_registered(service)
    }
}
