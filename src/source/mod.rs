//! Registration sources.
//!
//! A source synthesizes registrations on demand for services nobody
//! registered directly. The container uses them for the relay wrappers
//! ([`Vec<Arc<T>>`], [`Lazy`], [`Factory`], [`Meta`], [`Owned`]) and for open
//! generics; users can plug in their own via
//! [`ContainerBuilder::register_source`](crate::ContainerBuilder::register_source).
//!
//! [`Lazy`]: crate::Lazy
//! [`Factory`]: crate::Factory
//! [`Meta`]: crate::Meta
//! [`Owned`]: crate::Owned

mod factory;
mod open_generic;
pub(crate) mod relay;

pub use factory::{Factory, ParameterMapping};
pub use open_generic::OpenGenericSource;
pub use relay::{Lazy, Meta, Owned};

use std::sync::Arc;

use crate::registration::ComponentRegistration;
use crate::service::Service;

/// Read-only view of the registry handed to sources while they decide what
/// to synthesize. Queries through it are themselves source-aware, guarded
/// against re-entry on the service currently being synthesized.
pub trait ServiceAccessor {
    /// Every visible registration for a service.
    fn registrations_for(&self, service: &Service) -> Vec<Arc<ComponentRegistration>>;
    /// The registration a plain resolve would use.
    fn default_registration_for(&self, service: &Service) -> Option<Arc<ComponentRegistration>>;
    /// Whether any registration exists.
    fn is_registered(&self, service: &Service) -> bool;
}

/// Supplier of dynamic registrations.
pub trait RegistrationSource: Send + Sync {
    /// Registrations this source can produce for the service. An empty vector
    /// means the source has nothing to offer; it is not an error.
    fn registrations_for(
        &self,
        service: &Service,
        accessor: &dyn ServiceAccessor,
    ) -> Vec<Arc<ComponentRegistration>>;

    /// True when the produced registrations adapt individual registrations of
    /// other services (wrappers, open generics) rather than standing alone.
    fn is_adapter_for_individual_components(&self) -> bool {
        false
    }

    /// Diagnostic name.
    fn description(&self) -> &str {
        "registration source"
    }
}
