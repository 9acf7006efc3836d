//! # graft-di
//!
//! An inversion-of-control container with hierarchical lifetime scopes,
//! registration sources, decorators, and a middleware resolve pipeline.
//!
//! Components are registered against a [`ContainerBuilder`] with explicit
//! factory closures; the built [`Container`] resolves them by type, by key,
//! or in bulk, honoring each registration's [`Lifetime`], [`Sharing`], and
//! [`Ownership`]. Scopes nest: a child scope shares its parent's registry
//! until it adds registrations of its own, and disposal cascades children
//! first, then runs release hooks in reverse creation order.
//!
//! Wrapper services are synthesized on demand for every registered type:
//! `Vec<Arc<T>>` (all implementations), [`Lazy<T>`](Lazy) (deferred, breaks
//! cycles), [`Factory<T>`](Factory) (fresh instance per call), [`Meta<T>`](Meta)
//! (instance plus registration metadata), and [`Owned<T>`](Owned) (instance in
//! its own disposable scope).
//!
//! ## Quick start
//!
//! ```rust
//! use graft_di::{ContainerBuilder, Resolver};
//! use std::sync::Arc;
//!
//! trait Notifier: Send + Sync {
//!     fn notify(&self, message: &str) -> String;
//! }
//!
//! struct Email;
//! impl Notifier for Email {
//!     fn notify(&self, message: &str) -> String {
//!         format!("email: {message}")
//!     }
//! }
//!
//! struct Audit {
//!     notifier: Arc<dyn Notifier>,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder
//!     .register_arc::<dyn Notifier, _>(|_| Arc::new(Email))
//!     .single_instance();
//! builder.register(|ctx| Audit {
//!     notifier: ctx.resolve::<dyn Notifier>().unwrap(),
//! });
//! let container = builder.build();
//!
//! let audit = container.resolve::<Audit>().unwrap();
//! assert_eq!(audit.notifier.notify("hi"), "email: hi");
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use graft_di::{ContainerBuilder, Resolver};
//!
//! let mut builder = ContainerBuilder::new();
//! builder.register(|_| 1u32);
//! let container = builder.build();
//!
//! let scope = container
//!     .begin_scope_with(|b| {
//!         b.register(|_| 2u32);
//!     })
//!     .unwrap();
//! assert_eq!(*scope.resolve::<u32>().unwrap(), 2);
//! assert_eq!(*container.resolve::<u32>().unwrap(), 1);
//! ```

use std::any::Any;
use std::sync::Arc;

/// Type-erased instance payload.
///
/// The payload is always the `Arc<T>` of the resolved component, never a bare
/// `T`, so trait objects and other unsized services share one representation
/// with sized ones.
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

pub mod activator;
pub mod container;
pub mod decorator;
pub mod error;
mod internal;
pub mod lifetime;
pub mod metadata;
pub mod operation;
pub mod params;
pub mod pipeline;
pub mod registration;
pub mod registry;
pub mod scope;
pub mod service;
pub mod source;
pub mod tracer;
pub mod traits;

pub use activator::{Activator, FactoryActivator, InstanceActivator};
pub use container::{Container, ContainerBuilder, RegistrationBuilder};
pub use decorator::{DecoratorBuilder, DecoratorContext};
pub use error::{DiError, DiResult};
pub use lifetime::{Lifetime, Ownership, Sharing};
pub use metadata::{Metadata, MetadataValue};
pub use operation::{ResolveContext, ResolveOperation};
pub use params::Parameter;
pub use pipeline::{Next, PipelinePhase, ResolveMiddleware};
pub use registration::{ComponentRegistration, RegistrationId};
pub use registry::ComponentRegistry;
pub use scope::LifetimeScope;
pub use service::{Service, ServiceKey};
pub use source::{
    Factory, Lazy, Meta, OpenGenericSource, Owned, ParameterMapping, RegistrationSource,
    ServiceAccessor,
};
pub use tracer::{LoggingTracer, ResolveTracer};
pub use traits::{Dispose, Resolver, ResolverCore};
