//! Error types for the container.

use thiserror::Error;

use crate::service::Service;

/// Resolution and configuration errors.
///
/// A failure deep in a dependency graph is wrapped exactly once into
/// [`DiError::DependencyFailure`] at the request where it occurred, so the
/// top-level caller sees a single wrapper naming the failed service together
/// with the innermost cause. [`DiError::Circular`] and already-wrapped
/// failures propagate through outer requests unchanged.
///
/// # Examples
///
/// ```rust
/// use graft_di::{ContainerBuilder, DiError, Resolver};
///
/// let container = ContainerBuilder::new().build();
/// match container.resolve::<String>() {
///     Err(DiError::NotRegistered(service)) => assert!(service.contains("String")),
///     other => panic!("unexpected: {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No direct or source-producible registration exists for the service.
    #[error("no registrations found for service {0}")]
    NotRegistered(String),
    /// A request somewhere in the graph failed; carries the underlying cause.
    #[error("failed to resolve {service}: {source}")]
    DependencyFailure {
        /// Description of the service whose request failed.
        service: String,
        /// The underlying failure.
        #[source]
        source: Box<DiError>,
    },
    /// The same (service, scope) pair was re-entered within one operation.
    #[error("circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// A resolved instance could not be downcast to the requested type.
    #[error("type mismatch for {0}")]
    TypeMismatch(&'static str),
    /// The scope (or a required ancestor) has already been disposed.
    #[error("lifetime scope has been disposed")]
    ScopeDisposed,
    /// A matching-scope component found no ancestor carrying its tag.
    #[error("no ancestor scope tagged '{0}'")]
    NoMatchingScope(&'static str),
    /// A user activator reported a failure.
    #[error("activation failed: {0}")]
    ActivationFailure(String),
    /// A generated-factory argument did not fit the configured mapping mode.
    #[error("argument mapping failed: {0}")]
    ArgumentMapping(String),
    /// Two by-type factory arguments carried the same type.
    #[error("ambiguous by-type argument: {0} supplied more than once")]
    AmbiguousParameter(&'static str),
    /// A registration or source was configured inconsistently.
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),
    /// The per-operation request stack exceeded the depth limit.
    #[error("resolve depth {0} exceeded")]
    DepthExceeded(usize),
}

impl DiError {
    /// Convenience constructor for activator failures.
    pub fn activation(message: impl Into<String>) -> Self {
        DiError::ActivationFailure(message.into())
    }

    /// Wraps a failure with the service whose request it crossed, once.
    pub(crate) fn wrap(self, service: &Service) -> Self {
        match self {
            DiError::DependencyFailure { .. } | DiError::Circular(_) => self,
            other => DiError::DependencyFailure {
                service: service.description(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost cause of a (possibly wrapped) failure.
    pub fn root_cause(&self) -> &DiError {
        match self {
            DiError::DependencyFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;
