//! Service identity.
//!
//! A [`Service`] names *what* is being requested from the container; it is the
//! key every registry map is indexed by. Equality and hashing are structural
//! over the [`TypeId`] (plus key or unique id) and deliberately ignore the
//! human-readable type name, which exists only for diagnostics.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UNIQUE: AtomicU64 = AtomicU64::new(1);

/// Discriminates multiple registrations of the same service type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    /// A human-chosen name, e.g. `"primary"`.
    Name(&'static str),
    /// A numeric index.
    Index(u64),
}

impl From<&'static str> for ServiceKey {
    fn from(name: &'static str) -> Self {
        ServiceKey::Name(name)
    }
}

impl From<u64> for ServiceKey {
    fn from(index: u64) -> Self {
        ServiceKey::Index(index)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKey::Name(name) => write!(f, "\"{name}\""),
            ServiceKey::Index(index) => write!(f, "#{index}"),
        }
    }
}

/// Identity of a resolvable service.
///
/// # Examples
///
/// ```rust
/// use graft_di::Service;
///
/// let a = Service::typed::<String>();
/// let b = Service::typed::<String>();
/// assert_eq!(a, b);
/// assert_ne!(a, Service::named::<String>("primary"));
/// ```
#[derive(Debug, Clone)]
pub enum Service {
    /// The default service for a type.
    Typed {
        /// Type identity.
        type_id: TypeId,
        /// Diagnostic name; not part of equality.
        type_name: &'static str,
    },
    /// A keyed (or named) service for a type.
    Keyed {
        /// Type identity.
        type_id: TypeId,
        /// Diagnostic name; not part of equality.
        type_name: &'static str,
        /// The discriminating key.
        key: ServiceKey,
    },
    /// Marker under which decorators for a type are grouped. Never resolvable.
    Decorator {
        /// Target type identity.
        type_id: TypeId,
        /// Diagnostic name; not part of equality.
        type_name: &'static str,
    },
    /// A service identity no lookup can collide with; used to wire internal
    /// registrations that must not be addressable by type.
    Unique {
        /// Process-monotonic id.
        id: u64,
        /// Diagnostic name.
        type_name: &'static str,
    },
}

impl Service {
    /// The default service for `T`.
    pub fn typed<T: ?Sized + 'static>() -> Self {
        Service::Typed {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// A keyed service for `T`.
    pub fn keyed<T: ?Sized + 'static>(key: impl Into<ServiceKey>) -> Self {
        Service::Keyed {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            key: key.into(),
        }
    }

    /// A named service for `T`; shorthand for a [`ServiceKey::Name`] key.
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Service::keyed::<T>(ServiceKey::Name(name))
    }

    pub(crate) fn decorator_for(type_id: TypeId, type_name: &'static str) -> Self {
        Service::Decorator { type_id, type_name }
    }

    /// A fresh identity no other lookup can collide with. Useful for wiring
    /// registrations that must not be addressable by type, e.g. private
    /// plumbing inside a custom [`RegistrationSource`](crate::RegistrationSource).
    pub fn unique(type_name: &'static str) -> Self {
        Service::Unique {
            id: NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed),
            type_name,
        }
    }

    /// The `TypeId` this service targets, if it targets one.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Service::Typed { type_id, .. }
            | Service::Keyed { type_id, .. }
            | Service::Decorator { type_id, .. } => Some(*type_id),
            Service::Unique { .. } => None,
        }
    }

    /// Diagnostic type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Service::Typed { type_name, .. }
            | Service::Keyed { type_name, .. }
            | Service::Decorator { type_name, .. }
            | Service::Unique { type_name, .. } => type_name,
        }
    }

    /// Human-readable description used in errors and traces.
    pub fn description(&self) -> String {
        match self {
            Service::Typed { type_name, .. } => (*type_name).to_string(),
            Service::Keyed { type_name, key, .. } => format!("{type_name} (key: {key})"),
            Service::Decorator { type_name, .. } => format!("decorators of {type_name}"),
            Service::Unique { type_name, id } => format!("{type_name} (unique: {id})"),
        }
    }
}

// Equality and hashing ignore type_name: two `Service`s constructed in
// different crates for the same type must collide in registry maps even if
// the compiler rendered their names differently.
impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Service::Typed { type_id: a, .. }, Service::Typed { type_id: b, .. }) => a == b,
            (
                Service::Keyed {
                    type_id: a, key: ka, ..
                },
                Service::Keyed {
                    type_id: b, key: kb, ..
                },
            ) => a == b && ka == kb,
            (Service::Decorator { type_id: a, .. }, Service::Decorator { type_id: b, .. }) => {
                a == b
            }
            (Service::Unique { id: a, .. }, Service::Unique { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Service {}

impl Hash for Service {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Service::Typed { type_id, .. } => {
                0u8.hash(state);
                type_id.hash(state);
            }
            Service::Keyed { type_id, key, .. } => {
                1u8.hash(state);
                type_id.hash(state);
                key.hash(state);
            }
            Service::Decorator { type_id, .. } => {
                2u8.hash(state);
                type_id.hash(state);
            }
            Service::Unique { id, .. } => {
                3u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
