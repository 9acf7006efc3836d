//! Resolve-time parameters.
//!
//! Parameters travel with a single request and take precedence over container
//! registrations when a factory asks for an argument via
//! [`ResolveContext::argument`](crate::ResolveContext::argument).

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::internal::{erase, unerase};
use crate::SharedInstance;

/// A caller-supplied argument for one resolve request.
#[derive(Clone)]
pub enum Parameter {
    /// Matched by the argument's type.
    Typed {
        type_id: TypeId,
        type_name: &'static str,
        value: SharedInstance,
    },
    /// Matched by an explicit name.
    Named {
        name: &'static str,
        type_name: &'static str,
        value: SharedInstance,
    },
    /// Matched by position.
    Positional {
        index: usize,
        type_name: &'static str,
        value: SharedInstance,
    },
}

impl Parameter {
    /// A by-type parameter owning its value.
    pub fn typed<T: Send + Sync + 'static>(value: T) -> Self {
        Self::typed_arc(Arc::new(value))
    }

    /// A by-type parameter from an existing `Arc`.
    pub fn typed_arc<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Parameter::Typed {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value: erase(value),
        }
    }

    /// A named parameter owning its value.
    pub fn named<T: Send + Sync + 'static>(name: &'static str, value: T) -> Self {
        Self::named_arc(name, Arc::new(value))
    }

    /// A named parameter from an existing `Arc`.
    pub fn named_arc<T: ?Sized + Send + Sync + 'static>(name: &'static str, value: Arc<T>) -> Self {
        Parameter::Named {
            name,
            type_name: type_name::<T>(),
            value: erase(value),
        }
    }

    /// A positional parameter owning its value.
    pub fn positional<T: Send + Sync + 'static>(index: usize, value: T) -> Self {
        Self::positional_arc(index, Arc::new(value))
    }

    /// A positional parameter from an existing `Arc`.
    pub fn positional_arc<T: ?Sized + Send + Sync + 'static>(index: usize, value: Arc<T>) -> Self {
        Parameter::Positional {
            index,
            type_name: type_name::<T>(),
            value: erase(value),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Parameter::Typed { type_name, .. }
            | Parameter::Named { type_name, .. }
            | Parameter::Positional { type_name, .. } => type_name,
        }
    }

    pub(crate) fn value(&self) -> &SharedInstance {
        match self {
            Parameter::Typed { value, .. }
            | Parameter::Named { value, .. }
            | Parameter::Positional { value, .. } => value,
        }
    }

    /// Attempts to read the payload as `Arc<T>`.
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        unerase::<T>(self.value().clone()).ok()
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Typed { type_name, .. } => write!(f, "Parameter::Typed({type_name})"),
            Parameter::Named {
                name, type_name, ..
            } => write!(f, "Parameter::Named({name}: {type_name})"),
            Parameter::Positional {
                index, type_name, ..
            } => write!(f, "Parameter::Positional({index}: {type_name})"),
        }
    }
}
