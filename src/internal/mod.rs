//! Crate-internal plumbing.

pub(crate) mod disposer;

use std::any::type_name;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::SharedInstance;

/// Erases `Arc<T>` into the uniform instance payload.
///
/// The payload of a [`SharedInstance`] is always the `Arc<T>` itself, never a
/// bare `T`. This keeps unsized `T` (trait objects, slices) representable:
/// `Arc<T>` is `Sized` even when `T` is not, so it can live inside `dyn Any`.
pub(crate) fn erase<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> SharedInstance {
    Arc::new(value)
}

/// Recovers `Arc<T>` from the uniform instance payload.
pub(crate) fn unerase<T: ?Sized + Send + Sync + 'static>(
    shared: SharedInstance,
) -> DiResult<Arc<T>> {
    shared
        .downcast::<Arc<T>>()
        .map(|outer| (*outer).clone())
        .map_err(|_| DiError::TypeMismatch(type_name::<T>()))
}
