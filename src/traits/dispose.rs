//! Deterministic cleanup for scope-owned components.

/// Components that release resources when their owning scope is disposed.
///
/// Register the hook with
/// [`RegistrationBuilder::with_dispose`](crate::RegistrationBuilder::with_dispose);
/// the owning scope then calls [`dispose`](Dispose::dispose) exactly once, in
/// reverse creation order, when it is disposed.
pub trait Dispose: Send + Sync {
    /// Releases the component's resources. Must be idempotent-safe to the
    /// extent the component cares; the container itself never calls it twice.
    fn dispose(&self);
}
