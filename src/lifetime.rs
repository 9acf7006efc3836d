//! Lifetime, sharing, and ownership policies.
//!
//! Every registration carries one value of each of these three enums; together
//! they answer *where* an instance lives, *whether* it is reused, and *who*
//! disposes it.

/// In which scope instances of a component live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Instances belong to the root scope (the container). Combined with
    /// [`Sharing::Shared`] this is a classic singleton.
    RootScope,
    /// Instances belong to the nearest enclosing scope carrying this tag.
    /// Resolving with no tagged ancestor fails with
    /// [`NoMatchingScope`](crate::DiError::NoMatchingScope).
    MatchingScope(&'static str),
    /// Instances belong to whichever scope the resolve was issued against.
    CurrentScope,
}

/// Whether instances are reused within their owning scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharing {
    /// At most one instance per owning scope; concurrent first resolves
    /// block on the creating thread and observe the same instance.
    Shared,
    /// A fresh instance per resolve.
    None,
}

/// Who is responsible for disposing instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The owning scope tracks the instance and runs its release hook when
    /// the scope is disposed.
    OwnedByScope,
    /// The caller keeps responsibility; the scope never tracks the instance.
    ExternallyOwned,
}
