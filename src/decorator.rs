//! Decorators.
//!
//! A decorator wraps resolved instances of a target service without the
//! consumer knowing. Decorators apply in registration order, innermost first:
//! registering `D1` then `D2` yields `D2(D1(component))`. They run inside the
//! sharing stage, so a shared component is decorated exactly once.

use std::any::TypeId;
use std::sync::Arc;

use crate::error::DiResult;
use crate::internal::{erase, unerase};
use crate::operation::ResolveContext;
use crate::SharedInstance;

/// What a decorator knows about the instance it is wrapping.
#[derive(Debug, Clone)]
pub struct DecoratorContext {
    service_type: &'static str,
    implementation_type: &'static str,
    applied: Vec<&'static str>,
}

impl DecoratorContext {
    pub(crate) fn new(service_type: &'static str, implementation_type: &'static str) -> Self {
        DecoratorContext {
            service_type,
            implementation_type,
            applied: Vec::new(),
        }
    }

    /// The service type being decorated.
    pub fn service_type(&self) -> &'static str {
        self.service_type
    }

    /// The concrete type the activator produced.
    pub fn implementation_type(&self) -> &'static str {
        self.implementation_type
    }

    /// Display names of decorators already applied, innermost first.
    pub fn applied_decorators(&self) -> &[&'static str] {
        &self.applied
    }

    /// Zero-based position of the decorator about to be applied.
    pub fn position(&self) -> usize {
        self.applied.len()
    }

    pub(crate) fn push_applied(&mut self, name: &'static str) {
        self.applied.push(name);
    }
}

pub(crate) type DecorateFn = Arc<
    dyn for<'a> Fn(
            SharedInstance,
            &ResolveContext<'a>,
            &DecoratorContext,
        ) -> DiResult<SharedInstance>
        + Send
        + Sync,
>;
pub(crate) type ConditionFn = Arc<dyn Fn(&DecoratorContext) -> bool + Send + Sync>;

/// One decorator attached to a target service type.
pub(crate) struct DecoratorRegistration {
    pub(crate) target: TypeId,
    pub(crate) target_name: &'static str,
    pub(crate) display_name: &'static str,
    pub(crate) decorate: DecorateFn,
    pub(crate) condition: Option<ConditionFn>,
}

impl DecoratorRegistration {
    pub(crate) fn new<T, F>(decorate: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: for<'a> Fn(Arc<T>, &ResolveContext<'a>, &DecoratorContext) -> DiResult<Arc<T>>
            + Send
            + Sync
            + 'static,
    {
        DecoratorRegistration {
            target: TypeId::of::<T>(),
            target_name: std::any::type_name::<T>(),
            display_name: "decorator",
            decorate: Arc::new(move |shared, ctx, decoration| {
                let inner = unerase::<T>(shared)?;
                Ok(erase(decorate(inner, ctx, decoration)?))
            }),
            condition: None,
        }
    }
}

/// Fluent configuration for a decorator just registered with
/// [`ContainerBuilder::register_decorator`](crate::ContainerBuilder::register_decorator).
pub struct DecoratorBuilder<'b> {
    registration: &'b mut DecoratorRegistration,
}

impl<'b> DecoratorBuilder<'b> {
    pub(crate) fn new(registration: &'b mut DecoratorRegistration) -> Self {
        DecoratorBuilder { registration }
    }

    /// Name shown in [`DecoratorContext::applied_decorators`].
    pub fn display_name(self, name: &'static str) -> Self {
        self.registration.display_name = name;
        self
    }

    /// Applies the decorator only when the predicate holds for the current
    /// decoration context.
    pub fn only_if(
        self,
        condition: impl Fn(&DecoratorContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.registration.condition = Some(Arc::new(condition));
        self
    }
}
