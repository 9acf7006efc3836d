//! The resolve pipeline.
//!
//! Each registration runs its requests through an ordered chain of middleware
//! stages. The built-in stages implement scope selection, sharing, decoration,
//! and activation; registrations can splice in extra stages with
//! [`RegistrationBuilder::with_middleware`](crate::RegistrationBuilder::with_middleware).
//!
//! Decoration runs *inside* sharing: the instance cached for a shared
//! component is the decorated one, so a decorated singleton is decorated
//! exactly once and every resolve observes the same reference.

use std::sync::Arc;

use crate::decorator::DecoratorContext;
use crate::error::{DiError, DiResult};
use crate::lifetime::{Lifetime, Ownership, Sharing};
use crate::operation::ResolveContext;
use crate::service::Service;
use crate::SharedInstance;

/// The named stages of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelinePhase {
    /// Compute the owning scope from the registration's lifetime.
    ScopeSelection,
    /// Reuse or create the per-scope instance for shared components.
    Sharing,
    /// Wrap the activated instance in its decorators.
    Decoration,
    /// Run hooks and the activator.
    Activation,
}

/// One stage of the resolve pipeline.
pub trait ResolveMiddleware: Send + Sync {
    /// The phase this stage attaches to. Custom stages run after the built-in
    /// stage of their phase, except [`PipelinePhase::Activation`] stages,
    /// which run just before the terminal activation stage.
    fn phase(&self) -> PipelinePhase;

    /// Handles the request, calling `next.proceed(ctx)` to continue down the
    /// chain. Not calling it short-circuits the pipeline.
    fn invoke(&self, ctx: &mut ResolveContext<'_>, next: Next<'_>) -> DiResult<SharedInstance>;

    /// Diagnostic name.
    fn description(&self) -> &'static str;
}

/// Continuation handle for the remainder of a pipeline.
pub struct Next<'a> {
    stages: &'a [Arc<dyn ResolveMiddleware>],
    position: usize,
}

impl<'a> Next<'a> {
    /// Invokes the next stage.
    pub fn proceed(self, ctx: &mut ResolveContext<'_>) -> DiResult<SharedInstance> {
        let stage = match self.stages.get(self.position) {
            Some(stage) => stage.clone(),
            None => {
                return Err(DiError::InvalidRegistration(
                    "resolve pipeline ended without an activation stage".into(),
                ))
            }
        };
        let next = Next {
            stages: self.stages,
            position: self.position + 1,
        };
        let tracers = ctx.tracers().clone();
        if tracers.has_tracers() {
            let service = ctx.service().clone();
            let phase = stage.phase();
            tracers.middleware_enter(&service, phase);
            let result = stage.invoke(ctx, next);
            tracers.middleware_exit(&service, phase, result.is_ok());
            result
        } else {
            stage.invoke(ctx, next)
        }
    }
}

/// A registration's assembled stage chain.
pub(crate) struct ResolvePipeline {
    stages: Vec<Arc<dyn ResolveMiddleware>>,
}

impl ResolvePipeline {
    pub(crate) fn build(extra: &[Arc<dyn ResolveMiddleware>]) -> Self {
        let extras_in = |phase: PipelinePhase| {
            extra
                .iter()
                .filter(move |stage| stage.phase() == phase)
                .cloned()
        };
        let mut stages: Vec<Arc<dyn ResolveMiddleware>> = Vec::with_capacity(extra.len() + 4);
        stages.push(Arc::new(ScopeSelectionMiddleware));
        stages.extend(extras_in(PipelinePhase::ScopeSelection));
        stages.push(Arc::new(SharingMiddleware));
        stages.extend(extras_in(PipelinePhase::Sharing));
        stages.push(Arc::new(DecorationMiddleware));
        stages.extend(extras_in(PipelinePhase::Decoration));
        stages.extend(extras_in(PipelinePhase::Activation));
        stages.push(Arc::new(ActivationMiddleware));
        ResolvePipeline { stages }
    }

    pub(crate) fn invoke(&self, ctx: &mut ResolveContext<'_>) -> DiResult<SharedInstance> {
        Next {
            stages: &self.stages,
            position: 0,
        }
        .proceed(ctx)
    }
}

struct ScopeSelectionMiddleware;

impl ResolveMiddleware for ScopeSelectionMiddleware {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::ScopeSelection
    }

    fn invoke(&self, ctx: &mut ResolveContext<'_>, next: Next<'_>) -> DiResult<SharedInstance> {
        let selected = match ctx.registration().lifetime {
            Lifetime::RootScope => ctx.scope().root_scope()?,
            Lifetime::MatchingScope(tag) => ctx
                .scope()
                .find_tagged(tag)
                .ok_or(DiError::NoMatchingScope(tag))?,
            Lifetime::CurrentScope => ctx.scope().clone(),
        };
        if selected.is_disposed() {
            return Err(DiError::ScopeDisposed);
        }
        ctx.set_selected_scope(selected);
        next.proceed(ctx)
    }

    fn description(&self) -> &'static str {
        "scope selection"
    }
}

struct SharingMiddleware;

impl ResolveMiddleware for SharingMiddleware {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::Sharing
    }

    fn invoke(&self, ctx: &mut ResolveContext<'_>, next: Next<'_>) -> DiResult<SharedInstance> {
        if ctx.registration().sharing != Sharing::Shared {
            return next.proceed(ctx);
        }
        let owner = ctx.owning_scope();
        // The cached instance outlives the issuing scope, so the rest of the
        // pipeline resolves against the owner's registry.
        ctx.rebase_scope(owner.clone());
        let id = ctx.registration().id;
        owner
            .instances()
            .get_or_create(id, ctx, move |ctx: &mut ResolveContext<'_>| next.proceed(ctx))
    }

    fn description(&self) -> &'static str {
        "sharing"
    }
}

struct DecorationMiddleware;

impl ResolveMiddleware for DecorationMiddleware {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::Decoration
    }

    fn invoke(&self, ctx: &mut ResolveContext<'_>, next: Next<'_>) -> DiResult<SharedInstance> {
        let marker = match ctx.service() {
            Service::Typed { type_id, type_name }
            | Service::Keyed {
                type_id, type_name, ..
            } => Service::decorator_for(*type_id, type_name),
            _ => return next.proceed(ctx),
        };
        let decorators = ctx.scope().registry().decorators_for(&marker);
        if decorators.is_empty() {
            return next.proceed(ctx);
        }
        let mut instance = next.proceed(ctx)?;
        let mut decoration = DecoratorContext::new(
            ctx.service().type_name(),
            ctx.registration().implementation_type(),
        );
        for decorator in decorators {
            if let Some(condition) = &decorator.condition {
                if !condition(&decoration) {
                    continue;
                }
            }
            instance = (decorator.decorate)(instance, ctx, &decoration)?;
            decoration.push_applied(decorator.display_name);
        }
        Ok(instance)
    }

    fn description(&self) -> &'static str {
        "decoration"
    }
}

struct ActivationMiddleware;

impl ResolveMiddleware for ActivationMiddleware {
    fn phase(&self) -> PipelinePhase {
        PipelinePhase::Activation
    }

    fn invoke(&self, ctx: &mut ResolveContext<'_>, _next: Next<'_>) -> DiResult<SharedInstance> {
        let registration = ctx.registration_arc();

        for hook in &registration.preparing {
            let mut parameters = ctx.take_parameters();
            hook(ctx, &mut parameters);
            ctx.put_parameters(parameters);
        }

        let mut instance = registration.activator.activate(ctx)?;

        for hook in &registration.activating {
            hook(ctx, &mut instance)?;
        }

        if registration.ownership == Ownership::OwnedByScope {
            if let Some(release) = &registration.release {
                let release = release.clone();
                let tracked = instance.clone();
                ctx.owning_scope()
                    .track_disposal(Box::new(move || release(tracked)));
            }
        }

        for hook in &registration.activated {
            hook(ctx, &instance)?;
        }

        Ok(instance)
    }

    fn description(&self) -> &'static str {
        "activation"
    }
}
