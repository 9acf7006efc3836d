//! Generated factories.

use std::any::TypeId;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::params::Parameter;
use crate::scope::LifetimeScope;
use crate::traits::Resolver;

/// How [`Factory::invoke_with`] arguments are matched to the component's
/// factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterMapping {
    /// Arguments match by their type; supplying two arguments of the same
    /// type is ambiguous and rejected. The default.
    ByType,
    /// Arguments must be [`Parameter::Named`] and match by name.
    ByName,
    /// Arguments are renumbered in the order supplied and match by position.
    ByPosition,
}

/// A resolvable component factory: each [`invoke`](Factory::invoke) performs
/// a fresh resolve of `T` in the scope the factory came from, so a transient
/// `T` yields a new instance per call.
///
/// Synthesized on demand; resolve `Factory<T>` for any registered `T`.
pub struct Factory<T: ?Sized + Send + Sync + 'static> {
    scope: LifetimeScope,
    mapping: ParameterMapping,
    _marker: PhantomData<fn(Arc<T>) -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Factory<T> {
    pub(crate) fn new(scope: LifetimeScope, mapping: ParameterMapping) -> Self {
        Factory {
            scope,
            mapping,
            _marker: PhantomData,
        }
    }

    /// Resolves a fresh `T` with no extra arguments.
    pub fn invoke(&self) -> DiResult<Arc<T>> {
        self.scope.resolve::<T>()
    }

    /// Resolves a fresh `T`, passing the arguments as request parameters
    /// after applying the configured mapping.
    pub fn invoke_with(&self, arguments: Vec<Parameter>) -> DiResult<Arc<T>> {
        let mapped = map_arguments(self.mapping, arguments)?;
        self.scope.resolve_with::<T>(mapped)
    }

    /// The same factory with a different argument mapping.
    pub fn with_mapping(&self, mapping: ParameterMapping) -> Self {
        Factory {
            scope: self.scope.clone(),
            mapping,
            _marker: PhantomData,
        }
    }

    /// The mapping mode in effect.
    pub fn mapping(&self) -> ParameterMapping {
        self.mapping
    }
}

fn map_arguments(
    mapping: ParameterMapping,
    arguments: Vec<Parameter>,
) -> DiResult<Vec<Parameter>> {
    match mapping {
        ParameterMapping::ByType => {
            let mut seen: HashSet<TypeId> = HashSet::new();
            for argument in &arguments {
                match argument {
                    Parameter::Typed {
                        type_id, type_name, ..
                    } => {
                        if !seen.insert(*type_id) {
                            return Err(DiError::AmbiguousParameter(type_name));
                        }
                    }
                    other => {
                        return Err(DiError::ArgumentMapping(format!(
                            "by-type mapping accepts typed arguments only, got {other:?}"
                        )))
                    }
                }
            }
            Ok(arguments)
        }
        ParameterMapping::ByName => {
            for argument in &arguments {
                if !matches!(argument, Parameter::Named { .. }) {
                    return Err(DiError::ArgumentMapping(format!(
                        "by-name mapping accepts named arguments only, got {argument:?}"
                    )));
                }
            }
            Ok(arguments)
        }
        ParameterMapping::ByPosition => Ok(arguments
            .into_iter()
            .enumerate()
            .map(|(index, argument)| Parameter::Positional {
                index,
                type_name: argument.type_name(),
                value: argument.value().clone(),
            })
            .collect()),
    }
}
