//! Member resolution
//!
//! For every class in the hierarchy walk the candidates are the class's own
//! declared members plus its public member set (which also holds public
//! members inherited from superclasses), deduplicated by member identity.
//! A lookup succeeds only when exactly one candidate survives the filters
//! across the whole hierarchy. The scan stops at the second survivor.
//!
//! The walk is capped at `max_hierarchy_depth` classes. A runtime type whose
//! superclass chain continues past the cap fails with
//! [`ReflectError::HierarchyTooDeep`] instead of being scanned in part, as a
//! partial scan could miss a shadowing member.
//!
//! Method candidates are matched by name, arity, return type and
//! non-abstractness only. Argument types are not compared, so a resolved
//! method can still fail at call time with an argument mismatch.
//!
//! Primitive classes extend `Object`, so an `Object` constraint also accepts
//! primitive fields and return types. A primitive member shadowed by an
//! `Object`-typed one under that constraint is therefore ambiguous.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::class::{Class, Projection, Reflect};
use crate::config::ReflectConfig;
use crate::error::{AccessFault, MemberKind, ReflectError, ReflectResult, Thrown};
use crate::hierarchy::walk_hierarchy_bounded;
use crate::member::{Args, FieldInfo, MemberId, MethodInfo, Value};

/// Upcast steps from a runtime type to the class declaring a member
#[derive(Clone)]
struct UpcastPath {
    steps: Vec<Projection>,
}

impl UpcastPath {
    /// Steps from `hierarchy[0]` to the class with `declaring`'s identity
    fn find(hierarchy: &[Class], declaring: MemberId) -> Option<Self> {
        let mut steps = Vec::new();
        for class in hierarchy {
            if class.id() == declaring.declaring {
                return Some(Self { steps });
            }
            steps.push(class.super_link()?.projection.clone()?);
        }
        None
    }

    fn project<'a>(&self, instance: &'a dyn Any) -> Result<&'a dyn Any, AccessFault> {
        let mut current = instance;
        for step in &self.steps {
            current = step.apply(current).ok_or_else(|| AccessFault::InstanceMismatch {
                expected: step.from().to_string(),
            })?;
        }
        Ok(current)
    }

    fn project_mut<'a>(&self, instance: &'a mut dyn Any) -> Result<&'a mut dyn Any, AccessFault> {
        let mut current = instance;
        for step in &self.steps {
            current = step.apply_mut(current).ok_or_else(|| AccessFault::InstanceMismatch {
                expected: step.from().to_string(),
            })?;
        }
        Ok(current)
    }
}

/// A field resolved for one runtime type
pub(crate) struct FieldHandle {
    field: Arc<FieldInfo>,
    path: UpcastPath,
    accessible: bool,
}

impl FieldHandle {
    pub(crate) fn qualified_name(&self) -> String {
        format!("{}.{}", self.field.declaring_class_name(), self.field.name())
    }

    pub(crate) fn read(&self, instance: &dyn Reflect) -> Result<Value, AccessFault> {
        let target = self.path.project(instance)?;
        self.field.read(target, self.accessible)
    }

    pub(crate) fn write(&self, instance: &mut dyn Reflect, value: Value) -> Result<(), AccessFault> {
        let target = self.path.project_mut(instance)?;
        self.field.write(target, value, self.accessible)
    }
}

/// A method resolved for one runtime type and arity
pub(crate) struct MethodHandle {
    method: Arc<MethodInfo>,
    path: UpcastPath,
    accessible: bool,
}

impl MethodHandle {
    pub(crate) fn qualified_name(&self) -> String {
        format!("{}.{}", self.method.declaring_class_name(), self.method.name())
    }

    pub(crate) fn call(&self, instance: &mut dyn Reflect, args: Args) -> Result<Value, Thrown> {
        let target = self.path.project_mut(instance)?;
        self.method.call(target, args, self.accessible)
    }
}

/// Request shared by both member kinds
struct Lookup<'a> {
    kind: MemberKind,
    runtime: &'a Class,
    name: &'a str,
    constraint: &'a Class,
    parameter_count: Option<usize>,
}

impl Lookup<'_> {
    fn failure(&self, candidates: usize) -> ReflectError {
        let err = ReflectError::AmbiguousOrMissingMember {
            kind: self.kind,
            declaring_type: self.runtime.name().to_string(),
            name: self.name.to_string(),
            constraint: self.constraint.name().to_string(),
            parameter_count: self.parameter_count,
            candidates,
        };
        tracing::debug!(error = %err, "member resolution failed");
        err
    }

    /// Require exactly one match among the first two candidates
    fn single<M>(&self, mut matches: impl Iterator<Item = M>) -> ReflectResult<M> {
        match (matches.next(), matches.next()) {
            (Some(member), None) => Ok(member),
            (None, _) => Err(self.failure(0)),
            (Some(_), Some(_)) => Err(self.failure(2)),
        }
    }

    /// The full superclass chain of the runtime type, or an error when it
    /// runs past `max_depth` classes
    fn hierarchy(&self, max_depth: usize) -> ReflectResult<Vec<Class>> {
        let hierarchy = walk_hierarchy_bounded(Some(self.runtime), max_depth);
        let next = match hierarchy.last() {
            Some(last) => last.superclass(),
            None => Some(self.runtime.clone()),
        };
        // a cycle ends on an already visited class and is complete
        if next.is_some_and(|next| !hierarchy.contains(&next)) {
            let err = ReflectError::HierarchyTooDeep {
                declaring_type: self.runtime.name().to_string(),
                max_depth,
            };
            tracing::debug!(error = %err, "member resolution failed");
            return Err(err);
        }
        Ok(hierarchy)
    }

    /// Upcast path to the declaring class; a member that cannot be reached
    /// from the runtime type counts as missing
    fn path(&self, hierarchy: &[Class], declaring: MemberId) -> ReflectResult<UpcastPath> {
        UpcastPath::find(hierarchy, declaring).ok_or_else(|| self.failure(0))
    }
}

/// Field candidates of one hierarchy level: declared ∪ public
fn level_fields(class: &Class) -> impl Iterator<Item = Arc<FieldInfo>> {
    let mut seen = FxHashSet::default();
    class
        .declared_fields()
        .to_vec()
        .into_iter()
        .chain(class.public_fields())
        .filter(move |field| seen.insert(field.id()))
}

/// Method candidates of one hierarchy level: declared ∪ public
fn level_methods(class: &Class) -> impl Iterator<Item = Arc<MethodInfo>> {
    let mut seen = FxHashSet::default();
    class
        .declared_methods()
        .to_vec()
        .into_iter()
        .chain(class.public_methods())
        .filter(move |method| seen.insert(method.id()))
}

/// Resolve the unique field `name` whose type is assignable to `field_type`
pub(crate) fn resolve_field(
    runtime: &Class,
    name: &str,
    field_type: &Class,
    config: &ReflectConfig,
) -> ReflectResult<FieldHandle> {
    let lookup = Lookup {
        kind: MemberKind::Field,
        runtime,
        name,
        constraint: field_type,
        parameter_count: None,
    };
    let hierarchy = lookup.hierarchy(config.max_hierarchy_depth)?;

    let mut seen = FxHashSet::default();
    let matches = hierarchy
        .iter()
        .flat_map(level_fields)
        .filter(|field| field.name() == name)
        .filter(|field| field_type.is_assignable_from(&field.field_type()))
        .filter(|field| seen.insert(field.id()));
    let field = lookup.single(matches)?;

    let path = lookup.path(&hierarchy, field.id())?;
    tracing::debug!(
        runtime = runtime.name(),
        field = name,
        declaring = field.declaring_class_name(),
        "resolved field"
    );
    Ok(FieldHandle {
        field,
        path,
        accessible: true,
    })
}

/// Resolve the unique concrete method `name` taking `parameter_count`
/// arguments whose return type is assignable to `return_type`
pub(crate) fn resolve_method(
    runtime: &Class,
    name: &str,
    return_type: &Class,
    parameter_count: usize,
    config: &ReflectConfig,
) -> ReflectResult<MethodHandle> {
    let lookup = Lookup {
        kind: MemberKind::Method,
        runtime,
        name,
        constraint: return_type,
        parameter_count: Some(parameter_count),
    };
    let hierarchy = lookup.hierarchy(config.max_hierarchy_depth)?;

    let mut seen = FxHashSet::default();
    let matches = hierarchy
        .iter()
        .flat_map(level_methods)
        .filter(|method| !method.is_abstract())
        .filter(|method| method.parameter_count() == parameter_count)
        .filter(|method| method.name() == name)
        .filter(|method| return_type.is_assignable_from(&method.return_type()))
        .filter(|method| seen.insert(method.id()));
    let method = lookup.single(matches)?;

    let path = lookup.path(&hierarchy, method.id())?;
    tracing::debug!(
        runtime = runtime.name(),
        method = name,
        parameter_count,
        declaring = method.declaring_class_name(),
        "resolved method"
    );
    Ok(MethodHandle {
        method,
        path,
        accessible: true,
    })
}
