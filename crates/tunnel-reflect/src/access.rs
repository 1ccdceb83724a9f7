//! Typed access to resolved members

use std::any::Any;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::cache::{CacheKey, ResolutionCache};
use crate::class::{rust_type_name, Class, Reflect};
use crate::config::ReflectConfig;
use crate::error::{AccessFault, ReflectError, ReflectResult};
use crate::member::{Args, Value};
use crate::resolver::{resolve_field, resolve_method, FieldHandle, MethodHandle};

static GLOBAL_CACHE: OnceLock<AccessorCache> = OnceLock::new();

/// Resolves members once per (runtime type, name, constraint[, arity]) and
/// hands out typed accessors bound to an instance
#[derive(Debug, Default)]
pub struct AccessorCache {
    config: ReflectConfig,
    fields: ResolutionCache<FieldHandle>,
    methods: ResolutionCache<MethodHandle>,
}

impl AccessorCache {
    /// Create a cache with default configuration
    pub fn new() -> Self {
        Self::with_config(ReflectConfig::default())
    }

    /// Create a cache with custom configuration
    pub fn with_config(config: ReflectConfig) -> Self {
        Self {
            config,
            fields: ResolutionCache::new(),
            methods: ResolutionCache::new(),
        }
    }

    /// The process-wide cache used by the free functions of this crate
    pub fn global() -> &'static AccessorCache {
        GLOBAL_CACHE.get_or_init(AccessorCache::new)
    }

    /// Configure the process-wide cache. Fails, returning `config`, once the
    /// global cache is in use.
    pub fn install_global(config: ReflectConfig) -> Result<(), ReflectConfig> {
        GLOBAL_CACHE
            .set(AccessorCache::with_config(config))
            .map_err(|cache| cache.config)
    }

    /// Active configuration
    pub fn config(&self) -> &ReflectConfig {
        &self.config
    }

    /// Number of stored field resolutions
    pub fn resolved_fields(&self) -> usize {
        self.fields.len()
    }

    /// Number of stored method resolutions
    pub fn resolved_methods(&self) -> usize {
        self.methods.len()
    }

    /// How many field hierarchy scans have run
    pub fn field_scans(&self) -> usize {
        self.fields.computed()
    }

    /// How many method hierarchy scans have run
    pub fn method_scans(&self) -> usize {
        self.methods.computed()
    }

    fn field_handle(&self, runtime: &Class, name: &str, field_type: &Class) -> ReflectResult<Arc<FieldHandle>> {
        let key = CacheKey::field(runtime, name, field_type);
        let compute = |key: &CacheKey| resolve_field(key.runtime(), key.name(), key.constraint(), &self.config);
        if self.config.memoize {
            self.fields.resolve(key, compute)
        } else {
            self.fields.resolve_uncached(key, compute)
        }
    }

    fn method_handle(
        &self,
        runtime: &Class,
        name: &str,
        return_type: &Class,
        parameter_count: usize,
    ) -> ReflectResult<Arc<MethodHandle>> {
        let key = CacheKey::method(runtime, name, return_type, parameter_count);
        let compute = |key: &CacheKey| {
            resolve_method(
                key.runtime(),
                key.name(),
                key.constraint(),
                parameter_count,
                &self.config,
            )
        };
        if self.config.memoize {
            self.methods.resolve(key, compute)
        } else {
            self.methods.resolve_uncached(key, compute)
        }
    }

    /// Resolve field `name` of `instance` whose type is assignable to
    /// `field_type`, and bind a getter/setter pair to it.
    ///
    /// `F` is the Rust type values are read and written as; a mismatch
    /// surfaces on `get`/`set` as [`ReflectError::Invocation`].
    pub fn field_access<'a, F: Any + Send>(
        &self,
        instance: &'a mut dyn Reflect,
        name: &str,
        field_type: &Class,
    ) -> ReflectResult<FieldAccess<'a, F>> {
        let handle = self.field_handle(&instance.runtime_class(), name, field_type)?;
        Ok(FieldAccess {
            instance,
            handle,
            _value: PhantomData,
        })
    }

    /// Resolve a field and pass its accessor to `access`, returning what
    /// `access` returns
    pub fn with_field<F: Any + Send, X>(
        &self,
        instance: &mut dyn Reflect,
        name: &str,
        field_type: &Class,
        access: impl FnOnce(&mut FieldAccess<'_, F>) -> X,
    ) -> ReflectResult<X> {
        let mut field = self.field_access::<F>(instance, name, field_type)?;
        Ok(access(&mut field))
    }

    /// Resolve and read a field through a shared reference
    pub fn read_field<F: Any>(&self, instance: &dyn Reflect, name: &str, field_type: &Class) -> ReflectResult<F> {
        let handle = self.field_handle(&instance.runtime_class(), name, field_type)?;
        let value = handle
            .read(instance)
            .map_err(|fault| invocation_failure(handle.qualified_name(), fault))?;
        downcast_value(&handle.qualified_name(), value)
    }

    /// Resolve method `name` of `instance` taking `args.len()` arguments and
    /// returning a type assignable to `return_type`, then call it
    pub fn invoke_value(
        &self,
        instance: &mut dyn Reflect,
        name: &str,
        return_type: &Class,
        args: Vec<Value>,
    ) -> ReflectResult<Value> {
        let handle = self.method_handle(&instance.runtime_class(), name, return_type, args.len())?;
        handle
            .call(instance, Args::new(args))
            .map_err(|source| ReflectError::Invocation {
                member: handle.qualified_name(),
                source,
            })
    }

    /// Like [`invoke_value`](Self::invoke_value), returning the result as
    /// an `R`
    pub fn invoke<R: Any>(
        &self,
        instance: &mut dyn Reflect,
        name: &str,
        return_type: &Class,
        args: Vec<Value>,
    ) -> ReflectResult<R> {
        let value = self.invoke_value(instance, name, return_type, args)?;
        downcast_value(&format!("{}.{}", instance.runtime_class(), name), value)
    }
}

fn invocation_failure(member: String, fault: AccessFault) -> ReflectError {
    ReflectError::Invocation {
        member,
        source: Box::new(fault),
    }
}

fn downcast_value<T: Any>(member: &str, value: Value) -> ReflectResult<T> {
    value.downcast::<T>().map(|value| *value).map_err(|_| {
        invocation_failure(
            member.to_string(),
            AccessFault::ValueType {
                expected: rust_type_name::<T>(),
            },
        )
    })
}

/// Getter/setter pair bound to one instance and one resolved field
pub struct FieldAccess<'a, F> {
    instance: &'a mut dyn Reflect,
    handle: Arc<FieldHandle>,
    _value: PhantomData<fn() -> F>,
}

impl<F: Any + Send> FieldAccess<'_, F> {
    /// Read the field
    pub fn get(&self) -> ReflectResult<F> {
        let value = self
            .handle
            .read(&*self.instance)
            .map_err(|fault| invocation_failure(self.member(), fault))?;
        downcast_value(&self.member(), value)
    }

    /// Write the field
    pub fn set(&mut self, value: F) -> ReflectResult<()> {
        self.handle
            .write(&mut *self.instance, Box::new(value))
            .map_err(|fault| invocation_failure(self.member(), fault))
    }

    /// `Declaring.field` name of the resolved field
    pub fn member(&self) -> String {
        self.handle.qualified_name()
    }
}

/// [`AccessorCache::field_access`] on the global cache
pub fn field_access<'a, F: Any + Send>(
    instance: &'a mut dyn Reflect,
    name: &str,
    field_type: &Class,
) -> ReflectResult<FieldAccess<'a, F>> {
    AccessorCache::global().field_access(instance, name, field_type)
}

/// [`AccessorCache::with_field`] on the global cache
pub fn with_field<F: Any + Send, X>(
    instance: &mut dyn Reflect,
    name: &str,
    field_type: &Class,
    access: impl FnOnce(&mut FieldAccess<'_, F>) -> X,
) -> ReflectResult<X> {
    AccessorCache::global().with_field(instance, name, field_type, access)
}

/// [`AccessorCache::read_field`] on the global cache
pub fn read_field<F: Any>(instance: &dyn Reflect, name: &str, field_type: &Class) -> ReflectResult<F> {
    AccessorCache::global().read_field(instance, name, field_type)
}

/// [`AccessorCache::invoke`] on the global cache
pub fn invoke<R: Any>(
    instance: &mut dyn Reflect,
    name: &str,
    return_type: &Class,
    args: Vec<Value>,
) -> ReflectResult<R> {
    AccessorCache::global().invoke(instance, name, return_type, args)
}

/// [`AccessorCache::invoke_value`] on the global cache
pub fn invoke_value(
    instance: &mut dyn Reflect,
    name: &str,
    return_type: &Class,
    args: Vec<Value>,
) -> ReflectResult<Value> {
    AccessorCache::global().invoke_value(instance, name, return_type, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassBuilder, Typed, Visibility};
    use crate::registry::ClassRegistry;

    #[derive(Default)]
    struct Gauge {
        level: u64,
    }

    impl Typed for Gauge {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<Gauge>(|| {
                ClassBuilder::<Gauge>::new("Gauge")
                    .field::<u64>("level", Visibility::Private, |g| &g.level, |g| &mut g.level)
                    .method::<u64>("double", Visibility::Private, 0, |g, _| Ok(g.level * 2))
                    .build()
            })
        }
    }

    #[test]
    fn test_memoized_field_access() {
        let cache = AccessorCache::new();
        let mut gauge = Gauge::default();

        for level in 1..=3u64 {
            let mut access = cache.field_access::<u64>(&mut gauge, "level", &u64::class()).unwrap();
            access.set(level).unwrap();
            assert_eq!(access.get().unwrap(), level);
        }

        assert_eq!(cache.resolved_fields(), 1);
        assert_eq!(cache.field_scans(), 1);
    }

    #[test]
    fn test_unmemoized_field_access() {
        let cache = AccessorCache::with_config(ReflectConfig {
            memoize: false,
            ..ReflectConfig::default()
        });
        let mut gauge = Gauge::default();

        for _ in 0..3 {
            cache.field_access::<u64>(&mut gauge, "level", &u64::class()).unwrap();
        }

        assert_eq!(cache.resolved_fields(), 0);
        assert_eq!(cache.field_scans(), 3);
    }

    #[test]
    fn test_wrong_rust_type_is_invocation_failure() {
        let cache = AccessorCache::new();
        let mut gauge = Gauge { level: 4 };
        let access = cache.field_access::<u32>(&mut gauge, "level", &u64::class()).unwrap();

        let err = access.get().unwrap_err();
        assert!(matches!(err, ReflectError::Invocation { .. }));
        assert_eq!(
            err.cause().and_then(|c| c.downcast_ref::<AccessFault>()),
            Some(&AccessFault::ValueType { expected: "u32" })
        );
    }

    #[test]
    fn test_read_field_through_shared_reference() {
        let cache = AccessorCache::new();
        let gauge = Gauge { level: 9 };
        let level: u64 = cache.read_field(&gauge, "level", &u64::class()).unwrap();
        assert_eq!(level, 9);
    }

    #[test]
    fn test_invoke_counts_method_scans() {
        let cache = AccessorCache::new();
        let mut gauge = Gauge { level: 5 };

        let first: u64 = cache.invoke(&mut gauge, "double", &u64::class(), crate::args![]).unwrap();
        let second: u64 = cache.invoke(&mut gauge, "double", &u64::class(), crate::args![]).unwrap();

        assert_eq!((first, second), (10, 10));
        assert_eq!(cache.resolved_methods(), 1);
        assert_eq!(cache.method_scans(), 1);
    }
}
