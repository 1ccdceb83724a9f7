//! Process-wide registry of class descriptors

use std::any::TypeId;
use std::sync::LazyLock;

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::class::{Class, ClassInfo};

static GLOBAL_REGISTRY: LazyLock<ClassRegistry> = LazyLock::new(ClassRegistry::new);

/// Class registry keyed by Rust type identity, with a by-name index.
///
/// Registration is idempotent: the first descriptor stored for a type wins
/// and later registrations of the same type return it.
#[derive(Debug)]
pub struct ClassRegistry {
    /// Classes indexed by type
    classes: DashMap<TypeId, Class>,
    /// Class name to class mapping
    by_name: RwLock<FxHashMap<String, Class>>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            classes: DashMap::new(),
            by_name: RwLock::new(FxHashMap::default()),
        }
    }

    /// The registry used by every [`Typed`](crate::Typed) implementation
    pub fn global() -> &'static ClassRegistry {
        &GLOBAL_REGISTRY
    }

    /// Return the descriptor for `T`, building and storing it on first use.
    ///
    /// `build` runs without any registry lock held, so it may look up other
    /// classes. Racing first registrations may each build; one result is
    /// kept.
    pub fn get_or_register<T: ?Sized + 'static>(&self, build: impl FnOnce() -> ClassInfo) -> Class {
        let id = TypeId::of::<T>();
        if let Some(class) = self.classes.get(&id) {
            return class.clone();
        }

        let built = Class::from_info(build());
        if built.id() != id {
            tracing::warn!(
                class = built.name(),
                registered_as = std::any::type_name::<T>(),
                "class descriptor built for a different type"
            );
        }

        let class = self.classes.entry(id).or_insert(built).clone();
        self.by_name
            .write()
            .entry(class.name().to_string())
            .or_insert_with(|| class.clone());
        tracing::trace!(class = class.name(), "registered class");
        class
    }

    /// Get class by type
    pub fn get(&self, id: TypeId) -> Option<Class> {
        self.classes.get(&id).map(|class| class.clone())
    }

    /// Get class by name
    pub fn get_by_name(&self, name: &str) -> Option<Class> {
        self.by_name.read().get(name).cloned()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}
