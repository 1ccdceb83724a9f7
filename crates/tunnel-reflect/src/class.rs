//! Class descriptors
//!
//! A [`Class`] describes one Rust type to the accessor cache: its name, its
//! superclass (with a projection from the subtype to the embedded supertype
//! value), the interfaces it implements, and its accessor table of fields
//! and methods. Descriptors are built once with a [`ClassBuilder`] and
//! stored in the [`ClassRegistry`](crate::ClassRegistry).
//!
//! ```rust,ignore
//! struct Base { state: String }
//! struct Server { base: Base, sni: Option<String> }
//!
//! impl Typed for Server {
//!     fn class() -> Class {
//!         ClassRegistry::global().get_or_register::<Self>(|| {
//!             ClassBuilder::<Server>::new("Server")
//!                 .extends::<Base>(|s| &s.base, |s| &mut s.base)
//!                 .field::<Option<String>>("sni", Visibility::Private, |s| &s.sni, |s| &mut s.sni)
//!                 .build()
//!         })
//!     }
//! }
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::Thrown;
use crate::member::{Args, FieldInfo, MethodInfo};
use crate::registry::ClassRegistry;

/// Lazily evaluated reference to a class descriptor.
///
/// Descriptors refer to other descriptors through these so that a type can
/// mention itself (or a type that mentions it back) without recursing while
/// it is being registered.
pub type TypeRef = fn() -> Class;

/// A Rust type with a registered class descriptor
pub trait Typed: 'static {
    /// The descriptor for this type
    fn class() -> Class;
}

/// An instance whose runtime class can be queried.
///
/// Implemented for every `Typed + Send + Sync` type.
pub trait Reflect: Any + Send + Sync + 'static {
    /// Runtime class of this instance
    fn runtime_class(&self) -> Class;
}

impl<T: Typed + Send + Sync> Reflect for T {
    fn runtime_class(&self) -> Class {
        <T as Typed>::class()
    }
}

/// Kind of a class descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Ordinary class
    Class,
    /// Interface (no superclass, abstract methods only)
    Interface,
    /// Primitive value type
    Primitive,
}

/// Declared visibility of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Visible only through a resolved handle
    #[default]
    Private,
    /// Visible to subclasses; not part of the public member set
    Protected,
    /// Part of the public member set of the class and its subclasses
    Public,
}

type RefProjection = dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync;
type MutProjection = dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync;

fn ref_projection<P>(project: P) -> P
where
    P: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any>,
{
    project
}

fn mut_projection<P>(project: P) -> P
where
    P: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any>,
{
    project
}

/// Upcast from a subclass value to the superclass value it embeds
#[derive(Clone)]
pub(crate) struct Projection {
    from: String,
    get: Arc<RefProjection>,
    get_mut: Arc<MutProjection>,
}

impl Projection {
    fn new<T, P, G, M>(from: String, get: G, get_mut: M) -> Self
    where
        T: Any,
        P: Any,
        G: Fn(&T) -> &P + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut P + Send + Sync + 'static,
    {
        Self {
            from,
            get: Arc::new(ref_projection(move |any| {
                any.downcast_ref::<T>().map(|this| get(this) as &dyn Any)
            })),
            get_mut: Arc::new(mut_projection(move |any| {
                any.downcast_mut::<T>().map(|this| get_mut(this) as &mut dyn Any)
            })),
        }
    }

    /// Name of the subclass this projection starts from
    pub(crate) fn from(&self) -> &str {
        &self.from
    }

    pub(crate) fn apply<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.get)(value)
    }

    pub(crate) fn apply_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.get_mut)(value)
    }
}

/// Superclass link of a descriptor
#[derive(Clone)]
pub(crate) struct SuperLink {
    pub(crate) class: TypeRef,
    /// `None` for the implicit `Object` root, which has no state to project to
    pub(crate) projection: Option<Projection>,
}

/// Immutable class descriptor
pub struct ClassInfo {
    id: TypeId,
    name: String,
    kind: ClassKind,
    superclass: Option<SuperLink>,
    interfaces: Vec<TypeRef>,
    fields: Vec<Arc<FieldInfo>>,
    methods: Vec<Arc<MethodInfo>>,
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.fields.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("methods", &self.methods.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Shared handle to a registered class descriptor.
///
/// Equality and hashing use the Rust type identity the descriptor was built
/// for.
#[derive(Clone)]
pub struct Class(Arc<ClassInfo>);

impl Class {
    /// Descriptor of `T`
    pub fn of<T: Typed + ?Sized>() -> Class {
        T::class()
    }

    pub(crate) fn from_info(info: ClassInfo) -> Self {
        Class(Arc::new(info))
    }

    /// Rust type identity
    pub fn id(&self) -> TypeId {
        self.0.id
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Class kind
    pub fn kind(&self) -> ClassKind {
        self.0.kind
    }

    /// Whether this is an interface descriptor
    pub fn is_interface(&self) -> bool {
        self.0.kind == ClassKind::Interface
    }

    /// Direct superclass, if any
    pub fn superclass(&self) -> Option<Class> {
        self.0.superclass.as_ref().map(|link| (link.class)())
    }

    pub(crate) fn super_link(&self) -> Option<&SuperLink> {
        self.0.superclass.as_ref()
    }

    /// Directly implemented interfaces
    pub fn interfaces(&self) -> Vec<Class> {
        self.0.interfaces.iter().map(|iface| iface()).collect()
    }

    /// Fields declared by this class, regardless of visibility
    pub fn declared_fields(&self) -> &[Arc<FieldInfo>] {
        &self.0.fields
    }

    /// Methods declared by this class, regardless of visibility
    pub fn declared_methods(&self) -> &[Arc<MethodInfo>] {
        &self.0.methods
    }

    /// Public fields declared by this class or any superclass
    pub fn public_fields(&self) -> Vec<Arc<FieldInfo>> {
        let mut fields = Vec::new();
        for class in crate::hierarchy::walk_hierarchy(Some(self)) {
            fields.extend(
                class
                    .declared_fields()
                    .iter()
                    .filter(|field| field.visibility() == Visibility::Public)
                    .cloned(),
            );
        }
        fields
    }

    /// Public methods declared by this class, any superclass, or any
    /// implemented interface
    pub fn public_methods(&self) -> Vec<Arc<MethodInfo>> {
        let mut methods = Vec::new();
        let mut seen = FxHashSet::default();
        let mut pending = vec![self.clone()];
        while let Some(class) = pending.pop() {
            if !seen.insert(class.id()) {
                continue;
            }
            methods.extend(
                class
                    .declared_methods()
                    .iter()
                    .filter(|method| method.visibility() == Visibility::Public)
                    .cloned(),
            );
            pending.extend(class.interfaces());
            pending.extend(class.superclass());
        }
        methods
    }

    /// Whether a value of class `other` can be used where `self` is expected.
    ///
    /// True when `other` is `self`, or `self` is reachable from `other`
    /// through superclass and interface links.
    pub fn is_assignable_from(&self, other: &Class) -> bool {
        let mut seen = FxHashSet::default();
        let mut pending = vec![other.clone()];
        while let Some(class) = pending.pop() {
            if class == *self {
                return true;
            }
            if !seen.insert(class.id()) {
                continue;
            }
            pending.extend(class.interfaces());
            pending.extend(class.superclass());
        }
        false
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.0.name)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Builder for a [`ClassInfo`] describing `T`
pub struct ClassBuilder<T: ?Sized> {
    info: ClassInfo,
    _type: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + 'static> ClassBuilder<T> {
    fn with_kind(name: impl Into<String>, kind: ClassKind, superclass: Option<SuperLink>) -> Self {
        Self {
            info: ClassInfo {
                id: TypeId::of::<T>(),
                name: name.into(),
                kind,
                superclass,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
            },
            _type: PhantomData,
        }
    }

    fn object_link() -> Option<SuperLink> {
        Some(SuperLink {
            class: <Object as Typed>::class,
            projection: None,
        })
    }

    /// A class whose superclass is `Object` until [`extends`](Self::extends)
    /// says otherwise
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Class, Self::object_link())
    }

    /// An interface; `T` is usually a `dyn Trait` type
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Interface, None)
    }

    /// A primitive value type, assignable to itself and to `Object`
    pub fn primitive(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Primitive, Self::object_link())
    }

    /// Add an implemented interface (or, for interfaces, an extended one)
    pub fn implements<I: Typed + ?Sized>(mut self) -> Self {
        self.info.interfaces.push(I::class);
        self
    }

    /// Declare an abstract method. It is listed but never resolved.
    pub fn abstract_method<R: Typed>(
        mut self,
        name: impl Into<String>,
        visibility: Visibility,
        parameter_count: usize,
    ) -> Self {
        let index = self.info.methods.len();
        self.info.methods.push(Arc::new(MethodInfo::abstract_method(
            name.into(),
            visibility,
            self.info.id,
            self.info.name.clone(),
            index,
            parameter_count,
            R::class,
        )));
        self
    }

    /// Finish the descriptor
    pub fn build(self) -> ClassInfo {
        self.info
    }
}

impl<T: Any> ClassBuilder<T> {
    /// Make `P` the superclass; `T` embeds a `P` reachable through the
    /// given projections
    pub fn extends<P: Typed>(
        mut self,
        get: impl Fn(&T) -> &P + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut P + Send + Sync + 'static,
    ) -> Self {
        self.info.superclass = Some(SuperLink {
            class: P::class,
            projection: Some(Projection::new(self.info.name.clone(), get, get_mut)),
        });
        self
    }

    /// Declare a field of type `F`
    pub fn field<F: Typed + Clone + Send>(
        mut self,
        name: impl Into<String>,
        visibility: Visibility,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self {
        let index = self.info.fields.len();
        self.info.fields.push(Arc::new(FieldInfo::new::<T, F>(
            name.into(),
            visibility,
            self.info.name.clone(),
            index,
            get,
            get_mut,
        )));
        self
    }

    /// Declare a concrete method taking `parameter_count` positional
    /// arguments and returning `R`
    pub fn method<R: Typed + Send>(
        mut self,
        name: impl Into<String>,
        visibility: Visibility,
        parameter_count: usize,
        body: impl Fn(&mut T, &mut Args) -> Result<R, Thrown> + Send + Sync + 'static,
    ) -> Self {
        let index = self.info.methods.len();
        self.info.methods.push(Arc::new(MethodInfo::new::<T, R>(
            name.into(),
            visibility,
            self.info.name.clone(),
            index,
            parameter_count,
            body,
        )));
        self
    }
}

impl ClassBuilder<Object> {
    /// The root class; it has no superclass
    pub fn root() -> Self {
        Self::with_kind("Object", ClassKind::Class, None)
    }
}

impl ClassBuilder<()> {
    /// The `void` return type; it extends nothing
    pub fn void() -> Self {
        Self::with_kind("void", ClassKind::Primitive, None)
    }
}

/// Root of every class hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Object;

impl Typed for Object {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<Object>(|| ClassBuilder::<Object>::root().build())
    }
}

impl Typed for () {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<()>(|| ClassBuilder::<()>::void().build())
    }
}

macro_rules! primitive_classes {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn class() -> Class {
                    ClassRegistry::global()
                        .get_or_register::<$ty>(|| ClassBuilder::<$ty>::primitive($name).build())
                }
            }
        )*
    };
}

primitive_classes! {
    bool => "bool",
    char => "char",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
}

impl Typed for String {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<String>(|| ClassBuilder::<String>::new("String").build())
    }
}

impl<T: Typed> Typed for Option<T> {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<Option<T>>(|| {
            ClassBuilder::<Option<T>>::new(format!("Option<{}>", T::class().name())).build()
        })
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<Vec<T>>(|| {
            ClassBuilder::<Vec<T>>::new(format!("Vec<{}>", T::class().name())).build()
        })
    }
}

/// Rust type name, used in diagnostics
pub(crate) fn rust_type_name<T: ?Sized>() -> &'static str {
    type_name::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Closeable {}
    trait Channel {}

    impl Typed for dyn Closeable {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<dyn Closeable>(|| {
                ClassBuilder::<dyn Closeable>::interface("Closeable").build()
            })
        }
    }

    impl Typed for dyn Channel {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<dyn Channel>(|| {
                ClassBuilder::<dyn Channel>::interface("Channel")
                    .implements::<dyn Closeable>()
                    .build()
            })
        }
    }

    struct Animal {
        legs: u32,
    }

    struct Dog {
        animal: Animal,
        name: String,
    }

    impl Typed for Animal {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<Animal>(|| {
                ClassBuilder::<Animal>::new("Animal")
                    .implements::<dyn Channel>()
                    .field::<u32>("legs", Visibility::Public, |a| &a.legs, |a| &mut a.legs)
                    .build()
            })
        }
    }

    impl Typed for Dog {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<Dog>(|| {
                ClassBuilder::<Dog>::new("Dog")
                    .extends::<Animal>(|d| &d.animal, |d| &mut d.animal)
                    .field::<String>("name", Visibility::Private, |d| &d.name, |d| &mut d.name)
                    .build()
            })
        }
    }

    #[test]
    fn test_class_identity() {
        assert_eq!(Dog::class(), Class::of::<Dog>());
        assert_ne!(Dog::class(), Animal::class());
        assert_eq!(Dog::class().name(), "Dog");
        assert_eq!(Dog::class().to_string(), "Dog");
        assert_eq!(Dog::class().kind(), ClassKind::Class);
    }

    #[test]
    fn test_superclass_chain() {
        assert_eq!(Dog::class().superclass(), Some(Animal::class()));
        assert_eq!(Animal::class().superclass(), Some(Object::class()));
        assert_eq!(Object::class().superclass(), None);
        assert_eq!(<() as Typed>::class().superclass(), None);
        assert_eq!(<dyn Closeable as Typed>::class().superclass(), None);
    }

    #[test]
    fn test_assignability() {
        let object = Object::class();
        let dog = Dog::class();
        let animal = Animal::class();

        assert!(animal.is_assignable_from(&dog));
        assert!(dog.is_assignable_from(&dog));
        assert!(!dog.is_assignable_from(&animal));
        assert!(object.is_assignable_from(&dog));
        assert!(object.is_assignable_from(&u64::class()));
        assert!(object.is_assignable_from(&String::class()));
        assert!(!object.is_assignable_from(&<() as Typed>::class()));
        assert!(!String::class().is_assignable_from(&u64::class()));
    }

    #[test]
    fn test_interface_assignability_is_transitive() {
        let closeable = <dyn Closeable as Typed>::class();
        let channel = <dyn Channel as Typed>::class();

        assert!(closeable.is_interface());
        assert!(channel.is_assignable_from(&Dog::class()));
        assert!(closeable.is_assignable_from(&Dog::class()));
        assert!(closeable.is_assignable_from(&channel));
        assert!(!channel.is_assignable_from(&closeable));
    }

    #[test]
    fn test_public_fields_include_inherited() {
        let dog = Dog::class();
        let declared: Vec<_> = dog.declared_fields().iter().map(|f| f.name().to_string()).collect();
        let public: Vec<_> = dog.public_fields().iter().map(|f| f.name().to_string()).collect();

        assert_eq!(declared, vec!["name"]);
        assert_eq!(public, vec!["legs"]);
    }

    #[test]
    fn test_generic_class_names() {
        assert_eq!(Option::<String>::class().name(), "Option<String>");
        assert_eq!(Vec::<u8>::class().name(), "Vec<u8>");
        assert_ne!(Option::<String>::class(), Option::<u64>::class());
    }
}
