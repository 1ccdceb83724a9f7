//! Field and method descriptors
//!
//! These are the candidates the resolver examines. Each carries a type-erased
//! accessor built from the typed closures given to
//! [`ClassBuilder`](crate::ClassBuilder); the erased form works on the
//! declaring type's value as `dyn Any` and reports problems as
//! [`AccessFault`]s.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::class::{rust_type_name, Class, TypeRef, Typed, Visibility};
use crate::error::{AccessFault, Thrown};

/// A boxed field value, argument, or return value
pub type Value = Box<dyn Any + Send>;

type Getter = dyn Fn(&dyn Any) -> Result<Value, AccessFault> + Send + Sync;
type Setter = dyn Fn(&mut dyn Any, Value) -> Result<(), AccessFault> + Send + Sync;
type Invoker = dyn Fn(&mut dyn Any, &mut Args) -> Result<Value, Thrown> + Send + Sync;

/// Identity of a declared member: its declaring type and declaration index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId {
    /// Declaring type
    pub declaring: TypeId,
    /// Position in the declaring class's field or method list
    pub index: usize,
}

/// Field descriptor
pub struct FieldInfo {
    name: String,
    visibility: Visibility,
    id: MemberId,
    declaring_name: String,
    field_type: TypeRef,
    getter: Arc<Getter>,
    setter: Arc<Setter>,
}

impl FieldInfo {
    pub(crate) fn new<T, F>(
        name: String,
        visibility: Visibility,
        declaring_name: String,
        index: usize,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self
    where
        T: Any,
        F: Typed + Clone + Send,
    {
        let get_owner = declaring_name.clone();
        let set_owner = declaring_name.clone();
        Self {
            name,
            visibility,
            id: MemberId {
                declaring: TypeId::of::<T>(),
                index,
            },
            declaring_name,
            field_type: F::class,
            getter: Arc::new(move |target: &dyn Any| {
                let this = target.downcast_ref::<T>().ok_or_else(|| AccessFault::InstanceMismatch {
                    expected: get_owner.clone(),
                })?;
                Ok(Box::new(get(this).clone()) as Value)
            }),
            setter: Arc::new(move |target: &mut dyn Any, value: Value| {
                let this = target.downcast_mut::<T>().ok_or_else(|| AccessFault::InstanceMismatch {
                    expected: set_owner.clone(),
                })?;
                let value = value.downcast::<F>().map_err(|_| AccessFault::ValueType {
                    expected: rust_type_name::<F>(),
                })?;
                *get_mut(this) = *value;
                Ok(())
            }),
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Member identity
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Name of the declaring class
    pub fn declaring_class_name(&self) -> &str {
        &self.declaring_name
    }

    /// Declared type of the field
    pub fn field_type(&self) -> Class {
        (self.field_type)()
    }

    /// Read the field from a value of the declaring type. Fails for
    /// non-public fields.
    pub fn get(&self, target: &dyn Any) -> Result<Value, AccessFault> {
        self.read(target, false)
    }

    /// Write the field on a value of the declaring type. Fails for
    /// non-public fields.
    pub fn set(&self, target: &mut dyn Any, value: Value) -> Result<(), AccessFault> {
        self.write(target, value, false)
    }

    pub(crate) fn read(&self, target: &dyn Any, accessible: bool) -> Result<Value, AccessFault> {
        self.check_access(accessible)?;
        (self.getter)(target)
    }

    pub(crate) fn write(
        &self,
        target: &mut dyn Any,
        value: Value,
        accessible: bool,
    ) -> Result<(), AccessFault> {
        self.check_access(accessible)?;
        (self.setter)(target, value)
    }

    fn check_access(&self, accessible: bool) -> Result<(), AccessFault> {
        if accessible || self.visibility == Visibility::Public {
            Ok(())
        } else {
            Err(AccessFault::Inaccessible(format!("{}.{}", self.declaring_name, self.name)))
        }
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("declaring", &self.declaring_name)
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// Method descriptor
pub struct MethodInfo {
    name: String,
    visibility: Visibility,
    id: MemberId,
    declaring_name: String,
    parameter_count: usize,
    return_type: TypeRef,
    invoker: Option<Arc<Invoker>>,
}

impl MethodInfo {
    pub(crate) fn new<T, R>(
        name: String,
        visibility: Visibility,
        declaring_name: String,
        index: usize,
        parameter_count: usize,
        body: impl Fn(&mut T, &mut Args) -> Result<R, Thrown> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any,
        R: Typed + Send,
    {
        let owner = declaring_name.clone();
        Self {
            name,
            visibility,
            id: MemberId {
                declaring: TypeId::of::<T>(),
                index,
            },
            declaring_name,
            parameter_count,
            return_type: R::class,
            invoker: Some(Arc::new(move |target: &mut dyn Any, args: &mut Args| {
                let this = target.downcast_mut::<T>().ok_or_else(|| AccessFault::InstanceMismatch {
                    expected: owner.clone(),
                })?;
                Ok(Box::new(body(this, args)?) as Value)
            })),
        }
    }

    pub(crate) fn abstract_method(
        name: String,
        visibility: Visibility,
        declaring: TypeId,
        declaring_name: String,
        index: usize,
        parameter_count: usize,
        return_type: TypeRef,
    ) -> Self {
        Self {
            name,
            visibility,
            id: MemberId { declaring, index },
            declaring_name,
            parameter_count,
            return_type,
            invoker: None,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Member identity
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Name of the declaring class
    pub fn declaring_class_name(&self) -> &str {
        &self.declaring_name
    }

    /// Whether the method has no body
    pub fn is_abstract(&self) -> bool {
        self.invoker.is_none()
    }

    /// Number of positional parameters
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Declared return type
    pub fn return_type(&self) -> Class {
        (self.return_type)()
    }

    /// Invoke on a value of the declaring type. Fails for non-public methods.
    pub fn invoke(&self, target: &mut dyn Any, args: Args) -> Result<Value, Thrown> {
        self.call(target, args, false)
    }

    pub(crate) fn call(&self, target: &mut dyn Any, mut args: Args, accessible: bool) -> Result<Value, Thrown> {
        let qualified = || format!("{}.{}", self.declaring_name, self.name);
        if !accessible && self.visibility != Visibility::Public {
            return Err(Box::new(AccessFault::Inaccessible(qualified())));
        }
        let Some(invoker) = &self.invoker else {
            return Err(Box::new(AccessFault::AbstractMember(qualified())));
        };
        if args.len() != self.parameter_count {
            return Err(Box::new(AccessFault::ArgumentCount {
                expected: self.parameter_count,
                actual: args.len(),
            }));
        }
        invoker(target, &mut args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("declaring", &self.declaring_name)
            .field("parameter_count", &self.parameter_count)
            .field("is_abstract", &self.is_abstract())
            .finish()
    }
}

/// Positional arguments handed to a method body
#[derive(Default)]
pub struct Args {
    values: Vec<Option<Value>>,
}

impl Args {
    /// Wrap boxed positional arguments
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow argument `index` as an `A`
    pub fn get<A: Any>(&self, index: usize) -> Result<&A, AccessFault> {
        self.values
            .get(index)
            .and_then(|slot| slot.as_ref())
            .and_then(|value| value.downcast_ref::<A>())
            .ok_or(AccessFault::ArgumentType {
                index,
                expected: rust_type_name::<A>(),
            })
    }

    /// Move argument `index` out as an `A`. A second take of the same
    /// position fails.
    pub fn take<A: Any>(&mut self, index: usize) -> Result<A, AccessFault> {
        let mismatch = AccessFault::ArgumentType {
            index,
            expected: rust_type_name::<A>(),
        };
        let Some(slot) = self.values.get_mut(index) else {
            return Err(mismatch);
        };
        match slot.take().map(|value| value.downcast::<A>()) {
            Some(Ok(value)) => Ok(*value),
            Some(Err(value)) => {
                *slot = Some(value);
                Err(mismatch)
            }
            None => Err(mismatch),
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.values.len()).finish()
    }
}

/// Build a positional argument vector for
/// [`AccessorCache::invoke`](crate::AccessorCache::invoke)
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($arg) as $crate::Value),+]
    };
}
