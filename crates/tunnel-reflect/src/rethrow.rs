//! Rethrowing failures under a requested error type

use std::any::TypeId;
use std::error::Error;
use std::fmt;
use std::io;

use crate::error::{ReflectError, ReflectResult, Thrown};

/// Error type a caller is prepared to handle unchanged
#[derive(Clone, Copy)]
pub enum ErrorType {
    /// Exactly the Rust error type `E`
    Exact {
        /// Type identity of `E`
        id: TypeId,
        /// Rust type name of `E`
        name: &'static str,
        /// Whether an error is an `E`
        is: fn(&(dyn Error + 'static)) -> bool,
    },
    /// An `io::Error` of the given kind
    Io(io::ErrorKind),
}

impl ErrorType {
    /// Match errors of exactly type `E`
    pub fn of<E: Error + 'static>() -> Self {
        ErrorType::Exact {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
            is: |error| error.is::<E>(),
        }
    }

    /// Match `io::Error`s of `kind`
    pub fn io(kind: io::ErrorKind) -> Self {
        ErrorType::Io(kind)
    }

    /// Whether `error` is of this type
    pub fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        match self {
            ErrorType::Exact { is, .. } => is(error),
            ErrorType::Io(kind) => error
                .downcast_ref::<io::Error>()
                .is_some_and(|error| error.kind() == *kind),
        }
    }
}

impl PartialEq for ErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ErrorType::Exact { id: a, .. }, ErrorType::Exact { id: b, .. }) => a == b,
            (ErrorType::Io(a), ErrorType::Io(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ErrorType {}

impl fmt::Debug for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::Exact { name, .. } => f.debug_tuple("Exact").field(name).finish(),
            ErrorType::Io(kind) => f.debug_tuple("Io").field(kind).finish(),
        }
    }
}

/// Hand `error` back unchanged when it is of type `target`, otherwise wrap
/// it in [`ReflectError::Wrapped`]. Without a target the result is
/// [`ReflectError::UnsupportedRethrow`].
pub fn rethrow_as(error: Thrown, target: Option<&ErrorType>) -> Thrown {
    let Some(target) = target else {
        return Box::new(ReflectError::UnsupportedRethrow);
    };
    if target.matches(error.as_ref()) {
        error
    } else {
        tracing::trace!(?target, %error, "wrapping failure of unexpected type");
        Box::new(ReflectError::Wrapped(error))
    }
}

/// Recover a concrete `E`, wrapping anything else
pub fn downcast_or_wrap<E: Error + Send + Sync + 'static>(error: Thrown) -> Result<Box<E>, ReflectError> {
    error.downcast::<E>().map_err(ReflectError::Wrapped)
}

/// Run `f`, passing a [`ReflectError`] through and wrapping any other error
pub fn unchecked<T, E>(f: impl FnOnce() -> Result<T, E>) -> ReflectResult<T>
where
    E: Into<Thrown>,
{
    f().map_err(|error| match error.into().downcast::<ReflectError>() {
        Ok(error) => *error,
        Err(other) => ReflectError::Wrapped(other),
    })
}

impl ReflectError {
    /// Rethrow this failure as `target`.
    ///
    /// An invocation failure whose cause is a `target` yields that cause
    /// itself; everything else follows [`rethrow_as`].
    pub fn rethrow_as(self, target: Option<&ErrorType>) -> Thrown {
        match (self, target) {
            (ReflectError::Invocation { source, .. }, Some(target)) if target.matches(source.as_ref()) => source,
            (error, target) => rethrow_as(Box::new(error), target),
        }
    }
}
