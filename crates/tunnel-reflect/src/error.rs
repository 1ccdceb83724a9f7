//! Error types for member resolution and reflective access

use std::error::Error;
use std::fmt;

/// An error raised by a target method or by a low-level accessor.
pub type Thrown = Box<dyn Error + Send + Sync + 'static>;

/// The kind of member a lookup was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// An instance field
    Field,
    /// An instance method
    Method,
}

impl MemberKind {
    fn constraint_label(self) -> &'static str {
        match self {
            MemberKind::Field => "fieldType",
            MemberKind::Method => "returnType",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("field"),
            MemberKind::Method => f.write_str("method"),
        }
    }
}

/// Errors surfaced by the accessor cache
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// Resolution found zero or more than one matching member
    #[error(
        "{kind} lookup failed. declaringType:{declaring_type} {kind}Name:{name} {label}:{constraint}{arity}",
        label = .kind.constraint_label(),
        arity = arity_suffix(.parameter_count)
    )]
    AmbiguousOrMissingMember {
        /// Field or method
        kind: MemberKind,
        /// Runtime type the lookup started from
        declaring_type: String,
        /// Requested member name
        name: String,
        /// Requested field type or return type
        constraint: String,
        /// Requested arity (methods only)
        parameter_count: Option<usize>,
        /// Candidates seen before the scan stopped (0, or 2 for "at least two")
        candidates: usize,
    },

    /// The superclass chain continues past the configured walk bound, so
    /// uniqueness cannot be decided
    #[error("hierarchy of {declaring_type} exceeds {max_depth} classes")]
    HierarchyTooDeep {
        /// Runtime type the lookup started from
        declaring_type: String,
        /// Configured `max_hierarchy_depth`
        max_depth: usize,
    },

    /// The member was resolved but reading, writing or invoking it failed
    #[error("invocation of {member} failed: {source}")]
    Invocation {
        /// Qualified member name (`Type.member`)
        member: String,
        /// The underlying failure
        #[source]
        source: Thrown,
    },

    /// A rethrow was requested without a target error type
    #[error("rethrow requested without a target error type")]
    UnsupportedRethrow,

    /// Generic runtime failure carrying its cause
    #[error("{0}")]
    Wrapped(#[source] Thrown),
}

fn arity_suffix(parameter_count: &Option<usize>) -> String {
    match parameter_count {
        Some(count) => format!(" parameterCount:{count}"),
        None => String::new(),
    }
}

impl ReflectError {
    /// True for resolution failures: zero or several candidates, or a
    /// hierarchy too deep to scan
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            ReflectError::AmbiguousOrMissingMember { .. } | ReflectError::HierarchyTooDeep { .. }
        )
    }

    /// The wrapped cause, if this error carries one
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            ReflectError::Invocation { source, .. } | ReflectError::Wrapped(source) => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }

    /// Consume the error and return its cause, if any
    pub fn into_cause(self) -> Option<Thrown> {
        match self {
            ReflectError::Invocation { source, .. } | ReflectError::Wrapped(source) => Some(source),
            _ => None,
        }
    }
}

/// Result alias for accessor operations
pub type ReflectResult<T> = Result<T, ReflectError>;

/// Faults raised by descriptor accessors before or while touching a member.
///
/// These never escape on their own; the access wrapper reports them as the
/// cause of a [`ReflectError::Invocation`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessFault {
    /// The instance is not of the type the accessor was registered for
    #[error("instance is not a {expected}")]
    InstanceMismatch {
        /// Registered class name
        expected: String,
    },

    /// A value of the wrong Rust type was read or written
    #[error("value type mismatch: expected {expected}")]
    ValueType {
        /// Rust type name the member holds
        expected: &'static str,
    },

    /// Wrong number of positional arguments
    #[error("wrong number of arguments: expected {expected}, got {actual}")]
    ArgumentCount {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// An argument had the wrong Rust type
    #[error("argument {index} type mismatch: expected {expected}")]
    ArgumentType {
        /// Position of the argument
        index: usize,
        /// Rust type name the parameter takes
        expected: &'static str,
    },

    /// The method has no body
    #[error("cannot invoke abstract method {0}")]
    AbstractMember(String),

    /// A non-public member was touched without going through a resolved handle
    #[error("member {0} is not accessible")]
    Inaccessible(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup_message() {
        let err = ReflectError::AmbiguousOrMissingMember {
            kind: MemberKind::Field,
            declaring_type: "ServerChannel".to_string(),
            name: "sessionState".to_string(),
            constraint: "String".to_string(),
            parameter_count: None,
            candidates: 0,
        };
        assert_eq!(
            err.to_string(),
            "field lookup failed. declaringType:ServerChannel fieldName:sessionState fieldType:String"
        );
        assert!(err.is_lookup_failure());
    }

    #[test]
    fn test_method_lookup_message() {
        let err = ReflectError::AmbiguousOrMissingMember {
            kind: MemberKind::Method,
            declaring_type: "ServerChannel".to_string(),
            name: "handshake".to_string(),
            constraint: "void".to_string(),
            parameter_count: Some(2),
            candidates: 2,
        };
        assert_eq!(
            err.to_string(),
            "method lookup failed. declaringType:ServerChannel methodName:handshake returnType:void parameterCount:2"
        );
    }

    #[test]
    fn test_cause_accessors() {
        let err = ReflectError::Invocation {
            member: "A.b".to_string(),
            source: Box::new(AccessFault::ValueType { expected: "u64" }),
        };
        assert!(err.cause().is_some());
        assert!(!err.is_lookup_failure());

        let cause = err.into_cause().unwrap();
        assert_eq!(
            cause.downcast_ref::<AccessFault>(),
            Some(&AccessFault::ValueType { expected: "u64" })
        );

        assert!(ReflectError::UnsupportedRethrow.into_cause().is_none());
    }

    #[test]
    fn test_hierarchy_too_deep_is_lookup_failure() {
        let err = ReflectError::HierarchyTooDeep {
            declaring_type: "TurboEngine".to_string(),
            max_depth: 1,
        };
        assert_eq!(err.to_string(), "hierarchy of TurboEngine exceeds 1 classes");
        assert!(err.is_lookup_failure());
        assert!(err.cause().is_none());
    }
}
