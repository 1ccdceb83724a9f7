//! Tunnel Reflect
//!
//! Resolve-once reflective access to fields and methods of registered
//! types, used by tunnel tests to reach connection state that the channel
//! types do not expose:
//! - **Classes**: explicit descriptors with superclass, interface and
//!   member tables (`class`, `registry`, `hierarchy` modules)
//! - **Resolution**: unique lookup of a member across the hierarchy,
//!   memoized per (runtime type, name, constraint[, arity]) (`cache`,
//!   `access` modules)
//! - **Rethrow**: surfacing a failure as the error type the caller expects
//!   (`rethrow` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use tunnel_reflect::{args, field_access, invoke, Typed};
//!
//! let mut access = field_access::<Option<String>>(&mut channel, "sni", &Option::<String>::class())?;
//! access.set(Some("example.org".to_string()))?;
//!
//! let summary: String = invoke(&mut channel, "describe", &String::class(), args![])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Class descriptors and the `Typed`/`Reflect` traits
pub mod class;

/// Field and method descriptors
pub mod member;

/// Process-wide class registry
pub mod registry;

/// Superclass chain walking
pub mod hierarchy;

/// Error types
pub mod error;

/// Accessor cache configuration
pub mod config;

/// Concurrent resolution cache
pub mod cache;

/// Typed field and method access
pub mod access;

/// Rethrowing failures under a requested error type
pub mod rethrow;

mod resolver;

// ============================================================================
// Re-exports
// ============================================================================

pub use access::{field_access, invoke, invoke_value, read_field, with_field, AccessorCache, FieldAccess};
pub use cache::{CacheKey, ResolutionCache};
pub use class::{Class, ClassBuilder, ClassInfo, ClassKind, Object, Reflect, TypeRef, Typed, Visibility};
pub use config::{ConfigError, ReflectConfig};
pub use error::{AccessFault, MemberKind, ReflectError, ReflectResult, Thrown};
pub use hierarchy::{is_subclass_of, walk_hierarchy, walk_hierarchy_bounded};
pub use member::{Args, FieldInfo, MemberId, MethodInfo, Value};
pub use registry::ClassRegistry;
pub use rethrow::{downcast_or_wrap, rethrow_as, unchecked, ErrorType};
