//! Configuring the process-wide cache
//!
//! Kept in its own test binary: the global cache can be configured only
//! before its first use.

use tunnel_reflect::{AccessorCache, Class, ClassBuilder, ClassRegistry, ReflectConfig, Typed, Visibility};

#[derive(Default)]
struct Session {
    resumed: bool,
}

impl Typed for Session {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<Session>(|| {
            ClassBuilder::<Session>::new("Session")
                .field::<bool>("resumed", Visibility::Private, |s| &s.resumed, |s| &mut s.resumed)
                .build()
        })
    }
}

#[test]
fn test_install_global_before_first_use() {
    let unmemoized = ReflectConfig {
        memoize: false,
        ..ReflectConfig::default()
    };
    assert_eq!(AccessorCache::install_global(unmemoized.clone()), Ok(()));

    let global = AccessorCache::global();
    assert_eq!(global.config(), &unmemoized);

    let session = Session { resumed: true };
    for _ in 0..2 {
        assert!(tunnel_reflect::read_field::<bool>(&session, "resumed", &bool::class()).unwrap());
    }
    assert_eq!(global.field_scans(), 2);
    assert_eq!(global.resolved_fields(), 0);

    let late = ReflectConfig {
        max_hierarchy_depth: 8,
        ..ReflectConfig::default()
    };
    assert_eq!(AccessorCache::install_global(late.clone()), Err(late));
    assert_eq!(AccessorCache::global().config(), &unmemoized);
}
