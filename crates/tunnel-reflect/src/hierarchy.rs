//! Hierarchy walking

use rustc_hash::FxHashSet;

use crate::class::Class;

/// Get the class hierarchy (inheritance chain) for a class.
///
/// Returns the class itself first, then each superclass up to the root.
/// A class seen twice ends the walk, so a malformed cyclic link cannot
/// loop. `None` yields an empty chain.
pub fn walk_hierarchy(class: Option<&Class>) -> Vec<Class> {
    walk_hierarchy_bounded(class, usize::MAX)
}

/// Like [`walk_hierarchy`], stopping after `max_depth` classes
pub fn walk_hierarchy_bounded(class: Option<&Class>, max_depth: usize) -> Vec<Class> {
    let mut hierarchy = Vec::new();
    let mut seen = FxHashSet::default();
    let mut current = class.cloned();

    while let Some(class) = current {
        if hierarchy.len() >= max_depth || !seen.insert(class.id()) {
            break;
        }
        current = class.superclass();
        hierarchy.push(class);
    }

    hierarchy
}

/// Check if `sub` is `sup` or extends it through superclass links.
///
/// Interfaces are not considered; see
/// [`Class::is_assignable_from`] for that.
pub fn is_subclass_of(sub: &Class, sup: &Class) -> bool {
    walk_hierarchy(Some(sub)).iter().any(|class| class == sup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassBuilder, Object, Typed};
    use crate::registry::ClassRegistry;

    struct A;
    struct B(A);
    struct C(B);
    struct D(C);
    struct E(D);

    // A <- B <- C <- D <- E
    impl Typed for A {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<A>(|| ClassBuilder::<A>::new("A").build())
        }
    }

    macro_rules! subclass {
        ($ty:ident extends $parent:ident) => {
            impl Typed for $ty {
                fn class() -> Class {
                    ClassRegistry::global().get_or_register::<$ty>(|| {
                        ClassBuilder::<$ty>::new(stringify!($ty))
                            .extends::<$parent>(|v| &v.0, |v| &mut v.0)
                            .build()
                    })
                }
            }
        };
    }

    subclass!(B extends A);
    subclass!(C extends B);
    subclass!(D extends C);
    subclass!(E extends D);

    // Cyclic links are malformed but must not hang the walk
    struct Left;
    struct Right;

    impl Typed for Left {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<Left>(|| {
                ClassBuilder::<Left>::new("Left")
                    .extends::<Right>(|_| &Right, |_| unreachable!())
                    .build()
            })
        }
    }

    impl Typed for Right {
        fn class() -> Class {
            ClassRegistry::global().get_or_register::<Right>(|| {
                ClassBuilder::<Right>::new("Right")
                    .extends::<Left>(|_| &Left, |_| unreachable!())
                    .build()
            })
        }
    }

    fn names(chain: &[Class]) -> Vec<&str> {
        chain.iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_walk_deep_chain() {
        let hierarchy = walk_hierarchy(Some(&E::class()));
        assert_eq!(names(&hierarchy), vec!["E", "D", "C", "B", "A", "Object"]);
    }

    #[test]
    fn test_walk_root() {
        let hierarchy = walk_hierarchy(Some(&Object::class()));
        assert_eq!(names(&hierarchy), vec!["Object"]);
    }

    #[test]
    fn test_walk_absent_class() {
        assert!(walk_hierarchy(None).is_empty());
    }

    #[test]
    fn test_walk_bounded() {
        let hierarchy = walk_hierarchy_bounded(Some(&E::class()), 2);
        assert_eq!(names(&hierarchy), vec!["E", "D"]);
        assert!(walk_hierarchy_bounded(Some(&E::class()), 0).is_empty());
    }

    #[test]
    fn test_walk_terminates_on_cycle() {
        let hierarchy = walk_hierarchy(Some(&Left::class()));
        assert_eq!(names(&hierarchy), vec!["Left", "Right"]);
    }

    #[test]
    fn test_is_subclass_of() {
        assert!(is_subclass_of(&E::class(), &A::class()));
        assert!(is_subclass_of(&E::class(), &E::class()));
        assert!(is_subclass_of(&C::class(), &Object::class()));
        assert!(!is_subclass_of(&A::class(), &E::class()));
    }
}
