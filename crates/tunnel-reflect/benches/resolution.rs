use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tunnel_reflect::{args, AccessorCache, Class, ClassBuilder, ClassRegistry, ReflectConfig, Typed, Visibility};

#[derive(Default)]
struct Session {
    id: u64,
}

#[derive(Default)]
struct Channel {
    session: Session,
    sni: Option<String>,
}

impl Typed for Session {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<Session>(|| {
            ClassBuilder::<Session>::new("Session")
                .field::<u64>("id", Visibility::Private, |s| &s.id, |s| &mut s.id)
                .build()
        })
    }
}

impl Typed for Channel {
    fn class() -> Class {
        ClassRegistry::global().get_or_register::<Channel>(|| {
            ClassBuilder::<Channel>::new("Channel")
                .extends::<Session>(|c| &c.session, |c| &mut c.session)
                .field::<Option<String>>("sni", Visibility::Private, |c| &c.sni, |c| &mut c.sni)
                .method::<u64>("rekey", Visibility::Private, 1, |c, args| {
                    c.session.id += args.take::<u64>(0)?;
                    Ok(c.session.id)
                })
                .build()
        })
    }
}

fn bench_field_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_access");

    for (label, memoize) in [("cached", true), ("uncached", false)] {
        let cache = AccessorCache::with_config(ReflectConfig {
            memoize,
            ..ReflectConfig::default()
        });
        let mut channel = Channel::default();
        group.bench_with_input(BenchmarkId::new("inherited_u64", label), &cache, |b, cache| {
            b.iter(|| {
                let access = cache
                    .field_access::<u64>(&mut channel, black_box("id"), &u64::class())
                    .unwrap();
                access.get().unwrap()
            });
        });
    }

    group.finish();
}

fn bench_invoke(c: &mut Criterion) {
    let cache = AccessorCache::new();
    let mut channel = Channel::default();

    c.bench_function("invoke_cached", |b| {
        b.iter(|| {
            cache
                .invoke::<u64>(&mut channel, black_box("rekey"), &u64::class(), args![1u64])
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_field_access, bench_invoke);
criterion_main!(benches);
