//! Authorization engine benchmarks
//!
//! Covers flat grants, grants reached through role inheritance, and
//! conditional grants in fail-fast and complete validation modes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use warden_authz::{
    AccessManager, AccessRequest, BasicResource, BasicSubject, EqualCondition, IsOwnerCondition,
    NotEmptyCondition, Permission, PolicyDefinition, Role, ValueDescriptor,
};

/// Chain R0 -> R1 -> ... -> R(depth-1), with `read` granted at the top
fn inheritance_policy(depth: usize) -> PolicyDefinition {
    (0..depth).fold(PolicyDefinition::new(), |policy, level| {
        let mut role = Role::new(format!("R{}", level));
        if level + 1 < depth {
            role = role.with_parent(format!("R{}", level + 1));
        } else {
            role = role.with_grant("Doc", Permission::new("read"));
        }
        policy.with_role(role)
    })
}

fn conditional_policy() -> PolicyDefinition {
    PolicyDefinition::new().with_role(
        Role::new("User").with_grant(
            "Doc",
            Permission::new("update")
                .with_condition(Arc::new(IsOwnerCondition::new()))
                .with_condition(Arc::new(NotEmptyCondition::new(ValueDescriptor::resource("title"))))
                .with_condition(Arc::new(EqualCondition::new(
                    ValueDescriptor::resource("state"),
                    ValueDescriptor::explicit("draft"),
                ))),
        ),
    )
}

fn bench_flat_grant(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_grant");

    for grant_count in [1, 10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("grants", grant_count),
            grant_count,
            |b, &count| {
                let role = (0..count).fold(Role::new("User"), |role, i| {
                    role.with_grant("Doc", Permission::new(format!("action-{}", i)))
                });
                let manager = AccessManager::new(Arc::new(PolicyDefinition::new().with_role(role)));

                let subject = BasicSubject::new("u1").with_role("User");
                let resource = BasicResource::new("Doc");
                let action = format!("action-{}", count - 1);
                let request = AccessRequest::new(&subject, &resource, [action]);

                b.iter(|| {
                    manager.authorize(black_box(&request)).unwrap();
                });
            },
        );
    }

    group.finish();
}

fn bench_inherited_grant(c: &mut Criterion) {
    let mut group = c.benchmark_group("inherited_grant");

    for depth in [1, 4, 16].iter() {
        group.bench_with_input(BenchmarkId::new("depth", depth), depth, |b, &depth| {
            let manager = AccessManager::new(Arc::new(inheritance_policy(depth)));

            let subject = BasicSubject::new("u1").with_role("R0");
            let resource = BasicResource::new("Doc");
            let request = AccessRequest::new(&subject, &resource, ["read"]);

            b.iter(|| {
                manager.authorize(black_box(&request)).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_conditional_grant(c: &mut Criterion) {
    let mut group = c.benchmark_group("conditional_grant");
    let manager = AccessManager::new(Arc::new(conditional_policy()));

    let subject = BasicSubject::new("u1").with_role("User");
    let owned = BasicResource::new("Doc")
        .with_attribute("owner", "u1")
        .with_attribute("title", "Quarterly report")
        .with_attribute("state", "draft");
    let foreign = BasicResource::new("Doc")
        .with_attribute("owner", "u2")
        .with_attribute("title", "")
        .with_attribute("state", "published");

    group.bench_function("granted", |b| {
        let request = AccessRequest::new(&subject, &owned, ["update"]);
        b.iter(|| manager.authorize(black_box(&request)).unwrap());
    });

    group.bench_function("denied_fail_fast", |b| {
        let request = AccessRequest::new(&subject, &foreign, ["update"]);
        b.iter(|| black_box(manager.authorize(black_box(&request)).is_err()));
    });

    group.bench_function("denied_complete", |b| {
        let request = AccessRequest::new(&subject, &foreign, ["update"]).complete_validation(true);
        b.iter(|| black_box(manager.authorize(black_box(&request)).is_err()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_flat_grant,
    bench_inherited_grant,
    bench_conditional_grant
);
criterion_main!(benches);
