use graft_di::{ContainerBuilder, DiError, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn single_instance_is_shared_across_scopes() {
    static CREATED: AtomicUsize = AtomicUsize::new(0);

    struct Config;

    let mut builder = ContainerBuilder::new();
    builder
        .register(|_| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Config
        })
        .single_instance();
    let container = builder.build();

    let root = container.resolve::<Config>().unwrap();
    let scope = container.begin_scope().unwrap();
    let nested = scope.begin_scope().unwrap();
    let from_scope = scope.resolve::<Config>().unwrap();
    let from_nested = nested.resolve::<Config>().unwrap();

    assert!(Arc::ptr_eq(&root, &from_scope));
    assert!(Arc::ptr_eq(&root, &from_nested));
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
}

#[test]
fn instance_per_scope_is_shared_within_one_scope_only() {
    struct Session;

    let mut builder = ContainerBuilder::new();
    builder.register(|_| Session).instance_per_scope();
    let container = builder.build();

    let a = container.begin_scope().unwrap();
    let b = container.begin_scope().unwrap();

    let a1 = a.resolve::<Session>().unwrap();
    let a2 = a.resolve::<Session>().unwrap();
    let b1 = b.resolve::<Session>().unwrap();

    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b1));
}

#[test]
fn matching_scope_binds_to_nearest_tagged_ancestor() {
    struct UnitOfWork;

    let mut builder = ContainerBuilder::new();
    builder
        .register(|_| UnitOfWork)
        .instance_per_matching_scope("request");
    let container = builder.build();

    let request = container.begin_tagged_scope("request").unwrap();
    let inner_a = request.begin_scope().unwrap();
    let inner_b = request.begin_scope().unwrap();

    let from_a = inner_a.resolve::<UnitOfWork>().unwrap();
    let from_b = inner_b.resolve::<UnitOfWork>().unwrap();
    assert!(Arc::ptr_eq(&from_a, &from_b));

    let other_request = container.begin_tagged_scope("request").unwrap();
    let elsewhere = other_request.resolve::<UnitOfWork>().unwrap();
    assert!(!Arc::ptr_eq(&from_a, &elsewhere));
}

#[test]
fn matching_scope_fails_without_tagged_ancestor() {
    #[derive(Debug)]
    struct UnitOfWork;

    let mut builder = ContainerBuilder::new();
    builder
        .register(|_| UnitOfWork)
        .instance_per_matching_scope("request");
    let container = builder.build();

    let plain = container.begin_scope().unwrap();
    match plain.resolve::<UnitOfWork>() {
        Err(DiError::NoMatchingScope(tag)) => assert_eq!(tag, "request"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unconfigured_child_sees_parent_registrations() {
    let mut builder = ContainerBuilder::new();
    builder.register(|_| 5u32);
    let container = builder.build();

    let scope = container.begin_scope().unwrap();
    let nested = scope.begin_scope().unwrap();
    assert_eq!(*nested.resolve::<u32>().unwrap(), 5);
}

#[test]
fn configured_child_shadows_parent_default() {
    let mut builder = ContainerBuilder::new();
    builder.register(|_| String::from("parent"));
    let container = builder.build();

    let child = container
        .begin_scope_with(|b| {
            b.register(|_| String::from("child"));
        })
        .unwrap();

    assert_eq!(*child.resolve::<String>().unwrap(), "child");
    assert_eq!(*container.resolve::<String>().unwrap(), "parent");

    // A grandchild without configuration inherits the child's default.
    let grandchild = child.begin_scope().unwrap();
    assert_eq!(*grandchild.resolve::<String>().unwrap(), "child");
}

#[test]
fn singleton_dependencies_come_from_the_owning_scope() {
    struct Config {
        origin: Arc<String>,
    }

    let mut builder = ContainerBuilder::new();
    builder.register(|_| String::from("root"));
    builder
        .register(|ctx| Config {
            origin: ctx.resolve::<String>().unwrap(),
        })
        .single_instance();
    let container = builder.build();

    let child = container
        .begin_scope_with(|b| {
            b.register(|_| String::from("child"));
        })
        .unwrap();

    // The first resolve is issued from the child, but the singleton is
    // assembled against the root registry; the child's shadowing
    // registration must not be baked into the cached instance.
    let from_child = child.resolve::<Config>().unwrap();
    assert_eq!(*from_child.origin, "root");

    child.dispose();
    let from_root = container.resolve::<Config>().unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_root));
    assert_eq!(*from_root.origin, "root");
}

#[test]
fn scope_tag_is_observable() {
    let container = ContainerBuilder::new().build();
    let tagged = container.begin_tagged_scope("job").unwrap();
    assert_eq!(tagged.tag(), Some("job"));
    assert_eq!(container.root_scope().tag(), None);
}

#[test]
fn shared_instances_do_not_leak_between_sibling_scopes() {
    struct Session;

    let mut builder = ContainerBuilder::new();
    builder.register(|_| Session).instance_per_scope();
    let container = builder.build();

    let a = container.begin_scope().unwrap();
    let first = a.resolve::<Session>().unwrap();
    a.dispose();

    let b = container.begin_scope().unwrap();
    let second = b.resolve::<Session>().unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}
