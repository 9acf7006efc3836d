use graft_di::{
    ContainerBuilder, DiError, Dispose, Factory, Lazy, Meta, Owned, Parameter, ParameterMapping,
    Resolver,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn lazy_defers_construction_until_first_use() {
    static CREATED: AtomicUsize = AtomicUsize::new(0);

    struct Heavy;

    let mut builder = ContainerBuilder::new();
    builder.register(|_| {
        CREATED.fetch_add(1, Ordering::SeqCst);
        Heavy
    });
    let container = builder.build();

    let lazy = container.resolve::<Lazy<Heavy>>().unwrap();
    assert_eq!(CREATED.load(Ordering::SeqCst), 0);
    assert!(!lazy.is_created());

    let _value = lazy.value().unwrap();
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    assert!(lazy.is_created());

    // Repeated access reuses the resolved value.
    let _again = lazy.value().unwrap();
    assert_eq!(CREATED.load(Ordering::SeqCst), 1);
}

#[test]
fn lazy_breaks_circular_singleton_graphs() {
    struct Alpha {
        beta: Arc<Lazy<Beta>>,
    }
    struct Beta {
        alpha: Arc<Alpha>,
    }

    let mut builder = ContainerBuilder::new();
    builder
        .register(|ctx| Alpha {
            beta: ctx.resolve::<Lazy<Beta>>().unwrap(),
        })
        .single_instance();
    builder
        .register(|ctx| Beta {
            alpha: ctx.resolve::<Alpha>().unwrap(),
        })
        .single_instance();
    let container = builder.build();

    let alpha = container.resolve::<Alpha>().unwrap();
    let beta = alpha.beta.value().unwrap();
    assert!(Arc::ptr_eq(&beta.alpha, &alpha));
}

#[test]
fn meta_exposes_registration_metadata() {
    struct Endpoint;

    let mut builder = ContainerBuilder::new();
    builder
        .register(|_| Endpoint)
        .with_metadata("route", "/health")
        .with_metadata("weight", 10i64);
    let container = builder.build();

    let meta = container.resolve::<Meta<Endpoint>>().unwrap();
    assert_eq!(
        meta.metadata().get("route").and_then(|v| v.as_str()),
        Some("/health")
    );
    assert_eq!(
        meta.metadata().get("weight").and_then(|v| v.as_int()),
        Some(10)
    );
}

#[test]
fn owned_disposes_its_private_scope_on_drop() {
    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct Resource {
        log: Log,
    }
    impl Dispose for Resource {
        fn dispose(&self) {
            self.log.lock().unwrap().push("released");
        }
    }

    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let probe = log.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register(move |_| Resource { log: probe.clone() })
        .instance_per_scope()
        .with_dispose();
    let container = builder.build();

    let owned = container.resolve::<Owned<Resource>>().unwrap();
    assert!(log.lock().unwrap().is_empty());
    drop(owned);
    assert_eq!(*log.lock().unwrap(), vec!["released"]);

    // The scope the Owned came from is untouched.
    let _still_fine = container.resolve::<Resource>().unwrap();
}

#[test]
fn factory_produces_fresh_instances() {
    struct Job;

    let mut builder = ContainerBuilder::new();
    builder.register(|_| Job);
    let container = builder.build();

    let factory = container.resolve::<Factory<Job>>().unwrap();
    let a = factory.invoke().unwrap();
    let b = factory.invoke().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[test]
fn factory_passes_arguments_by_type() {
    struct Job {
        priority: u32,
    }

    let mut builder = ContainerBuilder::new();
    builder.register(|ctx| Job {
        priority: ctx.parameter::<u32>().map(|p| *p).unwrap_or(0),
    });
    let container = builder.build();

    let factory = container.resolve::<Factory<Job>>().unwrap();
    let job = factory
        .invoke_with(vec![Parameter::typed(5u32)])
        .unwrap();
    assert_eq!(job.priority, 5);
}

#[test]
fn factory_rejects_ambiguous_by_type_arguments() {
    #[derive(Debug)]
    struct Job;

    let mut builder = ContainerBuilder::new();
    builder.register(|_| Job);
    let container = builder.build();

    let factory = container.resolve::<Factory<Job>>().unwrap();
    let result = factory.invoke_with(vec![Parameter::typed(1u32), Parameter::typed(2u32)]);
    match result {
        Err(DiError::AmbiguousParameter(name)) => assert!(name.contains("u32")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn factory_maps_arguments_by_name_and_position() {
    struct Job {
        name: String,
        retries: u32,
    }

    let mut builder = ContainerBuilder::new();
    builder.register(|ctx| Job {
        name: ctx
            .parameter_named::<String>("name")
            .map(|n| (*n).clone())
            .unwrap_or_default(),
        retries: ctx.parameter_at::<u32>(0).map(|r| *r).unwrap_or(0),
    });
    let container = builder.build();

    let factory = container.resolve::<Factory<Job>>().unwrap();

    let named = factory
        .with_mapping(ParameterMapping::ByName)
        .invoke_with(vec![Parameter::named("name", String::from("sync"))])
        .unwrap();
    assert_eq!(named.name, "sync");

    let positional = factory
        .with_mapping(ParameterMapping::ByPosition)
        .invoke_with(vec![Parameter::typed(3u32)])
        .unwrap();
    assert_eq!(positional.retries, 3);
}

#[test]
fn wrappers_are_not_offered_for_unregistered_services() {
    struct Ghost;

    let mut builder = ContainerBuilder::new();
    builder.register(|_| 1u8);
    let container = builder.build();

    assert!(matches!(
        container.resolve::<Lazy<Ghost>>(),
        Err(DiError::NotRegistered(_))
    ));
}
