use graft_di::{
    ComponentRegistration, ContainerBuilder, DiError, FactoryActivator, Lifetime,
    OpenGenericSource, Ownership, RegistrationSource, Resolver, Service, ServiceAccessor, Sharing,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

struct Plugin {
    name: &'static str,
}

/// Synthesizes a `Plugin` whenever one is asked for and none is registered.
struct PluginSource;

impl RegistrationSource for PluginSource {
    fn registrations_for(
        &self,
        service: &Service,
        accessor: &dyn ServiceAccessor,
    ) -> Vec<Arc<ComponentRegistration>> {
        if *service != Service::typed::<Plugin>() {
            return Vec::new();
        }
        // Consulting the registry for the service currently being synthesized
        // must short-circuit rather than recurse.
        if accessor.is_registered(&Service::typed::<Plugin>()) {
            return Vec::new();
        }
        let activator = FactoryActivator::new::<Plugin, _>(|_| {
            Ok(Arc::new(Plugin {
                name: "synthesized",
            }))
        });
        vec![Arc::new(ComponentRegistration::new(
            [Service::typed::<Plugin>()],
            Arc::new(activator),
            Lifetime::CurrentScope,
            Sharing::None,
            Ownership::ExternallyOwned,
        ))]
    }

    fn description(&self) -> &str {
        "plugin source"
    }
}

#[test]
fn custom_source_synthesizes_registrations() {
    let mut builder = ContainerBuilder::new();
    builder.register_source(PluginSource);
    let container = builder.build();

    let plugin = container.resolve::<Plugin>().unwrap();
    assert_eq!(plugin.name, "synthesized");
}

#[test]
fn direct_registrations_take_precedence_over_sources() {
    let mut builder = ContainerBuilder::new();
    builder.register(|_| Plugin { name: "direct" });
    builder.register_source(PluginSource);
    let container = builder.build();

    assert_eq!(container.resolve::<Plugin>().unwrap().name, "direct");
}

#[test]
fn source_results_are_cached_per_service() {
    static QUERIES: AtomicUsize = AtomicUsize::new(0);

    struct CountingSource;

    impl RegistrationSource for CountingSource {
        fn registrations_for(
            &self,
            service: &Service,
            _accessor: &dyn ServiceAccessor,
        ) -> Vec<Arc<ComponentRegistration>> {
            if *service != Service::typed::<Plugin>() {
                return Vec::new();
            }
            QUERIES.fetch_add(1, Ordering::SeqCst);
            let activator =
                FactoryActivator::new::<Plugin, _>(|_| Ok(Arc::new(Plugin { name: "counted" })));
            vec![Arc::new(ComponentRegistration::new(
                [Service::typed::<Plugin>()],
                Arc::new(activator),
                Lifetime::CurrentScope,
                Sharing::None,
                Ownership::ExternallyOwned,
            ))]
        }
    }

    let mut builder = ContainerBuilder::new();
    builder.register_source(CountingSource);
    let container = builder.build();

    let _a = container.resolve::<Plugin>().unwrap();
    let _b = container.resolve::<Plugin>().unwrap();
    assert_eq!(QUERIES.load(Ordering::SeqCst), 1);
}

#[test]
fn sources_can_adapt_existing_registrations() {
    struct Wrapped {
        inner: Arc<String>,
    }

    struct WrappingSource;

    impl RegistrationSource for WrappingSource {
        fn registrations_for(
            &self,
            service: &Service,
            accessor: &dyn ServiceAccessor,
        ) -> Vec<Arc<ComponentRegistration>> {
            if *service != Service::typed::<Wrapped>()
                || !accessor.is_registered(&Service::typed::<String>())
            {
                return Vec::new();
            }
            let activator = FactoryActivator::new::<Wrapped, _>(|ctx| {
                Ok(Arc::new(Wrapped {
                    inner: ctx.resolve::<String>()?,
                }))
            });
            vec![Arc::new(ComponentRegistration::new(
                [Service::typed::<Wrapped>()],
                Arc::new(activator),
                Lifetime::CurrentScope,
                Sharing::None,
                Ownership::ExternallyOwned,
            ))]
        }

        fn is_adapter_for_individual_components(&self) -> bool {
            true
        }
    }

    let mut builder = ContainerBuilder::new();
    builder.register(|_| String::from("inner"));
    builder.register_source(WrappingSource);
    let container = builder.build();

    let wrapped = container.resolve::<Wrapped>().unwrap();
    assert_eq!(*wrapped.inner, "inner");
}

struct Cache<K> {
    hits: usize,
    _marker: std::marker::PhantomData<K>,
}

fn bind_cache<K: Send + Sync + 'static>(source: &mut OpenGenericSource) {
    source.bind(|_| {
        Ok(Arc::new(Cache::<K> {
            hits: 0,
            _marker: std::marker::PhantomData,
        }))
    });
}

#[test]
fn open_generic_bindings_close_over_each_type() {
    let mut source = OpenGenericSource::new("caches");
    bind_cache::<u32>(&mut source);
    bind_cache::<String>(&mut source);

    let mut builder = ContainerBuilder::new();
    builder.register_source(source);
    let container = builder.build();

    assert_eq!(container.resolve::<Cache<u32>>().unwrap().hits, 0);
    assert_eq!(container.resolve::<Cache<String>>().unwrap().hits, 0);
    assert!(container.resolve::<Cache<u64>>().is_err());
}

#[test]
fn open_generic_shared_bindings_are_singletons() {
    let mut source = OpenGenericSource::new("caches");
    source.bind_shared(|_| {
        Ok(Arc::new(Cache::<u32> {
            hits: 0,
            _marker: std::marker::PhantomData,
        }))
    });

    let mut builder = ContainerBuilder::new();
    builder.register_source(source);
    let container = builder.build();

    let a = container.resolve::<Cache<u32>>().unwrap();
    let b = container.resolve::<Cache<u32>>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn failed_predicate_produces_no_registrations() {
    static ENABLED: AtomicBool = AtomicBool::new(false);

    let mut source = OpenGenericSource::new("caches");
    bind_cache::<u32>(&mut source);
    source.when(|| ENABLED.load(Ordering::SeqCst));

    let mut builder = ContainerBuilder::new();
    builder.register_source(source);
    let container = builder.build();

    match container.resolve::<Cache<u32>>() {
        Err(DiError::NotRegistered(_)) => {}
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
}
