use graft_di::{ContainerBuilder, Resolver};
use std::sync::Arc;

trait Greeter: Send + Sync {
    fn greet(&self) -> &'static str;
}

struct English;
impl Greeter for English {
    fn greet(&self) -> &'static str {
        "hello"
    }
}

struct French;
impl Greeter for French {
    fn greet(&self) -> &'static str {
        "bonjour"
    }
}

#[test]
fn resolves_concrete_type() {
    let mut builder = ContainerBuilder::new();
    builder.register(|_| 42u32);
    let container = builder.build();

    assert_eq!(*container.resolve::<u32>().unwrap(), 42);
}

#[test]
fn resolves_trait_object() {
    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Greeter, _>(|_| Arc::new(English));
    let container = builder.build();

    let greeter = container.resolve::<dyn Greeter>().unwrap();
    assert_eq!(greeter.greet(), "hello");
}

#[test]
fn factories_see_their_dependencies() {
    struct App {
        greeter: Arc<dyn Greeter>,
    }

    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Greeter, _>(|_| Arc::new(French));
    builder.register(|ctx| App {
        greeter: ctx.resolve::<dyn Greeter>().unwrap(),
    });
    let container = builder.build();

    let app = container.resolve::<App>().unwrap();
    assert_eq!(app.greeter.greet(), "bonjour");
}

#[test]
fn last_registration_wins_as_default() {
    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Greeter, _>(|_| Arc::new(English));
    builder.register_arc::<dyn Greeter, _>(|_| Arc::new(French));
    let container = builder.build();

    assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "bonjour");
}

#[test]
fn default_selection_is_idempotent() {
    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Greeter, _>(|_| Arc::new(English));
    builder.register_arc::<dyn Greeter, _>(|_| Arc::new(French));
    let container = builder.build();

    for _ in 0..3 {
        assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "bonjour");
    }
}

#[test]
fn preserve_existing_defaults_keeps_first() {
    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Greeter, _>(|_| Arc::new(English));
    builder
        .register_arc::<dyn Greeter, _>(|_| Arc::new(French))
        .preserve_existing_defaults();
    let container = builder.build();

    assert_eq!(container.resolve::<dyn Greeter>().unwrap().greet(), "hello");
    // Both remain resolvable in bulk.
    assert_eq!(container.resolve_all::<dyn Greeter>().unwrap().len(), 2);
}

#[test]
fn keyed_and_named_registrations() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_arc::<dyn Greeter, _>(|_| Arc::new(English))
        .named("en");
    builder
        .register_arc::<dyn Greeter, _>(|_| Arc::new(French))
        .named("fr");
    builder
        .register(|_| 7u64)
        .keyed(1u64);
    let container = builder.build();

    assert_eq!(container.resolve_named::<dyn Greeter>("en").unwrap().greet(), "hello");
    assert_eq!(container.resolve_named::<dyn Greeter>("fr").unwrap().greet(), "bonjour");
    assert_eq!(*container.resolve_keyed::<u64>(1u64).unwrap(), 7);
    // A keyed-only registration does not answer the plain typed service.
    assert!(!container.is_registered::<dyn Greeter>());
}

#[test]
fn registered_instance_is_shared() {
    let mut builder = ContainerBuilder::new();
    builder.register_instance(String::from("shared"));
    let container = builder.build();

    let a = container.resolve::<String>().unwrap();
    let b = container.resolve::<String>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(*a, "shared");
}

#[test]
fn transient_is_fresh_per_resolve() {
    let mut builder = ContainerBuilder::new();
    builder.register(|_| vec![1u8, 2, 3]);
    let container = builder.build();

    let a = container.resolve::<Vec<u8>>().unwrap();
    let b = container.resolve::<Vec<u8>>().unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(*a, *b);
}

#[test]
fn resolve_with_passes_parameters() {
    use graft_di::Parameter;

    struct Panel {
        width: u32,
    }

    let mut builder = ContainerBuilder::new();
    builder.register(|ctx| Panel {
        width: ctx.parameter::<u32>().map(|w| *w).unwrap_or(1),
    });
    let container = builder.build();

    let plain = container.resolve::<Panel>().unwrap();
    assert_eq!(plain.width, 1);

    let wide = container
        .resolve_with::<Panel>(vec![Parameter::typed(9u32)])
        .unwrap();
    assert_eq!(wide.width, 9);
}

#[test]
fn on_registered_fires_per_registration() {
    use std::sync::Mutex;

    let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let probe = seen.clone();

    let mut builder = ContainerBuilder::new();
    builder.on_registered(move |registration| {
        probe.lock().unwrap().push(registration.implementation_type());
    });
    builder.register(|_| 1u32);
    builder.register(|_| String::from("x"));
    let _container = builder.build();

    let names = seen.lock().unwrap();
    assert_eq!(names.len(), 2);
    assert!(names[0].contains("u32"));
    assert!(names[1].contains("String"));
}
