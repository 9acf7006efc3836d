use graft_di::{ContainerBuilder, Resolver};
use std::sync::{Arc, Mutex};

trait Render: Send + Sync {
    fn render(&self) -> String;
}

struct Plain;
impl Render for Plain {
    fn render(&self) -> String {
        "text".into()
    }
}

struct Bold(Arc<dyn Render>);
impl Render for Bold {
    fn render(&self) -> String {
        format!("<b>{}</b>", self.0.render())
    }
}

struct Italic(Arc<dyn Render>);
impl Render for Italic {
    fn render(&self) -> String {
        format!("<i>{}</i>", self.0.render())
    }
}

#[test]
fn decorators_apply_in_registration_order() {
    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Render, _>(|_| Arc::new(Plain));
    builder.register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Bold(inner)));
    builder.register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Italic(inner)));
    let container = builder.build();

    let render = container.resolve::<dyn Render>().unwrap();
    // First registered is innermost.
    assert_eq!(render.render(), "<i><b>text</b></i>");
}

#[test]
fn consumers_are_unaware_of_decoration() {
    struct Page {
        body: Arc<dyn Render>,
    }

    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Render, _>(|_| Arc::new(Plain));
    builder.register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Bold(inner)));
    builder.register(|ctx| Page {
        body: ctx.resolve::<dyn Render>().unwrap(),
    });
    let container = builder.build();

    let page = container.resolve::<Page>().unwrap();
    assert_eq!(page.body.render(), "<b>text</b>");
}

#[test]
fn decorator_context_reports_applied_chain() {
    let contexts: Arc<Mutex<Vec<Vec<&'static str>>>> = Arc::new(Mutex::new(Vec::new()));
    let (probe_a, probe_b) = (contexts.clone(), contexts.clone());

    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Render, _>(|_| Arc::new(Plain));
    builder
        .register_decorator::<dyn Render, _>(move |inner, _, decoration| {
            probe_a.lock().unwrap().push(decoration.applied_decorators().to_vec());
            Arc::new(Bold(inner))
        })
        .display_name("bold");
    builder
        .register_decorator::<dyn Render, _>(move |inner, _, decoration| {
            probe_b.lock().unwrap().push(decoration.applied_decorators().to_vec());
            Arc::new(Italic(inner))
        })
        .display_name("italic");
    let container = builder.build();

    let _render = container.resolve::<dyn Render>().unwrap();
    let snapshots = contexts.lock().unwrap();
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[0].is_empty());
    assert_eq!(snapshots[1], vec!["bold"]);
}

#[test]
fn decorator_context_names_service_and_implementation() {
    let seen: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let probe = seen.clone();

    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Render, _>(|_| Arc::new(Plain));
    builder.register_decorator::<dyn Render, _>(move |inner, _, decoration| {
        probe.lock().unwrap().push((
            decoration.service_type().to_string(),
            decoration.implementation_type().to_string(),
        ));
        Arc::new(Bold(inner))
    });
    let container = builder.build();

    let _render = container.resolve::<dyn Render>().unwrap();
    let seen = seen.lock().unwrap();
    assert!(seen[0].0.contains("Render"));
    assert!(seen[0].1.contains("Render"));
}

#[test]
fn conditional_decorator_is_skipped_when_condition_fails() {
    let mut builder = ContainerBuilder::new();
    builder.register_arc::<dyn Render, _>(|_| Arc::new(Plain));
    builder
        .register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Bold(inner)))
        .display_name("bold");
    builder
        .register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Italic(inner)))
        .only_if(|decoration| !decoration.applied_decorators().contains(&"bold"));
    let container = builder.build();

    let render = container.resolve::<dyn Render>().unwrap();
    assert_eq!(render.render(), "<b>text</b>");
}

#[test]
fn shared_components_are_decorated_once() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_arc::<dyn Render, _>(|_| Arc::new(Plain))
        .single_instance();
    builder.register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Bold(inner)));
    let container = builder.build();

    let a = container.resolve::<dyn Render>().unwrap();
    let b = container.resolve::<dyn Render>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.render(), "<b>text</b>");
}

#[test]
fn child_scope_decorators_do_not_reach_root_singletons() {
    let mut builder = ContainerBuilder::new();
    builder
        .register_arc::<dyn Render, _>(|_| Arc::new(Plain))
        .single_instance();
    let container = builder.build();

    let child = container
        .begin_scope_with(|b| {
            b.register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Bold(inner)));
        })
        .unwrap();

    // The singleton is owned by the root, so only root-registered
    // decorators shape the cached instance, wherever the first resolve
    // was issued from.
    let from_child = child.resolve::<dyn Render>().unwrap();
    assert_eq!(from_child.render(), "text");

    let from_root = container.resolve::<dyn Render>().unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_root));
}

#[test]
fn undecorated_services_are_untouched() {
    let mut builder = ContainerBuilder::new();
    builder.register(|_| 3u32);
    builder.register_arc::<dyn Render, _>(|_| Arc::new(Plain));
    builder.register_decorator::<dyn Render, _>(|inner, _, _| Arc::new(Bold(inner)));
    let container = builder.build();

    assert_eq!(*container.resolve::<u32>().unwrap(), 3);
}
