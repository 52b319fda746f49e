//! Registry Integration Tests
//!
//! Registration, deregistration, tree queries and lifecycle transitions
//! against in-memory collaborators.

use std::sync::Arc;

use pagelet::testing::{HookLog, MemoryTransport, RecordingController, StaticModuleLoader, entries};
use pagelet::{
    ComponentDescriptor, ComponentMarkup, ComponentRegistry, CssDependency, Hooks, LifecycleState,
    RuntimeConfig, RuntimeError,
};

// =============================================================================
// Fixtures
// =============================================================================

/// A loader serving a recording controller at `<name>/1.0/controller` for
/// each module name.
fn loader_for(names: &[&str], log: &HookLog) -> StaticModuleLoader {
    names.iter().fold(StaticModuleLoader::new(), |loader, name| {
        let log = log.clone();
        let name = name.to_string();
        loader.with_controller(format!("{name}/1.0/controller"), move || {
            RecordingController::new(name.clone(), log.clone())
        })
    })
}

fn registry_with(transport: MemoryTransport, loader: StaticModuleLoader) -> ComponentRegistry {
    ComponentRegistry::new(&RuntimeConfig::default(), Arc::new(transport), Arc::new(loader))
}

fn registry(names: &[&str], log: &HookLog) -> ComponentRegistry {
    registry_with(MemoryTransport::new(), loader_for(names, log))
}

fn component(instance_id: &str, module: &str) -> ComponentDescriptor {
    ComponentDescriptor::new(instance_id, module, "1.0")
}

fn count(log: &HookLog, entry: &str) -> usize {
    entries(log).iter().filter(|e| *e == entry).count()
}

fn destroyed(log: &HookLog) -> Vec<String> {
    entries(log)
        .into_iter()
        .filter(|e| e.starts_with("destroy:"))
        .collect()
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn register_drives_component_to_start() {
    let log = HookLog::default();
    let registry = registry(&["page"], &log);

    let placed = registry
        .register(component("i-1", "page").with_container_id("main"))
        .await
        .unwrap()
        .expect("first registration places the component");

    assert_eq!(placed.state(), LifecycleState::Start);
    assert!(placed.is_bound());
    assert_eq!(placed.container_id, "main");
    assert_eq!(
        entries(&log),
        vec!["bind(i-1):page", "init:page", "start:page"]
    );
}

#[tokio::test]
async fn duplicate_register_is_a_noop() {
    let log = HookLog::default();
    let registry = registry(&["page"], &log);

    assert!(registry.register(component("i-1", "page")).await.unwrap().is_some());
    assert!(registry.register(component("i-1", "page")).await.unwrap().is_none());

    assert_eq!(registry.len(), 1);
    assert_eq!(count(&log, "init:page"), 1);
    assert_eq!(count(&log, "start:page"), 1);
}

#[tokio::test]
async fn directory_size_tracks_live_components() {
    let log = HookLog::default();
    let registry = registry(&["page"], &log);

    for i in 0..5 {
        registry.register(component(&format!("i-{i}"), "page")).await.unwrap();
    }
    assert_eq!(registry.len(), 5);

    assert!(registry.deregister("i-1"));
    assert!(registry.deregister("i-3"));
    assert!(!registry.deregister("i-3"));
    registry.register(component("i-0", "page")).await.unwrap();

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.instance_ids(), vec!["i-0", "i-2", "i-4"]);
}

#[tokio::test]
async fn undeclared_hooks_are_not_called() {
    let log = HookLog::default();
    let loader = StaticModuleLoader::new().with_controller("quiet/1.0/controller", {
        let log = log.clone();
        move || RecordingController::new("quiet", log.clone()).with_hooks(Hooks::DESTROY)
    });
    let registry = registry_with(MemoryTransport::new(), loader);

    let placed = registry.register(component("q", "quiet")).await.unwrap().unwrap();
    assert_eq!(placed.state(), LifecycleState::Start);
    assert_eq!(entries(&log), vec!["bind(q):quiet"]);

    registry.deregister("q");
    assert_eq!(entries(&log), vec!["bind(q):quiet", "destroy:quiet"]);
}

#[tokio::test]
async fn controller_load_failure_is_reported_and_isolated() {
    let log = HookLog::default();
    let registry = registry(&["page"], &log);

    let err = registry
        .register(component("broken", "page").with_controller_path("missing/controller"))
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::ControllerLoad { ref path, .. } if path == "missing/controller"));

    let broken = registry.get_component("broken").expect("left in the directory");
    assert_eq!(broken.state(), LifecycleState::Load);
    assert!(!broken.is_bound());

    let sibling = registry.register(component("ok", "page")).await.unwrap().unwrap();
    assert_eq!(sibling.state(), LifecycleState::Start);

    assert!(registry.deregister("broken"));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn unknown_parent_places_component_at_root() {
    let log = HookLog::default();
    let registry = registry(&["page"], &log);

    let placed = registry
        .register(component("orphan", "page").with_parent("nowhere"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(placed.parent(), None);
    assert!(registry.get_parent("orphan").is_none());
}

// =============================================================================
// Tree
// =============================================================================

#[tokio::test]
async fn deregister_destroys_children_before_parent() {
    let log = HookLog::default();
    let registry = registry(&["page", "left", "right"], &log);

    registry.register(component("root", "page")).await.unwrap();
    registry
        .register(component("a", "left").with_parent("root"))
        .await
        .unwrap();
    registry
        .register(component("b", "right").with_parent("root"))
        .await
        .unwrap();
    assert_eq!(
        registry.get_component("root").unwrap().children(),
        &["a".to_string(), "b".to_string()]
    );

    assert!(registry.deregister("root"));

    assert_eq!(destroyed(&log), vec!["destroy:left", "destroy:right", "destroy:page"]);
    assert!(registry.is_empty());
    assert!(!registry.deregister("root"));
}

#[tokio::test]
async fn deregistering_a_child_unlinks_it_from_its_parent() {
    let log = HookLog::default();
    let registry = registry(&["page", "left"], &log);

    registry.register(component("root", "page")).await.unwrap();
    registry
        .register(component("a", "left").with_parent("root"))
        .await
        .unwrap();

    assert!(registry.deregister("a"));
    assert!(registry.get_component("root").unwrap().children().is_empty());
    assert_eq!(registry.get_component("root").unwrap().state(), LifecycleState::Start);
}

#[tokio::test]
async fn static_id_lookup_is_scoped_to_the_parent() {
    let log = HookLog::default();
    let registry = registry(&["page", "left"], &log);

    registry.register(component("p1", "page")).await.unwrap();
    registry.register(component("p2", "page")).await.unwrap();
    registry
        .register(component("c1", "left").with_parent("p1").with_static_id("title"))
        .await
        .unwrap();
    registry
        .register(component("c2", "left").with_parent("p2").with_static_id("title"))
        .await
        .unwrap();

    assert_eq!(registry.get_child("p1", "title").unwrap().instance_id, "c1");
    assert_eq!(registry.get_child("p2", "title").unwrap().instance_id, "c2");
    assert!(registry.get_child("p1", "missing").is_none());
    assert!(registry.get_child("c1", "title").is_none());

    assert_eq!(registry.get_parent("c2").unwrap().instance_id, "p2");
    assert!(registry.get_parent("p1").is_none());

    let children: Vec<_> = registry
        .children("p1")
        .into_iter()
        .map(|c| c.instance_id)
        .collect();
    assert_eq!(children, vec!["c1"]);
}

#[tokio::test]
async fn unknown_ids_return_nothing() {
    let log = HookLog::default();
    let registry = registry(&[], &log);

    assert!(registry.get_component("ghost").is_none());
    assert!(registry.get_child("ghost", "title").is_none());
    assert!(registry.get_parent("ghost").is_none());
    assert!(registry.children("ghost").is_empty());
    assert!(!registry.deregister("ghost"));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn state_changes_are_broadcast() {
    let log = HookLog::default();
    let registry = registry(&["page"], &log);
    let mut changes = registry.subscribe();

    registry.register(component("i-1", "page")).await.unwrap();
    registry.deregister("i-1");

    let mut seen = Vec::new();
    while let Ok(change) = changes.try_recv() {
        assert_eq!(change.instance_id, "i-1");
        assert_eq!(change.module_id, "page");
        seen.push(change.state);
    }
    assert_eq!(
        seen,
        vec![LifecycleState::Init, LifecycleState::Start, LifecycleState::Dispose]
    );
}

#[tokio::test]
async fn pause_resume_stop() {
    let log = HookLog::default();
    let registry = registry(&["page"], &log);
    registry.register(component("i-1", "page")).await.unwrap();

    registry.pause("i-1").unwrap();
    assert_eq!(registry.get_component("i-1").unwrap().state(), LifecycleState::Pause);
    assert!(matches!(
        registry.pause("i-1"),
        Err(RuntimeError::InvalidTransition { from: LifecycleState::Pause, .. })
    ));

    registry.resume("i-1").unwrap();
    assert!(registry.resume("i-1").is_err(), "resume needs a paused component");

    registry.stop("i-1").unwrap();
    assert!(registry.resume("i-1").is_err());
    assert!(registry.pause("i-1").is_err());
    assert_eq!(registry.get_component("i-1").unwrap().state(), LifecycleState::Stop);

    assert!(matches!(
        registry.stop("ghost"),
        Err(RuntimeError::UnknownInstance(ref id)) if id == "ghost"
    ));

    let hooks: Vec<_> = entries(&log).into_iter().skip(3).collect();
    assert_eq!(hooks, vec!["pause:page", "resume:page", "stop:page"]);

    registry.deregister("i-1");
    assert_eq!(destroyed(&log), vec!["destroy:page"]);
}

#[tokio::test]
async fn deregister_while_loading_is_tolerated() {
    let log = HookLog::default();
    let mut loader = loader_for(&["page"], &log);
    let gate = loader.gate("page/1.0/controller");
    let transport = MemoryTransport::new().with_css("page.css", ".page {}");
    let registry = registry_with(transport, loader);

    let descriptor = component("slow", "page").with_css(CssDependency::new("page.css", 10));
    let (result, _) = tokio::join!(registry.register(descriptor), async {
        tokio::task::yield_now().await;
        assert_eq!(
            registry.get_component("slow").unwrap().state(),
            LifecycleState::Load
        );
        assert!(registry.deregister("slow"));
        gate.notify_one();
    });

    assert!(result.unwrap().is_none());
    assert!(registry.is_empty());
    assert!(entries(&log).is_empty(), "the late controller is never bound");

    let allocator = registry.allocator().lock().unwrap();
    assert_eq!(allocator.stats().rules, 0);
}

#[tokio::test]
async fn re_registration_after_a_stale_load_starts_fresh() {
    let log = HookLog::default();
    let mut loader = loader_for(&["page"], &log);
    let gate = loader.gate("page/1.0/controller");
    let registry = registry_with(MemoryTransport::new(), loader);

    let (first, _) = tokio::join!(registry.register(component("i-1", "page")), async {
        tokio::task::yield_now().await;
        registry.deregister("i-1");
        gate.notify_one();
    });
    assert!(first.unwrap().is_none());

    gate.notify_one();
    let second = registry.register(component("i-1", "page")).await.unwrap().unwrap();
    assert_eq!(second.state(), LifecycleState::Start);
    assert_eq!(count(&log, "init:page"), 1);
}

// =============================================================================
// Mount
// =============================================================================

#[tokio::test]
async fn mount_fetches_markup_and_its_css() {
    let log = HookLog::default();
    let transport = MemoryTransport::new()
        .with_css("card.css", ".card {}")
        .with_markup(
            "card-1",
            ComponentMarkup {
                content: "<div class=\"card\"></div>".to_string(),
                css: vec![CssDependency::new("card.css", 3)],
            },
        );
    let registry = registry_with(transport, loader_for(&["card"], &log));

    let mounted = registry.mount(component("card-1", "card")).await.unwrap().unwrap();
    assert_eq!(mounted.content, "<div class=\"card\"></div>");
    assert_eq!(mounted.component.state(), LifecycleState::Start);
    assert_eq!(registry.allocator().lock().unwrap().stats().rules, 3);

    assert!(registry.mount(component("card-1", "card")).await.unwrap().is_none());
    assert!(matches!(
        registry.mount(component("card-2", "card")).await,
        Err(RuntimeError::Markup { .. })
    ));
    assert!(!registry.is_registered("card-2"));
}
