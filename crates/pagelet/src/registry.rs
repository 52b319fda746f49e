//! The directory of live components.
//!
//! The `ComponentRegistry` owns every placed component for one page session.
//! Parent/child links are instance ids into the same directory map, so the
//! tree never forms reference cycles: a parent lists its children, a child
//! only remembers its parent's id for lookups.
//!
//! Loading a component joins two independent legs, its CSS and its
//! controller module. Only a controller failure is reported to the caller;
//! CSS problems are logged and the component renders with whatever CSS made
//! it onto the page.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stylepack::StylesheetAllocator;
use tokio::sync::broadcast;

use crate::component::{Component, ComponentDescriptor, InstanceId};
use crate::config::RuntimeConfig;
use crate::context::{ViewContext, ViewServices};
use crate::controller::{Controller, Hooks, run_hook};
use crate::css::CssRenderer;
use crate::error::{Result, RuntimeError};
use crate::lifecycle::{LifecycleState, StateChange};
use crate::transport::{ModuleLoader, Transport};

type HookCall = fn(&mut dyn Controller);

struct Entry {
    component: Component,
    controller: Option<Box<dyn Controller>>,
    /// Distinguishes this registration from an earlier one under the same id.
    generation: u64,
}

#[derive(Default)]
struct Directory {
    entries: HashMap<InstanceId, Entry>,
    next_generation: u64,
}

impl Directory {
    fn current(&mut self, id: &str, generation: u64) -> Option<&mut Entry> {
        self.entries
            .get_mut(id)
            .filter(|entry| entry.generation == generation)
    }

    fn child_by_static_id(&self, parent: &str, static_id: &str) -> Option<&Entry> {
        let parent = self.entries.get(parent)?;
        parent
            .component
            .children()
            .iter()
            .filter_map(|child| self.entries.get(child))
            .find(|entry| entry.component.static_id == static_id)
    }

    /// `root` and all of its descendants, children before their parents.
    fn post_order(&self, root: &str) -> Vec<InstanceId> {
        let mut order = Vec::new();
        self.visit(root, &mut order);
        order
    }

    fn visit(&self, id: &str, order: &mut Vec<InstanceId>) {
        if let Some(entry) = self.entries.get(id) {
            for child in entry.component.children() {
                self.visit(child, order);
            }
            order.push(id.to_string());
        }
    }
}

/// A component placed through [`ComponentRegistry::mount`], with its markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mounted {
    pub component: Component,
    pub content: String,
}

pub struct ComponentRegistry {
    directory: Mutex<Directory>,
    css: CssRenderer,
    transport: Arc<dyn Transport>,
    loader: Arc<dyn ModuleLoader>,
    services: ViewServices,
    notifier: broadcast::Sender<StateChange>,
}

impl ComponentRegistry {
    /// Create a registry with its own allocator sized by `config`.
    pub fn new(config: &RuntimeConfig, transport: Arc<dyn Transport>, loader: Arc<dyn ModuleLoader>) -> Self {
        let allocator = Arc::new(Mutex::new(config.allocator()));
        Self::with_allocator(config, allocator, transport, loader)
    }

    /// Create a registry that packs CSS into an existing allocator.
    pub fn with_allocator(
        config: &RuntimeConfig,
        allocator: Arc<Mutex<StylesheetAllocator>>,
        transport: Arc<dyn Transport>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        let (notifier, _) = broadcast::channel(config.notify_capacity);
        Self {
            directory: Mutex::new(Directory::default()),
            css: CssRenderer::new(allocator, Arc::clone(&transport)),
            transport,
            loader,
            services: ViewServices::default(),
            notifier,
        }
    }

    /// Services copied into every view context this registry binds.
    pub fn with_services(mut self, services: ViewServices) -> Self {
        self.services = services;
        self
    }

    pub fn allocator(&self) -> &Arc<Mutex<StylesheetAllocator>> {
        self.css.allocator()
    }

    pub fn css(&self) -> &CssRenderer {
        &self.css
    }

    /// Receive a [`StateChange`] for every lifecycle transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.notifier.subscribe()
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, component: &Component) {
        log::debug!("{}: {}", component.instance_id, component.state);
        // No subscribers is fine.
        let _ = self.notifier.send(StateChange {
            instance_id: component.instance_id.clone(),
            module_id: component.module_id.clone(),
            state: component.state,
        });
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Place a component and drive it to `Start`.
    ///
    /// Returns `Ok(None)` when the instance id is already registered, and
    /// also when the component was deregistered before its load finished.
    /// A controller module that fails to load is the only error; the
    /// component then stays in the directory in the `Load` state.
    pub async fn register(&self, descriptor: ComponentDescriptor) -> Result<Option<Component>> {
        let id = descriptor.instance_id.clone();
        let Some(generation) = self.insert(&descriptor) else {
            log::debug!("{id}: already registered, ignoring");
            return Ok(None);
        };

        let (css_placed, module) = futures::join!(
            self.css.load(&descriptor),
            self.loader.load_controller_module(&descriptor.controller_path),
        );
        if !css_placed {
            log::warn!("{id}: css could not be placed, continuing unstyled");
        }

        let module = match module {
            Ok(module) => module,
            Err(err) => {
                log::error!("{id}: {err}");
                if !self.is_current(&id, generation) {
                    self.css.reclaim_if_unused(&descriptor.full_id());
                }
                return Err(err);
            }
        };

        if !self.is_current(&id, generation) {
            log::debug!("{id}: deregistered while loading, dropping controller");
            self.css.reclaim_if_unused(&descriptor.full_id());
            return Ok(None);
        }

        let mut controller = module.instantiate();
        controller.bind(ViewContext::new(id.clone(), &self.services));

        let bound = match self.directory().current(&id, generation) {
            Some(entry) => {
                entry.controller = Some(controller);
                entry.component.bound = true;
                true
            }
            None => false,
        };
        if !bound {
            log::debug!("{id}: deregistered while binding, dropping controller");
            return Ok(None);
        }

        let steps: [(LifecycleState, Hooks, HookCall); 2] = [
            (LifecycleState::Init, Hooks::INIT, |c| c.init()),
            (LifecycleState::Start, Hooks::START, |c| c.start()),
        ];
        for (to, hook, call) in steps {
            if let Err(err) = self.advance(&id, Some(generation), None, to, hook, call) {
                log::debug!("{id}: load interrupted: {err}");
                return Ok(None);
            }
        }

        Ok(self.get_component(&id))
    }

    /// Fetch a placement's markup, then register it with the CSS the markup
    /// declares.
    pub async fn mount(&self, mut descriptor: ComponentDescriptor) -> Result<Option<Mounted>> {
        if self.is_registered(&descriptor.instance_id) {
            log::debug!("{}: already registered, not mounting", descriptor.instance_id);
            return Ok(None);
        }

        let markup = self.transport.fetch_component_markup(&descriptor).await?;
        for dep in markup.css {
            if !descriptor.css_deps.iter().any(|known| known.path == dep.path) {
                descriptor.css_deps.push(dep);
            }
        }

        let component = self.register(descriptor).await?;
        Ok(component.map(|component| Mounted {
            component,
            content: markup.content,
        }))
    }

    /// Add a `Load` entry for the descriptor, linked under its parent.
    fn insert(&self, descriptor: &ComponentDescriptor) -> Option<u64> {
        let mut dir = self.directory();
        let id = &descriptor.instance_id;
        if dir.entries.contains_key(id) {
            return None;
        }

        let mut component = Component::from_descriptor(descriptor);
        if let Some(parent_id) = &descriptor.parent_instance_id {
            if !descriptor.static_id.is_empty()
                && dir.child_by_static_id(parent_id, &descriptor.static_id).is_some()
            {
                log::warn!(
                    "{id}: static id {:?} is already used under {parent_id}",
                    descriptor.static_id
                );
            }
            match dir.entries.get_mut(parent_id) {
                Some(parent) if !parent.component.state.is_terminal() => {
                    parent.component.add_child(id);
                    component.parent = Some(parent_id.clone());
                }
                _ => log::warn!("{id}: parent {parent_id} is not registered, placing at page root"),
            }
        }

        dir.next_generation += 1;
        let generation = dir.next_generation;
        dir.entries.insert(
            id.clone(),
            Entry {
                component,
                controller: None,
                generation,
            },
        );
        Some(generation)
    }

    fn is_current(&self, id: &str, generation: u64) -> bool {
        self.directory().current(id, generation).is_some()
    }

    // =========================================================================
    // Deregistration
    // =========================================================================

    /// Dispose a component and everything beneath it, children first.
    ///
    /// Returns `false` if the instance id is not registered.
    pub fn deregister(&self, id: &str) -> bool {
        let order = self.directory().post_order(id);
        if order.is_empty() {
            return false;
        }
        for instance_id in &order {
            self.dispose(instance_id);
        }
        true
    }

    fn dispose(&self, id: &str) {
        let (mut controller, component) = {
            let mut dir = self.directory();
            let Some(entry) = dir.entries.get_mut(id) else {
                return;
            };
            if entry.component.state.is_terminal() {
                return;
            }
            entry.component.state = LifecycleState::Dispose;
            (entry.controller.take(), entry.component.clone())
        };

        if let Some(controller) = controller.as_deref_mut() {
            run_hook(controller, Hooks::DESTROY, |c| c.destroy());
        }
        self.notify(&component);
        self.css.unload(&component);

        let mut dir = self.directory();
        dir.entries.remove(id);
        if let Some(parent) = component.parent() {
            if let Some(parent) = dir.entries.get_mut(parent) {
                parent.component.remove_child(id);
            }
        }
    }

    // =========================================================================
    // Lifecycle transitions
    // =========================================================================

    /// Move a started component to `Pause`.
    pub fn pause(&self, id: &str) -> Result<()> {
        self.transition(id, None, LifecycleState::Pause, Hooks::PAUSE, |c| c.pause())
    }

    /// Move a paused component back to `Start`.
    pub fn resume(&self, id: &str) -> Result<()> {
        self.transition(
            id,
            Some(LifecycleState::Pause),
            LifecycleState::Start,
            Hooks::RESUME,
            |c| c.resume(),
        )
    }

    /// Move a started or paused component to `Stop`.
    pub fn stop(&self, id: &str) -> Result<()> {
        self.transition(id, None, LifecycleState::Stop, Hooks::STOP, |c| c.stop())
    }

    fn transition(
        &self,
        id: &str,
        from: Option<LifecycleState>,
        to: LifecycleState,
        hook: Hooks,
        call: HookCall,
    ) -> Result<()> {
        self.advance(id, None, from, to, hook, call)
            .inspect_err(|err| log::warn!("{err}"))
    }

    /// Change state, run the hook outside the directory lock, then notify.
    ///
    /// The controller is taken out of its entry while the hook runs so a hook
    /// may call back into the registry.
    fn advance(
        &self,
        id: &str,
        generation: Option<u64>,
        from: Option<LifecycleState>,
        to: LifecycleState,
        hook: Hooks,
        call: HookCall,
    ) -> Result<()> {
        let (mut controller, generation) = {
            let mut dir = self.directory();
            let entry = match dir.entries.get_mut(id) {
                Some(entry) if generation.is_none_or(|g| g == entry.generation) => entry,
                _ => return Err(RuntimeError::UnknownInstance(id.to_string())),
            };
            let state = entry.component.state;
            if from.is_some_and(|from| from != state) || !state.can_transition_to(to) {
                return Err(RuntimeError::InvalidTransition {
                    instance_id: id.to_string(),
                    from: state,
                    to,
                });
            }
            entry.component.state = to;
            (entry.controller.take(), entry.generation)
        };

        if let Some(controller) = controller.as_deref_mut() {
            run_hook(controller, hook, call);
        }

        let restored = match self.directory().current(id, generation) {
            Some(entry) => {
                entry.controller = controller.take();
                Some(entry.component.clone())
            }
            None => None,
        };
        match restored {
            Some(component) => {
                self.notify(&component);
                Ok(())
            }
            None => {
                // Deregistered from inside the hook, so it never saw our
                // controller.
                if let Some(controller) = controller.as_deref_mut() {
                    run_hook(controller, Hooks::DESTROY, |c| c.destroy());
                }
                Err(RuntimeError::UnknownInstance(id.to_string()))
            }
        }
    }

    // =========================================================================
    // Directory queries
    // =========================================================================

    pub fn get_component(&self, id: &str) -> Option<Component> {
        self.directory()
            .entries
            .get(id)
            .map(|entry| entry.component.clone())
    }

    /// Look up a direct child of `parent` by its static id.
    pub fn get_child(&self, parent: &str, static_id: &str) -> Option<Component> {
        self.directory()
            .child_by_static_id(parent, static_id)
            .map(|entry| entry.component.clone())
    }

    /// The component whose child set holds `child`.
    pub fn get_parent(&self, child: &str) -> Option<Component> {
        self.directory()
            .entries
            .values()
            .find(|entry| entry.component.children().iter().any(|c| c == child))
            .map(|entry| entry.component.clone())
    }

    /// Direct children of `id` in placement order.
    pub fn children(&self, id: &str) -> Vec<Component> {
        let dir = self.directory();
        let Some(entry) = dir.entries.get(id) else {
            return Vec::new();
        };
        entry
            .component
            .children()
            .iter()
            .filter_map(|child| dir.entries.get(child))
            .map(|child| child.component.clone())
            .collect()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.directory().entries.contains_key(id)
    }

    pub fn instance_ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.directory().entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.directory().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory().entries.is_empty()
    }
}
