//! In-memory collaborators for exercising the registry without a network.
//!
//! - [`MemoryTransport`] serves CSS text and markup from maps and records
//!   every CSS path it was asked for
//! - [`StaticModuleLoader`] resolves controller paths to registered
//!   constructors, optionally holding a load open until a test releases it
//! - [`RecordingController`] appends `"<hook>:<name>"` to a shared log for
//!   every hook it receives
//!
//! # Example
//! ```ignore
//! let transport = Arc::new(MemoryTransport::new().with_css("a.css", ".a {}"));
//! let log = HookLog::default();
//! let loader = Arc::new(StaticModuleLoader::new().with_controller("x/1.0/controller", {
//!     let log = log.clone();
//!     move || RecordingController::new("x", log.clone())
//! }));
//! let registry = ComponentRegistry::new(&RuntimeConfig::default(), transport, loader);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::component::ComponentDescriptor;
use crate::context::ViewContext;
use crate::controller::{Controller, ControllerFactory, ControllerModule, Hooks};
use crate::error::{Result, RuntimeError};
use crate::transport::{ComponentMarkup, ModuleLoader, Transport};

/// Shared, ordered record of hook calls.
pub type HookLog = Arc<Mutex<Vec<String>>>;

/// Snapshot the entries of a [`HookLog`].
pub fn entries(log: &HookLog) -> Vec<String> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

// =============================================================================
// Transport
// =============================================================================

#[derive(Default)]
pub struct MemoryTransport {
    css: HashMap<String, String>,
    markup: HashMap<String, ComponentMarkup>,
    fetched: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_css(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.css.insert(path.into(), text.into());
        self
    }

    /// Markup served for a given instance id.
    pub fn with_markup(mut self, instance_id: impl Into<String>, markup: ComponentMarkup) -> Self {
        self.markup.insert(instance_id.into(), markup);
        self
    }

    /// Every CSS path requested so far, in request order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch_component_markup(&self, descriptor: &ComponentDescriptor) -> Result<ComponentMarkup> {
        self.markup
            .get(&descriptor.instance_id)
            .cloned()
            .ok_or_else(|| RuntimeError::Markup {
                instance_id: descriptor.instance_id.clone(),
                reason: "not found".to_string(),
            })
    }

    async fn fetch_css_text(&self, path: &str) -> Option<String> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_string());
        self.css.get(path).cloned()
    }
}

// =============================================================================
// Module loader
// =============================================================================

#[derive(Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, ControllerFactory>,
    gates: HashMap<String, Arc<Notify>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_controller<F, C>(mut self, path: impl Into<String>, build: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.modules.insert(
            path.into(),
            Arc::new(move || Box::new(build()) as Box<dyn Controller>),
        );
        self
    }

    /// Hold loads of `path` until the returned handle is notified.
    pub fn gate(&mut self, path: impl Into<String>) -> Arc<Notify> {
        Arc::clone(self.gates.entry(path.into()).or_default())
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load_controller_module(&self, path: &str) -> Result<ControllerModule> {
        if let Some(gate) = self.gates.get(path) {
            gate.notified().await;
        }
        match self.modules.get(path) {
            Some(build) => Ok(ControllerModule::Constructor(Arc::clone(build))),
            None => Err(RuntimeError::ControllerLoad {
                path: path.to_string(),
                reason: "module not found".to_string(),
            }),
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

pub struct RecordingController {
    name: String,
    hooks: Hooks,
    log: HookLog,
    view: Option<ViewContext>,
}

impl RecordingController {
    /// A controller declaring every hook.
    pub fn new(name: impl Into<String>, log: HookLog) -> Self {
        Self {
            name: name.into(),
            hooks: Hooks::all(),
            log,
            view: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    fn record(&self, hook: &str) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{hook}:{}", self.name));
    }
}

impl Controller for RecordingController {
    fn hooks(&self) -> Hooks {
        self.hooks
    }

    fn bind(&mut self, view: ViewContext) {
        self.record(&format!("bind({})", view.instance_id()));
        self.view = Some(view);
    }

    fn init(&mut self) {
        self.record("init");
        if let Some(view) = &self.view {
            view.storage().set("initialized", self.name.as_str());
        }
    }

    fn start(&mut self) {
        self.record("start");
    }

    fn pause(&mut self) {
        self.record("pause");
    }

    fn resume(&mut self) {
        self.record("resume");
    }

    fn stop(&mut self) {
        self.record("stop");
    }

    fn destroy(&mut self) {
        self.record("destroy");
    }
}
