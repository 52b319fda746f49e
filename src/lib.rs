pub mod error;

use std::sync::{Arc, Mutex, PoisonError};

pub use error::{PageletError, Result};
pub use pagelet::{
    Component, ComponentDescriptor, ComponentMarkup, ComponentRegistry, Controller, ControllerModule,
    CssDependency, Hooks, LifecycleState, ModuleLoader, RuntimeConfig, StateChange, Transport,
    ViewContext, ViewServices,
};
pub use stylepack::{AllocatorStats, StylesheetAllocator};

/// One page session: a component directory and the stylesheets it fills.
///
/// Build one per page and share it by reference; nothing here is global.
pub struct Page {
    registry: Arc<ComponentRegistry>,
}

impl Page {
    /// Compose a page from its collaborators, installing the file logger if
    /// the config names one.
    pub fn new(
        config: RuntimeConfig,
        transport: Arc<dyn Transport>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self> {
        Self::with_services(config, transport, loader, ViewServices::default())
    }

    pub fn with_services(
        config: RuntimeConfig,
        transport: Arc<dyn Transport>,
        loader: Arc<dyn ModuleLoader>,
        services: ViewServices,
    ) -> Result<Self> {
        config.init_logging()?;
        let registry = ComponentRegistry::new(&config, transport, loader).with_services(services);
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Place a component, fetching its markup first.
    pub async fn place(&self, descriptor: ComponentDescriptor) -> Result<Option<pagelet::Mounted>> {
        Ok(self.registry.mount(descriptor).await?)
    }

    /// Remove a component and its subtree from the page.
    pub fn remove(&self, instance_id: &str) -> bool {
        self.registry.deregister(instance_id)
    }

    /// The style blocks to inject into the page, as `(id, text)` pairs.
    pub fn style_blocks(&self) -> Vec<(String, String)> {
        let allocator = self
            .registry
            .allocator()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        allocator
            .style_blocks()
            .map(|(id, text)| (id.to_string(), text.to_string()))
            .collect()
    }

    pub fn style_stats(&self) -> AllocatorStats {
        let allocator: &Mutex<StylesheetAllocator> = self.registry.allocator();
        allocator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats()
    }
}
