//! Interfaces to the collaborators that fetch payloads for the runtime.
//!
//! The network layer and the module loader live outside this crate. The
//! registry only sees these traits, so hosts can back them with HTTP, a
//! bundle on disk, or the in-memory doubles in [`crate::testing`].

use async_trait::async_trait;

use crate::component::{ComponentDescriptor, CssDependency};
use crate::controller::ControllerModule;
use crate::error::Result;

/// Server-rendered markup for one placement and the CSS it needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentMarkup {
    pub content: String,
    pub css: Vec<CssDependency>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the rendered markup for a placement.
    async fn fetch_component_markup(&self, descriptor: &ComponentDescriptor) -> Result<ComponentMarkup>;

    /// Fetch the raw text of one CSS file.
    ///
    /// `None` or an empty string means the file was not found. Neither is an
    /// error for the caller.
    async fn fetch_css_text(&self, path: &str) -> Option<String>;
}

#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Resolve a controller module. Failure is fatal to that component's load.
    async fn load_controller_module(&self, path: &str) -> Result<ControllerModule>;
}
