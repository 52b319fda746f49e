//! # pagelet - component lifecycle runtime
//!
//! A host page is made of independently versioned components, each with
//! server-rendered markup, a client-side controller and CSS. This crate keeps
//! the directory of live components and drives each one through its
//! lifecycle:
//!
//! ```text
//! Load -> Init -> Start <-> Pause
//!                   \        /
//!                    -> Stop -> Dispose
//! ```
//!
//! - [`ComponentRegistry`]: registers placements, joins the CSS and
//!   controller loads, runs the lifecycle hooks and answers tree queries
//! - [`CssRenderer`]: fetches missing CSS for a component version and packs
//!   it into a [`stylepack::StylesheetAllocator`]
//! - [`Controller`]: the optional-hook contract a controller implements
//! - [`Transport`] / [`ModuleLoader`]: the collaborators that fetch payloads
//!
//! Transitions are published on a broadcast channel, see
//! [`ComponentRegistry::subscribe`].

pub mod component;
pub mod config;
pub mod context;
pub mod controller;
pub mod css;
pub mod error;
pub mod lifecycle;
mod log_init;
pub mod registry;
pub mod testing;
pub mod transport;

pub use component::{Component, ComponentDescriptor, CssDependency, InstanceId};
pub use config::RuntimeConfig;
pub use context::{SharedService, Storage, ViewContext, ViewServices};
pub use controller::{Controller, ControllerFactory, ControllerModule, Hooks};
pub use css::{CssRenderer, decorate};
pub use error::{Result, RuntimeError};
pub use lifecycle::{LifecycleState, StateChange};
pub use log_init::init_logger;
pub use registry::{ComponentRegistry, Mounted};
pub use transport::{ComponentMarkup, ModuleLoader, Transport};

// Re-export the log crate so hosts can use pagelet::log::info!, etc.
pub use log;
pub use stylepack;
