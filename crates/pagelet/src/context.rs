//! Per-component view context handed to a controller when it is bound.
//!
//! The `ViewContext` bundles what a controller may use while it lives on the
//! page:
//! - The instance id of the component it belongs to
//! - A private key/value storage created fresh for every binding
//! - The host's messaging bus and socket services, shared across components

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::component::InstanceId;

/// An opaque host service shared with every view context.
pub type SharedService = Arc<dyn Any + Send + Sync>;

/// Host services the registry copies into each new view context.
#[derive(Clone, Default)]
pub struct ViewServices {
    messaging: Option<SharedService>,
    sockets: Option<SharedService>,
}

impl ViewServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messaging<T: Any + Send + Sync>(mut self, bus: T) -> Self {
        self.messaging = Some(Arc::new(bus));
        self
    }

    pub fn with_sockets<T: Any + Send + Sync>(mut self, sockets: T) -> Self {
        self.sockets = Some(Arc::new(sockets));
        self
    }
}

impl fmt::Debug for ViewServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewServices")
            .field("messaging", &self.messaging.is_some())
            .field("sockets", &self.sockets.is_some())
            .finish()
    }
}

/// Key/value storage private to one component binding.
///
/// Clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct Storage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl Storage {
    pub fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

/// Context bound to a controller.
///
/// Clone this context to share it with async tasks the controller spawns.
#[derive(Clone)]
pub struct ViewContext {
    instance_id: InstanceId,
    storage: Storage,
    messaging: Option<SharedService>,
    sockets: Option<SharedService>,
}

impl ViewContext {
    /// Create a context for `instance_id` with fresh storage.
    pub fn new(instance_id: impl Into<InstanceId>, services: &ViewServices) -> Self {
        Self {
            instance_id: instance_id.into(),
            storage: Storage::default(),
            messaging: services.messaging.clone(),
            sockets: services.sockets.clone(),
        }
    }

    /// The component this context belongs to.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The messaging bus, if the host provided one of type `T`.
    pub fn messaging<T: Any>(&self) -> Option<&T> {
        self.messaging.as_deref()?.downcast_ref::<T>()
    }

    /// The socket service, if the host provided one of type `T`.
    pub fn sockets<T: Any>(&self) -> Option<&T> {
        self.sockets.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("instance_id", &self.instance_id)
            .field("messaging", &self.messaging.is_some())
            .field("sockets", &self.sockets.is_some())
            .finish()
    }
}
