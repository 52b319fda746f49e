//! Component identity and the descriptors placements are registered from.

use smallvec::SmallVec;

use crate::lifecycle::LifecycleState;

/// Globally unique identifier for one placed component.
pub type InstanceId = String;

/// One CSS file a component depends on.
///
/// `rule_count` is declared by the server and used as-is for capacity
/// accounting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssDependency {
    pub path: String,
    pub rule_count: usize,
    /// Media query the file's rules apply under, if any.
    pub media: Option<String>,
}

impl CssDependency {
    pub fn new(path: impl Into<String>, rule_count: usize) -> Self {
        Self {
            path: path.into(),
            rule_count,
            media: None,
        }
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

impl AsRef<str> for CssDependency {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

/// Everything needed to place and load one component instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub instance_id: InstanceId,
    pub static_id: String,
    pub module_id: String,
    pub version: String,
    pub container_id: String,
    pub controller_path: String,
    pub css_deps: Vec<CssDependency>,
    pub parent_instance_id: Option<InstanceId>,
}

impl ComponentDescriptor {
    pub fn new(
        instance_id: impl Into<InstanceId>,
        module_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let module_id = module_id.into();
        let version = version.into();
        Self {
            instance_id: instance_id.into(),
            static_id: String::new(),
            controller_path: format!("{module_id}/{version}/controller"),
            module_id,
            version,
            container_id: String::new(),
            css_deps: Vec::new(),
            parent_instance_id: None,
        }
    }

    pub fn with_static_id(mut self, static_id: impl Into<String>) -> Self {
        self.static_id = static_id.into();
        self
    }

    pub fn with_container_id(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = container_id.into();
        self
    }

    pub fn with_controller_path(mut self, path: impl Into<String>) -> Self {
        self.controller_path = path.into();
        self
    }

    pub fn with_css(mut self, dep: CssDependency) -> Self {
        self.css_deps.push(dep);
        self
    }

    pub fn with_parent(mut self, parent: impl Into<InstanceId>) -> Self {
        self.parent_instance_id = Some(parent.into());
        self
    }

    /// Key shared by every instance of the same module version.
    pub fn full_id(&self) -> String {
        full_id(&self.module_id, &self.version)
    }
}

pub(crate) fn full_id(module_id: &str, version: &str) -> String {
    format!("{module_id}@{version}")
}

/// A snapshot of one live component as the directory sees it.
///
/// The controller itself stays inside the registry; this value only records
/// whether one has been bound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub instance_id: InstanceId,
    pub static_id: String,
    pub module_id: String,
    pub version: String,
    pub container_id: String,
    pub(crate) state: LifecycleState,
    pub(crate) bound: bool,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) children: SmallVec<[InstanceId; 4]>,
}

impl Component {
    pub(crate) fn from_descriptor(descriptor: &ComponentDescriptor) -> Self {
        Self {
            instance_id: descriptor.instance_id.clone(),
            static_id: descriptor.static_id.clone(),
            module_id: descriptor.module_id.clone(),
            version: descriptor.version.clone(),
            container_id: descriptor.container_id.clone(),
            state: LifecycleState::Load,
            bound: false,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether a controller has been loaded and bound.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Child instance ids in placement order.
    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    pub fn full_id(&self) -> String {
        full_id(&self.module_id, &self.version)
    }

    pub(crate) fn add_child(&mut self, child: &str) {
        if !self.children.iter().any(|c| c == child) {
            self.children.push(child.to_string());
        }
    }

    pub(crate) fn remove_child(&mut self, child: &str) {
        self.children.retain(|c| c != child);
    }
}
