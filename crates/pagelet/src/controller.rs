//! The contract a component's client-side controller fulfils.
//!
//! Every hook is optional. A controller declares which ones it implements
//! through [`Controller::hooks`], and the registry only calls the hooks that
//! are declared.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::context::ViewContext;

bitflags! {
    /// Lifecycle hooks a controller implements.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Hooks: u8 {
        const INIT = 0b0000_0001;
        const START = 0b0000_0010;
        const PAUSE = 0b0000_0100;
        const RESUME = 0b0000_1000;
        const STOP = 0b0001_0000;
        const DESTROY = 0b0010_0000;
    }
}

pub trait Controller: Send {
    /// Hooks this controller wants called. Defaults to none.
    fn hooks(&self) -> Hooks {
        Hooks::empty()
    }

    /// Receives the component's view context once the module has loaded.
    fn bind(&mut self, _view: ViewContext) {}

    fn init(&mut self) {}

    fn start(&mut self) {}

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn stop(&mut self) {}

    fn destroy(&mut self) {}
}

/// Builds a fresh controller for each instance of a module.
pub type ControllerFactory = Arc<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

/// What a module loader hands back for a controller path.
pub enum ControllerModule {
    /// A ready-made controller, used as-is.
    Instance(Box<dyn Controller>),
    /// A constructable type, instantiated once per component.
    Constructor(ControllerFactory),
}

impl ControllerModule {
    pub fn constructor<F, C>(build: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        ControllerModule::Constructor(Arc::new(move || Box::new(build()) as Box<dyn Controller>))
    }

    pub fn instance<C: Controller + 'static>(controller: C) -> Self {
        ControllerModule::Instance(Box::new(controller))
    }

    pub fn instantiate(self) -> Box<dyn Controller> {
        match self {
            ControllerModule::Instance(controller) => controller,
            ControllerModule::Constructor(build) => build(),
        }
    }
}

impl fmt::Debug for ControllerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerModule::Instance(_) => f.write_str("ControllerModule::Instance"),
            ControllerModule::Constructor(_) => f.write_str("ControllerModule::Constructor"),
        }
    }
}

/// Call a hook on `controller` if it declared it.
pub(crate) fn run_hook(controller: &mut dyn Controller, hook: Hooks, call: fn(&mut dyn Controller)) {
    if controller.hooks().contains(hook) {
        call(controller);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        hooks: Hooks,
        calls: Vec<&'static str>,
    }

    impl Controller for Counter {
        fn hooks(&self) -> Hooks {
            self.hooks
        }

        fn init(&mut self) {
            self.calls.push("init");
        }

        fn start(&mut self) {
            self.calls.push("start");
        }
    }

    #[test]
    fn test_undeclared_hooks_are_skipped() {
        let mut c = Counter {
            hooks: Hooks::INIT,
            calls: Vec::new(),
        };
        run_hook(&mut c, Hooks::INIT, |c| c.init());
        run_hook(&mut c, Hooks::START, |c| c.start());
        assert_eq!(c.calls, vec!["init"]);
    }

    #[test]
    fn test_constructor_builds_fresh_instances() {
        let module = ControllerModule::constructor(|| Counter {
            hooks: Hooks::all(),
            calls: Vec::new(),
        });
        assert!(format!("{module:?}").contains("Constructor"));

        let ControllerModule::Constructor(build) = module else {
            panic!("expected a constructor");
        };
        let first = ControllerModule::Constructor(build.clone()).instantiate();
        let second = ControllerModule::Constructor(build).instantiate();
        assert_eq!(first.hooks(), Hooks::all());
        assert_eq!(second.hooks(), Hooks::all());
    }
}
