//! Component lifecycle states and the notifications fired on each move.

use std::fmt;

use crate::component::InstanceId;

/// Where a component is in its life on the page.
///
/// States only move forward through the declaration order, with one
/// exception: `Pause` may return to `Start`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleState {
    #[default]
    Load,
    Init,
    Start,
    Pause,
    Stop,
    Dispose,
}

impl LifecycleState {
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        match (self, next) {
            (Dispose, _) => false,
            (_, Dispose) => true,
            (Load, Init) | (Init, Start) => true,
            (Start, Pause) | (Pause, Start) => true,
            (Start, Stop) | (Pause, Stop) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Dispose
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Load => "load",
            LifecycleState::Init => "init",
            LifecycleState::Start => "start",
            LifecycleState::Pause => "pause",
            LifecycleState::Stop => "stop",
            LifecycleState::Dispose => "dispose",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broadcast on every lifecycle transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub instance_id: InstanceId,
    pub module_id: String,
    pub state: LifecycleState,
}
