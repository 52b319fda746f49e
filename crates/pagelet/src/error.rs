use thiserror::Error;

use crate::lifecycle::LifecycleState;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Controller module {path} failed to load: {reason}")]
    ControllerLoad { path: String, reason: String },

    #[error("Markup for component {instance_id} could not be fetched: {reason}")]
    Markup { instance_id: String, reason: String },

    #[error("Unknown component instance {0}")]
    UnknownInstance(String),

    #[error("Component {instance_id} cannot move from {from} to {to}")]
    InvalidTransition {
        instance_id: String,
        from: LifecycleState,
        to: LifecycleState,
    },

    #[error("Log file error: {0}")]
    IO(#[from] std::io::Error),

    #[error("A logger was already installed")]
    LoggerInstalled(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
