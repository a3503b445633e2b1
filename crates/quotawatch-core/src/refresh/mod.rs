//! Refresh scheduling: the controller state machine, its backoff policy and
//! the async runner that executes its commands.

pub mod backoff;
pub mod controller;
pub mod runner;

pub use backoff::{backoff_delay, base_backoff, fetch_timeout, MAX_BACKOFF_STEP, MIN_FETCH_TIMEOUT};
pub use controller::{
    Command, Controller, ControllerConfig, ControllerState, ControllerView, Event, FetchToken,
    Trigger,
};
pub use runner::{ControlMessage, RefreshHandle, RefreshRunner, ViewReceiver, ViewSender};
