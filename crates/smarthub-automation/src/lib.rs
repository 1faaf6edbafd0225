//! Reactive automation for smarthub.
//!
//! Turns incoming `Status` records into the `SetStatus` commands they
//! imply:
//!
//! - **Switch fan-out**: a switch reporting on/off puts every device bound
//!   to it into the same state.
//! - **Sensor triggers**: an environment sensor reading that crosses a
//!   trigger's threshold switches the trigger's target on or off.
//!
//! The engine only *plans*. It reads the registry and returns commands;
//! sending them (and noticing that a target vanished in the meantime) is
//! the session controller's job.
//!
//! # Key types
//!
//! - [`AutomationEngine`]: `plan(&registry, &payload) -> Vec<SetStatusCommand>`
//! - [`SetStatusCommand`]: one device to switch, and why

mod command;
mod engine;

pub use command::{Reason, SetStatusCommand};
pub use engine::AutomationEngine;
