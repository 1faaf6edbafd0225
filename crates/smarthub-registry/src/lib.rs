//! Device registry for smarthub.
//!
//! Tracks every device the hub client currently believes is on the
//! network, indexed both by address (how the wire identifies devices) and
//! by name (how switches and sensor triggers refer to them).
//!
//! # How it fits in the stack
//!
//! ```text
//! Automation (above)  ← resolves trigger/switch targets by name
//!     ↕
//! Registry (this crate)  ← address and name indices over Device
//!     ↕
//! Protocol (below)  ← provides Address, DeviceType, DeviceProps
//! ```

mod device;
mod registry;

pub use device::Device;
pub use registry::DeviceRegistry;
