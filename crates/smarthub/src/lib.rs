//! # smarthub
//!
//! Client for a smart-home hub that speaks a compact binary protocol over
//! a store-and-forward HTTP transport.
//!
//! The client discovers devices, keeps a registry of what they can do,
//! polls for status changes and runs simple reactive automation: switches
//! that fan out to the devices bound to them, and environment-sensor
//! triggers that switch devices on or off.
//!
//! ## Crates
//!
//! | Crate | Role |
//! |---|---|
//! | `smarthub-protocol` | VarInt, CRC8, framing, payload grammar |
//! | `smarthub-transport` | [`Transport`](smarthub_transport::Transport) trait, HTTP implementation |
//! | `smarthub-registry` | address and name indices over known devices |
//! | `smarthub-tick` | virtual-time response window |
//! | `smarthub-automation` | status records → `SetStatus` commands |
//! | `smarthub` (this crate) | [`HubClient`] session loop, config, CLI |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smarthub::prelude::*;
//!
//! # async fn demo() -> Result<(), HubError> {
//! let transport = HttpTransport::new("http://localhost:9998")?;
//! let mut client = HubClientBuilder::new(parse_hub_address("ef0")?).build(transport);
//! let summary = client.run().await?;
//! println!("{} devices at shutdown", summary.devices);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod round;

pub use client::{HubClient, HubClientBuilder, SessionStats, SessionSummary};
pub use config::{HttpConfig, HubConfig, parse_hub_address};
pub use error::HubError;
pub use round::{IDLE_BODY, Round, RoundOutcome, RoundState};

/// Everything needed to run a session.
pub mod prelude {
    pub use crate::{
        HttpConfig, HubClient, HubClientBuilder, HubConfig, HubError, SessionStats,
        SessionSummary, parse_hub_address,
    };
    pub use smarthub_automation::{AutomationEngine, SetStatusCommand};
    pub use smarthub_protocol::{Address, DeviceType, Payload};
    pub use smarthub_registry::{Device, DeviceRegistry};
    pub use smarthub_tick::WindowConfig;
    pub use smarthub_transport::{Transport, TransportError, TransportResponse};
    #[cfg(feature = "http")]
    pub use smarthub_transport::HttpTransport;
}
