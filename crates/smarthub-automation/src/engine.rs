//! The automation engine.

use smarthub_protocol::{Address, Body, Command, EnvSensorProps, Payload, SwitchProps};
use smarthub_registry::{Device, DeviceRegistry};
use tracing::debug;

use crate::{Reason, SetStatusCommand};

/// Plans the `SetStatus` commands implied by a `Status` record.
///
/// Stateless. Everything it needs comes from the registry snapshot passed
/// to [`plan`](Self::plan).
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomationEngine;

impl AutomationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Returns the commands `payload` calls for, in the order they should
    /// be sent.
    ///
    /// Anything that isn't a `Status` from a registered switch or
    /// environment sensor yields no commands. Targets that don't resolve to
    /// a registered device are skipped.
    pub fn plan(&self, registry: &DeviceRegistry, payload: &Payload) -> Vec<SetStatusCommand> {
        if payload.cmd != Command::Status {
            return Vec::new();
        }
        let Some(source) = registry.get(payload.src) else {
            debug!(src = %payload.src, "status from unregistered device, ignoring");
            return Vec::new();
        };

        match (&payload.body, source.switch_props(), source.env_sensor_props()) {
            (Body::BinaryStatus { on }, Some(props), _) => {
                plan_switch(registry, source.address, props, *on)
            }
            (Body::EnvSensorStatus { values }, _, Some(props)) => {
                plan_sensor(registry, source, props, values)
            }
            _ => Vec::new(),
        }
    }
}

/// One command per bound device that resolves, in binding order.
fn plan_switch(
    registry: &DeviceRegistry,
    switch: Address,
    props: &SwitchProps,
    on: bool,
) -> Vec<SetStatusCommand> {
    props
        .devices
        .iter()
        .filter_map(|name| {
            let Some(target) = registry.lookup_by_name(name) else {
                debug!(%switch, %name, "switch bound to unknown device");
                return None;
            };
            Some(command(target, on, Reason::SwitchBinding { switch }))
        })
        .collect()
}

/// Walks the fitted sensors in index order, pairing each with the next
/// reported value, and fires every matching trigger.
fn plan_sensor(
    registry: &DeviceRegistry,
    source: &Device,
    props: &EnvSensorProps,
    values: &[u32],
) -> Vec<SetStatusCommand> {
    let mut commands = Vec::new();

    for (slot, sensor) in props.enabled_sensors().enumerate() {
        let Some(&value) = values.get(slot) else {
            debug!(
                address = %source.address,
                sensor,
                reported = values.len(),
                "fewer values than fitted sensors, stopping"
            );
            break;
        };

        for trigger in props.triggers.iter().filter(|t| t.sensor == sensor) {
            if !trigger.matches(value) {
                continue;
            }
            let Some(target) = registry.lookup_by_name(&trigger.device) else {
                debug!(
                    address = %source.address,
                    target = %trigger.device,
                    "trigger fired for unknown device"
                );
                continue;
            };
            commands.push(command(
                target,
                trigger.on,
                Reason::SensorTrigger {
                    sensor_device: source.address,
                    sensor,
                    value,
                    threshold: trigger.threshold,
                },
            ));
        }
    }

    commands
}

fn command(target: &Device, on: bool, reason: Reason) -> SetStatusCommand {
    SetStatusCommand {
        address: target.address,
        dev_type: target.dev_type,
        target: target.name.clone(),
        on,
        reason,
    }
}
