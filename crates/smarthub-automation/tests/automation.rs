//! Integration tests for the automation engine against a real registry.

use smarthub_automation::{AutomationEngine, Reason, SetStatusCommand};
use smarthub_protocol::{
    Address, Body, Command, DeviceProps, DeviceType, EnvSensorProps, Payload, SwitchProps,
    Trigger,
};
use smarthub_registry::{Device, DeviceRegistry};

// =========================================================================
// Helpers
// =========================================================================

fn addr(raw: u16) -> Address {
    Address::new(raw).unwrap()
}

fn device(address: u16, name: &str, dev_type: DeviceType, props: Option<DeviceProps>) -> Device {
    Device {
        name: name.into(),
        address: addr(address),
        dev_type,
        props,
    }
}

fn status(src: u16, dev_type: DeviceType, body: Body) -> Payload {
    Payload {
        src: addr(src),
        dst: Address::BROADCAST,
        serial: 1,
        dev_type,
        cmd: Command::Status,
        body,
    }
}

fn trigger(sensor: u8, compare_greater: bool, threshold: u32, on: bool, device: &str) -> Trigger {
    Trigger {
        on,
        compare_greater,
        sensor,
        threshold,
        device: device.into(),
    }
}

fn sensor_registry(sensors: [bool; 4], triggers: Vec<Trigger>) -> DeviceRegistry {
    let mut registry = DeviceRegistry::new();
    registry.upsert(device(
        2,
        "SENSOR",
        DeviceType::EnvSensor,
        Some(DeviceProps::EnvSensor(EnvSensorProps { sensors, triggers })),
    ));
    registry.upsert(device(10, "X", DeviceType::Lamp, None));
    registry.upsert(device(11, "Y", DeviceType::Socket, None));
    registry
}

fn sensor_status(values: Vec<u32>) -> Payload {
    status(2, DeviceType::EnvSensor, Body::EnvSensorStatus { values })
}

fn targets(commands: &[SetStatusCommand]) -> Vec<(&str, bool)> {
    commands.iter().map(|c| (c.target.as_str(), c.on)).collect()
}

// =========================================================================
// Sensor triggers
// =========================================================================

#[test]
fn test_trigger_fires_on_positional_value() {
    // Sensors 0 and 2 fitted, so values [10, 30] are sensor 0 = 10 and
    // sensor 2 = 30.
    let registry = sensor_registry(
        [true, false, true, false],
        vec![trigger(2, true, 25, true, "X")],
    );

    let commands = AutomationEngine::new().plan(&registry, &sensor_status(vec![10, 30]));

    assert_eq!(
        commands,
        vec![SetStatusCommand {
            address: addr(10),
            dev_type: DeviceType::Lamp,
            target: "X".into(),
            on: true,
            reason: Reason::SensorTrigger {
                sensor_device: addr(2),
                sensor: 2,
                value: 30,
                threshold: 25,
            },
        }]
    );
}

#[test]
fn test_trigger_comparison_is_strict() {
    let registry = sensor_registry(
        [true, false, false, false],
        vec![trigger(0, true, 25, true, "X"), trigger(0, false, 25, false, "Y")],
    );

    let at_threshold = AutomationEngine::new().plan(&registry, &sensor_status(vec![25]));
    assert!(at_threshold.is_empty());

    let below = AutomationEngine::new().plan(&registry, &sensor_status(vec![24]));
    assert_eq!(targets(&below), vec![("Y", false)]);
}

#[test]
fn test_trigger_for_other_sensor_is_ignored() {
    let registry = sensor_registry(
        [true, true, false, false],
        vec![trigger(1, true, 5, true, "X")],
    );

    // Sensor 0 reads 100, sensor 1 reads 1: only sensor 1 is watched.
    let commands = AutomationEngine::new().plan(&registry, &sensor_status(vec![100, 1]));

    assert!(commands.is_empty());
}

#[test]
fn test_triggers_fire_in_sensor_then_declaration_order() {
    let registry = sensor_registry(
        [true, true, false, false],
        vec![
            trigger(1, true, 0, false, "Y"),
            trigger(0, true, 0, true, "X"),
            trigger(1, true, 0, true, "X"),
        ],
    );

    let commands = AutomationEngine::new().plan(&registry, &sensor_status(vec![1, 1]));

    assert_eq!(targets(&commands), vec![("X", true), ("Y", false), ("X", true)]);
}

#[test]
fn test_trigger_with_unregistered_target_is_skipped() {
    let registry = sensor_registry(
        [true, false, false, false],
        vec![trigger(0, true, 0, true, "ghost"), trigger(0, true, 0, true, "X")],
    );

    let commands = AutomationEngine::new().plan(&registry, &sensor_status(vec![1]));

    assert_eq!(targets(&commands), vec![("X", true)]);
}

#[test]
fn test_missing_values_stop_evaluation() {
    // Three sensors fitted but only two values reported.
    let registry = sensor_registry(
        [true, true, true, false],
        vec![trigger(0, true, 0, true, "X"), trigger(2, true, 0, true, "Y")],
    );

    let commands = AutomationEngine::new().plan(&registry, &sensor_status(vec![5, 5]));

    assert_eq!(targets(&commands), vec![("X", true)]);
}

// =========================================================================
// Switch fan-out
// =========================================================================

fn switch_registry() -> DeviceRegistry {
    let mut registry = DeviceRegistry::new();
    registry.upsert(device(
        3,
        "SW1",
        DeviceType::Switch,
        Some(DeviceProps::Switch(SwitchProps {
            devices: vec!["lamp1".into(), "ghost".into(), "socket1".into()],
        })),
    ));
    registry.upsert(device(4, "lamp1", DeviceType::Lamp, None));
    registry.upsert(device(5, "socket1", DeviceType::Socket, None));
    registry
}

#[test]
fn test_switch_fans_out_in_binding_order() {
    let registry = switch_registry();

    let commands = AutomationEngine::new().plan(
        &registry,
        &status(3, DeviceType::Switch, Body::BinaryStatus { on: true }),
    );

    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].address, addr(4));
    assert_eq!(commands[0].dev_type, DeviceType::Lamp);
    assert_eq!(commands[1].address, addr(5));
    assert_eq!(commands[1].dev_type, DeviceType::Socket);
    assert!(commands.iter().all(|c| c.on));
    assert!(commands
        .iter()
        .all(|c| c.reason == Reason::SwitchBinding { switch: addr(3) }));
}

#[test]
fn test_switch_off_propagates_off() {
    let registry = switch_registry();

    let commands = AutomationEngine::new().plan(
        &registry,
        &status(3, DeviceType::Switch, Body::BinaryStatus { on: false }),
    );

    assert_eq!(targets(&commands), vec![("lamp1", false), ("socket1", false)]);
}

// =========================================================================
// Ignored inputs
// =========================================================================

#[test]
fn test_status_from_unknown_device_yields_nothing() {
    let registry = switch_registry();
    let payload = status(99, DeviceType::Switch, Body::BinaryStatus { on: true });
    assert!(AutomationEngine::new().plan(&registry, &payload).is_empty());
}

#[test]
fn test_lamp_status_yields_nothing() {
    let registry = switch_registry();
    let payload = status(4, DeviceType::Lamp, Body::BinaryStatus { on: true });
    assert!(AutomationEngine::new().plan(&registry, &payload).is_empty());
}

#[test]
fn test_non_status_command_yields_nothing() {
    let registry = switch_registry();
    let mut payload = status(3, DeviceType::Switch, Body::BinaryStatus { on: true });
    payload.cmd = Command::SetStatus;
    assert!(AutomationEngine::new().plan(&registry, &payload).is_empty());
}
