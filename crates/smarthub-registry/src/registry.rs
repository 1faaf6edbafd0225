//! The device registry: every device currently believed to be present.
//!
//! `DeviceRegistry` is a plain owned structure with no interior locking.
//! It is owned by the session controller and only ever touched from its
//! single task.

use std::collections::HashMap;

use smarthub_protocol::Address;

use crate::Device;

/// Devices indexed by address, with a secondary index by name.
///
/// ## Invariants
///
/// - Every name in the name index resolves to an address present in the
///   address index.
/// - An address is indexed under at most one name.
///
/// Names are not required to be unique on the network. When two devices
/// announce the same name, the later announcement owns the name and the
/// earlier device stays reachable by address only.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    /// All known devices, keyed by address.
    devices: HashMap<Address, Device>,

    /// Index from device name to address. Kept in sync with `devices`.
    names: HashMap<String, Address>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the device at `device.address`.
    ///
    /// Returns the entry that was replaced, if any.
    pub fn upsert(&mut self, device: Device) -> Option<Device> {
        let address = device.address;
        let name = device.name.clone();

        let previous = self.devices.insert(address, device);

        // A renamed device must not leave its old name behind.
        if let Some(old) = &previous {
            if old.name != name && self.names.get(&old.name) == Some(&address) {
                self.names.remove(&old.name);
            }
        }

        if let Some(other) = self.names.insert(name.clone(), address) {
            if other != address {
                tracing::warn!(
                    %name,
                    %address,
                    previous = %other,
                    "device name already taken, newer announcement wins"
                );
            }
        }

        match &previous {
            Some(_) => tracing::debug!(%address, %name, "device re-announced"),
            None => tracing::info!(%address, %name, "device registered"),
        }

        previous
    }

    pub fn get(&self, address: Address) -> Option<&Device> {
        self.devices.get(&address)
    }

    /// Looks up a device by the name it announced.
    pub fn lookup_by_name(&self, name: &str) -> Option<&Device> {
        self.address_of(name).and_then(|a| self.devices.get(&a))
    }

    pub fn address_of(&self, name: &str) -> Option<Address> {
        self.names.get(name).copied()
    }

    /// Removes the device at `address` along with its name entry.
    pub fn remove(&mut self, address: Address) -> Option<Device> {
        let device = self.devices.remove(&address)?;

        // Only drop the name if it still points here; a newer device may
        // have taken it over.
        if self.names.get(&device.name) == Some(&address) {
            self.names.remove(&device.name);
        }

        tracing::info!(%address, name = %device.name, "device removed");
        Some(device)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.devices.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Iterates over all devices in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// All registered addresses in ascending order.
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<_> = self.devices.keys().copied().collect();
        addresses.sort_unstable();
        addresses
    }
}

// =========================================================================
// Tests
// =========================================================================
