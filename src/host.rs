//! USB Host layer settings

use serde::Serialize;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::device::class::ParameterEvent;
use crate::device::field::IntField;
use crate::error::{AppError, Result};
use crate::ledger::keys::{
    DRIVER_SCOPE, HOST_DEVICE_NUMBER, HOST_MAX_INTERFACES, HOST_SCOPE, HOST_TPL_ENTRY_NUMBER,
    HOST_TRANSFERS_NUMBER, OPERATION_MODE,
};
use crate::ledger::{Ledger, LedgerExt, Value};

/// Dependency id under which the USB driver connects to the host layer
pub const DRIVER_DEPENDENCY_ID: &str = "usb_driver_dependency";

/// Driver operation mode that enables the host layer settings
pub const HOST_MODE: &str = "Host";

/// USB Host layer component
#[derive(Debug, Clone, Serialize)]
pub struct HostLayer {
    device_number: IntField,
    tpl_entries: IntField,
    max_interfaces: IntField,
    max_transfers: IntField,
}

impl HostLayer {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            device_number: IntField::new(
                HOST_DEVICE_NUMBER,
                "Maximum Number of Devices",
                config.max_devices,
            )
            .with_min(1)
            .hidden(),
            tpl_entries: IntField::new(
                HOST_TPL_ENTRY_NUMBER,
                "Number of TPL Entries",
                config.tpl_entries,
            )
            .with_min(1),
            max_interfaces: IntField::new(
                HOST_MAX_INTERFACES,
                "Maximum Interfaces per Device",
                config.max_interfaces,
            )
            .with_min(1),
            max_transfers: IntField::new(
                HOST_TRANSFERS_NUMBER,
                "Maximum Number of Transfers",
                config.max_transfers,
            )
            .with_min(1),
        }
    }

    fn fields(&self) -> [&IntField; 4] {
        [
            &self.device_number,
            &self.tpl_entries,
            &self.max_interfaces,
            &self.max_transfers,
        ]
    }

    fn fields_mut(&mut self) -> [&mut IntField; 4] {
        [
            &mut self.device_number,
            &mut self.tpl_entries,
            &mut self.max_interfaces,
            &mut self.max_transfers,
        ]
    }

    /// Create the host layer scope and publish every setting
    pub fn instantiate<L: Ledger + ?Sized>(&self, ledger: &mut L) {
        ledger.activate(HOST_SCOPE);
        for field in self.fields() {
            ledger.replace(HOST_SCOPE, field.id(), Value::Int(field.value()));
        }
        info!("USB Host layer instantiated");
    }

    /// Current value of a setting
    pub fn value(&self, id: &str) -> Option<i64> {
        self.fields()
            .into_iter()
            .find(|f| f.id() == id)
            .map(|f| f.value())
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.fields()
            .into_iter()
            .find(|f| f.id() == id)
            .map(|f| f.is_visible())
    }

    /// Settings are shown only while the driver runs in host mode
    pub fn on_operation_mode_changed(&mut self, mode: &str) {
        let visible = mode == HOST_MODE;
        for field in self.fields_mut() {
            field.set_visible(visible);
        }
        debug!("Host settings visible: {}", visible);
    }

    /// Put the driver into host mode when it connects as our dependency
    ///
    /// Returns whether the driver mode was written.
    pub fn on_dependent_component_added<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        dependency_id: &str,
    ) -> bool {
        if dependency_id != DRIVER_DEPENDENCY_ID {
            return false;
        }
        ledger.replace(DRIVER_SCOPE, OPERATION_MODE, Value::from(HOST_MODE));
        info!("{} set to {}", OPERATION_MODE, HOST_MODE);
        true
    }

    /// Edit one setting and publish it
    pub fn set_parameter<L: Ledger + ?Sized>(
        &mut self,
        ledger: &mut L,
        event: &ParameterEvent,
    ) -> Result<()> {
        let field = self
            .fields_mut()
            .into_iter()
            .find(|f| f.id() == event.id)
            .ok_or_else(|| AppError::NotFound(format!("host setting {}", event.id)))?;
        field.set(event.value)?;
        ledger.replace(HOST_SCOPE, field.id(), Value::Int(field.value()));
        Ok(())
    }
}

impl Default for HostLayer {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    #[test]
    fn test_instantiate_publishes_defaults() {
        let mut ledger = MemoryLedger::new();
        let host = HostLayer::default();
        host.instantiate(&mut ledger);

        assert!(ledger.is_active(HOST_SCOPE));
        assert_eq!(ledger.read_int(HOST_SCOPE, HOST_DEVICE_NUMBER).unwrap(), 1);
        assert_eq!(ledger.read_int(HOST_SCOPE, HOST_TPL_ENTRY_NUMBER).unwrap(), 1);
        assert_eq!(ledger.read_int(HOST_SCOPE, HOST_MAX_INTERFACES).unwrap(), 5);
        assert_eq!(ledger.read_int(HOST_SCOPE, HOST_TRANSFERS_NUMBER).unwrap(), 10);
    }

    #[test]
    fn test_visibility_follows_operation_mode() {
        let mut host = HostLayer::default();
        assert_eq!(host.is_visible(HOST_DEVICE_NUMBER), Some(false));
        assert_eq!(host.is_visible(HOST_TRANSFERS_NUMBER), Some(true));

        host.on_operation_mode_changed("Device");
        assert_eq!(host.is_visible(HOST_TRANSFERS_NUMBER), Some(false));

        host.on_operation_mode_changed(HOST_MODE);
        assert_eq!(host.is_visible(HOST_DEVICE_NUMBER), Some(true));
        assert_eq!(host.is_visible("CONFIG_UNKNOWN"), None);
    }

    #[test]
    fn test_driver_dependency_sets_host_mode() {
        let mut ledger = MemoryLedger::new();
        let host = HostLayer::default();

        assert!(!host.on_dependent_component_added(&mut ledger, "other_dependency"));
        assert!(ledger.get(DRIVER_SCOPE, OPERATION_MODE).is_none());

        assert!(host.on_dependent_component_added(&mut ledger, DRIVER_DEPENDENCY_ID));
        assert_eq!(
            ledger.get(DRIVER_SCOPE, OPERATION_MODE),
            Some(Value::Str("Host".to_string()))
        );
        assert_eq!(ledger.priority(DRIVER_SCOPE, OPERATION_MODE), Some(2));
    }

    #[test]
    fn test_set_parameter() {
        let mut ledger = MemoryLedger::new();
        let mut host = HostLayer::default();
        host.instantiate(&mut ledger);

        host.set_parameter(&mut ledger, &ParameterEvent::new(HOST_TRANSFERS_NUMBER, 20))
            .unwrap();
        assert_eq!(host.value(HOST_TRANSFERS_NUMBER), Some(20));
        assert_eq!(ledger.read_int(HOST_SCOPE, HOST_TRANSFERS_NUMBER).unwrap(), 20);

        assert!(host
            .set_parameter(&mut ledger, &ParameterEvent::new(HOST_MAX_INTERFACES, 0))
            .is_err());
        assert!(host
            .set_parameter(&mut ledger, &ParameterEvent::new("CONFIG_UNKNOWN", 1))
            .is_err());
    }
}
