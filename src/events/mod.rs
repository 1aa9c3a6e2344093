//! Host event replay
//!
//! The configuration host drives every component through events: component
//! creation and removal, attach/detach to the device stack, and watched-field
//! changes. Recording these as JSON and replaying them reproduces a project's
//! ledger state outside the host.

pub mod types;

pub use types::{Component, EventOutcome, HostEvent};

use std::path::Path;
use tracing::{debug, error};

use crate::device::accountant::UpdateReport;
use crate::device::class::ParameterEvent;
use crate::device::manager::DeviceStackManager;
use crate::error::Result;
use crate::host::{HostLayer, HOST_MODE};
use crate::ledger::keys::HOST_SCOPE;
use crate::ledger::Ledger;

/// Load a JSON array of host events
pub fn load_events(path: &Path) -> Result<Vec<HostEvent>> {
    let content = std::fs::read_to_string(path)?;
    let events = serde_json::from_str(&content)?;
    Ok(events)
}

fn outcome_of(event: &HostEvent, target: &str, report: Option<&UpdateReport>) -> EventOutcome {
    EventOutcome {
        event: event.event_name(),
        target: Some(target.to_string()),
        skipped: report
            .map(|r| r.skipped_steps().map(|(step, _)| step).collect())
            .unwrap_or_default(),
    }
}

/// Apply one event to the device stack and the host layer
pub fn apply<L: Ledger>(
    manager: &mut DeviceStackManager<L>,
    host: &mut HostLayer,
    event: &HostEvent,
) -> Result<EventOutcome> {
    debug!("Applying {:?}", event);
    let outcome = match event {
        HostEvent::Instantiate { component } => match component.function_class() {
            Some(class) => {
                let name = manager.add(class)?;
                outcome_of(event, &name, None)
            }
            None => {
                host.instantiate(manager.ledger_mut());
                outcome_of(event, HOST_SCOPE, None)
            }
        },
        HostEvent::Attach { name } => {
            let report = manager.attach(name)?;
            outcome_of(event, name, Some(&report))
        }
        HostEvent::Detach { name } => {
            let report = manager.detach(name)?;
            outcome_of(event, name, Some(&report))
        }
        HostEvent::Remove { name } => {
            let report = manager.remove(name)?;
            outcome_of(event, name, report.as_ref())
        }
        HostEvent::SetParameter { name, id, value } => {
            let parameter = ParameterEvent::new(id, *value);
            if name == HOST_SCOPE {
                host.set_parameter(manager.ledger_mut(), &parameter)?;
            } else {
                manager.set_parameter(name, &parameter)?;
            }
            outcome_of(event, name, None)
        }
        HostEvent::SetUseIad { name, use_iad } => {
            manager.set_use_iad(name, *use_iad)?;
            outcome_of(event, name, None)
        }
        HostEvent::OperationModeChanged { mode } => {
            host.on_operation_mode_changed(mode);
            outcome_of(event, HOST_SCOPE, None)
        }
        HostEvent::DependentComponentAdded { id } => {
            // Writing the driver mode fires the mode watchers as well
            if host.on_dependent_component_added(manager.ledger_mut(), id) {
                host.on_operation_mode_changed(HOST_MODE);
            }
            outcome_of(event, id, None)
        }
    };
    Ok(outcome)
}

/// Apply events in order, stopping at the first failure
pub fn replay<L: Ledger>(
    manager: &mut DeviceStackManager<L>,
    host: &mut HostLayer,
    events: &[HostEvent],
) -> Result<Vec<EventOutcome>> {
    let mut outcomes = Vec::with_capacity(events.len());
    for (index, event) in events.iter().enumerate() {
        match apply(manager, host, event) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!("Event #{} ({}) failed: {}", index, event.event_name(), e);
                return Err(e);
            }
        }
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::accountant::Step;
    use crate::ledger::keys::{
        DEVICE_SCOPE, DRIVER_SCOPE, FUNCTIONS_NUMBER, HOST_TRANSFERS_NUMBER, OPERATION_MODE,
    };
    use crate::ledger::{LedgerExt, MemoryLedger, Value};
    use crate::platform::Platform;
    use std::io::Write;

    fn attach(name: &str) -> HostEvent {
        HostEvent::Attach {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_replay_device_scenario() {
        let mut manager = DeviceStackManager::default();
        let mut host = HostLayer::default();
        let events = vec![
            HostEvent::Instantiate {
                component: Component::Cdc,
            },
            HostEvent::Instantiate {
                component: Component::Printer,
            },
            attach("usb_device_cdc_0"),
            attach("usb_device_printer_0"),
            HostEvent::Remove {
                name: "usb_device_printer_0".to_string(),
            },
        ];

        let outcomes = replay(&mut manager, &mut host, &events).unwrap();
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[0].target.as_deref(), Some("usb_device_cdc_0"));
        assert!(outcomes.iter().all(|o| o.skipped.is_empty()));

        let totals = manager.totals().unwrap();
        assert_eq!(totals.function_count, 1);
        assert_eq!(totals.config_descriptor_size, 58);
    }

    #[test]
    fn test_replay_reports_skipped_steps() {
        let mut manager = DeviceStackManager::new(MemoryLedger::new(), Platform::default());
        let mut host = HostLayer::default();
        manager.add_cdc().unwrap();
        // Function count not initialized yet
        manager.ledger_mut().clear(DEVICE_SCOPE, FUNCTIONS_NUMBER);

        let outcome = apply(&mut manager, &mut host, &attach("usb_device_cdc_0")).unwrap();
        assert!(outcome.skipped.contains(&Step::FunctionCount));
    }

    #[test]
    fn test_replay_host_layer() {
        let mut manager = DeviceStackManager::default();
        let mut host = HostLayer::default();
        let events = vec![
            HostEvent::Instantiate {
                component: Component::Host,
            },
            HostEvent::DependentComponentAdded {
                id: "usb_driver_dependency".to_string(),
            },
            HostEvent::SetParameter {
                name: "usb_host".to_string(),
                id: HOST_TRANSFERS_NUMBER.to_string(),
                value: 12,
            },
        ];
        replay(&mut manager, &mut host, &events).unwrap();

        let ledger = manager.ledger();
        assert_eq!(
            ledger.get(DRIVER_SCOPE, OPERATION_MODE),
            Some(Value::from("Host"))
        );
        assert_eq!(ledger.read_int(HOST_SCOPE, HOST_TRANSFERS_NUMBER).unwrap(), 12);
        assert_eq!(host.is_visible(HOST_TRANSFERS_NUMBER), Some(true));
    }

    #[test]
    fn test_replay_stops_at_failure() {
        let mut manager = DeviceStackManager::default();
        let mut host = HostLayer::default();
        let events = vec![
            attach("usb_device_cdc_7"),
            HostEvent::Instantiate {
                component: Component::Cdc,
            },
        ];
        assert!(replay(&mut manager, &mut host, &events).is_err());
        assert_eq!(manager.functions().count(), 0);
    }

    #[test]
    fn test_load_events() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"event": "instantiate", "data": {{"component": "cdc"}}}},
                {{"event": "attach", "data": {{"name": "usb_device_cdc_0"}}}},
                {{"event": "set_use_iad", "data": {{"name": "usb_device_cdc_0", "use_iad": true}}}}
            ]"#
        )
        .unwrap();

        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], attach("usb_device_cdc_0"));
    }
}
