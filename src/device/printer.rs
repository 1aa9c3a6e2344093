//! Printer function descriptor

use serde::Serialize;

use super::endpoint::{EndpointAssignment, EndpointRole};
use super::field::IntField;
use super::function::{Accounting, FunctionClass, UsbFunction};
use super::queue::QueueSet;
use crate::ledger::keys::{
    FUNCTION_BULK_OUT_ENDPOINT_NUMBER, FUNCTION_CONFIG_VALUE, FUNCTION_INDEX,
    FUNCTION_INTERFACE_NUMBER, FUNCTION_NUMBER_OF_INTERFACES,
};
use crate::platform::Platform;

/// Printer function
///
/// Uses 1 interface. Only the bulk OUT endpoint number is assigned; the
/// endpoint budget depends on the processor family.
#[derive(Debug, Clone, Serialize)]
pub struct PrinterFunction {
    name: String,
    index: IntField,
    config_value: IntField,
    start_interface: IntField,
    number_of_interfaces: IntField,
    ep_bulk_out: IntField,
    endpoints: EndpointAssignment,
    queues: QueueSet,
    accounting: Accounting,
}

impl PrinterFunction {
    pub fn new(index: u8, platform: &Platform) -> Self {
        Self {
            name: format!("usb_device_printer_{}", index),
            index: IntField::new(FUNCTION_INDEX, "Function Index", index as i64)
                .with_range(0, 16)
                .hidden()
                .read_only(),
            config_value: IntField::new(FUNCTION_CONFIG_VALUE, "Configuration Value", 1)
                .with_range(1, 16)
                .hidden()
                .read_only(),
            start_interface: IntField::new(FUNCTION_INTERFACE_NUMBER, "Start Interface Number", 0)
                .with_min(0)
                .read_only(),
            number_of_interfaces: IntField::new(
                FUNCTION_NUMBER_OF_INTERFACES,
                "Number of Interfaces",
                FunctionClass::Printer.cost(platform).interfaces,
            )
            .with_range(1, 16),
            ep_bulk_out: IntField::new(FUNCTION_BULK_OUT_ENDPOINT_NUMBER, "Bulk OUT Endpoint Number", 1)
                .with_range(1, platform.printer_max_endpoint_number() as i64),
            endpoints: EndpointAssignment::default(),
            queues: QueueSet::new(FunctionClass::Printer.queue_roles()),
            accounting: Accounting::default(),
        }
    }

    /// Highest bulk OUT endpoint number allowed on this platform
    pub fn max_endpoint_number(&self) -> Option<i64> {
        self.ep_bulk_out.max()
    }
}

impl UsbFunction for PrinterFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Printer
    }

    fn index(&self) -> u8 {
        self.index.value() as u8
    }

    fn start_interface(&self) -> i64 {
        self.start_interface.value()
    }

    fn number_of_interfaces(&self) -> i64 {
        self.number_of_interfaces.value()
    }

    fn assign_interfaces(&mut self, start: i64) {
        self.start_interface.assign(start);
    }

    fn endpoints(&self) -> &EndpointAssignment {
        &self.endpoints
    }

    fn assign_endpoints(&mut self, assignment: EndpointAssignment) -> bool {
        let in_range = match assignment.get(EndpointRole::BulkOut) {
            Some(number) => self.ep_bulk_out.assign(number),
            None => true,
        };
        self.endpoints = assignment;
        in_range
    }

    fn queues(&self) -> &QueueSet {
        &self.queues
    }

    fn queues_mut(&mut self) -> &mut QueueSet {
        &mut self.queues
    }

    fn accounting(&self) -> &Accounting {
        &self.accounting
    }

    fn accounting_mut(&mut self) -> &mut Accounting {
        &mut self.accounting
    }
}
