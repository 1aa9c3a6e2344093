//! CDC (serial) function descriptor

use serde::Serialize;

use super::endpoint::{EndpointAssignment, EndpointRole};
use super::field::{BoolField, IntField};
use super::function::{Accounting, FunctionClass, UsbFunction};
use super::queue::QueueSet;
use crate::ledger::keys::{
    FUNCTION_BULK_IN_ENDPOINT_NUMBER, FUNCTION_BULK_OUT_ENDPOINT_NUMBER, FUNCTION_CONFIG_VALUE,
    FUNCTION_INDEX, FUNCTION_INTERFACE_NUMBER, FUNCTION_INT_ENDPOINT_NUMBER,
    FUNCTION_NUMBER_OF_INTERFACES, FUNCTION_USE_IAD,
};

/// Highest endpoint number a CDC endpoint may use
pub const CDC_MAX_ENDPOINT_NUMBER: i64 = 10;

/// CDC ACM function
///
/// Uses 2 interfaces (communication + data) and 3 endpoints:
/// interrupt IN, bulk OUT, bulk IN.
#[derive(Debug, Clone, Serialize)]
pub struct CdcFunction {
    name: String,
    index: IntField,
    config_value: IntField,
    start_interface: IntField,
    number_of_interfaces: IntField,
    use_iad: BoolField,
    ep_interrupt: IntField,
    ep_bulk_out: IntField,
    ep_bulk_in: IntField,
    endpoints: EndpointAssignment,
    queues: QueueSet,
    accounting: Accounting,
}

impl CdcFunction {
    pub fn new(index: u8) -> Self {
        Self {
            name: format!("usb_device_cdc_{}", index),
            index: IntField::new(FUNCTION_INDEX, "Function Index", index as i64)
                .with_range(0, 16)
                .hidden(),
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
                2,
            )
            .with_range(1, 16)
            .read_only(),
            use_iad: BoolField::new(
                FUNCTION_USE_IAD,
                "Use Interface Association Descriptor",
                false,
            ),
            ep_interrupt: IntField::new(FUNCTION_INT_ENDPOINT_NUMBER, "Interrupt Endpoint Number", 1)
                .with_range(1, CDC_MAX_ENDPOINT_NUMBER),
            ep_bulk_out: IntField::new(FUNCTION_BULK_OUT_ENDPOINT_NUMBER, "Bulk OUT Endpoint Number", 2)
                .with_range(1, CDC_MAX_ENDPOINT_NUMBER),
            ep_bulk_in: IntField::new(FUNCTION_BULK_IN_ENDPOINT_NUMBER, "Bulk IN Endpoint Number", 3)
                .with_range(1, CDC_MAX_ENDPOINT_NUMBER),
            endpoints: EndpointAssignment::default(),
            queues: QueueSet::new(FunctionClass::Cdc.queue_roles()),
            accounting: Accounting::default(),
        }
    }

    /// Configuration value this function belongs to
    pub fn config_value(&self) -> i64 {
        self.config_value.value()
    }

    fn endpoint_field(&mut self, role: EndpointRole) -> &mut IntField {
        match role {
            EndpointRole::Interrupt => &mut self.ep_interrupt,
            EndpointRole::BulkOut => &mut self.ep_bulk_out,
            EndpointRole::BulkIn => &mut self.ep_bulk_in,
        }
    }
}

impl UsbFunction for CdcFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn class(&self) -> FunctionClass {
        FunctionClass::Cdc
    }

    fn index(&self) -> u8 {
        self.index.value() as u8
    }

    fn use_iad(&self) -> bool {
        self.use_iad.value()
    }

    fn set_use_iad(&mut self, use_iad: bool) -> bool {
        self.use_iad.set(use_iad);
        true
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
        let mut in_range = true;
        for (role, number) in assignment.iter() {
            in_range &= self.endpoint_field(role).assign(number);
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::queue::QueueRole;
    use crate::platform::Platform;

    #[test]
    fn test_cdc_defaults() {
        let cdc = CdcFunction::new(0);
        assert_eq!(cdc.name(), "usb_device_cdc_0");
        assert_eq!(cdc.index(), 0);
        assert_eq!(cdc.config_value(), 1);
        assert_eq!(cdc.number_of_interfaces(), 2);
        assert!(!cdc.use_iad());
        assert_eq!(cdc.queues().total(), 3);
        assert!(cdc.queues().has_role(QueueRole::SerialStateNotification));
        assert!(cdc.endpoints().is_empty());
    }

    #[test]
    fn test_cdc_descriptor_size_with_iad() {
        let platform = Platform::default();
        let mut cdc = CdcFunction::new(1);
        assert_eq!(cdc.descriptor_size(&platform), 58);
        assert!(cdc.set_use_iad(true));
        assert_eq!(cdc.descriptor_size(&platform), 66);
    }

    #[test]
    fn test_cdc_endpoint_limit() {
        let mut cdc = CdcFunction::new(3);
        let roles = FunctionClass::Cdc.endpoint_roles();

        assert!(cdc.assign_endpoints(EndpointAssignment::after(6, roles)));
        assert_eq!(cdc.endpoints().get(EndpointRole::BulkIn), Some(10));

        assert!(!cdc.assign_endpoints(EndpointAssignment::after(9, roles)));
        assert_eq!(cdc.endpoints().get(EndpointRole::Interrupt), Some(10));
    }
}
