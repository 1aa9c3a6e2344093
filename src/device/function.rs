//! USB device function trait definition

use serde::{Deserialize, Serialize};
use std::fmt;

use super::endpoint::{EndpointAssignment, EndpointRole};
use super::queue::{QueueRole, QueueSet};
use crate::ledger::keys::{
    CDC_INSTANCES, CDC_QUEUE_DEPTH_COMBINED, CDC_SCOPE, PRINTER_INSTANCES,
    PRINTER_QUEUE_DEPTH_COMBINED, PRINTER_SCOPE,
};
use crate::platform::Platform;

/// Size of one Interface Association Descriptor
pub const IAD_DESCRIPTOR_SIZE: i64 = 8;

/// USB function class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionClass {
    /// CDC ACM serial
    Cdc,
    Printer,
}

impl FunctionClass {
    /// Ledger scope shared by all instances of the class
    pub fn scope(&self) -> &'static str {
        match self {
            FunctionClass::Cdc => CDC_SCOPE,
            FunctionClass::Printer => PRINTER_SCOPE,
        }
    }

    pub fn instances_key(&self) -> &'static str {
        match self {
            FunctionClass::Cdc => CDC_INSTANCES,
            FunctionClass::Printer => PRINTER_INSTANCES,
        }
    }

    pub fn queue_depth_key(&self) -> &'static str {
        match self {
            FunctionClass::Cdc => CDC_QUEUE_DEPTH_COMBINED,
            FunctionClass::Printer => PRINTER_QUEUE_DEPTH_COMBINED,
        }
    }

    pub fn queue_roles(&self) -> &'static [QueueRole] {
        match self {
            FunctionClass::Cdc => &[
                QueueRole::Read,
                QueueRole::Write,
                QueueRole::SerialStateNotification,
            ],
            FunctionClass::Printer => &[QueueRole::Read, QueueRole::Write],
        }
    }

    pub fn endpoint_roles(&self) -> &'static [EndpointRole] {
        match self {
            FunctionClass::Cdc => &[
                EndpointRole::Interrupt,
                EndpointRole::BulkOut,
                EndpointRole::BulkIn,
            ],
            FunctionClass::Printer => &[EndpointRole::BulkOut],
        }
    }

    /// Fixed resource cost of one instance
    pub fn cost(&self, platform: &Platform) -> ClassCost {
        match self {
            FunctionClass::Cdc => ClassCost {
                interfaces: 2,
                endpoints: 3,
                descriptor_size: 58,
            },
            FunctionClass::Printer => ClassCost {
                interfaces: 1,
                endpoints: platform.printer_endpoints() as i64,
                descriptor_size: 16,
            },
        }
    }
}

impl fmt::Display for FunctionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionClass::Cdc => write!(f, "CDC"),
            FunctionClass::Printer => write!(f, "Printer"),
        }
    }
}

/// Resources one function instance adds to the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassCost {
    pub interfaces: i64,
    pub endpoints: i64,
    /// Descriptor bytes without any IAD
    pub descriptor_size: i64,
}

/// What an attached function actually added to the shared totals.
/// Detach reverses exactly this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Contribution {
    pub function: bool,
    pub interfaces: i64,
    pub endpoints: i64,
    pub descriptor_bytes: i64,
}

impl Contribution {
    pub fn is_empty(&self) -> bool {
        *self == Contribution::default()
    }
}

/// Accounting state of one function instance
#[derive(Debug, Clone, Default, Serialize)]
pub struct Accounting {
    pub attached: bool,
    pub contribution: Contribution,
    /// Counted in the class instance counter and combined queue depth
    pub registered: bool,
}

/// Function metadata
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMeta {
    /// Component name (e.g., "usb_device_cdc_0")
    pub name: String,
    pub class: FunctionClass,
    pub index: u8,
    pub attached: bool,
    pub start_interface: i64,
    pub number_of_interfaces: i64,
    pub use_iad: bool,
    pub endpoints: EndpointAssignment,
    pub queue_total: i64,
    pub contribution: Contribution,
}

/// USB device function descriptor
pub trait UsbFunction: Send + Sync + fmt::Debug {
    /// Component name (e.g., "usb_device_cdc_0")
    fn name(&self) -> &str;

    fn class(&self) -> FunctionClass;

    /// Assignment order within the class, starting at 0
    fn index(&self) -> u8;

    /// Whether this function emits its own IAD
    fn use_iad(&self) -> bool {
        false
    }

    /// Change the IAD flag. Returns false for classes that never carry an IAD.
    fn set_use_iad(&mut self, _use_iad: bool) -> bool {
        false
    }

    fn start_interface(&self) -> i64;

    fn number_of_interfaces(&self) -> i64;

    /// Record the first interface number of this function
    fn assign_interfaces(&mut self, start: i64);

    fn endpoints(&self) -> &EndpointAssignment;

    /// Record endpoint numbers. Returns false if any number exceeds the
    /// field limit for this platform.
    fn assign_endpoints(&mut self, assignment: EndpointAssignment) -> bool;

    fn queues(&self) -> &QueueSet;

    fn queues_mut(&mut self) -> &mut QueueSet;

    fn accounting(&self) -> &Accounting;

    fn accounting_mut(&mut self) -> &mut Accounting;

    /// Descriptor bytes this function adds when attached now
    fn descriptor_size(&self, platform: &Platform) -> i64 {
        let base = self.class().cost(platform).descriptor_size;
        if self.use_iad() {
            base + IAD_DESCRIPTOR_SIZE
        } else {
            base
        }
    }

    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: self.name().to_string(),
            class: self.class(),
            index: self.index(),
            attached: self.accounting().attached,
            start_interface: self.start_interface(),
            number_of_interfaces: self.number_of_interfaces(),
            use_iad: self.use_iad(),
            endpoints: self.endpoints().clone(),
            queue_total: self.queues().total(),
            contribution: self.accounting().contribution,
        }
    }
}
