//! Host event types

use serde::{Deserialize, Serialize};

use crate::device::accountant::Step;
use crate::device::function::FunctionClass;

/// Component kinds the host can instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Cdc,
    Printer,
    /// USB Host layer
    Host,
}

impl Component {
    /// Function class, `None` for the host layer
    pub fn function_class(&self) -> Option<FunctionClass> {
        match self {
            Component::Cdc => Some(FunctionClass::Cdc),
            Component::Printer => Some(FunctionClass::Printer),
            Component::Host => None,
        }
    }
}

/// Event delivered by the configuration host
///
/// Serialized as:
/// ```json
/// { "event": "attach", "data": { "name": "usb_device_cdc_0" } }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum HostEvent {
    /// A component was added to the project
    #[serde(rename = "instantiate")]
    Instantiate { component: Component },

    /// A function was connected to the device stack
    #[serde(rename = "attach")]
    Attach { name: String },

    /// A function was disconnected from the device stack
    #[serde(rename = "detach")]
    Detach { name: String },

    /// A component was removed from the project
    #[serde(rename = "remove")]
    Remove { name: String },

    /// A watched field changed
    #[serde(rename = "set_parameter")]
    SetParameter {
        /// Function name, or `usb_host` for the host layer
        name: String,
        id: String,
        value: i64,
    },

    #[serde(rename = "set_use_iad")]
    SetUseIad { name: String, use_iad: bool },

    /// Driver `USB_OPERATION_MODE` changed
    #[serde(rename = "operation_mode_changed")]
    OperationModeChanged { mode: String },

    #[serde(rename = "dependent_component_added")]
    DependentComponentAdded { id: String },
}

impl HostEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Instantiate { .. } => "instantiate",
            Self::Attach { .. } => "attach",
            Self::Detach { .. } => "detach",
            Self::Remove { .. } => "remove",
            Self::SetParameter { .. } => "set_parameter",
            Self::SetUseIad { .. } => "set_use_iad",
            Self::OperationModeChanged { .. } => "operation_mode_changed",
            Self::DependentComponentAdded { .. } => "dependent_component_added",
        }
    }
}

/// Outcome of one replayed event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOutcome {
    pub event: &'static str,
    /// Component the event created or acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Accounting steps skipped because their ledger key was missing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Step>,
}
