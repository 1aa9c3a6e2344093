//! USB device stack configuration
//!
//! Each function instance adds its share of interfaces, endpoints and
//! configuration descriptor bytes to the device-wide totals when it is
//! attached, and takes exactly that share back when it is detached.
//!
//! Architecture:
//! ```text
//! StackService (serialized host callbacks)
//!     └── DeviceStackManager (function lifecycle)
//!             ├── accountant (device totals: functions, IAD, descriptor,
//!             │               interfaces, endpoints)
//!             ├── ClassLedger (per-class instances + combined queue depth)
//!             ├── CdcFunction
//!             └── PrinterFunction
//! ```

pub mod accountant;
pub mod cdc;
pub mod class;
pub mod endpoint;
pub mod field;
pub mod function;
pub mod manager;
pub mod printer;
pub mod queue;
pub mod service;

pub use accountant::{DeviceIad, SharedTotals, Step, UpdateReport};
pub use cdc::CdcFunction;
pub use class::{ClassLedger, ClassTotals, ParameterEvent};
pub use endpoint::{EndpointAssignment, EndpointRole};
pub use function::{Contribution, FunctionClass, FunctionMeta, UsbFunction, IAD_DESCRIPTOR_SIZE};
pub use manager::DeviceStackManager;
pub use printer::PrinterFunction;
pub use queue::{QueueRole, QueueSet};
pub use service::StackService;
