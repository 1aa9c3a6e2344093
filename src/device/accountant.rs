//! Shared-total accounting for function attach and detach
//!
//! Attach reads each device total, adds this function's share and writes it
//! back, recording exactly what was added. Detach subtracts the recorded
//! share, so totals are conserved across any attach/detach order. A step whose
//! ledger key does not exist yet is skipped and reported, never raised.
//!
//! The device-level IAD overhead belongs to the stack rather than to a
//! function: it is added once when a second function joins and removed when
//! the stack falls back to a single function. Only the overhead recorded in
//! [`DeviceIad`] is ever removed.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::endpoint::EndpointAssignment;
use super::function::{Contribution, UsbFunction, IAD_DESCRIPTOR_SIZE};
use crate::error::{AppError, Result};
use crate::ledger::keys::{
    CONFIG_DESCRIPTOR_SIZE, DEVICE_SCOPE, ENDPOINTS_NUMBER, FUNCTIONS_NUMBER, IAD_ENABLE,
    INTERFACES_NUMBER,
};
use crate::ledger::{Ledger, LedgerExt, Value};
use crate::platform::Platform;

/// One read-modify-write step of attach/detach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    FunctionCount,
    /// Device-level Interface Association Descriptor
    Iad,
    DescriptorSize,
    Interfaces,
    Endpoints,
}

/// Per-step outcome of an attach or detach
#[derive(Debug, Default)]
pub struct UpdateReport {
    steps: Vec<(Step, Result<()>)>,
    /// Function count after the update, when it could be read
    pub functions_after: Option<i64>,
}

impl UpdateReport {
    fn record(&mut self, step: Step, result: Result<()>) {
        if let Err(e) = &result {
            warn!("Skipping {:?}: {}", step, e);
        }
        self.steps.push((step, result));
    }

    /// The step ran and wrote the ledger
    pub fn applied(&self, step: Step) -> bool {
        self.steps.iter().any(|(s, r)| *s == step && r.is_ok())
    }

    /// The step was skipped because of a ledger error
    pub fn skipped(&self, step: Step) -> bool {
        self.steps.iter().any(|(s, r)| *s == step && r.is_err())
    }

    pub fn skipped_steps(&self) -> impl Iterator<Item = (Step, &AppError)> {
        self.steps
            .iter()
            .filter_map(|(s, r)| r.as_ref().err().map(|e| (*s, e)))
    }

    /// No step was skipped
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|(_, r)| r.is_ok())
    }
}

/// Device-wide totals shared by all functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SharedTotals {
    pub function_count: i64,
    pub endpoint_count: i64,
    pub interface_count: i64,
    pub config_descriptor_size: i64,
    pub iad_enabled: bool,
}

impl SharedTotals {
    pub fn read<L: Ledger + ?Sized>(ledger: &L) -> Result<Self> {
        Ok(Self {
            function_count: ledger.read_int(DEVICE_SCOPE, FUNCTIONS_NUMBER)?,
            endpoint_count: ledger.read_int(DEVICE_SCOPE, ENDPOINTS_NUMBER)?,
            interface_count: ledger.read_int(DEVICE_SCOPE, INTERFACES_NUMBER)?,
            config_descriptor_size: ledger.read_int(DEVICE_SCOPE, CONFIG_DESCRIPTOR_SIZE)?,
            iad_enabled: ledger.read_bool(DEVICE_SCOPE, IAD_ENABLE)?,
        })
    }
}

/// Device-level IAD overhead added by this stack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeviceIad {
    /// Bytes added to the configuration descriptor
    pub bytes: i64,
    /// `IAD_ENABLE` as it was before the overhead was added
    pub flag_before: bool,
}

impl DeviceIad {
    pub fn is_owned(&self) -> bool {
        self.bytes != 0
    }
}

/// Add `function`'s share to the device totals
pub fn attach<L: Ledger + ?Sized>(
    ledger: &mut L,
    device_iad: &mut DeviceIad,
    function: &mut dyn UsbFunction,
    platform: &Platform,
) -> Result<UpdateReport> {
    if function.accounting().attached {
        return Err(AppError::InvalidState(format!(
            "{} is already attached",
            function.name()
        )));
    }

    let class = function.class();
    let cost = class.cost(platform);
    let mut contribution = Contribution::default();
    let mut report = UpdateReport::default();

    // Function count
    let previous_functions = match ledger.adjust_int(DEVICE_SCOPE, FUNCTIONS_NUMBER, 1) {
        Ok(adjusted) => {
            contribution.function = true;
            report.functions_after = Some(adjusted.current);
            report.record(Step::FunctionCount, Ok(()));
            Some(adjusted.previous)
        }
        Err(e) => {
            report.record(Step::FunctionCount, Err(e));
            None
        }
    };

    // Other functions present: this configuration needs IADs
    if let Some(present) = previous_functions.filter(|n| *n > 0) {
        let result = enable_device_iad(ledger, device_iad, present).map(|_| ());
        report.record(Step::Iad, result);
        function.set_use_iad(true);
    }

    // Descriptor bytes, including this function's own IAD
    let descriptor_bytes = function.descriptor_size(platform);
    let result = ledger
        .adjust_int(DEVICE_SCOPE, CONFIG_DESCRIPTOR_SIZE, descriptor_bytes)
        .map(|_| contribution.descriptor_bytes = descriptor_bytes);
    report.record(Step::DescriptorSize, result);

    // Interfaces: a contiguous block starting at the previous total
    let result = ledger
        .adjust_int(DEVICE_SCOPE, INTERFACES_NUMBER, cost.interfaces)
        .map(|adjusted| {
            function.assign_interfaces(adjusted.previous);
            contribution.interfaces = cost.interfaces;
        });
    report.record(Step::Interfaces, result);

    // Endpoints: numbered after the previous total
    let result = ledger
        .adjust_int(DEVICE_SCOPE, ENDPOINTS_NUMBER, cost.endpoints)
        .map(|adjusted| {
            let assignment = EndpointAssignment::after(adjusted.previous, class.endpoint_roles());
            if !function.assign_endpoints(assignment) {
                warn!(
                    "{}: endpoint numbers {:?} exceed the {} limit",
                    function.name(),
                    function.endpoints(),
                    platform.processor()
                );
            }
            contribution.endpoints = cost.endpoints;
        });
    report.record(Step::Endpoints, result);

    let accounting = function.accounting_mut();
    accounting.attached = true;
    accounting.contribution = contribution;

    info!(
        "{} attached: interfaces from {}, {:?}",
        function.name(),
        function.start_interface(),
        contribution
    );
    Ok(report)
}

/// Remove exactly the share `function` added at attach
pub fn detach<L: Ledger + ?Sized>(
    ledger: &mut L,
    device_iad: &mut DeviceIad,
    function: &mut dyn UsbFunction,
) -> Result<UpdateReport> {
    if !function.accounting().attached {
        return Err(AppError::InvalidState(format!(
            "{} is not attached",
            function.name()
        )));
    }

    let contribution = function.accounting().contribution;
    let mut report = UpdateReport::default();

    if contribution.function {
        let result = ledger
            .adjust_int(DEVICE_SCOPE, FUNCTIONS_NUMBER, -1)
            .map(|adjusted| report.functions_after = Some(adjusted.current));
        report.record(Step::FunctionCount, result);
    }

    for (step, key, amount) in [
        (Step::Endpoints, ENDPOINTS_NUMBER, contribution.endpoints),
        (Step::Interfaces, INTERFACES_NUMBER, contribution.interfaces),
        (
            Step::DescriptorSize,
            CONFIG_DESCRIPTOR_SIZE,
            contribution.descriptor_bytes,
        ),
    ] {
        if amount != 0 {
            let result = ledger.adjust_int(DEVICE_SCOPE, key, -amount).map(|_| ());
            report.record(step, result);
        }
    }

    // Back to a single function: the device-level IAD goes away
    if report.functions_after.is_some_and(|n| n <= 1) {
        let result = disable_device_iad(ledger, device_iad).map(|_| ());
        report.record(Step::Iad, result);
    }

    let accounting = function.accounting_mut();
    accounting.attached = false;
    accounting.contribution = Contribution::default();

    info!("{} detached: {:?} returned", function.name(), contribution);
    Ok(report)
}

/// Switch an attached function's own IAD on or off, keeping the descriptor
/// size and the recorded share in step
pub fn set_own_iad<L: Ledger + ?Sized>(
    ledger: &mut L,
    function: &mut dyn UsbFunction,
    use_iad: bool,
) -> Result<()> {
    if function.use_iad() == use_iad {
        return Ok(());
    }
    if !function.accounting().attached {
        if !function.set_use_iad(use_iad) {
            return Err(AppError::InvalidState(format!(
                "{} has no interface association descriptor",
                function.name()
            )));
        }
        return Ok(());
    }
    if function.accounting().contribution.descriptor_bytes == 0 {
        // Descriptor bytes were never counted, nothing to keep in step
        function.set_use_iad(use_iad);
        return Ok(());
    }

    let delta = if use_iad {
        IAD_DESCRIPTOR_SIZE
    } else {
        -IAD_DESCRIPTOR_SIZE
    };
    ledger.adjust_int(DEVICE_SCOPE, CONFIG_DESCRIPTOR_SIZE, delta)?;
    if !function.set_use_iad(use_iad) {
        // Undo: this class never carries an IAD
        ledger.adjust_int(DEVICE_SCOPE, CONFIG_DESCRIPTOR_SIZE, -delta)?;
        return Err(AppError::InvalidState(format!(
            "{} has no interface association descriptor",
            function.name()
        )));
    }
    function.accounting_mut().contribution.descriptor_bytes += delta;
    debug!("{} own IAD -> {}", function.name(), use_iad);
    Ok(())
}

/// Returns whether the overhead was added by this call
fn enable_device_iad<L: Ledger + ?Sized>(
    ledger: &mut L,
    device_iad: &mut DeviceIad,
    functions_present: i64,
) -> Result<bool> {
    if device_iad.is_owned() {
        return Ok(false);
    }
    let enabled = ledger.read_bool(DEVICE_SCOPE, IAD_ENABLE)?;
    // Seeded with two or more functions under an enabled flag: the overhead
    // is already part of the seeded descriptor size
    if enabled && functions_present >= 2 {
        return Ok(false);
    }
    let adjusted = ledger.adjust_int(DEVICE_SCOPE, CONFIG_DESCRIPTOR_SIZE, IAD_DESCRIPTOR_SIZE)?;
    ledger.replace(DEVICE_SCOPE, IAD_ENABLE, Value::Bool(true));
    *device_iad = DeviceIad {
        bytes: adjusted.current - adjusted.previous,
        flag_before: enabled,
    };
    debug!("Device IAD enabled");
    Ok(true)
}

/// Returns whether recorded overhead was removed by this call
fn disable_device_iad<L: Ledger + ?Sized>(
    ledger: &mut L,
    device_iad: &mut DeviceIad,
) -> Result<bool> {
    if !device_iad.is_owned() {
        return Ok(false);
    }
    ledger.adjust_int(DEVICE_SCOPE, CONFIG_DESCRIPTOR_SIZE, -device_iad.bytes)?;
    ledger.replace(DEVICE_SCOPE, IAD_ENABLE, Value::Bool(device_iad.flag_before));
    *device_iad = DeviceIad::default();
    debug!("Device IAD disabled");
    Ok(true)
}
