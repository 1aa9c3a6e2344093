//! Device Stack Manager - owns the ledger and every function instance

use tracing::{debug, info};

use super::accountant::{self, DeviceIad, SharedTotals, UpdateReport};
use super::cdc::CdcFunction;
use super::class::{ClassLedger, ClassTotals, ParameterEvent};
use super::function::{FunctionClass, FunctionMeta, UsbFunction, IAD_DESCRIPTOR_SIZE};
use super::printer::PrinterFunction;
use crate::config::StackConfig;
use crate::error::{AppError, Result};
use crate::ledger::keys::DEVICE_SCOPE;
use crate::ledger::{Ledger, MemoryLedger};
use crate::platform::Platform;

/// Highest function index the generated stack accepts
pub const MAX_FUNCTION_INDEX: u8 = 16;

/// Device Stack Manager
///
/// Instantiates CDC and Printer functions, runs their attach/detach
/// accounting against the shared ledger and routes parameter edits to the
/// class buffer queue aggregation. Every call runs to completion before the
/// next one; see [`super::service::StackService`] for shared use.
pub struct DeviceStackManager<L: Ledger = MemoryLedger> {
    ledger: L,
    platform: Platform,
    /// CDC instance counter (index of the next CDC function)
    cdc_instance: u8,
    /// Printer instance counter
    printer_instance: u8,
    /// Registered functions, in instantiation order
    functions: Vec<Box<dyn UsbFunction>>,
    /// Device-level IAD overhead this stack added
    device_iad: DeviceIad,
}

impl DeviceStackManager<MemoryLedger> {
    /// Create a manager with an in-memory ledger seeded from configuration
    pub fn from_config(config: &StackConfig) -> Self {
        Self::new(
            MemoryLedger::with_device_defaults(&config.device),
            Platform::new(&config.processor),
        )
    }
}

impl<L: Ledger> DeviceStackManager<L> {
    pub fn new(ledger: L, platform: Platform) -> Self {
        Self {
            ledger,
            platform,
            cdc_instance: 0,
            printer_instance: 0,
            // Typical composite devices carry a handful of functions
            functions: Vec::with_capacity(4),
            device_iad: DeviceIad::default(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Add a CDC function, returns its component name
    pub fn add_cdc(&mut self) -> Result<String> {
        let index = self.next_index(FunctionClass::Cdc)?;
        let name = self.add_function(Box::new(CdcFunction::new(index)));
        self.cdc_instance += 1;
        Ok(name)
    }

    /// Add a Printer function, returns its component name
    pub fn add_printer(&mut self) -> Result<String> {
        let index = self.next_index(FunctionClass::Printer)?;
        let name = self.add_function(Box::new(PrinterFunction::new(index, &self.platform)));
        self.printer_instance += 1;
        Ok(name)
    }

    /// Add a function of the given class
    pub fn add(&mut self, class: FunctionClass) -> Result<String> {
        match class {
            FunctionClass::Cdc => self.add_cdc(),
            FunctionClass::Printer => self.add_printer(),
        }
    }

    fn next_index(&self, class: FunctionClass) -> Result<u8> {
        let index = match class {
            FunctionClass::Cdc => self.cdc_instance,
            FunctionClass::Printer => self.printer_instance,
        };
        if index > MAX_FUNCTION_INDEX {
            return Err(AppError::OutOfRange {
                field: format!("{} function index", class),
                value: index as i64,
                min: 0,
                max: MAX_FUNCTION_INDEX as i64,
            });
        }
        Ok(index)
    }

    fn add_function(&mut self, function: Box<dyn UsbFunction>) -> String {
        // The device stack component must exist before any function uses it
        self.ledger.activate(DEVICE_SCOPE);

        let name = function.name().to_string();
        info!("Instantiated {} function {}", function.class(), name);
        self.functions.push(function);
        name
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.functions
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| AppError::NotFound(format!("function {}", name)))
    }

    /// Connect a function to the device stack
    ///
    /// The class count goes first: when it fails, nothing has been written.
    pub fn attach(&mut self, name: &str) -> Result<UpdateReport> {
        let pos = self.position(name)?;
        let function = self.functions[pos].as_mut();
        if function.accounting().attached {
            return Err(AppError::InvalidState(format!("{} is already attached", name)));
        }

        let class_ledger = ClassLedger::new(function.class());
        class_ledger.register(&mut self.ledger, function)?;
        match accountant::attach(&mut self.ledger, &mut self.device_iad, function, &self.platform) {
            Ok(report) => Ok(report),
            Err(e) => {
                class_ledger.unregister(&mut self.ledger, function)?;
                Err(e)
            }
        }
    }

    /// Disconnect a function from the device stack
    pub fn detach(&mut self, name: &str) -> Result<UpdateReport> {
        let pos = self.position(name)?;
        let function = self.functions[pos].as_mut();
        if !function.accounting().attached {
            return Err(AppError::InvalidState(format!("{} is not attached", name)));
        }

        let class_ledger = ClassLedger::new(function.class());
        class_ledger.unregister(&mut self.ledger, function)?;
        let report = accountant::detach(&mut self.ledger, &mut self.device_iad, function)?;

        if report.functions_after == Some(1) {
            self.drop_lone_cdc_iad()?;
        }
        Ok(report)
    }

    /// The last remaining function no longer shares the configuration, so a
    /// lone CDC instance stops carrying its own IAD.
    fn drop_lone_cdc_iad(&mut self) -> Result<()> {
        let cdc_totals = ClassLedger::new(FunctionClass::Cdc).totals(&self.ledger);
        if cdc_totals.instances != 1 {
            return Ok(());
        }
        let mut with_iad = self.functions.iter_mut().filter(|f| {
            f.class() == FunctionClass::Cdc && f.accounting().attached && f.use_iad()
        });
        let (Some(function), None) = (with_iad.next(), with_iad.next()) else {
            return Ok(());
        };
        accountant::set_own_iad(&mut self.ledger, function.as_mut(), false)?;
        debug!(
            "{} is alone again, dropped its {} IAD bytes",
            function.name(),
            IAD_DESCRIPTOR_SIZE
        );
        Ok(())
    }

    /// Destroy a function, detaching it first when attached
    pub fn remove(&mut self, name: &str) -> Result<Option<UpdateReport>> {
        let pos = self.position(name)?;
        let report = if self.functions[pos].accounting().attached {
            Some(self.detach(name)?)
        } else {
            None
        };
        let function = self.functions.remove(pos);
        info!("Destroyed {} function {}", function.class(), function.name());
        Ok(report)
    }

    /// Deliver one watched-field change to a function
    pub fn set_parameter(&mut self, name: &str, event: &ParameterEvent) -> Result<()> {
        let pos = self.position(name)?;
        let function = self.functions[pos].as_mut();
        let class_ledger = ClassLedger::new(function.class());
        class_ledger
            .on_queue_size_changed(&mut self.ledger, function, event)?
            .ok_or_else(|| {
                AppError::NotFound(format!("parameter {} on {}", event.id, name))
            })?;
        Ok(())
    }

    /// Deliver a batch of watched-field changes, applying each one in order
    pub fn set_parameters(&mut self, name: &str, events: &[ParameterEvent]) -> Result<()> {
        for event in events {
            self.set_parameter(name, event)?;
        }
        Ok(())
    }

    /// Change the Interface Association Descriptor flag of a function
    pub fn set_use_iad(&mut self, name: &str, use_iad: bool) -> Result<()> {
        let pos = self.position(name)?;
        accountant::set_own_iad(&mut self.ledger, self.functions[pos].as_mut(), use_iad)
    }

    pub fn function(&self, name: &str) -> Option<&dyn UsbFunction> {
        self.functions
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
    }

    pub fn functions(&self) -> impl Iterator<Item = &dyn UsbFunction> {
        self.functions.iter().map(|f| f.as_ref())
    }

    /// Get function metadata
    pub fn get_meta(&self) -> Vec<FunctionMeta> {
        self.functions.iter().map(|f| f.meta()).collect()
    }

    /// Current device totals
    pub fn totals(&self) -> Result<SharedTotals> {
        SharedTotals::read(&self.ledger)
    }

    /// Current class totals
    pub fn class_totals(&self, class: FunctionClass) -> ClassTotals {
        ClassLedger::new(class).totals(&self.ledger)
    }
}

impl Default for DeviceStackManager<MemoryLedger> {
    fn default() -> Self {
        Self::from_config(&StackConfig::default())
    }
}
