//! Stack Service - serialized access to one device stack
//!
//! Host callbacks may arrive from several threads. Each one must run its whole
//! read-modify-write sequence before the next starts, so the manager sits
//! behind a single lock and every callback is one critical section.
//!
//! ```text
//!   host thread A ──┐
//!                   ├──> StackService ──lock──> DeviceStackManager ──> Ledger
//!   host thread B ──┘
//! ```

use parking_lot::Mutex;

use super::accountant::{SharedTotals, UpdateReport};
use super::class::ParameterEvent;
use super::function::{FunctionClass, FunctionMeta};
use super::manager::DeviceStackManager;
use crate::config::StackConfig;
use crate::error::Result;
use crate::ledger::MemoryLedger;

/// Thread-safe handle around a [`DeviceStackManager`]
pub struct StackService {
    manager: Mutex<DeviceStackManager<MemoryLedger>>,
}

impl StackService {
    pub fn new(manager: DeviceStackManager<MemoryLedger>) -> Self {
        Self {
            manager: Mutex::new(manager),
        }
    }

    pub fn from_config(config: &StackConfig) -> Self {
        Self::new(DeviceStackManager::from_config(config))
    }

    /// Run `f` with exclusive access to the manager
    pub fn with<R>(&self, f: impl FnOnce(&mut DeviceStackManager<MemoryLedger>) -> R) -> R {
        let mut manager = self.manager.lock();
        f(&mut manager)
    }

    pub fn add(&self, class: FunctionClass) -> Result<String> {
        self.manager.lock().add(class)
    }

    pub fn attach(&self, name: &str) -> Result<UpdateReport> {
        self.manager.lock().attach(name)
    }

    pub fn detach(&self, name: &str) -> Result<UpdateReport> {
        self.manager.lock().detach(name)
    }

    pub fn remove(&self, name: &str) -> Result<Option<UpdateReport>> {
        self.manager.lock().remove(name)
    }

    pub fn set_parameter(&self, name: &str, event: &ParameterEvent) -> Result<()> {
        self.manager.lock().set_parameter(name, event)
    }

    pub fn totals(&self) -> Result<SharedTotals> {
        self.manager.lock().totals()
    }

    pub fn get_meta(&self) -> Vec<FunctionMeta> {
        self.manager.lock().get_meta()
    }

    /// Take the manager back out of the service
    pub fn into_inner(self) -> DeviceStackManager<MemoryLedger> {
        self.manager.into_inner()
    }
}

impl Default for StackService {
    fn default() -> Self {
        Self::new(DeviceStackManager::default())
    }
}
