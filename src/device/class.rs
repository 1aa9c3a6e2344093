//! Per-class instance counter and buffer queue aggregation

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::function::{FunctionClass, UsbFunction};
use super::queue::QueueRole;
use crate::error::{AppError, Result};
use crate::ledger::{Adjusted, Ledger, LedgerExt};

/// Watched-field change delivered by the host: which field changed and its new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterEvent {
    pub id: String,
    pub value: i64,
}

impl ParameterEvent {
    pub fn new(id: &str, value: i64) -> Self {
        Self {
            id: id.to_string(),
            value,
        }
    }

    pub fn queue(role: QueueRole, value: i64) -> Self {
        Self::new(role.field_id(), value)
    }
}

/// Class-wide totals: live instance count and combined queue depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassTotals {
    pub instances: i64,
    pub queue_depth: i64,
}

/// Ledger view of one function class
#[derive(Debug, Clone, Copy)]
pub struct ClassLedger {
    class: FunctionClass,
}

impl ClassLedger {
    pub fn new(class: FunctionClass) -> Self {
        Self { class }
    }

    pub fn class(&self) -> FunctionClass {
        self.class
    }

    /// Current totals, missing keys read as zero
    pub fn totals<L: Ledger + ?Sized>(&self, ledger: &L) -> ClassTotals {
        let read = |key| ledger.read_int(self.class.scope(), key).unwrap_or(0);
        ClassTotals {
            instances: read(self.class.instances_key()),
            queue_depth: read(self.class.queue_depth_key()),
        }
    }

    /// Fail on a key holding something other than an integer. Missing keys
    /// are fine, they start at zero.
    fn check_keys<L: Ledger + ?Sized>(&self, ledger: &L) -> Result<()> {
        for key in [self.class.instances_key(), self.class.queue_depth_key()] {
            match ledger.read_int(self.class.scope(), key) {
                Err(e) if !e.is_not_initialized() => return Err(e),
                _ => {}
            }
        }
        Ok(())
    }

    /// Count an instance in and fold its queue depths into the combined depth
    pub fn register<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        function: &mut dyn UsbFunction,
    ) -> Result<Adjusted> {
        if function.accounting().registered {
            return Err(AppError::InvalidState(format!(
                "{} is already counted",
                function.name()
            )));
        }
        self.check_keys(ledger)?;

        let scope = self.class.scope();
        let instances = ledger.adjust_int_or_zero(scope, self.class.instances_key(), 1)?;
        ledger.adjust_int_or_zero(
            scope,
            self.class.queue_depth_key(),
            function.queues().total(),
        )?;
        function.accounting_mut().registered = true;
        debug!(
            "{} instances: {} -> {}",
            self.class, instances.previous, instances.current
        );
        Ok(instances)
    }

    /// Count an instance out and withdraw its queue depths
    pub fn unregister<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        function: &mut dyn UsbFunction,
    ) -> Result<Adjusted> {
        if !function.accounting().registered {
            return Err(AppError::InvalidState(format!(
                "{} is not counted",
                function.name()
            )));
        }
        self.check_keys(ledger)?;

        let scope = self.class.scope();
        let instances = ledger.adjust_int_or_zero(scope, self.class.instances_key(), -1)?;
        if let Err(e) = ledger.adjust_int(
            scope,
            self.class.queue_depth_key(),
            -function.queues().total(),
        ) {
            warn!("{}: combined queue depth not withdrawn: {}", function.name(), e);
        }
        function.accounting_mut().registered = false;
        debug!(
            "{} instances: {} -> {}",
            self.class, instances.previous, instances.current
        );
        Ok(instances)
    }

    /// Apply one queue size edit of `function`
    ///
    /// The function's own cache is always updated. The combined depth only
    /// moves while the function is counted in. Returns the applied delta,
    /// `None` when the event does not name a queue of this function.
    pub fn on_queue_size_changed<L: Ledger + ?Sized>(
        &self,
        ledger: &mut L,
        function: &mut dyn UsbFunction,
        event: &ParameterEvent,
    ) -> Result<Option<i64>> {
        let Some(role) = QueueRole::from_field_id(&event.id) else {
            return Ok(None);
        };
        let Some(delta) = function.queues_mut().edit(role, event.value)? else {
            return Ok(None);
        };
        if function.accounting().registered && delta != 0 {
            ledger.adjust_int(self.class.scope(), self.class.queue_depth_key(), delta)?;
        }
        debug!(
            "{} {:?} queue -> {} ({:+})",
            function.name(),
            role,
            event.value,
            delta
        );
        Ok(Some(delta))
    }
}
