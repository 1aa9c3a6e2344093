//! Function driver buffer queues

use serde::{Deserialize, Serialize};

use super::field::IntField;
use crate::error::Result;
use crate::ledger::keys::{
    FUNCTION_READ_Q_SIZE, FUNCTION_SERIAL_NOTIFICATION_Q_SIZE, FUNCTION_WRITE_Q_SIZE,
};

pub const MIN_QUEUE_DEPTH: i64 = 1;
pub const MAX_QUEUE_DEPTH: i64 = 32767;
pub const DEFAULT_QUEUE_DEPTH: i64 = 1;

/// Queue role of a function driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueRole {
    Read,
    Write,
    /// CDC serial state notification
    SerialStateNotification,
}

impl QueueRole {
    /// Field identifier watched by the aggregator
    pub fn field_id(&self) -> &'static str {
        match self {
            QueueRole::Read => FUNCTION_READ_Q_SIZE,
            QueueRole::Write => FUNCTION_WRITE_Q_SIZE,
            QueueRole::SerialStateNotification => FUNCTION_SERIAL_NOTIFICATION_Q_SIZE,
        }
    }

    pub fn from_field_id(id: &str) -> Option<Self> {
        [
            QueueRole::Read,
            QueueRole::Write,
            QueueRole::SerialStateNotification,
        ]
        .into_iter()
        .find(|role| role.field_id() == id)
    }

    fn label(&self) -> &'static str {
        match self {
            QueueRole::Read => "Read Queue Size",
            QueueRole::Write => "Write Queue Size",
            QueueRole::SerialStateNotification => "Serial Notification Queue Size",
        }
    }
}

/// Queue depths of one function instance
///
/// Holds the last value seen for every role so that an edit carrying only the
/// new value can be turned into a delta.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSet {
    entries: Vec<(QueueRole, IntField)>,
}

impl QueueSet {
    pub fn new(roles: &[QueueRole]) -> Self {
        Self {
            entries: roles
                .iter()
                .map(|role| {
                    let field = IntField::new(role.field_id(), role.label(), DEFAULT_QUEUE_DEPTH)
                        .with_range(MIN_QUEUE_DEPTH, MAX_QUEUE_DEPTH);
                    (*role, field)
                })
                .collect(),
        }
    }

    pub fn roles(&self) -> impl Iterator<Item = QueueRole> + '_ {
        self.entries.iter().map(|(role, _)| *role)
    }

    pub fn has_role(&self, role: QueueRole) -> bool {
        self.entries.iter().any(|(r, _)| *r == role)
    }

    pub fn depth(&self, role: QueueRole) -> Option<i64> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, field)| field.value())
    }

    /// Sum of all roles
    pub fn total(&self) -> i64 {
        self.entries.iter().map(|(_, field)| field.value()).sum()
    }

    /// Store a new depth for `role` and return the change against the previous value.
    /// `Ok(None)` when this function has no such queue.
    pub fn edit(&mut self, role: QueueRole, value: i64) -> Result<Option<i64>> {
        let Some((_, field)) = self.entries.iter_mut().find(|(r, _)| *r == role) else {
            return Ok(None);
        };
        let previous = field.value();
        field.set(value)?;
        Ok(Some(value - previous))
    }
}
