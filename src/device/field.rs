//! Per-instance configuration fields

use serde::Serialize;

use crate::error::{AppError, Result};

/// Integer field with declared bounds
#[derive(Debug, Clone, Serialize)]
pub struct IntField {
    id: &'static str,
    label: &'static str,
    value: i64,
    default: i64,
    min: i64,
    max: Option<i64>,
    visible: bool,
    read_only: bool,
}

impl IntField {
    pub fn new(id: &'static str, label: &'static str, default: i64) -> Self {
        Self {
            id,
            label,
            value: default,
            default,
            min: i64::MIN,
            max: None,
            visible: true,
            read_only: false,
        }
    }

    pub fn with_min(mut self, min: i64) -> Self {
        self.min = min;
        self
    }

    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.min = min;
        self.max = Some(max);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    /// User edit: rejected when read-only or out of range
    pub fn set(&mut self, value: i64) -> Result<()> {
        if self.read_only {
            return Err(AppError::InvalidState(format!("{} is read-only", self.id)));
        }
        self.check(value)?;
        self.value = value;
        Ok(())
    }

    /// Value computed by the stack itself. Returns whether it is within bounds;
    /// the value is stored either way.
    pub fn assign(&mut self, value: i64) -> bool {
        self.value = value;
        self.contains(value)
    }

    pub fn check(&self, value: i64) -> Result<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(AppError::OutOfRange {
                field: self.id.to_string(),
                value,
                min: self.min,
                max: self.max.unwrap_or(i64::MAX),
            })
        }
    }
}

/// Boolean field
#[derive(Debug, Clone, Serialize)]
pub struct BoolField {
    id: &'static str,
    label: &'static str,
    value: bool,
    default: bool,
    visible: bool,
}

impl BoolField {
    pub fn new(id: &'static str, label: &'static str, default: bool) -> Self {
        Self {
            id,
            label,
            value: default,
            default,
            visible: true,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn set(&mut self, value: bool) {
        self.value = value;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}
