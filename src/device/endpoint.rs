//! USB endpoint number assignment

use serde::Serialize;

/// Endpoint role within a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRole {
    /// Interrupt IN (CDC notifications)
    Interrupt,
    BulkOut,
    BulkIn,
}

/// Endpoint numbers assigned to one function
///
/// Numbers are handed out once, at attach time, as a contiguous run after the
/// endpoints already in use. They are not renumbered when an earlier
/// function goes away.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointAssignment {
    numbers: Vec<(EndpointRole, i64)>,
}

impl EndpointAssignment {
    /// Assign `previous_total + 1`, `+ 2`, ... to `roles` in order
    pub fn after(previous_total: i64, roles: &[EndpointRole]) -> Self {
        Self {
            numbers: roles
                .iter()
                .enumerate()
                .map(|(i, role)| (*role, previous_total + 1 + i as i64))
                .collect(),
        }
    }

    pub fn get(&self, role: EndpointRole) -> Option<i64> {
        self.numbers
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, n)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EndpointRole, i64)> + '_ {
        self.numbers.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}
