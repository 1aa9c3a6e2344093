//! USB Stack Config - shared resource accounting for USB device functions
//!
//! This crate computes what each USB function (CDC serial, Printer) adds to
//! the device-wide configuration: function count, interfaces, endpoints and
//! configuration descriptor bytes, plus per-class buffer queue depths.

pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod host;
pub mod ledger;
pub mod platform;

pub use error::{AppError, Result};
