//! Trigger-bracketed benchmark harness.
//!
//! Raises a trigger line around a single opaque workload so external
//! instrumentation can capture its power trace, either once at boot or
//! every time the host sends the run command over SimpleSerial.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod board;
pub mod config;
pub mod debug;
pub mod dispatch;
pub mod handler;

pub use board::Board;
pub use config::{BuildVariant, Config, RunMode};
pub use debug::{Console, DebugPrinter, IoConsole};
pub use dispatch::{Harness, SerialLoop};
pub use handler::{CommandHandler, Status, TriggerBracket, Workload};
