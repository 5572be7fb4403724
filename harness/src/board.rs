//! Platform bring-up boundary.

use embedded_hal::digital::OutputPin;
use embedded_io::{Read, Write};

use crate::debug::Console;

/// One-time setup of the target and the peripherals the harness drives.
///
/// Setup calls are assumed to succeed and are made exactly once, in
/// declaration order, before anything is printed.
pub trait Board {
    /// Port the command framework reads and answers on.
    type Serial: Read + Write;
    /// Device behind the debug printer, usually the same UART.
    type Console: Console;
    /// Line marking the measurement window.
    type Trigger: OutputPin;

    fn platform_init(&mut self);

    fn init_uart(&mut self) -> (Self::Serial, Self::Console);

    /// Configure the trigger line, leaving it low.
    fn trigger_setup(&mut self) -> Self::Trigger;
}
