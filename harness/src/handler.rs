use embedded_hal::digital::OutputPin;
use simpleserial::{Handler, Reply, Request};

use crate::{
    config::CONFIRMATION,
    debug::{Console, DebugPrinter},
};

/// The code under measurement.
///
/// Runs to completion without parameters or a result.
pub trait Workload {
    fn execute(&mut self);
}

impl<F: FnMut()> Workload for F {
    fn execute(&mut self) {
        self()
    }
}

/// Status byte returned to the host.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Ok = 0x00,
    /// The trigger line could not be driven; the measurement is invalid.
    TriggerFault = 0x01,
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

/// Holds the trigger line high while alive.
///
/// The line is lowered by [`close`](Self::close), or on drop if the
/// bracket is abandoned (e.g. the workload unwinds).
pub struct TriggerBracket<'a, T: OutputPin> {
    pin: &'a mut T,
    open: bool,
}

impl<'a, T: OutputPin> TriggerBracket<'a, T> {
    /// Raise the trigger.
    ///
    /// On failure the line is driven low again before returning.
    pub fn open(pin: &'a mut T) -> Result<Self, T::Error> {
        if let Err(err) = pin.set_high() {
            let _ = pin.set_low();
            return Err(err);
        }

        Ok(Self { pin, open: true })
    }

    /// Lower the trigger.
    pub fn close(mut self) -> Result<(), T::Error> {
        self.open = false;
        self.pin.set_low()
    }
}

impl<T: OutputPin> Drop for TriggerBracket<'_, T> {
    fn drop(&mut self) {
        if self.open && self.pin.set_low().is_err() {
            warn!("trigger stuck high");
        }
    }
}

/// Runs the workload inside a trigger bracket on request.
pub struct CommandHandler<T, W, C> {
    trigger: T,
    workload: W,
    printer: DebugPrinter<C>,
}

impl<T, W, C> CommandHandler<T, W, C>
where
    T: OutputPin,
    W: Workload,
    C: Console,
{
    pub fn new(trigger: T, workload: W, printer: DebugPrinter<C>) -> Self {
        Self {
            trigger,
            workload,
            printer,
        }
    }

    pub fn printer(&mut self) -> &mut DebugPrinter<C> {
        &mut self.printer
    }

    /// Run the workload once between a raised and lowered trigger.
    ///
    /// The selection is not interpreted.
    pub fn perform(&mut self, _selection: &[u8]) -> Status {
        let Ok(bracket) = TriggerBracket::open(&mut self.trigger) else {
            warn!("trigger raise failed, workload skipped");
            return Status::TriggerFault;
        };

        self.workload.execute();

        if bracket.close().is_err() {
            warn!("trigger lower failed");
            return Status::TriggerFault;
        }

        self.printer.print(CONFIRMATION);

        Status::Ok
    }
}

impl<T, W, C> Handler for CommandHandler<T, W, C>
where
    T: OutputPin,
    W: Workload,
    C: Console,
{
    fn handle(&mut self, request: Request<'_>, _reply: &mut Reply) -> u8 {
        self.perform(request.payload).into()
    }
}
