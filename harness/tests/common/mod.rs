//! Fake board that records every hardware interaction.
//!
//! Serial output and debug printing share one transmit log, as they share
//! one UART on real targets.

#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, convert::Infallible, rc::Rc};

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_io::{ErrorType, Read, Write};
use harness::{Board, CommandHandler, Console, DebugPrinter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    PlatformInit,
    UartInit,
    TriggerSetup,
    High,
    Low,
    Execute,
}

#[derive(Default)]
pub struct Bench {
    pub events: Vec<Event>,
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub trigger_high: bool,
}

pub type Probe = Rc<RefCell<Bench>>;

pub fn probe(rx: &[u8]) -> Probe {
    Rc::new(RefCell::new(Bench {
        rx: rx.iter().copied().collect(),
        ..Bench::default()
    }))
}

pub struct FakeBoard(pub Probe);

pub struct FakeSerial(Probe);

pub struct FakeConsole(Probe);

pub struct FakePin(Probe);

impl Board for FakeBoard {
    type Serial = FakeSerial;
    type Console = FakeConsole;
    type Trigger = FakePin;

    fn platform_init(&mut self) {
        self.0.borrow_mut().events.push(Event::PlatformInit);
    }

    fn init_uart(&mut self) -> (FakeSerial, FakeConsole) {
        self.0.borrow_mut().events.push(Event::UartInit);
        (FakeSerial(self.0.clone()), FakeConsole(self.0.clone()))
    }

    fn trigger_setup(&mut self) -> FakePin {
        self.0.borrow_mut().events.push(Event::TriggerSetup);
        FakePin(self.0.clone())
    }
}

impl ErrorType for FakeSerial {
    type Error = Infallible;
}

impl Read for FakeSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut bench = self.0.borrow_mut();
        let count = buf.len().min(bench.rx.len());
        for slot in &mut buf[..count] {
            *slot = bench.rx.pop_front().unwrap();
        }
        Ok(count)
    }
}

impl Write for FakeSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.borrow_mut().tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Console for FakeConsole {
    fn putch(&mut self, byte: u8) {
        self.0.borrow_mut().tx.push(byte);
    }
}

impl PinErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut bench = self.0.borrow_mut();
        bench.trigger_high = false;
        bench.events.push(Event::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut bench = self.0.borrow_mut();
        assert!(!bench.trigger_high, "trigger raised twice");
        bench.trigger_high = true;
        bench.events.push(Event::High);
        Ok(())
    }
}

/// A workload that checks it runs inside the measurement window.
pub fn workload(probe: &Probe) -> impl FnMut() {
    let probe = probe.clone();
    move || {
        let mut bench = probe.borrow_mut();
        assert!(bench.trigger_high, "workload ran outside the trigger window");
        bench.events.push(Event::Execute);
    }
}

pub fn handler(probe: &Probe, debug: bool) -> CommandHandler<FakePin, impl FnMut(), FakeConsole> {
    CommandHandler::new(
        FakePin(probe.clone()),
        workload(probe),
        DebugPrinter::new(FakeConsole(probe.clone()), debug),
    )
}

pub const SETUP: [Event; 3] = [Event::PlatformInit, Event::UartInit, Event::TriggerSetup];

pub const BRACKET: [Event; 3] = [Event::High, Event::Execute, Event::Low];

/// Setup followed by `runs` back-to-back brackets.
pub fn bracketed(runs: usize) -> Vec<Event> {
    SETUP
        .into_iter()
        .chain(BRACKET.into_iter().cycle().take(3 * runs))
        .collect()
}

pub fn events(probe: &Probe) -> Vec<Event> {
    probe.borrow().events.clone()
}

pub fn tx(probe: &Probe) -> Vec<u8> {
    probe.borrow().tx.clone()
}
