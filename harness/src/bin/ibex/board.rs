//! CW305 Ibex soft core: memory-mapped UART and GPIO.

use core::{
    convert::Infallible,
    ptr::{read_volatile, write_volatile},
};

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_io::{ErrorType, Read, Write};
use harness::{Board, Console};

const GPIO_BASE: usize = 0x8000_0000;
const GPIO_OUT: usize = GPIO_BASE;

const UART_BASE: usize = 0x8000_1000;
const UART_RX: usize = UART_BASE;
const UART_TX: usize = UART_BASE + 0x4;
const UART_STATUS: usize = UART_BASE + 0x8;

const UART_STATUS_RX_EMPTY: u32 = 1 << 0;
const UART_STATUS_TX_FULL: u32 = 1 << 1;

const TRIGGER_MASK: u32 = 1 << 0;

#[inline]
fn read_reg(addr: usize) -> u32 {
    // SAFETY: only called with the register addresses above, which are
    // valid, aligned MMIO on this target.
    unsafe { read_volatile(addr as *const u32) }
}

#[inline]
fn write_reg(addr: usize, value: u32) {
    // SAFETY: see `read_reg`.
    unsafe { write_volatile(addr as *mut u32, value) }
}

/// Handle to the UART registers.
///
/// The port and the debug console are both handles to the same UART;
/// execution is single-threaded so they never interleave mid-byte.
#[derive(Clone, Copy)]
pub struct Uart {
    _p: (),
}

impl Uart {
    #[inline]
    fn rx_ready(&self) -> bool {
        read_reg(UART_STATUS) & UART_STATUS_RX_EMPTY == 0
    }

    fn receive(&mut self) -> u8 {
        while !self.rx_ready() {}
        read_reg(UART_RX) as u8
    }

    fn transmit(&mut self, byte: u8) {
        while read_reg(UART_STATUS) & UART_STATUS_TX_FULL != 0 {}
        write_reg(UART_TX, byte as u32);
    }
}

impl ErrorType for Uart {
    type Error = Infallible;
}

impl Read for Uart {
    /// Blocks for the first byte, then drains what is already waiting.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };

        *first = self.receive();

        let mut count = 1;
        for slot in rest {
            if !self.rx_ready() {
                break;
            }
            *slot = read_reg(UART_RX) as u8;
            count += 1;
        }

        Ok(count)
    }
}

impl Write for Uart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        buf.iter().for_each(|&byte| self.transmit(byte));
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Console for Uart {
    fn putch(&mut self, byte: u8) {
        self.transmit(byte);
    }
}

/// Trigger output on GPIO bit 0.
pub struct Trigger {
    _p: (),
}

impl PinErrorType for Trigger {
    type Error = Infallible;
}

impl OutputPin for Trigger {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        write_reg(GPIO_OUT, read_reg(GPIO_OUT) & !TRIGGER_MASK);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        write_reg(GPIO_OUT, read_reg(GPIO_OUT) | TRIGGER_MASK);
        Ok(())
    }
}

pub struct Ibex {
    _p: (),
}

impl Ibex {
    /// Claim the board. Call once, from `main`.
    pub fn take() -> Self {
        Self { _p: () }
    }
}

impl Board for Ibex {
    type Serial = Uart;
    type Console = Uart;
    type Trigger = Trigger;

    fn platform_init(&mut self) {
        // clocks and pin muxing are fixed by the bitstream
    }

    fn init_uart(&mut self) -> (Uart, Uart) {
        // baud rate is fixed by the bitstream
        let uart = Uart { _p: () };
        (uart, uart)
    }

    fn trigger_setup(&mut self) -> Trigger {
        let mut trigger = Trigger { _p: () };
        let _ = trigger.set_low();
        trigger
    }
}
