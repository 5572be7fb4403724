//! Target side of the ChipWhisperer SimpleSerial command protocol.
//!
//! Commands are single bytes registered against a [`Handler`]. The host
//! sends a framed payload, the framework decodes it, invokes the handler
//! and acknowledges with the handler's status byte.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod command_buffer;
pub mod command_processor;
pub mod crc;
pub mod hex;

pub use command_processor::{Dispatch, Handler, Reply, Request, SimpleSerial};

/// Maximum number of commands a processor can hold.
pub const MAX_COMMANDS: usize = 16;

/// Maximum decoded payload length of a single command or response.
pub const MAX_PAYLOAD: usize = 64;

/// Staging capacity that fits the largest frame of either protocol.
pub const FRAME_CAPACITY: usize = 2 * MAX_PAYLOAD + 2;

/// Command byte answered with the protocol version when enabled.
pub const VERSION_COMMAND: u8 = b'v';

/// Wire protocol revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    /// ASCII hex frames, no acknowledgement.
    V1_0,
    /// ASCII hex frames acknowledged with `z`.
    V1_1,
    /// COBS frames with CRC-8, acknowledged with `e`.
    V2_1,
}

impl Protocol {
    /// The code reported by the version command.
    pub const fn version_code(self) -> u8 {
        match self {
            Self::V1_0 => 0,
            Self::V1_1 => 1,
            Self::V2_1 => 3,
        }
    }
}

pub mod error {
    /// The staging buffer has no room for more bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Overflow;

    /// A payload exceeds [`MAX_PAYLOAD`](crate::MAX_PAYLOAD).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct PayloadTooLong;

    /// A COBS block is malformed or the destination is too small.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Cobs;

    /// Command registration failure.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Register {
        Full,
        PayloadTooLong,
    }

    impl From<PayloadTooLong> for Register {
        fn from(_: PayloadTooLong) -> Self {
            Self::PayloadTooLong
        }
    }

    /// Why an incoming frame was dropped.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Reject {
        UnknownCommand(u8),
        /// A line terminator arrived inside the hex payload.
        EarlyTerminator,
        /// The byte after the hex payload was not a line terminator.
        MissingTerminator,
        InvalidHex,
        Framing,
        Crc,
        Length,
        /// The staging buffer filled without yielding a frame.
        Overflow,
    }

    impl Reject {
        /// Error code sent back to the host by protocol 2.1.
        pub const fn code(self) -> u8 {
            match self {
                Self::UnknownCommand(_) => 0x01,
                Self::Crc => 0x02,
                Self::Length | Self::Overflow => 0x04,
                Self::EarlyTerminator
                | Self::MissingTerminator
                | Self::InvalidHex
                | Self::Framing => 0x05,
            }
        }
    }

    impl From<Overflow> for Reject {
        fn from(_: Overflow) -> Self {
            Self::Overflow
        }
    }

    impl From<Cobs> for Reject {
        fn from(_: Cobs) -> Self {
            Self::Framing
        }
    }

    impl From<PayloadTooLong> for Reject {
        fn from(_: PayloadTooLong) -> Self {
            Self::Length
        }
    }

    /// Failure of the underlying serial port.
    #[derive(Debug)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Error<E> {
        Io(E),
        /// The port returned no bytes.
        EndOfStream,
        /// Outgoing data exceeds [`MAX_PAYLOAD`](crate::MAX_PAYLOAD).
        PayloadTooLong,
    }
}
