use embedded_io::{Read, Write};
use heapless::Vec;

use crate::{
    command_buffer::CommandBuffer,
    crc::{self, Crc8},
    error::{self, Error, Reject},
    hex, Protocol, FRAME_CAPACITY, MAX_COMMANDS, MAX_PAYLOAD, VERSION_COMMAND,
};

pub(crate) type Payload = Vec<u8, MAX_PAYLOAD>;

/// A decoded frame awaiting dispatch.
pub(crate) struct Frame {
    pub cmd: u8,
    pub scmd: u8,
    pub payload: Payload,
}

/// A decoded command handed to a [`Handler`].
///
/// `scmd` is always `0` under protocol 1.x.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub cmd: u8,
    pub scmd: u8,
    pub payload: &'a [u8],
}

/// Response data a handler sends back ahead of the acknowledgement.
#[derive(Debug, Default)]
pub struct Reply {
    payload: Option<Payload>,
}

impl Reply {
    pub const fn new() -> Self {
        Self { payload: None }
    }

    /// Queue `data` as an `r` packet, replacing anything queued before.
    pub fn send(&mut self, data: &[u8]) -> Result<(), error::PayloadTooLong> {
        self.payload = Some(Payload::from_slice(data).map_err(|_| error::PayloadTooLong)?);
        Ok(())
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }
}

/// A command callback.
///
/// The returned byte is the status carried by the acknowledgement.
pub trait Handler {
    fn handle(&mut self, request: Request<'_>, reply: &mut Reply) -> u8;
}

impl<F> Handler for F
where
    F: FnMut(Request<'_>, &mut Reply) -> u8,
{
    fn handle(&mut self, request: Request<'_>, reply: &mut Reply) -> u8 {
        self(request, reply)
    }
}

struct Entry<'h> {
    cmd: u8,
    len: usize,
    handler: &'h mut dyn Handler,
}

/// Outcome of servicing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    Handled { cmd: u8, status: u8 },
    Rejected(Reject),
}

enum Parsed {
    /// More bytes are needed.
    Incomplete,
    /// Bytes were consumed without producing a frame.
    Skipped,
    Frame(Frame),
    Rejected(Reject),
}

/// The SimpleSerial command processor.
///
/// Owns the serial port and a table of borrowed handlers. Received bytes
/// are staged in a `CommandBuffer<N>` until a complete frame is available.
pub struct SimpleSerial<'h, P, const N: usize = FRAME_CAPACITY>
where
    P: Read + Write,
{
    port: P,
    protocol: Protocol,
    commands: Vec<Entry<'h>, MAX_COMMANDS>,
    version_command: bool,
    buf: CommandBuffer<N>,
}

impl<'h, P, const N: usize> SimpleSerial<'h, P, N>
where
    P: Read + Write,
{
    pub fn new(port: P, protocol: Protocol) -> Self {
        Self {
            port,
            protocol,
            commands: Vec::new(),
            version_command: false,
            buf: CommandBuffer::new(),
        }
    }

    /// Answer [`VERSION_COMMAND`] with the protocol version code.
    ///
    /// A handler registered for the same byte takes precedence.
    pub fn with_version_command(mut self) -> Self {
        self.version_command = true;
        self
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Register `handler` for `cmd`, expecting `len` payload bytes.
    ///
    /// Registering a command again replaces its handler. Frames whose
    /// payload length differs from `len` are rejected.
    pub fn add_cmd(&mut self, cmd: u8, len: usize, handler: &'h mut dyn Handler) -> Result<(), error::Register> {
        if len > MAX_PAYLOAD {
            Err(error::PayloadTooLong)?
        }

        if let Some(entry) = self.commands.iter_mut().find(|entry| entry.cmd == cmd) {
            entry.len = len;
            entry.handler = handler;
            return Ok(());
        }

        self.commands
            .push(Entry { cmd, len, handler })
            .map_err(|_| error::Register::Full)
    }

    /// Block until one frame has been dispatched or rejected.
    pub fn poll(&mut self) -> Result<Dispatch, Error<P::Error>> {
        loop {
            match self.parse() {
                Parsed::Frame(frame) => return self.dispatch(frame),
                Parsed::Rejected(reject) => return self.reject(reject),
                Parsed::Skipped => {}
                Parsed::Incomplete if self.buf.is_full() => {
                    self.buf.clear();
                    return self.reject(Reject::Overflow);
                }
                Parsed::Incomplete => self.fill()?,
            }
        }
    }

    /// Service frames forever.
    pub fn run(&mut self) -> ! {
        loop {
            if self.poll().is_err() {
                warn!("serial port error");
            }
        }
    }

    /// Send a packet tagged `c` carrying `data`.
    pub fn put(&mut self, c: u8, data: &[u8]) -> Result<(), Error<P::Error>> {
        if data.len() > MAX_PAYLOAD {
            return Err(Error::PayloadTooLong);
        }

        match self.protocol {
            Protocol::V1_0 | Protocol::V1_1 => {
                self.port.write_all(&[c]).map_err(Error::Io)?;
                for &byte in data {
                    self.port.write_all(&hex::encode(byte)).map_err(Error::Io)?;
                }
                self.port.write_all(b"\n").map_err(Error::Io)?;
            }
            Protocol::V2_1 => {
                let mut stuffed = [0u8; crc::MAX_RENDERED + 1];
                let len = crc::render(c, data, &mut stuffed, &mut Crc8::new())
                    .map_err(|_| Error::PayloadTooLong)?;
                // delimiter
                stuffed[len] = 0;
                self.port.write_all(&stuffed[..=len]).map_err(Error::Io)?;
            }
        }

        self.port.flush().map_err(Error::Io)
    }

    fn parse(&mut self) -> Parsed {
        match self.protocol {
            Protocol::V1_0 | Protocol::V1_1 => self.parse_ascii(),
            Protocol::V2_1 => self.parse_stuffed(),
        }
    }

    fn parse_ascii(&mut self) -> Parsed {
        let mut cursor = self.buf.cursor();

        let Some(cmd) = cursor.next() else {
            return Parsed::Incomplete;
        };

        let outcome = match self.payload_len(cmd) {
            Some(len) => ascii_body(&mut cursor, len),
            None => Some(Err(Reject::UnknownCommand(cmd))),
        };
        let consumed = cursor.consumed();

        let Some(result) = outcome else {
            return Parsed::Incomplete;
        };

        self.buf.flush(consumed);

        match result {
            Ok(payload) => Parsed::Frame(Frame {
                cmd,
                scmd: 0,
                payload,
            }),
            Err(reject) => Parsed::Rejected(reject),
        }
    }

    fn parse_stuffed(&mut self) -> Parsed {
        let Some(end) = self.buf.cursor().position(|byte| byte == 0) else {
            return Parsed::Incomplete;
        };

        let mut cursor = self.buf.cursor();
        let mut stuffed = Vec::<u8, FRAME_CAPACITY>::new();
        let mut fits = true;

        for byte in cursor.by_ref().take(end) {
            fits &= stuffed.push(byte).is_ok();
        }
        // delimiter
        cursor.next();

        let consumed = cursor.consumed();
        self.buf.flush(consumed);

        if end == 0 {
            return Parsed::Skipped;
        }

        if !fits {
            return Parsed::Rejected(Reject::Length);
        }

        let Ok(len) = cobs::decode_in_place(&mut stuffed) else {
            return Parsed::Rejected(Reject::Framing);
        };

        match crc::construct(&stuffed[..len], &mut Crc8::new()) {
            Ok(frame) => Parsed::Frame(frame),
            Err(reject) => Parsed::Rejected(reject),
        }
    }

    fn payload_len(&self, cmd: u8) -> Option<usize> {
        self.commands
            .iter()
            .find(|entry| entry.cmd == cmd)
            .map(|entry| entry.len)
            .or((self.version_command && cmd == VERSION_COMMAND).then_some(0))
    }

    fn fill(&mut self) -> Result<(), Error<P::Error>> {
        let read = self.port.read(self.buf.spare_mut()).map_err(Error::Io)?;

        if read == 0 {
            return Err(Error::EndOfStream);
        }

        trace!("staged {} bytes", read);
        self.buf.commit(read);

        Ok(())
    }

    fn dispatch(&mut self, frame: Frame) -> Result<Dispatch, Error<P::Error>> {
        let request = Request {
            cmd: frame.cmd,
            scmd: frame.scmd,
            payload: frame.payload.as_slice(),
        };
        let mut reply = Reply::new();

        let index = self.commands.iter().position(|entry| entry.cmd == frame.cmd);
        let status = match index {
            Some(index) if self.commands[index].len != request.payload.len() => {
                return self.reject(Reject::Length);
            }
            Some(index) => self.commands[index].handler.handle(request, &mut reply),
            None if self.version_command && frame.cmd == VERSION_COMMAND => self.protocol.version_code(),
            None => return self.reject(Reject::UnknownCommand(frame.cmd)),
        };

        if let Some(data) = reply.payload() {
            self.put(b'r', data)?;
        }

        match self.protocol {
            Protocol::V1_0 => {}
            Protocol::V1_1 => self.put(b'z', &[status])?,
            Protocol::V2_1 => self.put(b'e', &[status])?,
        }

        debug!("command {} handled with status {}", frame.cmd, status);

        Ok(Dispatch::Handled {
            cmd: frame.cmd,
            status,
        })
    }

    fn reject(&mut self, reject: Reject) -> Result<Dispatch, Error<P::Error>> {
        warn!("frame dropped: {}", reject);

        // protocol 1.x drops bad frames silently
        if self.protocol == Protocol::V2_1 {
            self.put(b'e', &[reject.code()])?;
        }

        Ok(Dispatch::Rejected(reject))
    }
}

#[inline]
fn is_terminator(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Read `len` hex-encoded bytes and the line terminator.
///
/// `None` when the input runs out first. The terminator is checked
/// before the digits are validated.
fn ascii_body(bytes: &mut impl Iterator<Item = u8>, len: usize) -> Option<Result<Payload, Reject>> {
    let mut payload = Payload::new();
    let mut invalid = false;

    for _ in 0..len {
        let mut pair = [0u8; 2];
        for digit in pair.iter_mut() {
            *digit = bytes.next()?;
            if is_terminator(*digit) {
                return Some(Err(Reject::EarlyTerminator));
            }
        }

        match hex::decode(pair) {
            Some(byte) => invalid |= payload.push(byte).is_err(),
            None => invalid = true,
        }
    }

    let terminator = bytes.next()?;

    Some(if !is_terminator(terminator) {
        Err(Reject::MissingTerminator)
    } else if invalid {
        Err(Reject::InvalidHex)
    } else {
        Ok(payload)
    })
}
