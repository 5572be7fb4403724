use crate::{
    command_processor::{Frame, Payload},
    error::{Cobs, Reject},
    MAX_PAYLOAD,
};
use iter::Checksummed;

mod iter;

/// CRC-8 used by protocol 2.1 packets (polynomial `0x4D`).
pub const SIMPLESERIAL_CRC: crc::Algorithm<u8> = crc::Algorithm {
    width: 8,
    poly: 0x4d,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xc3,
    residue: 0x00,
};

static CRC8: crc::Crc<u8> = crc::Crc::<u8>::new(&SIMPLESERIAL_CRC);

/// Describes types that can provide
/// a CRC computation.
pub trait CRCProvider {
    type Word;
    type Rep: Eq;

    fn update(&mut self, word: &Self::Word);

    /// Produce the checksum and start over.
    fn finalize(&mut self) -> Self::Rep;
}

/// Running [`SIMPLESERIAL_CRC`] checksum.
pub struct Crc8 {
    digest: crc::Digest<'static, u8>,
}

impl Default for Crc8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc8 {
    pub fn new() -> Self {
        Self {
            digest: CRC8.digest(),
        }
    }
}

impl CRCProvider for Crc8 {
    type Word = u8;
    type Rep = u8;

    fn update(&mut self, word: &u8) {
        self.digest.update(core::slice::from_ref(word));
    }

    fn finalize(&mut self) -> u8 {
        core::mem::replace(&mut self.digest, CRC8.digest()).finalize()
    }
}

/// Parse an unstuffed command packet `[cmd, scmd, dlen, data.., crc]`.
pub(crate) fn construct<C>(src: &[u8], crc_provider: &mut C) -> Result<Frame, Reject>
where
    C: CRCProvider<Word = u8, Rep = u8>,
{
    let mut checked = Checksummed::new(crc_provider, src.iter().copied());

    let mut header = [0u8; 3];
    for slot in header.iter_mut() {
        *slot = checked.next().ok_or(Reject::Length)?;
    }
    let [cmd, scmd, dlen] = header;

    if dlen as usize > MAX_PAYLOAD {
        Err(Reject::Length)?
    }

    let mut payload = Payload::new();
    for _ in 0..dlen {
        let byte = checked.next().ok_or(Reject::Length)?;
        payload.push(byte).map_err(|_| Reject::Length)?;
    }

    let (crc_provider, mut src) = checked.into_parts();
    let computed_crc = crc_provider.finalize();
    let read_crc = src.next().ok_or(Reject::Length)?;

    if src.next().is_some() {
        Err(Reject::Length)?
    }

    if computed_crc != read_crc {
        Err(Reject::Crc)?
    }

    Ok(Frame { cmd, scmd, payload })
}

const MAX_RAW: usize = MAX_PAYLOAD + 3;

/// Largest stuffed response packet, excluding the delimiter.
pub(crate) const MAX_RENDERED: usize = MAX_RAW + MAX_RAW / 254 + 1;

/// Render a response packet `[c, len, data.., crc]` stuffed into `dst`,
/// returning the stuffed length.
pub(crate) fn render<C>(c: u8, data: &[u8], dst: &mut [u8], crc_provider: &mut C) -> Result<usize, Cobs>
where
    C: CRCProvider<Word = u8, Rep = u8>,
{
    if data.len() > MAX_PAYLOAD {
        return Err(Cobs);
    }

    let mut raw = [0u8; MAX_RAW];
    let header = [c, data.len() as u8];
    let body = header.len() + data.len();

    Checksummed::new(crc_provider, header.into_iter().chain(data.iter().copied()))
        .zip(raw.iter_mut())
        .for_each(|(byte, slot)| *slot = byte);

    raw[body] = crc_provider.finalize();

    cobs::try_encode(&raw[..=body], dst).map_err(|_| Cobs)
}
