//! ## RTP Control Protocol
//!
//! [RFC3550]: https://tools.ietf.org/html/rfc3550#section-6
//! [RFC4585]: https://tools.ietf.org/html/rfc4585
//!
//! RTCP is based on the periodic transmission of control packets to all
//! participants in the session. Each control packet starts with the common
//! 32-bit header word followed by the sender's SSRC, and packets are
//! stacked back to back into compound packets whose boundaries are
//! recovered from the per-packet length fields ([RFC3550]).
//!
//! The feedback profile of [RFC4585] reuses the report count bits of the
//! header as a feedback message type and appends feedback control
//! information after the media source SSRC.

pub mod feedback;

use bytes::{BufMut, BytesMut};
use num_enum::TryFromPrimitive;

use crate::Error;

/// Common header word plus the sender SSRC word.
pub const HEADER_SIZE: usize = 8;

pub(crate) const VERSION: u8 = 2;

const VERSION_MASK: u8 = 0b11000000;
const PADDING_MASK: u8 = 0b00100000;
const COUNT_MASK: u8 = 0b00011111;

/// RTCP packet types registered for the AVPF profile.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
pub enum PacketKind {
    SenderReport = 200,
    ReceiverReport = 201,
    SourceDescription = 202,
    Goodbye = 203,
    App = 204,
    TransportFeedback = 205,
    PayloadFeedback = 206,
    ExtendedReport = 207,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// padding (P): 1 bit
    ///
    /// If the padding bit is set, this individual RTCP packet contains
    /// some additional padding octets at the end which are not part of
    /// the control information but are included in the length field.
    pub padding: bool,
    /// reception report count (RC): 5 bits
    ///
    /// The number of reception report blocks contained in this packet.
    /// Feedback packets reuse these bits as the feedback message type
    /// (FMT) selecting the FCI layout.
    pub count: u8,
    /// packet type (PT): 8 bits
    ///
    /// Contains a constant identifying the RTCP packet type.
    pub kind: PacketKind,
    /// length: 16 bits
    ///
    /// The length of this RTCP packet in 32-bit words minus one,
    /// including the header and any padding.
    pub length: u16,
    /// SSRC of packet sender: 32 bits
    ///
    /// The synchronization source identifier for the originator of this
    /// packet.
    pub ssrc: u32,
}

impl Header {
    /// Total packet size in bytes claimed by the length field.
    pub const fn packet_size(&self) -> usize {
        (self.length as usize + 1) * 4
    }

    /// Peeks the claimed packet size out of a raw buffer.
    ///
    /// The buffer length must be >= 4.
    pub fn peek_size(bytes: &[u8]) -> usize {
        (u16::from_be_bytes([bytes[2], bytes[3]]) as usize + 1) * 4
    }

    /// Decodes the common header prefix. The length field is carried as
    /// claimed, whole-packet length validation is up to the caller.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::rtcp::{Header, PacketKind};
    ///
    /// let bytes = [0x80u8, 0xC8, 0x00, 0x06, 0x75, 0x6D, 0x56, 0x40];
    ///
    /// let header = Header::decode(&bytes).unwrap();
    ///
    /// assert!(!header.padding);
    /// assert_eq!(header.count, 0);
    /// assert_eq!(header.kind, PacketKind::SenderReport);
    /// assert_eq!(header.length, 6);
    /// assert_eq!(header.packet_size(), 28);
    /// assert_eq!(header.ssrc, 0x756D5640);
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::InvalidInput);
        }

        if (bytes[0] & VERSION_MASK) >> 6 != VERSION {
            return Err(Error::InvalidInput);
        }

        Ok(Self {
            padding: bytes[0] & PADDING_MASK != 0,
            count: bytes[0] & COUNT_MASK,
            kind: PacketKind::try_from(bytes[1])?,
            length: u16::from_be_bytes(bytes[2..4].try_into()?),
            ssrc: u32::from_be_bytes(bytes[4..8].try_into()?),
        })
    }

    /// Appends the encoded header, the buffer is not cleared.
    pub fn encode(&self, bytes: &mut BytesMut) {
        let mut first = (VERSION << 6) | (self.count & COUNT_MASK);
        if self.padding {
            first |= PADDING_MASK;
        }

        bytes.put_u8(first);
        bytes.put_u8(self.kind as u8);
        bytes.put_u16(self.length);
        bytes.put_u32(self.ssrc);
    }
}

/// A decoded RTCP packet, dispatched on packet type and feedback format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet<'a> {
    Nack(feedback::Nack<'a>),
    Pli(feedback::Pli),
    Other(Header, &'a [u8]),
}

impl<'a> Packet<'a> {
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Nack(_) => PacketKind::TransportFeedback,
            Self::Pli(_) => PacketKind::PayloadFeedback,
            Self::Other(header, _) => header.kind,
        }
    }

    /// Decodes a single packet, the slice must cover exactly the region
    /// the length field claims.
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        let header = Header::decode(bytes)?;
        if header.packet_size() != bytes.len() {
            return Err(Error::LengthMismatch);
        }

        Ok(match (header.kind, header.count) {
            (PacketKind::TransportFeedback, feedback::NACK_FORMAT) => {
                Self::Nack(feedback::Nack::decode(bytes)?)
            }
            (PacketKind::PayloadFeedback, feedback::PLI_FORMAT) => {
                Self::Pli(feedback::Pli::decode(bytes)?)
            }
            _ => Self::Other(header, &bytes[HEADER_SIZE..]),
        })
    }
}

/// Iterator over the back-to-back packets of a compound buffer.
///
/// Every item borrows exactly the region its length field claims.
/// Iteration fuses after the first error, a malformed length would
/// desynchronize all following boundaries.
pub struct Compound<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Compound<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }
}

impl<'a> Iterator for Compound<'a> {
    type Item = Result<Packet<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.bytes.len() {
            return None;
        }

        let rest = &self.bytes[self.offset..];
        if rest.len() < HEADER_SIZE {
            self.offset = self.bytes.len();
            return Some(Err(Error::LengthMismatch));
        }

        let size = Header::peek_size(rest);
        if size > rest.len() {
            self.offset = self.bytes.len();
            return Some(Err(Error::LengthMismatch));
        }

        match Packet::decode(&rest[..size]) {
            Ok(packet) => {
                self.offset += size;
                Some(Ok(packet))
            }
            Err(e) => {
                self.offset = self.bytes.len();
                Some(Err(e))
            }
        }
    }
}
