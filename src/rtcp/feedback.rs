//! ## RTCP-Based Feedback Messages
//!
//! [RFC4585]: https://tools.ietf.org/html/rfc4585#section-6
//!
//! Feedback messages share the common packet format of [RFC4585]: the
//! header's count bits carry the feedback message type (FMT), the sender
//! SSRC is followed by the media source SSRC the feedback refers to, and
//! feedback control information (FCI) entries fill the rest of the packet.

use std::iter::once;

use bytes::{BufMut, BytesMut};

use crate::{
    Error,
    rtcp::{HEADER_SIZE, Header, PacketKind},
};

/// FMT of the Generic NACK transport feedback message.
pub const NACK_FORMAT: u8 = 1;

/// FMT of the Picture Loss Indication payload feedback message.
pub const PLI_FORMAT: u8 = 1;

/// A single Generic NACK FCI pair.
///
/// ```bash
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |            PID                |             BLP               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The pair reports the packet id as lost together with any of the 16
/// sequence numbers following it, the least significant bitmask bit
/// standing for `packet_id + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NackBlock {
    pub packet_id: u16,
    pub bitmask: u16,
}

impl NackBlock {
    /// Builds a pair anchored at `packet_id` reporting every number in
    /// `lost` that falls within the 16 sequence numbers after it, other
    /// numbers are ignored.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::rtcp::feedback::NackBlock;
    ///
    /// let block = NackBlock::new(0, &[1, 3, 5, 7, 9, 11, 13, 15]);
    ///
    /// assert_eq!(block.bitmask, 0x5555);
    /// ```
    pub fn new(packet_id: u16, lost: &[u16]) -> Self {
        let mut bitmask = 0;
        for item in lost.iter().copied() {
            let diff = item.wrapping_sub(packet_id);
            if (1..=16).contains(&diff) {
                bitmask |= 1 << (diff - 1);
            }
        }

        Self { packet_id, bitmask }
    }

    /// All sequence numbers the pair reports, the packet id first.
    pub fn lost(self) -> impl Iterator<Item = u16> {
        once(self.packet_id).chain((1..=16u16).filter_map(move |k| {
            (self.bitmask & (1 << (k - 1)) != 0).then(|| self.packet_id.wrapping_add(k))
        }))
    }

    /// Greedily groups lost sequence numbers into the fewest pairs: each
    /// pair anchors at the smallest remaining number and absorbs the 16
    /// numbers after it.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::rtcp::feedback::NackBlock;
    ///
    /// let blocks = NackBlock::group(&[1, 3, 5, 7, 9]).unwrap();
    ///
    /// assert_eq!(blocks.len(), 1);
    /// assert_eq!(blocks[0].packet_id, 1);
    /// assert_eq!(blocks[0].bitmask, 0x00AA);
    /// ```
    pub fn group(lost: &[u16]) -> Result<Vec<Self>, Error> {
        if lost.is_empty() {
            return Err(Error::EmptyNackSet);
        }

        let mut items = lost.to_vec();
        items.sort_unstable();
        items.dedup();

        let mut blocks = Vec::with_capacity(1);
        let mut packet_id = items[0];
        let mut bitmask: u16 = 0;
        for item in items.into_iter().skip(1) {
            let diff = item - packet_id;
            if diff <= 16 {
                bitmask |= 1 << (diff - 1);
            } else {
                blocks.push(Self { packet_id, bitmask });
                packet_id = item;
                bitmask = 0;
            }
        }

        blocks.push(Self { packet_id, bitmask });
        Ok(blocks)
    }
}

/// A Generic NACK transport feedback packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nack<'a> {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
    fci: &'a [u8],
}

impl<'a> Nack<'a> {
    /// Decodes a whole NACK packet, the slice must cover exactly the
    /// region the length field claims.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::rtcp::feedback::Nack;
    ///
    /// let bytes = [
    ///     0x81u8, 0xCD, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x30, 0x39, 0x00, 0x00, 0x55, 0x55,
    /// ];
    ///
    /// let nack = Nack::decode(&bytes).unwrap();
    ///
    /// assert_eq!(nack.media_ssrc, 12345);
    /// assert_eq!(
    ///     nack.lost().collect::<Vec<_>>(),
    ///     [0, 1, 3, 5, 7, 9, 11, 13, 15]
    /// );
    /// ```
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        let header = Header::decode(bytes)?;
        if header.kind != PacketKind::TransportFeedback || header.count != NACK_FORMAT {
            return Err(Error::TypeMismatch);
        }

        if header.packet_size() != bytes.len() {
            return Err(Error::LengthMismatch);
        }

        if bytes.len() < HEADER_SIZE + 4 {
            return Err(Error::InvalidInput);
        }

        let fci = &bytes[HEADER_SIZE + 4..];
        if fci.is_empty() {
            return Err(Error::InvalidInput);
        }

        Ok(Self {
            sender_ssrc: header.ssrc,
            media_ssrc: u32::from_be_bytes(bytes[8..12].try_into()?),
            fci,
        })
    }

    /// Iterates the FCI pairs.
    pub fn blocks(&self) -> Blocks<'a> {
        Blocks { fci: self.fci }
    }

    /// All lost sequence numbers the packet reports, in FCI order.
    pub fn lost(&self) -> impl Iterator<Item = u16> + 'a {
        self.blocks().flat_map(NackBlock::lost)
    }

    /// Encodes a NACK for a set of lost sequence numbers, grouped into
    /// the fewest FCI pairs. The buffer is cleared first and the length
    /// field is backfilled once the total size is known.
    ///
    /// # Test
    ///
    /// ```
    /// use bytes::BytesMut;
    /// use rtp_codec::rtcp::feedback::Nack;
    ///
    /// let mut buf = BytesMut::new();
    /// Nack::encode(0, 12345, &[0, 1, 3, 5, 7, 9, 11, 13, 15], &mut buf).unwrap();
    ///
    /// let expected = [
    ///     0x81u8, 0xCD, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x30, 0x39, 0x00, 0x00, 0x55, 0x55,
    /// ];
    ///
    /// assert_eq!(&buf[..], &expected[..]);
    /// ```
    pub fn encode(
        sender_ssrc: u32,
        media_ssrc: u32,
        lost: &[u16],
        bytes: &mut BytesMut,
    ) -> Result<(), Error> {
        let blocks = NackBlock::group(lost)?;

        bytes.clear();
        Header {
            padding: false,
            count: NACK_FORMAT,
            kind: PacketKind::TransportFeedback,
            length: 0,
            ssrc: sender_ssrc,
        }
        .encode(bytes);

        bytes.put_u32(media_ssrc);
        for block in blocks {
            bytes.put_u16(block.packet_id);
            bytes.put_u16(block.bitmask);
        }

        let words = (bytes.len() / 4 - 1) as u16;
        bytes[2..4].copy_from_slice(words.to_be_bytes().as_slice());

        Ok(())
    }
}

/// Iterator over the FCI pairs of a NACK packet.
pub struct Blocks<'a> {
    fci: &'a [u8],
}

impl<'a> Iterator for Blocks<'a> {
    type Item = NackBlock;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fci.len() < 4 {
            return None;
        }

        let packet_id = u16::from_be_bytes([self.fci[0], self.fci[1]]);
        let bitmask = u16::from_be_bytes([self.fci[2], self.fci[3]]);
        self.fci = &self.fci[4..];

        Some(NackBlock { packet_id, bitmask })
    }
}

/// A Picture Loss Indication payload feedback packet. The FCI is empty,
/// the packet is exactly the feedback header and the two SSRC words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pli {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
}

impl Pli {
    pub const SIZE: usize = HEADER_SIZE + 4;

    /// # Test
    ///
    /// ```
    /// use rtp_codec::rtcp::feedback::Pli;
    ///
    /// let bytes = [
    ///     0x81u8, 0xCE, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
    ///     0x30, 0x39,
    /// ];
    ///
    /// let pli = Pli::decode(&bytes).unwrap();
    ///
    /// assert_eq!(pli.sender_ssrc, 1);
    /// assert_eq!(pli.media_ssrc, 12345);
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let header = Header::decode(bytes)?;
        if header.kind != PacketKind::PayloadFeedback || header.count != PLI_FORMAT {
            return Err(Error::TypeMismatch);
        }

        if bytes.len() != Self::SIZE || header.packet_size() != bytes.len() {
            return Err(Error::LengthMismatch);
        }

        Ok(Self {
            sender_ssrc: header.ssrc,
            media_ssrc: u32::from_be_bytes(bytes[8..12].try_into()?),
        })
    }

    /// Encodes a PLI, the buffer is cleared first.
    pub fn encode(&self, bytes: &mut BytesMut) {
        bytes.clear();
        Header {
            padding: false,
            count: PLI_FORMAT,
            kind: PacketKind::PayloadFeedback,
            length: (Self::SIZE / 4 - 1) as u16,
            ssrc: self.sender_ssrc,
        }
        .encode(bytes);

        bytes.put_u32(self.media_ssrc);
    }
}
