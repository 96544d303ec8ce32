//! ## Secure RTCP
//!
//! [RFC3711]: https://tools.ietf.org/html/rfc3711#section-3.4
//!
//! SRTCP appends a trailer to every RTCP compound packet: a 32-bit word
//! carrying the encryption flag (E) in its top bit and the 31-bit SRTCP
//! index below it, then the authentication tag. The tag covers the RTCP
//! payload together with the index word, and its length is fixed by the
//! negotiated crypto suite rather than carried on the wire.
//!
//! [`Authenticated`] and [`Unauthenticated`] are the two states a packet
//! moves between: stripping the trailer is the only way from the first to
//! the second, appending or computing a trailer the only way back.

use bytes::{BufMut, BytesMut};

use crate::{
    Error,
    crypto::Authenticator,
    rtcp::{self, Compound, Packet, feedback},
    view::View,
};

/// The SRTCP index is 31 bits.
pub const MAX_INDEX: u32 = 0x7FFF_FFFF;

const E_FLAG: u32 = 1 << 31;

/// A packet still carrying its SRTCP trailer.
///
/// Only the leading header is validated on decode, the payload behind it
/// may be a compound packet or ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authenticated<'a> {
    bytes: &'a [u8],
}

impl<'a> Authenticated<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < rtcp::HEADER_SIZE {
            return Err(Error::InsufficientLength);
        }

        rtcp::Header::decode(bytes)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Splits off the trailer: the index, the encryption flag, the tag
    /// and the remaining packet without its trailer.
    ///
    /// `tag_len` comes from the negotiated suite, the trailer is not
    /// self-describing.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::srtcp::Authenticated;
    ///
    /// let bytes = [
    ///     0x81u8, 0xCD, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x30, 0x39, 0x00, 0x00, 0x55, 0x55, 0x80, 0x00, 0x00, 0x01,
    ///     0xDE, 0xAD, 0xBE, 0xEF,
    /// ];
    ///
    /// let packet = Authenticated::decode(&bytes).unwrap();
    /// let (index, encrypted, tag, rest) = packet.strip_index_and_tag(4).unwrap();
    ///
    /// assert_eq!(index, 1);
    /// assert!(encrypted);
    /// assert_eq!(tag, &[0xDE, 0xAD, 0xBE, 0xEF]);
    /// assert_eq!(rest.as_bytes().len(), 16);
    /// ```
    pub fn strip_index_and_tag(
        &self,
        tag_len: usize,
    ) -> Result<(u32, bool, &'a [u8], Unauthenticated<'a>), Error> {
        if self.bytes.len() < rtcp::HEADER_SIZE + 4 + tag_len {
            return Err(Error::InsufficientLength);
        }

        let tail_offset = self.bytes.len() - tag_len - 4;
        let word = u32::from_be_bytes(self.bytes[tail_offset..tail_offset + 4].try_into()?);

        Ok((
            word & !E_FLAG,
            word & E_FLAG != 0,
            &self.bytes[self.bytes.len() - tag_len..],
            Unauthenticated {
                bytes: &self.bytes[..tail_offset],
            },
        ))
    }

    /// Verifies the tag over the payload and the index word.
    pub fn verify<A: Authenticator>(
        &self,
        authenticator: &A,
        tag_len: usize,
    ) -> Result<bool, Error> {
        if self.bytes.len() < rtcp::HEADER_SIZE + 4 + tag_len {
            return Err(Error::InsufficientLength);
        }

        let (portion, tag) = self.bytes.split_at(self.bytes.len() - tag_len);
        Ok(authenticator.verify(portion, tag))
    }
}

/// A packet without its trailer, the exact region an authenticator signs
/// apart from the index word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthenticated<'a> {
    bytes: &'a [u8],
}

impl<'a> Unauthenticated<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < rtcp::HEADER_SIZE {
            return Err(Error::InsufficientLength);
        }

        rtcp::Header::decode(bytes)?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Iterates the compound packets of the payload.
    pub fn packets(&self) -> Compound<'a> {
        Compound::new(self.bytes)
    }

    /// Decodes the payload as a single RTCP packet.
    pub fn to_rtcp(&self) -> Result<Packet<'a>, Error> {
        Packet::decode(self.bytes)
    }

    pub fn to_nack(&self) -> Result<feedback::Nack<'a>, Error> {
        feedback::Nack::decode(self.bytes)
    }

    pub fn to_pli(&self) -> Result<feedback::Pli, Error> {
        feedback::Pli::decode(self.bytes)
    }

    /// Appends a caller-provided index word and tag, returning the whole
    /// sealed packet.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::srtcp::Unauthenticated;
    ///
    /// let bytes = [
    ///     0x81u8, 0xCD, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ///     0x30, 0x39, 0x00, 0x00, 0x55, 0x55,
    /// ];
    ///
    /// let tag = [0xDEu8, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD];
    /// let packet = Unauthenticated::decode(&bytes).unwrap();
    /// let sealed = packet.add_index_and_tag(1, false, &tag).unwrap();
    ///
    /// assert_eq!(&sealed[16..20], &[0x00, 0x00, 0x00, 0x01]);
    /// assert_eq!(&sealed[20..], &tag[..]);
    /// ```
    pub fn add_index_and_tag(
        &self,
        index: u32,
        encrypted: bool,
        tag: &[u8],
    ) -> Result<BytesMut, Error> {
        if index > MAX_INDEX {
            return Err(Error::InvalidInput);
        }

        let mut word = index;
        if encrypted {
            word |= E_FLAG;
        }

        let mut tail = BytesMut::with_capacity(4 + tag.len());
        tail.put_u32(word);
        tail.put(tag);

        View::new(self.bytes.len()).concat(self.bytes, &tail)
    }

    /// Computes the tag over the payload and index word, returning the
    /// whole sealed packet.
    pub fn authenticate<A: Authenticator>(
        &self,
        index: u32,
        encrypted: bool,
        authenticator: &A,
    ) -> Result<BytesMut, Error> {
        if index > MAX_INDEX {
            return Err(Error::InvalidInput);
        }

        let mut word = index;
        if encrypted {
            word |= E_FLAG;
        }

        let mut bytes = View::new(self.bytes.len()).copy(self.bytes)?;
        bytes.put_u32(word);

        let tag = authenticator.sign(&bytes)?;
        bytes.put(tag.as_slice());

        Ok(bytes)
    }
}
