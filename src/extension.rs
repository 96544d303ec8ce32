//! ## A General Mechanism for RTP Header Extensions
//!
//! [RFC5285]: https://tools.ietf.org/html/rfc5285
//!
//! The [RFC5285] mechanism carries multiple extension elements inside the
//! single RTP header extension block. The 16-bit profile cookie in front of
//! the block selects between two element encodings, a compact one-byte form
//! and a two-byte form with an explicit length octet:
//!
//! ```bash
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       0xBE    |    0xDE       |           length=3            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  ID   | L=0   |     data      |  ID   |  L=1  |   data...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!       ...data   |    0 (pad)    |    0 (pad)    |  ID   | L=3   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          data                                 |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The length field counts the element region in 32-bit words, and the
//! region is zero padded up to that boundary. Decoders must also tolerate
//! zero padding between elements, not only at the end of the block.

use std::ops::Range;

use bytes::{BufMut, BytesMut};

use crate::{Error, alignment_32, view::View};

/// block cookie selecting the one-byte element form.
pub const ONE_BYTE_COOKIE: u16 = 0xBEDE;

/// block cookie selecting the two-byte element form. Only the high 12 bits
/// identify the form, the low 4 bits are application bits.
pub const TWO_BYTE_COOKIE: u16 = 0x1000;

const TWO_BYTE_COOKIE_MASK: u16 = 0xFFF0;

/// In the one-byte form the id 15 is reserved: the octet is skipped as
/// padding and never produces an element.
const PADDING_SKIP_ID: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    OneByte,
    TwoByte,
}

impl Profile {
    /// Selects the element form from the block cookie.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::extension::Profile;
    ///
    /// assert_eq!(Profile::from_cookie(0xBEDE).unwrap(), Profile::OneByte);
    /// assert_eq!(Profile::from_cookie(0x1002).unwrap(), Profile::TwoByte);
    /// assert!(Profile::from_cookie(0x4142).is_err());
    /// ```
    pub fn from_cookie(cookie: u16) -> Result<Self, Error> {
        if cookie == ONE_BYTE_COOKIE {
            Ok(Self::OneByte)
        } else if cookie & TWO_BYTE_COOKIE_MASK == TWO_BYTE_COOKIE {
            Ok(Self::TwoByte)
        } else {
            Err(Error::UnsupportedProfile)
        }
    }

    pub fn cookie(&self) -> u16 {
        match self {
            Self::OneByte => ONE_BYTE_COOKIE,
            Self::TwoByte => TWO_BYTE_COOKIE,
        }
    }
}

/// A single decoded extension element.
///
/// `data` borrows the source buffer: 1-16 bytes in the one-byte form,
/// 0-255 bytes in the two-byte form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension<'a> {
    pub id: u8,
    pub data: &'a [u8],
}

/// Decodes the next element from a view positioned at an element's first
/// byte, returning `None` once the view is exhausted.
///
/// Zero padding before the element is consumed, and a one-byte head
/// carrying the reserved id 15 is skipped without producing an element.
///
/// # Test
///
/// ```
/// use rtp_codec::extension::{Profile, decode_element};
/// use rtp_codec::view::View;
///
/// let bytes = [0x10u8, 0xAB, 0x00, 0x00];
/// let mut view = View::new(bytes.len());
///
/// let element = decode_element(Profile::OneByte, &mut view, &bytes)
///     .unwrap()
///     .unwrap();
///
/// assert_eq!(element.id, 1);
/// assert_eq!(element.data, &[0xAB]);
/// assert!(
///     decode_element(Profile::OneByte, &mut view, &bytes)
///         .unwrap()
///         .is_none()
/// );
/// ```
pub fn decode_element<'a>(
    profile: Profile,
    view: &mut View,
    bytes: &'a [u8],
) -> Result<Option<Extension<'a>>, Error> {
    Ok(element_range(profile, view, bytes)?.map(|(id, range)| Extension {
        id,
        data: &bytes[range],
    }))
}

fn element_range(
    profile: Profile,
    view: &mut View,
    bytes: &[u8],
) -> Result<Option<(u8, Range<usize>)>, Error> {
    loop {
        view.consume_padding(bytes)?;
        if view.is_empty() {
            return Ok(None);
        }

        let (id, size) = match profile {
            Profile::OneByte => {
                let head = view.get_u8(bytes)?;
                let id = head >> 4;
                if id == PADDING_SKIP_ID {
                    continue;
                }

                (id, (head & 0b00001111) as usize + 1)
            }
            Profile::TwoByte => {
                let id = view.get_u8(bytes)?;
                let size = view.get_u8(bytes).map_err(|_| Error::TruncatedExtension)?;
                (id, size as usize)
            }
        };

        let position = view.position();
        view.read(bytes, size)
            .map_err(|_| Error::TruncatedExtension)?;

        return Ok(Some((id, position..position + size)));
    }
}

/// An RTP header extensions block.
///
/// The element region is walked once at decode time into an id/range cache
/// that is resolved lazily against the source bytes.
#[derive(Debug, Clone)]
pub struct Extensions<'a> {
    profile: Profile,
    bytes: &'a [u8],
    elements: Vec<(u8, Range<usize>)>,
}

impl<'a> Extensions<'a> {
    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Gets the data of the first element with the given id.
    pub fn get(&self, id: u8) -> Option<&'a [u8]> {
        self.elements
            .iter()
            .find(|(k, _)| *k == id)
            .map(|(_, range)| &self.bytes[range.clone()])
    }

    pub fn iter(&self) -> impl Iterator<Item = Extension<'a>> + '_ {
        self.elements.iter().map(|(id, range)| Extension {
            id: *id,
            data: &self.bytes[range.clone()],
        })
    }

    /// Decodes a whole block: cookie, length in 32-bit words, then the
    /// padded element region.
    ///
    /// # Test
    ///
    /// ```
    /// use rtp_codec::extension::Extensions;
    ///
    /// let bytes = [0xBEu8, 0xDE, 0x00, 0x01, 0x10, 0xAB, 0x00, 0x00];
    ///
    /// let extensions = Extensions::decode(&bytes).unwrap();
    ///
    /// assert_eq!(extensions.len(), 1);
    /// assert_eq!(extensions.get(1), Some([0xAB].as_slice()));
    /// ```
    pub fn decode(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < 4 {
            return Err(Error::InvalidInput);
        }

        let profile = Profile::from_cookie(u16::from_be_bytes(bytes[..2].try_into()?))?;
        let size = u16::from_be_bytes(bytes[2..4].try_into()?) as usize * 4;
        if bytes.len() < 4 + size {
            return Err(Error::TruncatedExtension);
        }

        let mut view = View::with_range(4, 4 + size)?;
        let mut elements = Vec::with_capacity(8);
        while let Some(element) = element_range(profile, &mut view, bytes)? {
            elements.push(element);
        }

        Ok(Self {
            profile,
            bytes,
            elements,
        })
    }
}

/// Writes an extensions block: cookie, a reserved length field, the
/// appended elements, then zero padding up to a multiple of 4 bytes and the
/// backfilled length in 32-bit words.
///
/// # Test
///
/// ```
/// use bytes::BytesMut;
/// use rtp_codec::extension::{Extensions, ExtensionsEncoder, Profile};
///
/// let mut buf = BytesMut::new();
/// let mut encoder = ExtensionsEncoder::new(Profile::OneByte, &mut buf);
///
/// encoder.append(1, &[0xAB]).unwrap();
/// encoder.append(3, &[0x01, 0x02, 0x03, 0x04]).unwrap();
/// encoder.flush();
///
/// assert_eq!(&buf[..4], &[0xBE, 0xDE, 0x00, 0x02]);
///
/// let extensions = Extensions::decode(&buf).unwrap();
///
/// assert_eq!(extensions.get(1), Some([0xAB].as_slice()));
/// assert_eq!(extensions.get(3), Some([0x01, 0x02, 0x03, 0x04].as_slice()));
/// ```
pub struct ExtensionsEncoder<'a> {
    profile: Profile,
    bytes: &'a mut BytesMut,
}

impl<'a> ExtensionsEncoder<'a> {
    pub fn new(profile: Profile, bytes: &'a mut BytesMut) -> Self {
        bytes.clear();
        bytes.put_u16(profile.cookie());
        bytes.put_u16(0);

        Self { profile, bytes }
    }

    /// append an element.
    ///
    /// One-byte form ids are 1-14 with 1-16 data bytes, two-byte form ids
    /// are 1-255 with 0-255 data bytes.
    pub fn append(&mut self, id: u8, data: &[u8]) -> Result<(), Error> {
        match self.profile {
            Profile::OneByte => {
                if !(1..=14).contains(&id) || !(1..=16).contains(&data.len()) {
                    return Err(Error::InvalidInput);
                }

                self.bytes.put_u8((id << 4) | (data.len() - 1) as u8);
            }
            Profile::TwoByte => {
                if id == 0 || data.len() > 255 {
                    return Err(Error::InvalidInput);
                }

                self.bytes.put_u8(id);
                self.bytes.put_u8(data.len() as u8);
            }
        }

        self.bytes.put(data);
        Ok(())
    }

    /// pad the element region to a multiple of 4 and backfill the length
    /// field.
    pub fn flush(&mut self) {
        let psize = alignment_32(self.bytes.len());
        if psize > 0 {
            self.bytes.put(&[0u8; 3][0..psize]);
        }

        let words = ((self.bytes.len() - 4) / 4) as u16;
        self.bytes[2..4].copy_from_slice(words.to_be_bytes().as_slice());
    }
}
