use aws_lc_rs::{constant_time, hmac};

use crate::Error;

/// HMAC SHA1 digest over a list of buffers.
///
/// # Test
///
/// ```
/// use rtp_codec::crypto::hmac_sha1;
///
/// let tag = hmac_sha1(
///     b"Jefe",
///     &[b"what do ya want ".as_slice(), b"for nothing?".as_slice()],
/// )
/// .unwrap();
///
/// assert_eq!(
///     tag.as_slice(),
///     &[
///         0xEF, 0xFC, 0xDF, 0x6A, 0xE5, 0xEB, 0x2F, 0xA2, 0xD2, 0x74,
///         0x16, 0xD5, 0xF1, 0x84, 0xDF, 0x9C, 0x25, 0x9A, 0x7C, 0x79,
///     ]
/// );
/// ```
pub fn hmac_sha1(key: &[u8], source: &[&[u8]]) -> Result<[u8; 20], Error> {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key);
    let mut ctx = hmac::Context::with_key(&key);
    for buf in source {
        ctx.update(buf);
    }

    Ok(ctx.sign().as_ref().try_into()?)
}

/// Signing and verification hooks for [`crate::srtcp`] packets.
///
/// The envelope code does the placement and length bookkeeping, an
/// authenticator only supplies the tag bytes.
pub trait Authenticator {
    /// Computes the tag over the given region.
    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, Error>;

    /// Checks a received tag over the given region.
    fn verify(&self, bytes: &[u8], tag: &[u8]) -> bool;
}

/// HMAC-SHA1 with a truncated tag, the default SRTP protection suites
/// carry 80 or 32 bit tags cut from the 160 bit digest.
pub struct HmacSha1 {
    key: Vec<u8>,
    tag_len: usize,
}

impl HmacSha1 {
    /// `tag_len` must be 1..=20 bytes.
    pub fn new(key: &[u8], tag_len: usize) -> Result<Self, Error> {
        if tag_len == 0 || tag_len > 20 {
            return Err(Error::InvalidInput);
        }

        Ok(Self {
            key: key.to_vec(),
            tag_len,
        })
    }
}

impl Authenticator for HmacSha1 {
    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(hmac_sha1(&self.key, &[bytes])?[..self.tag_len].to_vec())
    }

    fn verify(&self, bytes: &[u8], tag: &[u8]) -> bool {
        if tag.len() != self.tag_len {
            return false;
        }

        self.sign(bytes)
            .map(|local| constant_time::verify_slices_are_equal(&local, tag).is_ok())
            .unwrap_or(false)
    }
}
