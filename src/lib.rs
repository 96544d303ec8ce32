//! ## RTP: A Transport Protocol for Real-Time Applications
//!
//! [RFC3550]: https://tools.ietf.org/html/rfc3550
//! [RFC4585]: https://tools.ietf.org/html/rfc4585
//! [RFC5285]: https://tools.ietf.org/html/rfc5285
//! [RFC3711]: https://tools.ietf.org/html/rfc3711
//!
//! RTP provides end-to-end network transport functions suitable for
//! applications transmitting real-time data, such as audio, video or
//! simulation data, over multicast or unicast network services. The data
//! transport is augmented by a control protocol (RTCP) to allow monitoring
//! of the data delivery in a manner scalable to large multicast networks,
//! and to provide minimal control and identification functionality.
//! The extension profile in [RFC4585] enables receivers to provide more
//! immediate feedback to the senders, allowing short-term adaptation and
//! feedback-based repair such as retransmission requests (NACK). A general
//! mechanism for RTP header extensions is defined in [RFC5285]. The Secure
//! Real-time Transport Protocol [RFC3711] provides confidentiality, message
//! authentication, and replay protection for RTP and RTCP traffic.

pub mod crypto;
pub mod extension;
pub mod rtcp;
pub mod srtcp;
pub mod view;

use std::array::TryFromSliceError;

use num_enum::TryFromPrimitiveError;

use crate::rtcp::PacketKind;

#[derive(Debug)]
pub enum Error {
    OutOfBounds,
    TruncatedExtension,
    LengthMismatch,
    InsufficientLength,
    EmptyNackSet,
    TypeMismatch,
    UnsupportedProfile,
    UnknownPacketKind,
    InvalidInput,
    TryFromSliceError(TryFromSliceError),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<TryFromSliceError> for Error {
    fn from(value: TryFromSliceError) -> Self {
        Self::TryFromSliceError(value)
    }
}

impl From<TryFromPrimitiveError<PacketKind>> for Error {
    fn from(_: TryFromPrimitiveError<PacketKind>) -> Self {
        Self::UnknownPacketKind
    }
}

/// compute padding size.
///
/// RTP and RTCP align variable-length regions to multiples of 4.
///
/// # Test
///
/// ```
/// use rtp_codec::alignment_32;
///
/// assert_eq!(alignment_32(4), 0);
/// assert_eq!(alignment_32(0), 0);
/// assert_eq!(alignment_32(5), 3);
/// ```
#[inline(always)]
pub fn alignment_32(size: usize) -> usize {
    let range = size % 4;
    if size == 0 || range == 0 {
        return 0;
    }

    4 - range
}
