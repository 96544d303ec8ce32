use anyhow::Result;
use bytes::BytesMut;
use rtp_codec::{
    Error,
    crypto::{Authenticator, HmacSha1},
    extension::{Extension, Extensions, ExtensionsEncoder, Profile},
    rtcp::{
        Compound, Header, Packet, PacketKind,
        feedback::{Nack, NackBlock, Pli},
    },
    srtcp::{Authenticated, Unauthenticated},
    view::View,
};

#[rustfmt::skip]
mod samples {
    pub const EXTENSIONS_ONE_BYTE: &[u8] = include_bytes!("samples/extensions_one_byte.bin");
    pub const EXTENSIONS_TWO_BYTE: &[u8] = include_bytes!("samples/extensions_two_byte.bin");
    pub const NACK: &[u8] = include_bytes!("samples/nack.bin");
    pub const SRTCP_COMPOUND: &[u8] = include_bytes!("samples/srtcp_compound.bin");
}

#[test]
fn test_rtp_codec() -> Result<()> {
    {
        let extensions = Extensions::decode(samples::EXTENSIONS_ONE_BYTE)?;

        assert_eq!(extensions.profile(), Profile::OneByte);
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions.get(1), Some([0xABu8].as_slice()));
        assert_eq!(extensions.get(3), Some([0x01u8, 0x02, 0x03, 0x04].as_slice()));
        assert_eq!(extensions.get(2), None);

        let elements = extensions.iter().collect::<Vec<_>>();
        assert_eq!(
            elements,
            [
                Extension { id: 1, data: &[0xAB] },
                Extension { id: 3, data: &[0x01, 0x02, 0x03, 0x04] },
            ]
        );
    }

    {
        let extensions = Extensions::decode(samples::EXTENSIONS_TWO_BYTE)?;

        assert_eq!(extensions.profile(), Profile::TwoByte);
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions.get(1), Some([0u8; 0].as_slice()));
        assert_eq!(extensions.get(2), Some([0xAAu8, 0xBB, 0xCC].as_slice()));
    }

    {
        let mut buf = BytesMut::new();
        let mut encoder = ExtensionsEncoder::new(Profile::OneByte, &mut buf);
        encoder.append(1, &[0xAB])?;
        encoder.append(14, &[0x55; 16])?;
        encoder.flush();

        assert_eq!(buf.len() % 4, 0);

        let extensions = Extensions::decode(&buf)?;
        assert_eq!(extensions.profile(), Profile::OneByte);
        assert_eq!(extensions.get(1), Some([0xABu8].as_slice()));
        assert_eq!(extensions.get(14), Some([0x55u8; 16].as_slice()));
    }

    {
        let mut buf = BytesMut::new();
        let mut encoder = ExtensionsEncoder::new(Profile::TwoByte, &mut buf);
        encoder.append(1, &[])?;
        encoder.append(120, &[0xEE; 255])?;
        encoder.flush();

        assert_eq!(buf.len() % 4, 0);

        let extensions = Extensions::decode(&buf)?;
        assert_eq!(extensions.profile(), Profile::TwoByte);
        assert_eq!(extensions.get(1), Some([0u8; 0].as_slice()));
        assert_eq!(extensions.get(120).map(|it| it.len()), Some(255));
    }

    {
        let header = Header::decode(&samples::SRTCP_COMPOUND[..8])?;

        assert!(!header.padding);
        assert_eq!(header.count, 0);
        assert_eq!(header.kind, PacketKind::SenderReport);
        assert_eq!(header.length, 6);
        assert_eq!(header.packet_size(), 28);
        assert_eq!(header.ssrc, 0x756D5640);

        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(&buf[..], &samples::SRTCP_COMPOUND[..8]);
    }

    {
        let nack = Nack::decode(samples::NACK)?;

        assert_eq!(nack.sender_ssrc, 0);
        assert_eq!(nack.media_ssrc, 12345);
        assert_eq!(
            nack.blocks().collect::<Vec<_>>(),
            [NackBlock { packet_id: 0, bitmask: 0x5555 }]
        );
        assert_eq!(
            nack.lost().collect::<Vec<_>>(),
            [0, 1, 3, 5, 7, 9, 11, 13, 15]
        );

        let mut buf = BytesMut::new();
        Nack::encode(0, 12345, &nack.lost().collect::<Vec<_>>(), &mut buf)?;
        assert_eq!(&buf[..], samples::NACK);
    }

    {
        let Packet::Nack(nack) = Packet::decode(samples::NACK)? else {
            return Err(anyhow::anyhow!("Expected Nack"));
        };

        assert_eq!(nack.media_ssrc, 12345);
    }

    {
        let mut buf = BytesMut::new();
        Pli {
            sender_ssrc: 1,
            media_ssrc: 12345,
        }
        .encode(&mut buf);

        let mut compound = BytesMut::from(samples::NACK);
        compound.extend_from_slice(&buf);

        let packets = Compound::new(&compound).collect::<Result<Vec<_>, _>>()?;
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].kind(), PacketKind::TransportFeedback);

        let Packet::Pli(report) = packets[1] else {
            return Err(anyhow::anyhow!("Expected Pli"));
        };

        assert_eq!(report.sender_ssrc, 1);
        assert_eq!(report.media_ssrc, 12345);
    }

    {
        let packet = Authenticated::decode(samples::SRTCP_COMPOUND)?;
        let (index, encrypted, tag, rest) = packet.strip_index_and_tag(10)?;

        assert_eq!(index, 1);
        assert!(encrypted);
        assert_eq!(tag, &samples::SRTCP_COMPOUND[60..]);
        assert_eq!(rest.as_bytes(), &samples::SRTCP_COMPOUND[..56]);

        let Some(Ok(Packet::Other(header, _))) = rest.packets().next() else {
            return Err(anyhow::anyhow!("Expected a sender report"));
        };

        assert_eq!(header.kind, PacketKind::SenderReport);
        assert_eq!(header.length, 6);
        assert_eq!(header.ssrc, 0x756D5640);
    }

    {
        let tag = [0xDEu8, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD];
        let packet = Unauthenticated::decode(samples::NACK)?;
        let sealed = packet.add_index_and_tag(1, false, &tag)?;

        assert_eq!(&sealed[..16], samples::NACK);
        assert_eq!(&sealed[16..20], &[0x00, 0x00, 0x00, 0x01]);
        assert_eq!(&sealed[20..], &tag[..]);

        let received = Authenticated::decode(&sealed)?;
        let (index, encrypted, received_tag, rest) = received.strip_index_and_tag(10)?;

        assert_eq!(index, 1);
        assert!(!encrypted);
        assert_eq!(received_tag, &tag[..]);
        assert_eq!(rest.as_bytes(), samples::NACK);
        assert_eq!(rest.to_nack()?.media_ssrc, 12345);
    }

    Ok(())
}

#[test]
fn test_nack_grouping() -> Result<()> {
    let block = NackBlock::new(0, &[1, 3, 5, 7, 9, 11, 13, 15]);
    assert_eq!(block.packet_id, 0);
    assert_eq!(block.bitmask, 0x5555);

    let block = NackBlock::new(100, &[99, 100, 101, 117]);
    assert_eq!(block.bitmask, 0x0001);

    assert_eq!(
        NackBlock { packet_id: 65535, bitmask: 0b11 }.lost().collect::<Vec<_>>(),
        [65535, 0, 1]
    );

    assert_eq!(
        NackBlock::group(&[0, 1, 3, 5, 7, 9, 11, 13, 15])?,
        [NackBlock { packet_id: 0, bitmask: 0x5555 }]
    );

    assert_eq!(
        NackBlock::group(&(0..=16).collect::<Vec<u16>>())?,
        [NackBlock { packet_id: 0, bitmask: 0xFFFF }]
    );

    assert_eq!(
        NackBlock::group(&[0, 17])?,
        [
            NackBlock { packet_id: 0, bitmask: 0 },
            NackBlock { packet_id: 17, bitmask: 0 },
        ]
    );

    assert_eq!(
        NackBlock::group(&[9, 1, 3, 1, 7, 5])?,
        [NackBlock { packet_id: 1, bitmask: 0x00AA }]
    );

    assert_eq!(NackBlock::group(&[5])?, [NackBlock { packet_id: 5, bitmask: 0 }]);

    assert_eq!(
        NackBlock::group(&[65535, 0])?,
        [
            NackBlock { packet_id: 0, bitmask: 0 },
            NackBlock { packet_id: 65535, bitmask: 0 },
        ]
    );

    {
        let mut buf = BytesMut::new();
        Nack::encode(1, 2, &[100, 116], &mut buf)?;

        let nack = Nack::decode(&buf)?;
        assert_eq!(
            nack.blocks().collect::<Vec<_>>(),
            [NackBlock { packet_id: 100, bitmask: 0x8000 }]
        );
        assert_eq!(nack.lost().collect::<Vec<_>>(), [100, 116]);
    }

    Ok(())
}

#[test]
fn test_srtcp_authentication() -> Result<()> {
    let authenticator = HmacSha1::new(b"0123456789abcdef", 10)?;

    {
        let packet = Unauthenticated::decode(samples::NACK)?;
        let sealed = packet.authenticate(7, false, &authenticator)?;

        assert_eq!(sealed.len(), samples::NACK.len() + 4 + 10);

        let received = Authenticated::decode(&sealed)?;
        assert!(received.verify(&authenticator, 10)?);

        let (index, encrypted, _, rest) = received.strip_index_and_tag(10)?;
        assert_eq!(index, 7);
        assert!(!encrypted);
        assert_eq!(rest.as_bytes(), samples::NACK);
    }

    {
        let packet = Unauthenticated::decode(samples::NACK)?;
        let mut sealed = packet.authenticate(7, false, &authenticator)?;

        sealed[8] ^= 0xFF;
        assert!(!Authenticated::decode(&sealed)?.verify(&authenticator, 10)?);
    }

    {
        let packet = Unauthenticated::decode(samples::NACK)?;
        let sealed = packet.authenticate(7, false, &authenticator)?;

        let wrong_key = HmacSha1::new(b"another-key", 10)?;
        assert!(!Authenticated::decode(&sealed)?.verify(&wrong_key, 10)?);
        assert!(!authenticator.verify(samples::NACK, &[0; 4]));
    }

    {
        let mut storage = samples::NACK.to_vec();
        let mut view = View::with_range(8, 12)?;
        view.put_u32(&mut storage, 0xAABBCCDD)?;

        let edited = Unauthenticated::decode(&storage)?;
        assert_eq!(edited.to_nack()?.media_ssrc, 0xAABBCCDD);

        let sealed = edited.authenticate(8, false, &authenticator)?;
        assert!(Authenticated::decode(&sealed)?.verify(&authenticator, 10)?);

        let (index, _, _, rest) = Authenticated::decode(&sealed)?.strip_index_and_tag(10)?;
        assert_eq!(index, 8);
        assert_eq!(rest.to_nack()?.media_ssrc, 0xAABBCCDD);
    }

    Ok(())
}

#[test]
fn test_rtp_codec_errors() -> Result<()> {
    {
        let mut buf = BytesMut::new();
        assert!(matches!(
            Nack::encode(0, 1, &[], &mut buf),
            Err(Error::EmptyNackSet)
        ));
    }

    {
        let bytes = [0xBEu8, 0xDE, 0x00, 0x04, 0x10, 0xAB, 0x00, 0x00];
        assert!(matches!(
            Extensions::decode(&bytes),
            Err(Error::TruncatedExtension)
        ));

        let bytes = [0xBEu8, 0xDE, 0x00, 0x01, 0x13, 0xAB, 0x00, 0x00];
        assert!(matches!(
            Extensions::decode(&bytes),
            Err(Error::TruncatedExtension)
        ));

        let bytes = [0x10u8, 0x00, 0x00, 0x01, 0x05, 0x00, 0x00, 0x01];
        assert!(matches!(
            Extensions::decode(&bytes),
            Err(Error::TruncatedExtension)
        ));

        let bytes = [0x41u8, 0x42, 0x00, 0x00];
        assert!(matches!(
            Extensions::decode(&bytes),
            Err(Error::UnsupportedProfile)
        ));
    }

    {
        let mut buf = BytesMut::new();
        let mut encoder = ExtensionsEncoder::new(Profile::OneByte, &mut buf);

        assert!(matches!(encoder.append(15, &[1]), Err(Error::InvalidInput)));
        assert!(matches!(encoder.append(1, &[]), Err(Error::InvalidInput)));
        assert!(matches!(
            encoder.append(1, &[0; 17]),
            Err(Error::InvalidInput)
        ));

        let mut encoder = ExtensionsEncoder::new(Profile::TwoByte, &mut buf);
        assert!(matches!(encoder.append(0, &[]), Err(Error::InvalidInput)));
    }

    {
        assert!(matches!(
            Authenticated::decode(samples::NACK)?.strip_index_and_tag(10),
            Err(Error::InsufficientLength)
        ));
        assert!(matches!(
            Authenticated::decode(samples::NACK)?.verify(&HmacSha1::new(b"key", 20)?, 20),
            Err(Error::InsufficientLength)
        ));
        assert!(matches!(
            Unauthenticated::decode(samples::NACK)?.add_index_and_tag(0x8000_0000, false, &[0; 4]),
            Err(Error::InvalidInput)
        ));
        assert!(matches!(HmacSha1::new(b"key", 0), Err(Error::InvalidInput)));
        assert!(matches!(HmacSha1::new(b"key", 21), Err(Error::InvalidInput)));
    }

    {
        let mut buf = BytesMut::new();
        Pli {
            sender_ssrc: 1,
            media_ssrc: 2,
        }
        .encode(&mut buf);

        assert!(matches!(
            Unauthenticated::decode(&buf)?.to_nack(),
            Err(Error::TypeMismatch)
        ));
        assert!(matches!(
            Unauthenticated::decode(samples::NACK)?.to_pli(),
            Err(Error::TypeMismatch)
        ));
    }

    {
        assert!(matches!(
            Packet::decode(&samples::NACK[..12]),
            Err(Error::LengthMismatch)
        ));

        let mut packets = Compound::new(&samples::NACK[..12]);
        assert!(matches!(packets.next(), Some(Err(Error::LengthMismatch))));
        assert!(packets.next().is_none());
    }

    {
        let bytes = [0x00u8, 0xCD, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(Header::decode(&bytes), Err(Error::InvalidInput)));

        let bytes = [0x80u8, 0xD2, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            Header::decode(&bytes),
            Err(Error::UnknownPacketKind)
        ));

        let bytes = [
            0x81u8, 0xCD, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x39,
        ];
        assert!(matches!(Nack::decode(&bytes), Err(Error::InvalidInput)));
    }

    {
        let bytes = [0u8; 2];
        let mut view = View::new(4);

        assert!(matches!(view.read(&bytes, 4), Err(Error::OutOfBounds)));
        assert!(matches!(view.advance(5), Err(Error::OutOfBounds)));
        assert!(matches!(View::with_range(4, 2), Err(Error::OutOfBounds)));
    }

    Ok(())
}
