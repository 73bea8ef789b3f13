#![cfg(feature = "async")]

use std::future::poll_fn;
use std::pin::Pin;

use futures_core::Stream;
use multitalk_tash::{Kind, Packet, TashCodec, TashError};
use tokio::io::AsyncWriteExt;
use tokio_util::codec::FramedRead;

async fn next<S>(stream: &mut S) -> Option<Result<Packet, TashError>>
where
    S: Stream<Item = Result<Packet, TashError>> + Unpin,
{
    poll_fn(|cx| Pin::new(&mut *stream).poll_next(cx)).await
}

#[tokio::test]
async fn framed_read_skips_bad_frames() {
    let (mut board, host) = tokio::io::duplex(16);
    let mut framed = FramedRead::new(host, TashCodec::new());

    let writer = tokio::spawn(async move {
        board
            .write_all(&[
                0x02, 0x01, 0x81, 0x2d, 0xff, 0x00, 0xfd, // ENQ
                0x01, 0x02, 0x00, 0xfa, // aborted
                0x02, 0x01, 0x81, 0xea, 0xea, 0x00, 0xfd, // bad FCS
                0x01, 0x02, 0x82, 0xba, 0x08, 0x00, 0xfd, // ACK
                0x01, 0x02, 0x82, // cut off
            ])
            .await
            .expect("write should succeed");
    });

    let first = next(&mut framed).await.expect("item").expect("packet");
    assert_eq!(first, Packet::control(2, 1, Kind::ENQ));
    let second = next(&mut framed).await.expect("item").expect("packet");
    assert_eq!(second, Packet::control(1, 2, Kind::ACK));

    writer.await.expect("writer should finish");
    assert!(next(&mut framed).await.is_none());
    assert_eq!(framed.decoder().stats().packets, 2);
    assert_eq!(framed.decoder().stats().bad_checksum, 1);
    assert_eq!(framed.decoder().stats().aborted, 1);
}
