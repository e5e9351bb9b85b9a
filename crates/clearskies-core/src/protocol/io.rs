//! Async frame I/O helpers.
//!
//! The state machine itself never touches a socket; these helpers bridge it
//! to tokio streams. Writers serialize one unit per call and flush at
//! message boundaries; [`drive`] pumps a reader into a
//! [`ProtocolState`] until EOF.
//!
//! Transport concerns (TLS, connection setup, discovery) live outside this
//! crate.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{frame, payload, ProtocolHandler, ProtocolState};
use crate::error::{Error, Result};
use crate::message::{Coder, Message};

/// Read buffer used by [`drive`].
const READ_BUF_LEN: usize = 4096;

/// Write one message as a complete frame and flush.
///
/// # Errors
///
/// Returns an error when the message cannot be encoded or the write fails.
pub async fn write_msg<W>(writer: &mut W, coder: &Coder, msg: &Message) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame::encode_frame(coder, msg)?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Write one non-empty payload chunk. The stream must be terminated with
/// [`write_payload_end`] once all chunks are written.
///
/// # Errors
///
/// Returns an error for empty or oversize chunks, or when the write fails.
pub async fn write_payload_chunk<W>(writer: &mut W, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = payload::encode_chunk(data)?;
    writer.write_all(&bytes).await?;
    Ok(())
}

/// Terminate the current payload stream and flush.
///
/// # Errors
///
/// Returns an error when the write fails.
pub async fn write_payload_end<W>(writer: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload::PAYLOAD_END).await?;
    writer.flush().await?;
    Ok(())
}

/// Pump a reader into the state machine until EOF.
///
/// # Errors
///
/// Returns an error when the read fails, or when the peer closes the
/// connection in the middle of a frame or payload.
pub async fn drive<R, H>(reader: &mut R, state: &mut ProtocolState<H>) -> Result<()>
where
    R: AsyncRead + Unpin,
    H: ProtocolHandler,
{
    let mut buf = [0u8; READ_BUF_LEN];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            if state.reading_payload() {
                return Err(Error::TruncatedStream("payload"));
            }
            if state.buffered() > 0 {
                return Err(Error::TruncatedStream("frame"));
            }
            return Ok(());
        }
        state.input(&buf[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;

    #[derive(Debug, Default)]
    struct Collect {
        messages: Vec<Message>,
        payload: Vec<u8>,
        ended: bool,
    }

    impl ProtocolHandler for Collect {
        fn on_message(&mut self, msg: Message) {
            self.messages.push(msg);
        }
        fn on_payload(&mut self, chunk: &[u8]) {
            self.payload.extend_from_slice(chunk);
        }
        fn on_payload_end(&mut self) {
            self.ended = true;
        }
    }

    #[tokio::test]
    async fn written_frames_drive_back_through_the_state_machine() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        let coder = Coder::default();

        let msg = Message::with_payload(MessageKind::FileData { path: "f".into() });
        write_msg(&mut tx, &coder, &msg).await.expect("write msg");
        write_payload_chunk(&mut tx, b"HELLO").await.expect("chunk");
        write_payload_end(&mut tx).await.expect("end");
        drop(tx);

        let mut state = ProtocolState::new(Collect::default());
        drive(&mut rx, &mut state).await.expect("drive");

        let collect = state.into_handler();
        assert_eq!(collect.messages, vec![msg]);
        assert_eq!(collect.payload, b"HELLO");
        assert!(collect.ended);
    }

    #[tokio::test]
    async fn eof_inside_a_payload_is_an_error() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        let coder = Coder::default();

        let msg = Message::with_payload(MessageKind::FileData { path: "f".into() });
        write_msg(&mut tx, &coder, &msg).await.expect("write msg");
        write_payload_chunk(&mut tx, b"HELLO").await.expect("chunk");
        drop(tx); // no terminator

        let mut state = ProtocolState::new(Collect::default());
        let err = drive(&mut rx, &mut state).await.expect_err("must fail");
        assert!(matches!(err, Error::TruncatedStream("payload")));
    }

    #[tokio::test]
    async fn eof_inside_a_frame_is_an_error() {
        let (mut tx, mut rx) = tokio::io::duplex(64);
        tx.write_all(b"{\"type\":\"ping\"").await.expect("write");
        drop(tx);

        let mut state = ProtocolState::new(Collect::default());
        let err = drive(&mut rx, &mut state).await.expect_err("must fail");
        assert!(matches!(err, Error::TruncatedStream("frame")));
    }
}
