//! Length-prefixed frames carried by [`SocketConnection`](crate::SocketConnection).
//!
//! ```text
//! +-----------+------------------+----------------------------+---------+
//! | len: u32  | correlation: u64 | code: i32 | status: i16+u16 | body    |
//! +-----------+------------------+----------------------------+---------+
//! ```
//!
//! `len` counts every byte after itself. Requests carry the operation code in
//! the 4-byte tag, responses carry the status followed by two reserved bytes.

use crate::errors::ConnectionError;
use crate::protocol::ResponseStatus;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const HEADER_LEN: usize = 8 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub correlation_id: u64,
    pub code: i32,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub correlation_id: u64,
    pub status: ResponseStatus,
    pub body: Vec<u8>,
}

pub async fn write_request<W>(
    writer: &mut W,
    frame: &RequestFrame,
    max_frame_bytes: usize,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    write_raw(
        writer,
        frame.correlation_id,
        frame.code.to_be_bytes(),
        &frame.body,
        max_frame_bytes,
    )
    .await
}

pub async fn write_response<W>(
    writer: &mut W,
    frame: &ResponseFrame,
    max_frame_bytes: usize,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    let status = frame.status.as_i16().to_be_bytes();
    let tag = [status[0], status[1], 0, 0];
    write_raw(
        writer,
        frame.correlation_id,
        tag,
        &frame.body,
        max_frame_bytes,
    )
    .await
}

/// Returns `Ok(None)` when the peer closed the stream between frames.
pub async fn read_request<R>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> Result<Option<RequestFrame>, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    Ok(read_raw(reader, max_frame_bytes)
        .await?
        .map(|(correlation_id, tag, body)| RequestFrame {
            correlation_id,
            code: i32::from_be_bytes(tag),
            body,
        }))
}

/// Returns `Ok(None)` when the peer closed the stream between frames.
pub async fn read_response<R>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> Result<Option<ResponseFrame>, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    Ok(read_raw(reader, max_frame_bytes)
        .await?
        .map(|(correlation_id, tag, body)| ResponseFrame {
            correlation_id,
            status: ResponseStatus::from_i16(i16::from_be_bytes([tag[0], tag[1]])),
            body,
        }))
}

async fn write_raw<W>(
    writer: &mut W,
    correlation_id: u64,
    tag: [u8; 4],
    body: &[u8],
    max_frame_bytes: usize,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    let len = HEADER_LEN + body.len();
    if len > max_frame_bytes {
        return Err(ConnectionError::FrameTooLarge(len, max_frame_bytes));
    }
    let len_prefix = u32::try_from(len)
        .map_err(|_| ConnectionError::FrameTooLarge(len, max_frame_bytes))?;

    let mut buf = Vec::with_capacity(4 + len);
    buf.extend_from_slice(&len_prefix.to_be_bytes());
    buf.extend_from_slice(&correlation_id.to_be_bytes());
    buf.extend_from_slice(&tag);
    buf.extend_from_slice(body);

    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_raw<R>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> Result<Option<(u64, [u8; 4], Vec<u8>)>, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if len > max_frame_bytes {
        return Err(ConnectionError::FrameTooLarge(len, max_frame_bytes));
    }
    if len < HEADER_LEN {
        return Err(ConnectionError::MalformedFrame(format!(
            "frame length {} is shorter than the {} byte header",
            len, HEADER_LEN
        )));
    }

    let correlation_id = reader.read_u64().await?;
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag).await?;
    let mut body = vec![0u8; len - HEADER_LEN];
    reader.read_exact(&mut body).await?;

    Ok(Some((correlation_id, tag, body)))
}
