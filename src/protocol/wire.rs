//! Wire format for message framing.
//!
//! Messages are length-prefixed: [4 bytes native-endian u32][payload]

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{BridgeError, ProtocolErrorKind};

/// Largest message the browser will send to the bridge (64 MiB).
pub const DEFAULT_MAX_INBOUND_SIZE: usize = 64 * 1024 * 1024;

/// Largest message the browser will accept from the bridge (1 MiB).
pub const DEFAULT_MAX_OUTBOUND_SIZE: usize = 1024 * 1024;

/// Read a length-prefixed message from the reader.
///
/// Returns the raw bytes of the message payload. The payload is not read at
/// all when the declared length exceeds `max_size`.
pub async fn read_message<R>(reader: &mut R, max_size: usize) -> Result<Vec<u8>, BridgeError>
where
    R: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 4];
    read_exact_or_truncated(reader, &mut len_buf).await?;

    let len = u32::from_ne_bytes(len_buf) as usize;

    if len > max_size {
        return Err(BridgeError::Protocol {
            kind: ProtocolErrorKind::MessageTooLarge {
                size: len,
                max: max_size,
            },
        });
    }

    let mut buf = vec![0u8; len];
    read_exact_or_truncated(reader, &mut buf).await?;

    Ok(buf)
}

/// Write a length-prefixed message to the writer.
///
/// Nothing is written when `data` exceeds `max_size`.
pub async fn write_message<W>(
    writer: &mut W,
    data: &[u8],
    max_size: usize,
) -> Result<(), BridgeError>
where
    W: AsyncWriteExt + Unpin,
{
    if data.len() > max_size {
        return Err(BridgeError::Protocol {
            kind: ProtocolErrorKind::MessageTooLarge {
                size: data.len(),
                max: max_size,
            },
        });
    }

    // max_size is bounded by the configuration to fit a u32
    let len = u32::try_from(data.len()).map_err(|_| BridgeError::Protocol {
        kind: ProtocolErrorKind::MessageTooLarge {
            size: data.len(),
            max: u32::MAX as usize,
        },
    })?;

    let mut frame = Vec::with_capacity(4 + data.len());
    frame.extend_from_slice(&len.to_ne_bytes());
    frame.extend_from_slice(data);

    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_exact_or_truncated<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), BridgeError>
where
    R: AsyncReadExt + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(BridgeError::Protocol {
            kind: ProtocolErrorKind::Truncated,
        }),
        Err(e) => Err(BridgeError::Io(e)),
    }
}
