//! # Gateway Protocol
//!
//! Message types for client <-> bot communication.
//!
//! Uses length-prefixed JSON framing:
//! - 4 bytes: message length (big-endian u32)
//! - N bytes: JSON payload

use anyhow::{bail, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::features::reminders::Repeat;

/// Upper bound on a single frame; anything larger is a protocol error.
const MAX_FRAME: usize = 64 * 1024;

// ============================================================================
// Client -> Bot Events
// ============================================================================

/// Events sent by a connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// First frame on every connection: who this client speaks for.
    Hello { owner_id: i64 },
    /// Start (or restart) a new-reminder capture flow.
    StartReminder,
    /// Free text; the bot routes it by the session's current step.
    Message { text: String },
    /// Repeat cadence selection for the reminder being captured.
    RepeatChoice { repeat: Repeat },
    /// List this user's reminders.
    ListReminders,
    /// Delete one of this user's reminders by id.
    DeleteReminder { id: i64 },
}

// ============================================================================
// Bot -> Client Events
// ============================================================================

/// Events sent by the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Direct answer to something the client sent.
    Reply { text: String },
    /// Unsolicited delivery of a due reminder.
    Notification { text: String },
}

// ============================================================================
// Framing - Length-prefixed JSON messages
// ============================================================================

/// Write one framed message.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_FRAME {
        bail!("frame too large: {} bytes", json.len());
    }
    writer.write_all(&(json.len() as u32).to_be_bytes()).await?;
    writer.write_all(&json).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME {
        bail!("frame too large: {len} bytes");
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(serde_json::from_slice(&buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_frame_roundtrip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &ClientEvent::Hello { owner_id: 42 })
            .await
            .unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded: ClientEvent = read_frame(&mut cursor).await.unwrap();
        match decoded {
            ClientEvent::Hello { owner_id } => assert_eq!(owner_id, 42),
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(u32::MAX).to_be_bytes());
        let mut cursor = Cursor::new(buf);
        assert!(read_frame::<_, ClientEvent>(&mut cursor).await.is_err());
    }

    #[test]
    fn test_events_are_tagged_by_type() {
        let json = serde_json::to_string(&ClientEvent::RepeatChoice {
            repeat: Repeat::Weekly,
        })
        .unwrap();
        assert!(json.contains("\"type\":\"RepeatChoice\""));
        assert!(json.contains("\"repeat\":\"weekly\""));

        let json = serde_json::to_string(&ServerEvent::Notification {
            text: "🔔 tea".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"type\":\"Notification\""));
    }
}
