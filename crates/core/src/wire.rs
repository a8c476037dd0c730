// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary framing for the control channel.
//!
//! Request framing is fixed by the contract: `kind:i8, n_slots:i32 (BE),
//! (len:i32 BE, bytes[len])^n_slots`. Replies reuse the length-prefixed
//! framing style already established for this kind of channel, carrying one
//! JSON document per reply.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::PgmonetaError;
use crate::protocol::{ControlRequest, ControlResponse};

/// Slots above this length are always malformed; guards against a hostile
/// or corrupt peer driving an unbounded allocation.
const MAX_SLOT_LEN: i32 = 16 * 1024 * 1024;
const MAX_SLOTS: i32 = 8;

pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<ControlRequest, PgmonetaError> {
    let kind_byte = reader.read_i8().await?;
    let n_slots = reader.read_i32().await?;

    if !(0..=MAX_SLOTS).contains(&n_slots) {
        return Err(PgmonetaError::WireMalformed);
    }

    let mut slots = Vec::with_capacity(n_slots as usize);
    for _ in 0..n_slots {
        let len = reader.read_i32().await?;
        if !(0..=MAX_SLOT_LEN).contains(&len) {
            return Err(PgmonetaError::WireMalformed);
        }
        let mut buf = vec![0u8; len as usize];
        reader.read_exact(&mut buf).await?;
        let s = String::from_utf8(buf).map_err(|_| PgmonetaError::WireMalformed)?;
        slots.push(s);
    }

    ControlRequest::parse(kind_byte, slots)
}

pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    req: &ControlRequest,
) -> Result<(), PgmonetaError> {
    writer.write_i8(req.kind as i8).await?;
    writer.write_i32(req.slots.len() as i32).await?;
    for slot in &req.slots {
        let bytes = slot.as_bytes();
        writer.write_i32(bytes.len() as i32).await?;
        writer.write_all(bytes).await?;
    }
    writer.flush().await?;
    Ok(())
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    resp: &ControlResponse,
) -> Result<(), PgmonetaError> {
    let body = serde_json::to_vec(resp).map_err(|e| PgmonetaError::InternalBug(e.to_string()))?;
    writer.write_u32(body.len() as u32).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> Result<ControlResponse, PgmonetaError> {
    let len = reader.read_u32().await?;
    if len as usize > MAX_SLOT_LEN as usize {
        return Err(PgmonetaError::WireMalformed);
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    serde_json::from_slice(&buf).map_err(|_| PgmonetaError::WireMalformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ControlKind;
    use std::io::Cursor;

    #[tokio::test]
    async fn request_round_trips() {
        let req = ControlRequest::parse(ControlKind::Delete as i8, vec!["b".into(), "42".into()]).unwrap();
        let mut buf = Vec::new();
        write_request(&mut buf, &req).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_request(&mut cursor).await.unwrap();
        assert_eq!(decoded, req);
    }

    #[tokio::test]
    async fn zero_slot_request_round_trips() {
        let req = ControlRequest::parse(ControlKind::Stop as i8, vec![]).unwrap();
        let mut buf = Vec::new();
        write_request(&mut buf, &req).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_request(&mut cursor).await.unwrap();
        assert_eq!(decoded, req);
    }

    #[tokio::test]
    async fn oversized_slot_count_is_malformed() {
        let mut buf = Vec::new();
        buf.push(ControlKind::Stop as u8 as i8 as u8);
        buf.extend_from_slice(&(MAX_SLOTS + 1).to_be_bytes());
        let mut cursor = Cursor::new(buf);
        assert!(read_request(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn response_round_trips() {
        let resp = ControlResponse::Delete { server_index: 1, result: 0 };
        let mut buf = Vec::new();
        write_response(&mut buf, &resp).await.unwrap();

        let mut cursor = Cursor::new(buf);
        let decoded = read_response(&mut cursor).await.unwrap();
        assert_eq!(decoded, resp);
    }
}
