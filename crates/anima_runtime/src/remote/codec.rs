//! Wire framing for the remote protocol.
//!
//! A frame is: 4-byte little-endian payload length, then the payload. The
//! payload starts with a 1-byte opcode; request/response payloads follow with
//! a 4-byte correlation id. Field encoding reuses the packed-binary
//! reader/writer.
use anima_ir::{BinError, ByteReader, ByteWriter};

pub const HEADER_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Tool -> core: replace one member's source (hot patch).
    MemberPush = 1,
    /// Tool -> core: set a breakpoint (class, member, statement index).
    BreakpointSet = 2,
    /// Tool -> core: clear a breakpoint.
    BreakpointClear = 3,
    /// Tool -> core: evaluate an expression against a live frame.
    EvalFrame = 4,
    /// Core -> tool: print/log output stream.
    Print = 5,
    /// Core -> tool: reply to a correlated request.
    Reply = 6,
    /// Core -> tool: a breakpoint was hit.
    BreakpointHit = 7,
}

impl Opcode {
    pub fn from_u8(v: u8) -> Option<Opcode> {
        Some(match v {
            1 => Opcode::MemberPush,
            2 => Opcode::BreakpointSet,
            3 => Opcode::BreakpointClear,
            4 => Opcode::EvalFrame,
            5 => Opcode::Print,
            6 => Opcode::Reply,
            7 => Opcode::BreakpointHit,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    ShortFrame,
    UnknownOpcode(u8),
    Malformed(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::ShortFrame => write!(f, "frame shorter than its header"),
            ProtocolError::UnknownOpcode(op) => write!(f, "unknown opcode {op:#04x}"),
            ProtocolError::Malformed(msg) => write!(f, "malformed payload: {msg}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<BinError> for ProtocolError {
    fn from(e: BinError) -> Self {
        ProtocolError::Malformed(e.to_string())
    }
}

/// Wrap an opcode + payload into a length-prefixed frame.
pub fn frame(op: Opcode, payload: &[u8]) -> Vec<u8> {
    frame_raw(op as u8, payload)
}

/// Raw-opcode variant; lets tools and tests produce arbitrary frames.
pub fn frame_raw(op: u8, payload: &[u8]) -> Vec<u8> {
    let len = (payload.len() + 1) as u32;
    let mut out = Vec::with_capacity(HEADER_LEN + 1 + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.push(op);
    out.extend_from_slice(payload);
    out
}

/// Split one frame off the front of `buf`. Returns `None` until a whole
/// frame is buffered.
pub fn split_frame(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    if buf.len() < HEADER_LEN {
        return None;
    }
    let len = u32::from_le_bytes(buf[..HEADER_LEN].try_into().unwrap()) as usize;
    let total = HEADER_LEN + len;
    if buf.len() < total {
        return None;
    }
    Some((&buf[HEADER_LEN..total], &buf[total..]))
}

/// Decode the opcode byte off a payload.
pub fn open_payload(payload: &[u8]) -> Result<(Opcode, ByteReader<'_>), ProtocolError> {
    let (&op, rest) = payload.split_first().ok_or(ProtocolError::ShortFrame)?;
    let op = Opcode::from_u8(op).ok_or(ProtocolError::UnknownOpcode(op))?;
    Ok((op, ByteReader::new(rest)))
}

/// Reply payload: correlation id, ok flag, message text.
pub fn reply(correlation: u32, ok: bool, message: &str) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(correlation);
    w.bool(ok);
    w.str(message);
    frame(Opcode::Reply, &w.into_bytes())
}
