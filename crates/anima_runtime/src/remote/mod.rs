//! Remote debug session.
//!
//! Transport-agnostic: the host feeds received bytes in with `on_bytes` and
//! drains `poll_outgoing` into whatever duplex channel it owns. Requests are
//! answered asynchronously with correlation ids; nothing here ever blocks
//! the evaluation thread.
pub mod codec;

use anima_ir::{ByteWriter, MemberKind};
use anima_syntax::Symbol;
use std::collections::VecDeque;

use crate::engine::{DebugEvent, Engine};
use crate::frame::FrameId;

use codec::{Opcode, ProtocolError};

pub struct RemoteSession {
    inbuf: Vec<u8>,
    outgoing: VecDeque<Vec<u8>>,
}

impl RemoteSession {
    pub fn attach(engine: &mut Engine) -> Self {
        engine.capture_prints = true;
        Self {
            inbuf: Vec::new(),
            outgoing: VecDeque::new(),
        }
    }

    /// Feed raw bytes from the transport; complete frames are handled
    /// immediately, partial ones buffered.
    pub fn on_bytes(&mut self, engine: &mut Engine, bytes: &[u8]) {
        self.inbuf.extend_from_slice(bytes);
        loop {
            let Some((payload, rest)) = codec::split_frame(&self.inbuf) else {
                break;
            };
            let payload = payload.to_vec();
            let rest = rest.to_vec();
            self.inbuf = rest;
            if let Err(e) = self.on_frame(engine, &payload) {
                self.outgoing.push_back(codec::reply(0, false, &e.to_string()));
            }
        }
    }

    fn on_frame(&mut self, engine: &mut Engine, payload: &[u8]) -> Result<(), ProtocolError> {
        let (op, mut r) = codec::open_payload(payload)?;
        match op {
            Opcode::MemberPush => {
                let correlation = r.u32()?;
                let class = r.sym()?;
                let member = r.sym()?;
                let is_coroutine = r.bool()?;
                let source = r.str()?;
                let kind = if is_coroutine {
                    MemberKind::Coroutine
                } else {
                    MemberKind::Method
                };
                match engine.load_member(class, member, kind, &source) {
                    Ok(diags) => {
                        let errors: Vec<String> = diags
                            .iter()
                            .filter(|d| d.is_error())
                            .map(|d| d.message.clone())
                            .collect();
                        if errors.is_empty() {
                            self.outgoing.push_back(codec::reply(correlation, true, ""));
                        } else {
                            self.outgoing.push_back(codec::reply(
                                correlation,
                                false,
                                &errors.join("; "),
                            ));
                        }
                    }
                    Err(e) => {
                        self.outgoing
                            .push_back(codec::reply(correlation, false, &e.to_string()));
                    }
                }
            }
            Opcode::BreakpointSet | Opcode::BreakpointClear => {
                let correlation = r.u32()?;
                let class = r.sym()?;
                let member = r.sym()?;
                let stmt = r.u32()?;
                if op == Opcode::BreakpointSet {
                    engine.set_breakpoint(class, member, stmt);
                } else {
                    engine.clear_breakpoint(class, member, stmt);
                }
                self.outgoing.push_back(codec::reply(correlation, true, ""));
            }
            Opcode::EvalFrame => {
                let correlation = r.u32()?;
                let frame = FrameId(r.u32()?);
                let source = r.str()?;
                match engine.eval_in_frame(frame, &source) {
                    Ok(result) => {
                        self.outgoing
                            .push_back(codec::reply(correlation, true, &result));
                    }
                    Err(e) => {
                        self.outgoing
                            .push_back(codec::reply(correlation, false, &e.to_string()));
                    }
                }
            }
            Opcode::Print | Opcode::Reply | Opcode::BreakpointHit => {
                // Core-to-tool opcodes are never valid inbound.
                return Err(ProtocolError::Malformed(format!(
                    "opcode {op:?} flows core to tool"
                )));
            }
        }
        Ok(())
    }

    /// Move engine-side events (script print output, breakpoint hits) into
    /// outgoing frames. Call once per host tick.
    pub fn pump(&mut self, engine: &mut Engine) {
        for text in std::mem::take(&mut engine.print_events) {
            let mut w = ByteWriter::new();
            w.str(&text);
            self.outgoing.push_back(codec::frame(Opcode::Print, &w.into_bytes()));
        }
        for ev in engine.take_debug_events() {
            if let DebugEvent::BreakpointHit {
                class,
                member,
                stmt,
                frame,
            } = ev
            {
                let mut w = ByteWriter::new();
                w.sym(class);
                w.sym(member);
                w.u32(stmt);
                w.u32(frame.0);
                self.outgoing
                    .push_back(codec::frame(Opcode::BreakpointHit, &w.into_bytes()));
            }
        }
    }

    /// Next frame to write to the transport, if any.
    pub fn poll_outgoing(&mut self) -> Option<Vec<u8>> {
        self.outgoing.pop_front()
    }
}

/// Build a member-push request frame (tool side; also used by tests).
pub fn member_push_request(
    correlation: u32,
    class: Symbol,
    member: Symbol,
    is_coroutine: bool,
    source: &str,
) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(correlation);
    w.sym(class);
    w.sym(member);
    w.bool(is_coroutine);
    w.str(source);
    codec::frame(Opcode::MemberPush, &w.into_bytes())
}

/// Build a breakpoint request frame.
pub fn breakpoint_request(
    correlation: u32,
    set: bool,
    class: Symbol,
    member: Symbol,
    stmt: u32,
) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(correlation);
    w.sym(class);
    w.sym(member);
    w.u32(stmt);
    codec::frame(
        if set {
            Opcode::BreakpointSet
        } else {
            Opcode::BreakpointClear
        },
        &w.into_bytes(),
    )
}

/// Build an eval-in-frame request frame.
pub fn eval_frame_request(correlation: u32, frame: FrameId, source: &str) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.u32(correlation);
    w.u32(frame.0);
    w.str(source);
    codec::frame(Opcode::EvalFrame, &w.into_bytes())
}

/// Parse a reply payload (tool side; also used by tests).
pub fn parse_reply(payload: &[u8]) -> Result<(u32, bool, String), ProtocolError> {
    let (op, mut r) = codec::open_payload(payload)?;
    if op != Opcode::Reply {
        return Err(ProtocolError::Malformed(format!("expected reply, got {op:?}")));
    }
    let correlation = r.u32()?;
    let ok = r.bool()?;
    let message = r.str()?;
    Ok((correlation, ok, message))
}

/// Parse a print payload (tool side; also used by tests).
pub fn parse_print(payload: &[u8]) -> Result<String, ProtocolError> {
    let (op, mut r) = codec::open_payload(payload)?;
    if op != Opcode::Print {
        return Err(ProtocolError::Malformed(format!("expected print, got {op:?}")));
    }
    Ok(r.str()?)
}
