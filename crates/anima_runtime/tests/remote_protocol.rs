mod common;

use anima_runtime::remote::{
    self, RemoteSession, codec,
};
use common::*;

fn strip_header(frame: &[u8]) -> &[u8] {
    codec::split_frame(frame).expect("whole frame").0
}

#[test]
fn member_push_hot_patches_and_acknowledges() {
    let mut engine = engine();
    add_class(&mut engine, "Speaker", None);
    load_method(&mut engine, "Speaker", "talk", "() { write(\"old\") }");
    let s = engine.instantiate(sym("Speaker"), vec![]).unwrap();

    let mut session = RemoteSession::attach(&mut engine);
    let req = remote::member_push_request(
        7,
        sym("Speaker"),
        sym("talk"),
        false,
        "() { write(\"patched\") }",
    );
    session.on_bytes(&mut engine, &req);
    let reply = session.poll_outgoing().expect("reply frame");
    let (correlation, ok, msg) = remote::parse_reply(strip_header(&reply)).unwrap();
    assert_eq!(correlation, 7);
    assert!(ok, "{msg}");

    let r = call(&mut engine, s, "talk");
    engine.release(r);
    assert_eq!(engine.take_output(), "patched");
    engine.release(s);
}

#[test]
fn member_push_with_errors_reports_diagnostics() {
    let mut engine = engine();
    add_class(&mut engine, "Speaker", None);
    let mut session = RemoteSession::attach(&mut engine);
    let req = remote::member_push_request(9, sym("Speaker"), sym("talk"), false, "(((");
    session.on_bytes(&mut engine, &req);
    let reply = session.poll_outgoing().expect("reply frame");
    let (correlation, ok, msg) = remote::parse_reply(strip_header(&reply)).unwrap();
    assert_eq!(correlation, 9);
    assert!(!ok);
    assert!(!msg.is_empty());
}

#[test]
fn print_output_streams_to_the_tool() {
    let mut engine = engine();
    add_class(&mut engine, "Talker", None);
    load_method(&mut engine, "Talker", "say", "() { write_line(\"over the wire\") }");
    let t = engine.instantiate(sym("Talker"), vec![]).unwrap();
    let mut session = RemoteSession::attach(&mut engine);

    let r = call(&mut engine, t, "say");
    engine.release(r);
    session.pump(&mut engine);
    let frame = session.poll_outgoing().expect("print frame");
    let text = remote::parse_print(strip_header(&frame)).unwrap();
    assert_eq!(text, "over the wire\n");
    engine.release(t);
}

#[test]
fn breakpoints_set_over_the_wire_report_hits() {
    let mut engine = engine();
    add_class(&mut engine, "Stepper", None);
    load_method(&mut engine, "Stepper", "go", "() { write(\"a\")\n write(\"b\") }");
    let s = engine.instantiate(sym("Stepper"), vec![]).unwrap();
    let mut session = RemoteSession::attach(&mut engine);

    let req = remote::breakpoint_request(3, true, sym("Stepper"), sym("go"), 1);
    session.on_bytes(&mut engine, &req);
    let reply = session.poll_outgoing().expect("ack");
    let (correlation, ok, _) = remote::parse_reply(strip_header(&reply)).unwrap();
    assert_eq!((correlation, ok), (3, true));

    let r = call(&mut engine, s, "go");
    engine.release(r);
    session.pump(&mut engine);
    // First outgoing frame is the streamed print, then the hit notice.
    let mut saw_hit = false;
    while let Some(frame) = session.poll_outgoing() {
        let payload = strip_header(&frame).to_vec();
        if let Ok((op, _)) = codec::open_payload(&payload) {
            if op == codec::Opcode::BreakpointHit {
                saw_hit = true;
            }
        }
    }
    assert!(saw_hit);
    engine.release(s);
}

#[test]
fn eval_against_a_live_suspended_frame() {
    let mut engine = engine();
    add_class(&mut engine, "Guard", Some("Actor"));
    load_coroutine(
        &mut engine,
        "Guard",
        "_watch",
        "(limit) { var seen = limit + 1\n _wait(10.0)\n write(seen) }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    let limit = engine.new_integer(4);
    let fid = engine
        .start_coroutine(g, sym("_watch"), vec![limit])
        .unwrap()
        .expect("suspends at the wait");

    let mut session = RemoteSession::attach(&mut engine);
    let req = remote::eval_frame_request(11, fid, "seen * 2");
    session.on_bytes(&mut engine, &req);
    let reply = session.poll_outgoing().expect("reply");
    let (correlation, ok, msg) = remote::parse_reply(strip_header(&reply)).unwrap();
    assert_eq!(correlation, 11);
    assert!(ok, "{msg}");
    assert_eq!(msg, "10");
    engine.release(g);
}

#[test]
fn malformed_frames_get_an_error_reply_not_a_panic() {
    let mut engine = engine();
    let mut session = RemoteSession::attach(&mut engine);
    // Unknown opcode inside a well-formed frame.
    session.on_bytes(&mut engine, &codec::frame_raw(0xEE, &[1, 2, 3]));
    let reply = session.poll_outgoing().expect("error reply");
    let (_, ok, msg) = remote::parse_reply(strip_header(&reply)).unwrap();
    assert!(!ok);
    assert!(msg.contains("opcode"));
}

#[test]
fn frames_reassemble_across_partial_reads() {
    let mut engine = engine();
    add_class(&mut engine, "Speaker", None);
    let mut session = RemoteSession::attach(&mut engine);
    let req = remote::member_push_request(
        5,
        sym("Speaker"),
        sym("talk"),
        false,
        "() { write(\"x\") }",
    );
    let (head, tail) = req.split_at(req.len() / 2);
    session.on_bytes(&mut engine, head);
    assert!(session.poll_outgoing().is_none());
    session.on_bytes(&mut engine, tail);
    let reply = session.poll_outgoing().expect("reply after reassembly");
    let (correlation, ok, msg) = remote::parse_reply(strip_header(&reply)).unwrap();
    assert_eq!(correlation, 5);
    assert!(ok, "{msg}");
}
