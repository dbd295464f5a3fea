//! Session Tests
//!
//! Tests verify:
//! - Line-by-line dispatch with replies written in order
//! - Errors are reported and the session continues
//! - EXIT and end of input both end the session

use std::io::Cursor;

use ledgerkv::engine::Engine;
use ledgerkv::protocol::Reply;
use ledgerkv::shell::{ManualClock, Session, Step};
use tempfile::TempDir;

fn run_script(engine: &mut Engine, clock: &ManualClock, script: &str) -> String {
    let mut out = Vec::new();
    Session::new(engine, clock)
        .run(Cursor::new(script.as_bytes()), &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_session_replies_in_order() {
    let temp = TempDir::new().unwrap();
    let mut engine = Engine::open_path(temp.path()).unwrap();
    let clock = ManualClock::new(1_000);

    let output = run_script(
        &mut engine,
        &clock,
        "SET a 1\nGET a\n\nGET b\nDEL a\nEXISTS a\n",
    );

    assert_eq!(output, "OK\n1\nNULL\n1\n0\n");
}

#[test]
fn test_session_reports_errors_and_continues() {
    let temp = TempDir::new().unwrap();
    let mut engine = Engine::open_path(temp.path()).unwrap();
    let clock = ManualClock::new(1_000);

    let mut out = Vec::new();
    let stats = Session::new(&mut engine, &clock)
        .run(Cursor::new("FROB x\nCOMMIT\nSET k v\nGET k\n"), &mut out)
        .unwrap();
    let output = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert!(lines[0].starts_with("ERR "));
    assert_eq!(lines[1], "ERR no active transaction");
    assert_eq!(&lines[2..], &["OK", "v"]);
    assert_eq!(stats.commands, 3);
    assert_eq!(stats.errors, 2);
    assert_eq!(stats.writes, 1);
}

#[test]
fn test_invalid_utf8_line_is_rejected_and_session_continues() {
    let temp = TempDir::new().unwrap();
    let mut engine = Engine::open_path(temp.path()).unwrap();
    let clock = ManualClock::new(1_000);

    let mut input = b"SET a 1\n".to_vec();
    input.extend_from_slice(b"SET b \xff\xfe\n");
    input.extend_from_slice(b"GET a\r\nGET b\n");

    let mut out = Vec::new();
    let stats = Session::new(&mut engine, &clock)
        .run(Cursor::new(input), &mut out)
        .unwrap();
    let output = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = output.lines().collect();

    assert_eq!(lines[0], "OK");
    assert!(lines[1].starts_with("ERR "));
    assert_eq!(&lines[2..], &["1", "NULL"]);
    assert_eq!(stats.commands, 3);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.writes, 1);
}

#[test]
fn test_reads_do_not_count_as_writes() {
    let temp = TempDir::new().unwrap();
    let mut engine = Engine::open_path(temp.path()).unwrap();
    let clock = ManualClock::new(1_000);

    let mut out = Vec::new();
    let stats = Session::new(&mut engine, &clock)
        .run(
            Cursor::new("MSET a 1 b 2\nGET a\nRANGE a z\nBEGIN\nSET c 3\nCOMMIT\n"),
            &mut out,
        )
        .unwrap();

    assert_eq!(stats.commands, 6);
    assert_eq!(stats.writes, 3);
    assert_eq!(stats.errors, 0);
}

#[test]
fn test_exit_stops_reading() {
    let temp = TempDir::new().unwrap();
    let mut engine = Engine::open_path(temp.path()).unwrap();
    let clock = ManualClock::new(1_000);

    let output = run_script(&mut engine, &clock, "SET a 1\nEXIT\nSET b 2\n");

    assert_eq!(output, "OK\n");
    assert_eq!(engine.get(b"b", 1_000), None);
}

#[test]
fn test_session_uses_injected_clock() {
    let temp = TempDir::new().unwrap();
    let mut engine = Engine::open_path(temp.path()).unwrap();
    let clock = ManualClock::new(50_000);

    let mut session = Session::new(&mut engine, &clock);
    assert_eq!(session.handle_line("SET k v"), Step::Reply(Reply::Ok));
    assert_eq!(session.handle_line("EXPIRE k 10"), Step::Reply(Reply::Integer(1)));
    assert_eq!(session.handle_line("TTL k"), Step::Reply(Reply::Integer(10)));

    clock.advance_secs(4);
    assert_eq!(session.handle_line("TTL k"), Step::Reply(Reply::Integer(6)));

    clock.advance_secs(6);
    assert_eq!(session.handle_line("GET k"), Step::Reply(Reply::Value(None)));
    assert_eq!(session.handle_line("TTL k"), Step::Reply(Reply::Integer(-2)));
    assert_eq!(session.handle_line("  "), Step::Skip);
    assert_eq!(session.handle_line("exit"), Step::Exit);
}
