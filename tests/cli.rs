//! Integration tests for the mysqltap command line.
//!
//! Builds small captures on disk and runs them through the same entry
//! points `main` uses.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use mysqltap::cli::{guess_macs, run, Args};
use mysqltap_core::protocol::flags::{ACK, PSH, SYN};
use mysqltap_core::protocol::test_utils::{build_tcp_frame, encode_capture, mysql_packet};
use mysqltap_core::RawPacket;

const SERVER: ([u8; 4], u16) = ([172, 16, 0, 2], 3306);
const CLIENT: ([u8; 4], u16) = ([172, 16, 0, 9], 60000);

/// One connection issuing `statements`, each answered by an OK packet
/// `delay_ms` milliseconds later.
fn capture(statements: &[(&str, i64)]) -> Vec<u8> {
    type Addr = ([u8; 4], u16);
    fn push(frames: &mut Vec<RawPacket>, ts: i64, src: Addr, dst: Addr, flags: u8, payload: &[u8]) {
        let n = frames.len() as u64 + 1;
        frames.push(RawPacket::ethernet(n, ts, build_tcp_frame(src, dst, flags, payload)));
    }

    let mut frames = Vec::new();
    let mut ts = 5_000_000i64;

    push(&mut frames, ts, CLIENT, SERVER, SYN, &[]);
    push(&mut frames, ts, SERVER, CLIENT, PSH | ACK, &mysql_packet(0, b"\x0a8.0\x00"));
    push(&mut frames, ts, CLIENT, SERVER, PSH | ACK, &mysql_packet(1, b"login"));
    push(&mut frames, ts, SERVER, CLIENT, PSH | ACK, &mysql_packet(2, &[0x00, 0x00, 0x00]));

    for (sql, delay_ms) in statements {
        ts += 10_000;
        let mut body = vec![0x03];
        body.extend_from_slice(sql.as_bytes());
        push(&mut frames, ts, CLIENT, SERVER, PSH | ACK, &mysql_packet(0, &body));
        push(
            &mut frames,
            ts + delay_ms * 1_000,
            SERVER,
            CLIENT,
            PSH | ACK,
            &mysql_packet(0, &[0x00, 0x00, 0x00]),
        );
    }

    encode_capture(&frames)
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

fn args(extra: &[&str], files: &[&Path]) -> Args {
    let mut argv: Vec<String> = vec!["mysqltap".to_string()];
    argv.extend(extra.iter().map(|s| s.to_string()));
    argv.extend(files.iter().map(|p| p.display().to_string()));
    Args::parse_from(argv)
}

#[test]
fn test_csv_report_ranks_by_total_latency() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "a.pcap",
        &capture(&[
            ("SELECT * FROM a WHERE id = 1", 2),
            ("SELECT * FROM b WHERE id = 1", 5),
            ("SELECT * FROM a WHERE id = 2", 2),
        ]),
    );

    let mut out = Vec::new();
    let summary = run(&args(&["--format", "csv"], &[path.as_path()]), &mut out).unwrap();

    assert_eq!(summary.queries, 3);
    assert_eq!(summary.shapes, 2);
    assert_eq!(summary.counters.connections_opened, 1);

    let output = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("5000,1,"));
    assert!(lines[1].contains("SELECT * FROM b WHERE id = ?"));
    assert!(lines[2].starts_with("4000,2,"));
}

#[test]
fn test_limit() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "a.pcap",
        &capture(&[("SELECT 1", 1), ("UPDATE t SET a = 1", 2), ("DELETE FROM t", 3)]),
    );

    let mut out = Vec::new();
    run(&args(&["--format", "json", "--limit", "1"], &[path.as_path()]), &mut out).unwrap();

    let output = String::from_utf8(out).unwrap();
    assert_eq!(output.lines().count(), 1);
    assert!(output.contains("\"shape\":\"DELETE FROM t\""));
}

#[test]
fn test_snapshot_save_and_merge() {
    let dir = TempDir::new().unwrap();
    let first = write_file(&dir, "first.pcap", &capture(&[("SELECT 1", 1), ("SELECT 2", 3)]));
    let second = write_file(&dir, "second.pcap", &capture(&[("SELECT 3", 2)]));
    let snapshot = dir.path().join("first.snap");
    let snapshot_arg = snapshot.display().to_string();

    let mut sink = Vec::new();
    run(
        &args(&["--save-snapshot", snapshot_arg.as_str(), "--format", "csv"], &[first.as_path()]),
        &mut sink,
    )
    .unwrap();
    assert!(snapshot.exists());

    let mut out = Vec::new();
    let summary = run(
        &args(&["--merge-snapshot", snapshot_arg.as_str(), "--format", "csv"], &[second.as_path()]),
        &mut out,
    )
    .unwrap();

    assert_eq!(summary.queries, 3);
    assert_eq!(summary.shapes, 1);
    let output = String::from_utf8(out).unwrap();
    // 1 + 3 + 2 ms, median of [1000, 2000, 3000]
    assert!(output.lines().nth(1).unwrap().starts_with("6000,3,2000.0,2000,"));

    // A snapshot alone is enough input
    let mut out = Vec::new();
    let summary = run(&args(&["--merge-snapshot", snapshot_arg.as_str()], &[]), &mut out).unwrap();
    assert_eq!(summary.queries, 2);
    assert_eq!(summary.counters.frames, 0);
}

#[test]
fn test_bad_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let bogus = write_file(&dir, "bogus.snap", b"definitely not a snapshot");

    let mut out = Vec::new();
    let bogus_arg = bogus.display().to_string();
    let err = run(&args(&["--merge-snapshot", bogus_arg.as_str()], &[]), &mut out).unwrap_err();
    assert!(err.to_string().contains("Failed to merge snapshot"));
}

#[test]
fn test_no_input_is_an_error() {
    let mut out = Vec::new();
    assert!(run(&args(&[], &[]), &mut out).is_err());
}

#[test]
fn test_missing_capture_names_the_file() {
    let mut out = Vec::new();
    let err = run(&args(&[], &[Path::new("/no/such/file.pcap")]), &mut out).unwrap_err();
    assert!(err.to_string().contains("/no/such/file.pcap"));
}

#[test]
fn test_guess_mac() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "a.pcap", &capture(&[("SELECT 1", 1)]));

    let mut out = Vec::new();
    guess_macs(&args(&["--guess-mac"], &[path.as_path()]), &mut out).unwrap();

    // Builder frames all carry the same two addresses; the lower one wins the tie
    let output = String::from_utf8(out).unwrap();
    assert!(output.trim_end().ends_with("\t00:11:22:33:44:55"));
}
