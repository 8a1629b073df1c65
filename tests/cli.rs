use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;

mod common;
use common::start_server;

fn client() -> Command {
    Command::cargo_bin("sunspots-client").unwrap()
}

#[test]
fn client_without_arguments_fails() {
    client().assert().failure().code(1);
}

#[test]
fn server_without_arguments_fails() {
    Command::cargo_bin("sunspots-server")
        .unwrap()
        .assert()
        .failure()
        .code(1);
}

#[test]
fn server_with_invalid_port_fails() {
    Command::cargo_bin("sunspots-server")
        .unwrap()
        .args(&["not-a-port", "records.dat"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("could not parse"));
}

#[test]
fn client_with_invalid_port_fails() {
    client()
        .args(&["127.0.0.1", "99999"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn client_without_server_fails() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    client()
        .arg("127.0.0.1")
        .arg(port.to_string())
        .write_stdin("alice\n")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn client_prints_replies() {
    let (_dir, addr) = start_server(&[("alice", 42)]);
    client()
        .arg("127.0.0.1")
        .arg(addr.port().to_string())
        .write_stdin("alice\nbob\n")
        .assert()
        .success()
        .stdout("Ready\n42\nnone\n");
}

#[test]
fn client_stops_at_blank_line() {
    let (_dir, addr) = start_server(&[("alice", 42), ("bob", 5)]);
    client()
        .arg("127.0.0.1")
        .arg(addr.port().to_string())
        .write_stdin("alice\n\nbob\n")
        .assert()
        .success()
        .stdout("Ready\n42\n");
}

#[test]
fn client_rejects_oversized_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        (&stream).write_all(b"123456789012\n").unwrap();
    });

    client()
        .arg("127.0.0.1")
        .arg(port.to_string())
        .write_stdin("alice\n")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("invalid response"));
}

#[test]
fn client_fails_when_server_hangs_up() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
    });

    client()
        .arg("127.0.0.1")
        .arg(port.to_string())
        .write_stdin("alice\n")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn mkdb_builds_a_file_the_server_can_serve() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("records.json");
    let dat = dir.path().join("records.dat");
    fs::write(
        &json,
        r#"[{"name": "alice", "sunspots": 42}, {"name": "bob", "sunspots": 7}]"#,
    )
    .unwrap();

    Command::cargo_bin("sunspots-mkdb")
        .unwrap()
        .arg("build")
        .arg(&json)
        .arg(&dat)
        .assert()
        .success();
    assert_eq!(fs::metadata(&dat).unwrap().len(), 64);

    Command::cargo_bin("sunspots-mkdb")
        .unwrap()
        .arg("dump")
        .arg(&dat)
        .assert()
        .success()
        .stdout(contains("\"alice\"").and(contains("42")));
}

#[test]
fn mkdb_rejects_long_names() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("records.json");
    fs::write(&json, format!(r#"[{{"name": "{}", "sunspots": 1}}]"#, "x".repeat(40))).unwrap();

    Command::cargo_bin("sunspots-mkdb")
        .unwrap()
        .arg("build")
        .arg(&json)
        .arg(dir.path().join("out.dat"))
        .assert()
        .failure()
        .stderr(contains("invalid record"));
}
