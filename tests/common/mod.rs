#![allow(dead_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::thread;

use sunspots::record::write_records;
use sunspots::{Record, ServerConfig, SunspotsServer};
use tempfile::TempDir;

/// writes `entries`, in order, into a record file inside `dir`
pub fn record_file(dir: &Path, entries: &[(&str, u16)]) -> PathBuf {
    let path = dir.join("records.dat");
    let records: Vec<Record> = entries
        .iter()
        .map(|(name, n)| Record::new(name.as_bytes(), *n).unwrap())
        .collect();
    let mut file = File::create(&path).unwrap();
    write_records(&mut file, &records).unwrap();
    path
}

/// starts a server on an ephemeral localhost port, serving `entries`
pub fn start_server(entries: &[(&str, u16)]) -> (TempDir, SocketAddr) {
    let dir = tempfile::tempdir().unwrap();
    let path = record_file(dir.path(), entries);

    let mut config = ServerConfig::new("127.0.0.1:0".parse().unwrap(), path);
    config.backlog = 64;
    let server = SunspotsServer::bind(&config).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    (dir, addr)
}

/// a raw protocol connection, for poking at the server byte by byte
pub struct Conn {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Conn {
    pub fn open(addr: SocketAddr) -> Conn {
        let writer = TcpStream::connect(addr).unwrap();
        let reader = BufReader::new(writer.try_clone().unwrap());
        Conn { reader, writer }
    }

    pub fn send(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).unwrap();
    }

    /// sends `name` as a request and returns the reply line
    pub fn ask(&mut self, name: &str) -> String {
        self.send(format!("{}\n", name).as_bytes());
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line
    }

    /// returns `true` once the server has closed its side without sending anything
    pub fn is_closed_by_server(&mut self) -> bool {
        let mut buf = [0_u8; 16];
        match self.reader.read(&mut buf) {
            Ok(0) => true,
            Ok(_) => false,
            // the server may reset a connection it closed with unread input
            Err(_) => true,
        }
    }
}
