use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;

use socket2::{Domain, Socket, Type};
use tracing::{debug, error, info, instrument, warn};

use crate::engine::{EngineSource, SunspotsEngine};
use crate::protocol::{parse_request, LineReader, Response, REQUEST_LINE_MAX};
use crate::supervisor::Supervisor;
use crate::{RecordFile, Result};

/// pending-connection backlog used when none is configured
pub const DEFAULT_BACKLOG: i32 = 2;

/// Everything needed to start a [`SunspotsServer`] over a record file
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// the address to listen on
    pub addr: SocketAddr,
    /// path of the record file every connection reads from
    pub record_file: PathBuf,
    /// the listen backlog
    pub backlog: i32,
}

impl ServerConfig {
    /// a config for `addr` and `record_file` with the default backlog
    pub fn new(addr: SocketAddr, record_file: impl Into<PathBuf>) -> Self {
        ServerConfig {
            addr,
            record_file: record_file.into(),
            backlog: DEFAULT_BACKLOG,
        }
    }
}

/// A TCP socket server answering sunspot lookups.
///
/// Every accepted connection is handed to its own thread, which opens its own engine from the
/// [`EngineSource`] and runs [`handle_connection`] until the client goes away or breaks the
/// protocol. Finished threads are reclaimed by a [`Supervisor`] in the background.
///
/// # Example
/// ```rust,no_run
/// use sunspots::{ServerConfig, SunspotsServer};
/// # fn main() -> sunspots::Result<()> {
/// let config = ServerConfig::new("0.0.0.0:4000".parse().unwrap(), "records.dat");
/// SunspotsServer::bind(&config)?.run()?;
/// # Ok(())
/// # }
/// ```
pub struct SunspotsServer<S: EngineSource> {
    /// opens a fresh engine per connection
    source: S,
    listener: TcpListener,
}

impl SunspotsServer<RecordFile> {
    /// binds a listener as described by `config`, serving lookups from its record file
    ///
    /// # Errors
    /// returns [`SunspotsError::Io`] if the socket could not be created, bound or put
    /// into the listening state
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        if !config.record_file.exists() {
            warn!("record file {:?} does not exist, every lookup will miss", config.record_file);
        }
        let listener = listen(config.addr, config.backlog)?;
        Ok(SunspotsServer::with_listener(RecordFile::new(&config.record_file), listener))
    }
}

impl<S: EngineSource> SunspotsServer<S> {
    /// creates a server from an already listening socket
    pub fn with_listener(source: S, listener: TcpListener) -> Self {
        SunspotsServer { source, listener }
    }

    /// the address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// accepts connections forever.
    ///
    /// A failed accept or a failed thread spawn is logged and the loop carries on; nothing
    /// that happens on a connection reaches this loop.
    ///
    /// # Errors
    /// returns an error only if the reaper thread could not be started
    pub fn run(self) -> Result<()> {
        let mut supervisor = Supervisor::start()?;
        info!("Listening on {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer = match stream.peer_addr() {
                        Ok(peer) => peer,
                        Err(e) => {
                            warn!("dropping connection with unknown peer: {}", e);
                            continue;
                        }
                    };
                    info!("Got client: {}", peer);

                    let source = self.source.clone();
                    let spawned = supervisor.spawn(format!("conn-{}", peer), move || {
                        match serve(source, stream, peer) {
                            Ok(()) => debug!("client {} done", peer),
                            Err(e) => error!("Error on serving client {}: {}", peer, e),
                        }
                    });
                    if let Err(e) = spawned {
                        error!("could not start a handler for {}: {}", peer, e);
                    }
                    debug!("{} connections active", supervisor.active());
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }
        Ok(())
    }
}

/// opens an IPv4/IPv6 TCP listener with address reuse and the given backlog
fn listen(addr: SocketAddr, backlog: i32) -> Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    Ok(socket.into())
}

/// runs one connection on the current thread with an engine opened just for it
fn serve<S: EngineSource>(source: S, tcp: TcpStream, peer: SocketAddr) -> Result<()> {
    let engine = source.open();
    handle_connection(&tcp, BufWriter::new(&tcp), engine, peer)
}

/// Answers lookup requests read from `reader` until the client closes the connection.
///
/// Each request line is looked up in `engine` and the [`Response`] is written and flushed
/// before the next line is read.
///
/// Returns `Ok(())` when the client closes the stream between requests. An oversized,
/// unterminated or blank line ends the connection with an error and nothing is sent back.
/// A failed write ends it the same way, a closed peer is only logged as such.
#[instrument(name = "connection", skip(reader, writer, engine))]
pub fn handle_connection<R, W, E>(reader: R, mut writer: W, mut engine: E, peer: SocketAddr) -> Result<()>
where
    R: Read,
    W: Write,
    E: SunspotsEngine,
{
    let mut lines = LineReader::new(BufReader::new(reader), REQUEST_LINE_MAX);
    loop {
        let line = match lines.read_line()? {
            Some(line) => line,
            None => {
                debug!("client {} closed the connection", peer);
                return Ok(());
            }
        };

        let name = parse_request(&line)?;
        debug!("Receive request from {}: {:?}", peer, String::from_utf8_lossy(name));

        let resp = Response::from(engine.lookup(name));
        if let Err(e) = send(&mut writer, resp) {
            if e.is_broken_pipe() {
                warn!("connection closed by {} before the response was sent", peer);
            }
            return Err(e);
        }
        debug!("Response sent to {}: {:?}", peer, resp);
    }
}

fn send<W: Write>(writer: &mut W, resp: Response) -> Result<()> {
    writer.write_all(resp.to_string().as_bytes())?;
    writer.flush()?;
    Ok(())
}
