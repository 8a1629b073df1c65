use std::io::{self, BufRead, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::protocol::{LineReader, Response, CLIENT_LINE_MAX, RESPONSE_BUF_SIZE, RESPONSE_LINE_MAX};
use crate::{Result, SunspotsError};

/// `SunspotsClient` contains the functionality for communication with a [`SunspotsServer`]
///
/// [`SunspotsServer`]: ./struct.SunspotsServer.html
pub struct SunspotsClient<R: Read = TcpStream, W: Write = BufWriter<TcpStream>> {
    reader: R,
    writer: W,
}

impl SunspotsClient {
    /// creates a client and establishes a socket connection to the server at the given `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let tcp_reader = TcpStream::connect(addr)?;
        let tcp_writer = tcp_reader.try_clone()?;
        debug!("connected to {}", tcp_reader.peer_addr()?);

        Ok(SunspotsClient {
            reader: tcp_reader,
            writer: BufWriter::new(tcp_writer),
        })
    }
}

impl<R: Read, W: Write> SunspotsClient<R, W> {
    /// creates a client over an already established pair of streams
    pub fn from_parts(reader: R, writer: W) -> Self {
        SunspotsClient { reader, writer }
    }

    /// gives back the underlying streams
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// sends one request line, which must already end in a newline
    pub fn send_line(&mut self, line: &[u8]) -> Result<()> {
        self.writer.write_all(line)?;
        self.writer.flush()?;
        Ok(())
    }

    /// reads one response line, see [`read_response`]
    pub fn read_response(&mut self) -> Result<Vec<u8>> {
        read_response(&mut self.reader)
    }

    /// looks up the sunspot count of `name`
    /// ## Returns
    /// `Ok(Response::Found(n))` if the server knows `name`.
    /// `Ok(Response::NotFound)` if it does not
    pub fn lookup(&mut self, name: &str) -> Result<Response> {
        self.send_line(format!("{}\n", name).as_bytes())?;
        Response::parse(&self.read_response()?)
    }
}

/// Reads a response from `reader`.
///
/// Bytes are accumulated until a newline shows up, the peer stops sending, or the
/// [`RESPONSE_BUF_SIZE`] buffer is full. The bytes are returned verbatim.
///
/// # Errors
/// - [`SunspotsError::ServerClosed`] if the server sent nothing before closing
/// - [`SunspotsError::ResponseTooLong`] if more than [`RESPONSE_LINE_MAX`] bytes arrived
/// - [`SunspotsError::Io`] on any read failure
pub fn read_response<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut buf = [0_u8; RESPONSE_BUF_SIZE];
    let mut total = 0;
    while total < buf.len() {
        let n = match reader.read(&mut buf[total..]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            break;
        }
        total += n;
        if buf[..total].contains(&b'\n') {
            break;
        }
    }

    if total == 0 {
        return Err(SunspotsError::ServerClosed);
    }
    if total > RESPONSE_LINE_MAX {
        return Err(SunspotsError::ResponseTooLong {
            len: total,
            limit: RESPONSE_LINE_MAX,
        });
    }
    Ok(buf[..total].to_vec())
}

/// Runs an interactive session: every line of `input` is sent to the server and the reply
/// is copied to `output`.
///
/// `Ready` is printed once up front. The session ends successfully when `input` runs out
/// or when it yields a blank line, which is never sent. A last line missing its newline is
/// sent with one added.
///
/// # Errors
/// returns [`SunspotsError::LineTooLong`] for input lines over [`CLIENT_LINE_MAX`] bytes,
/// and any error from sending or reading a response
pub fn run_session<I, O, R, W>(input: I, output: &mut O, client: &mut SunspotsClient<R, W>) -> Result<()>
where
    I: BufRead,
    O: Write,
    R: Read,
    W: Write,
{
    writeln!(output, "Ready")?;
    output.flush()?;

    let mut lines = LineReader::new(input, CLIENT_LINE_MAX);
    while let Some(mut line) = lines.read_line()? {
        if line == b"\n" {
            debug!("blank line, ending session");
            return Ok(());
        }
        if !line.ends_with(b"\n") {
            line.push(b'\n');
        }

        client.send_line(&line)?;
        let resp = client.read_response()?;
        output.write_all(&resp)?;
        output.flush()?;
    }
    Ok(())
}
