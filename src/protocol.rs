//! The line protocol spoken between [`SunspotsClient`](crate::SunspotsClient) and
//! [`SunspotsServer`](crate::SunspotsServer).
//!
//! A request is a name followed by a single `\n`. A response is either the decimal sunspot
//! count or `none`, again followed by `\n`. Exactly one request is in flight per connection.
use std::fmt;
use std::io::{self, BufRead};

use crate::record::NAME_LEN_MAX;
use crate::{Result, SunspotsError};

/// longest request line the server accepts, newline included
pub const REQUEST_LINE_MAX: usize = NAME_LEN_MAX + 1;

/// longest response line a client accepts, newline included
pub const RESPONSE_LINE_MAX: usize = 11;

/// longest input line the client forwards, newline included
pub const CLIENT_LINE_MAX: usize = 30;

/// size of the buffer the client accumulates a response into
pub const RESPONSE_BUF_SIZE: usize = 1024;

/// Reads `\n` terminated lines of at most `limit` bytes from a buffered reader.
///
/// The three ways a read can end are kept apart:
/// - `Ok(None)` when the stream ended with nothing pending
/// - `Err(SunspotsError::LineTooLong)` when `limit` bytes arrived without a newline
/// - `Ok(Some(line))` otherwise, where the line keeps its newline. The last line of a
///   stream may lack one.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    limit: usize,
}

impl<R: BufRead> LineReader<R> {
    /// wraps `inner`, accepting lines of up to `limit` bytes including the newline
    pub fn new(inner: R, limit: usize) -> Self {
        LineReader { inner, limit }
    }

    /// reads the next line, see [`LineReader`] for the possible outcomes
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::with_capacity(self.limit);
        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                return Ok(if line.is_empty() { None } else { Some(line) });
            }

            let room = self.limit - line.len();
            let window = &available[..available.len().min(room)];
            if let Some(i) = window.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&window[..=i]);
                self.inner.consume(i + 1);
                return Ok(Some(line));
            }

            let taken = window.len();
            line.extend_from_slice(window);
            self.inner.consume(taken);
            if line.len() >= self.limit {
                return Err(SunspotsError::LineTooLong { limit: self.limit });
            }
        }
    }

    /// the maximum line length in bytes
    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Validates a request line and returns the name it carries, without the newline.
///
/// # Errors
/// - [`SunspotsError::Unterminated`] if the line does not end in a newline
/// - [`SunspotsError::BlankLine`] if the line is empty or starts with a newline
pub fn parse_request(line: &[u8]) -> Result<&[u8]> {
    match line {
        [] | [b'\n', ..] => Err(SunspotsError::BlankLine),
        [name @ .., b'\n'] => Ok(name),
        _ => Err(SunspotsError::Unterminated),
    }
}

/// The answer to a single lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// the name was found with this sunspot count
    Found(u16),
    /// no record matched the name
    NotFound,
}

impl Response {
    /// parses a response line as sent by the server, the trailing newline is optional
    pub fn parse(line: &[u8]) -> Result<Response> {
        let body = line.strip_suffix(b"\n").unwrap_or(line);
        if body == b"none" {
            return Ok(Response::NotFound);
        }
        std::str::from_utf8(body)
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .map(Response::Found)
            .ok_or_else(|| {
                SunspotsError::Parsing(format!(
                    "not a sunspot count: {:?}",
                    String::from_utf8_lossy(body)
                ))
            })
    }
}

impl From<Option<u16>> for Response {
    fn from(found: Option<u16>) -> Self {
        found.map_or(Response::NotFound, Response::Found)
    }
}

/// formats the response line, newline included
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Found(n) => writeln!(f, "{}", n),
            Response::NotFound => writeln!(f, "none"),
        }
    }
}
