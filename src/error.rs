use std::io;
use thiserror::Error;

/// type alias for all operations in this crate that could fail with a [`SunspotsError`]
pub type Result<T> = std::result::Result<T, SunspotsError>;

/// The Error variants used by the sunspots server, client and record tooling.
///
/// Protocol violations get their own variants so a connection handler can tell
/// "end of stream" apart from "line too long" and "malformed line".
#[derive(Error, Debug)]
pub enum SunspotsError {
    /// IO error, includes broken pipes and connection resets
    #[error("{0}")]
    Io(#[from] io::Error),

    /// serde_json error while reading or writing record listings
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// a command line parameter (or similar input) could not be parsed
    #[error("{0}")]
    Parsing(String),

    /// no newline was seen within `limit` bytes
    #[error("line exceeds {limit} bytes without a newline")]
    LineTooLong {
        /// the maximum number of bytes allowed, newline included
        limit: usize,
    },

    /// the stream ended in the middle of a line
    #[error("line is missing its terminating newline")]
    Unterminated,

    /// the line holds no name, only a newline
    #[error("blank request line")]
    BlankLine,

    /// the server answered with more bytes than a response may hold
    #[error("invalid response from server: {len} bytes, at most {limit} allowed")]
    ResponseTooLong {
        /// bytes received
        len: usize,
        /// the maximum size of a response, newline included
        limit: usize,
    },

    /// the server closed the connection before answering
    #[error("invalid response from server: connection closed")]
    ServerClosed,

    /// a record could not be built from the given name
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// generic error message
    #[error("{0}")]
    StringErr(String),
}

impl SunspotsError {
    /// returns `true` if this error is an IO error caused by the peer going away
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            SunspotsError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
            ),
            _ => false,
        }
    }
}
