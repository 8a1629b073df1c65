#![deny(missing_docs)]
//! A small networked lookup service that maps names to sunspot counts.
//!
//! This crate provides the [`SunspotsServer`] and [`SunspotsClient`] implementations, as well
//! as [`sunspots-server`], [`sunspots-client`] and [`sunspots-mkdb`] executables.
//! Names and counts are sent between the client and server using synchronous networking over
//! a line protocol.
//!
//! ## Line Protocol
//! A client sends a name followed by a newline, at most [`NAME_LEN_MAX`] bytes of name. The
//! server answers with the sunspot count in decimal, or `none` if the name is unknown, again
//! followed by a newline. A response is never longer than 11 bytes and clients reject longer
//! ones. Only one request is in flight per connection; the client closes the connection to
//! end the session.
//!
//! A request line that is too long, has no newline, or holds no name makes the server close
//! that connection without a reply. Other connections are not affected.
//!
//! ## Record Files
//! Lookups are answered from a flat file of fixed-width binary [`Record`]s, scanned from the
//! start on every request. The first matching record in file order wins. See the [`record`]
//! module for the layout. [`sunspots-mkdb`] builds such files from JSON.
//!
//! ## Connections
//! Every connection runs on its own thread with its own handle on the record file, so no
//! connection can observe or disturb another's read position. Finished threads are joined by
//! a [`Supervisor`] without ever holding up the accept loop.
//!
//! [`sunspots-server`]: ./bin/sunspots-server.rs
//! [`sunspots-client`]: ./bin/sunspots-client.rs
//! [`sunspots-mkdb`]: ./bin/sunspots-mkdb.rs

pub use client::{read_response, run_session, SunspotsClient};
pub use engine::{EngineSource, RecordFile, RecordStore, SunspotsEngine};
pub use error::{Result, SunspotsError};
pub use protocol::{LineReader, Response};
pub use record::{Record, RecordEntry, NAME_LEN_MAX};
pub use server::{handle_connection, ServerConfig, SunspotsServer, DEFAULT_BACKLOG};
pub use supervisor::Supervisor;

mod client;
mod engine;
mod error;
pub mod protocol;
pub mod record;
mod server;
mod supervisor;
