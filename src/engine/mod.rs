//! This module provides the lookup engine used by the connection handlers.
//! The only implementation is [`RecordStore`], a linear scan over a file of fixed-width
//! [`Record`](crate::Record)s. Every connection opens its own store through a
//! [`RecordFile`], so no handle or read cursor is ever shared between connections.

/// A trait for the lookup side of a sunspots storage engine
pub trait SunspotsEngine: Send + 'static {
    /// Gets the sunspot count associated with `name`
    ///
    /// Returns `None` if no record matches `name`. Engines that cannot read their backing
    /// storage also report `None`.
    fn lookup(&mut self, name: &[u8]) -> Option<u16>;
}

/// Something that can open a fresh, independent [`SunspotsEngine`] for every connection
pub trait EngineSource: Clone + Send + 'static {
    /// the engine type opened by this source
    type Engine: SunspotsEngine;

    /// opens a new engine with its own read position
    fn open(&self) -> Self::Engine;
}

mod record_file;

pub use self::record_file::{RecordFile, RecordStore};
