use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use super::{EngineSource, SunspotsEngine};
use crate::record::{Record, RECORD_SIZE};

/// A handle on a record file path. Cloning it is cheap; the file itself is only opened
/// by [`RecordFile::open`], once per connection.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    /// creates a handle for the record file at `path`. The file is not touched yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordFile { path: path.into() }
    }

    /// the path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EngineSource for RecordFile {
    type Engine = RecordStore<File>;

    /// opens the record file for reading.
    ///
    /// A file that cannot be opened still yields a store; every lookup on it reports
    /// "not found".
    fn open(&self) -> RecordStore<File> {
        match File::open(&self.path) {
            Ok(file) => {
                debug!("opened record file {:?}", &self.path);
                RecordStore::new(file)
            }
            Err(e) => {
                error!("could not open record file {:?}: {}", &self.path, e);
                RecordStore::unavailable()
            }
        }
    }
}

/// A read-only store over a sequence of fixed-width records.
///
/// Lookups scan from the first record every time and return the first match in file
/// order. Nothing is cached between calls.
#[derive(Debug)]
pub struct RecordStore<R: Read + Seek> {
    reader: Option<BufReader<R>>,
}

impl<R: Read + Seek> RecordStore<R> {
    /// creates a store reading records from `inner`
    pub fn new(inner: R) -> Self {
        RecordStore {
            reader: Some(BufReader::new(inner)),
        }
    }

    /// creates a store with no backing file, every lookup is a miss
    pub fn unavailable() -> Self {
        RecordStore { reader: None }
    }
}

impl<R: Read + Seek + Send + 'static> SunspotsEngine for RecordStore<R> {
    fn lookup(&mut self, name: &[u8]) -> Option<u16> {
        let reader = self.reader.as_mut()?;
        match scan(reader, name) {
            Ok(found) => found,
            Err(e) => {
                warn!("could not read record file: {}", e);
                None
            }
        }
    }
}

/// seeks `reader` back to the start and reads records until one matches `name`.
/// A trailing partial record ends the scan like end of file does.
fn scan<R: Read + Seek>(reader: &mut BufReader<R>, name: &[u8]) -> io::Result<Option<u16>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut buf = [0_u8; RECORD_SIZE];
    loop {
        match reader.read_exact(&mut buf) {
            Ok(()) => {
                let rec = Record::from_bytes(&buf);
                if rec.matches(name) {
                    return Ok(Some(rec.sunspots()));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}
