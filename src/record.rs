//! The fixed-width binary record that backs every lookup.
//!
//! A record file is nothing more than a sequence of [`RECORD_SIZE`] byte records, laid out as:
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 1    | declared name length                    |
//! | 1      | 29   | name bytes, zero padded                 |
//! | 30     | 2    | sunspot count, unsigned, little-endian  |
//!
//! There is no header and no index; record order in the file is lookup order.
use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, SunspotsError};

/// maximum number of name bytes a record can hold
pub const NAME_LEN_MAX: usize = 29;

/// size in bytes of one encoded record
pub const RECORD_SIZE: usize = 1 + NAME_LEN_MAX + 2;

/// A single name to sunspot-count entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    name_len: u8,
    name: [u8; NAME_LEN_MAX],
    sunspots: u16,
}

impl Record {
    /// builds a record for `name`.
    ///
    /// # Errors
    /// returns [`SunspotsError::InvalidRecord`] if `name` is empty, longer than
    /// [`NAME_LEN_MAX`], or contains a newline or zero byte
    pub fn new(name: &[u8], sunspots: u16) -> Result<Record> {
        if name.is_empty() || name.len() > NAME_LEN_MAX {
            return Err(SunspotsError::InvalidRecord(format!(
                "name must be 1 to {} bytes long, got {}",
                NAME_LEN_MAX,
                name.len()
            )));
        }
        if name.iter().any(|&b| b == b'\n' || b == 0) {
            return Err(SunspotsError::InvalidRecord(format!(
                "name {:?} contains a newline or zero byte",
                String::from_utf8_lossy(name)
            )));
        }

        let mut buf = [0_u8; NAME_LEN_MAX];
        buf[..name.len()].copy_from_slice(name);
        Ok(Record {
            name_len: name.len() as u8,
            name: buf,
            sunspots,
        })
    }

    /// decodes a record, exactly as it is stored on disk
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Record {
        let mut name = [0_u8; NAME_LEN_MAX];
        name.copy_from_slice(&bytes[1..1 + NAME_LEN_MAX]);
        Record {
            name_len: bytes[0],
            name,
            sunspots: u16::from_le_bytes([bytes[RECORD_SIZE - 2], bytes[RECORD_SIZE - 1]]),
        }
    }

    /// encodes this record into its on-disk form
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0_u8; RECORD_SIZE];
        bytes[0] = self.name_len;
        bytes[1..1 + NAME_LEN_MAX].copy_from_slice(&self.name);
        bytes[RECORD_SIZE - 2..].copy_from_slice(&self.sunspots.to_le_bytes());
        bytes
    }

    /// the name bytes covered by the declared length
    pub fn name(&self) -> &[u8] {
        let len = (self.name_len as usize).min(NAME_LEN_MAX);
        &self.name[..len]
    }

    /// the sunspot count stored in this record
    pub fn sunspots(&self) -> u16 {
        self.sunspots
    }

    /// returns `true` if this record answers a lookup for `name`.
    ///
    /// The declared length must either equal the length of `name` or be [`NAME_LEN_MAX`].
    /// The stored bytes are then compared against `name` over the declared length, where
    /// the comparison ends early at a zero byte found in both. A full-capacity record
    /// therefore also matches a shorter name when its buffer is zero terminated right
    /// after that name.
    pub fn matches(&self, name: &[u8]) -> bool {
        let declared = self.name_len as usize;
        if declared > NAME_LEN_MAX {
            return false;
        }
        if declared != name.len() && declared != NAME_LEN_MAX {
            return false;
        }

        for (i, &stored) in self.name[..declared].iter().enumerate() {
            let wanted = name.get(i).copied().unwrap_or(0);
            if stored != wanted {
                return false;
            }
            if stored == 0 {
                break;
            }
        }
        true
    }
}

/// A human editable form of a [`Record`], used for building and dumping record files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// the name to look up
    pub name: String,
    /// the value returned for `name`
    pub sunspots: u16,
}

impl RecordEntry {
    /// converts this entry into a [`Record`]
    pub fn to_record(&self) -> Result<Record> {
        Record::new(self.name.as_bytes(), self.sunspots)
    }
}

impl From<&Record> for RecordEntry {
    fn from(rec: &Record) -> Self {
        RecordEntry {
            name: String::from_utf8_lossy(rec.name()).into_owned(),
            sunspots: rec.sunspots,
        }
    }
}

/// writes `records` to `writer` in file order
pub fn write_records<W: Write>(writer: &mut W, records: &[Record]) -> Result<()> {
    for rec in records {
        writer.write_all(&rec.to_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// reads every complete record from `reader`.
///
/// A truncated trailing record is skipped, as the lookup scan does.
pub fn read_records<R: Read>(reader: &mut R) -> Result<Vec<Record>> {
    let mut records = vec![];
    let mut buf = [0_u8; RECORD_SIZE];
    loop {
        match reader.read_exact(&mut buf) {
            Ok(()) => records.push(Record::from_bytes(&buf)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }
    if records.iter().any(|r| r.name_len as usize > NAME_LEN_MAX) {
        warn!("record file holds records with a declared name length above {}", NAME_LEN_MAX);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn exact_name_matches() {
        let rec = Record::new(b"alice", 42).unwrap();
        assert!(rec.matches(b"alice"));
        assert!(!rec.matches(b"alic"));
        assert!(!rec.matches(b"alicex"));
        assert!(!rec.matches(b"bob"));
    }

    #[test]
    fn full_capacity_name_matches() {
        let name = [b'x'; NAME_LEN_MAX];
        let rec = Record::new(&name, 7).unwrap();
        assert!(rec.matches(&name));
        assert!(!rec.matches(&name[..NAME_LEN_MAX - 1]));
    }

    #[test]
    fn full_capacity_declared_length_with_short_zero_terminated_name() {
        // a record whose length field claims full capacity but whose buffer ends early
        let mut bytes = Record::new(b"carol", 9).unwrap().to_bytes();
        bytes[0] = NAME_LEN_MAX as u8;
        let rec = Record::from_bytes(&bytes);
        assert!(rec.matches(b"carol"));
        assert!(!rec.matches(b"caro"));
    }

    #[test]
    fn oversized_declared_length_never_matches() {
        let mut bytes = Record::new(b"dave", 1).unwrap().to_bytes();
        bytes[0] = 200;
        let rec = Record::from_bytes(&bytes);
        assert!(!rec.matches(b"dave"));
        assert_eq!(rec.name().len(), NAME_LEN_MAX);
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(Record::new(b"", 1).is_err());
        assert!(Record::new(&[b'a'; NAME_LEN_MAX + 1], 1).is_err());
        assert!(Record::new(b"a\nb", 1).is_err());
        assert!(Record::new(b"a\0b", 1).is_err());
    }

    #[test]
    fn layout_is_little_endian_and_zero_padded() {
        let bytes = Record::new(b"ab", 0x0102).unwrap().to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..3], b"ab");
        assert!(bytes[3..30].iter().all(|&b| b == 0));
        assert_eq!(&bytes[30..], &[0x02, 0x01]);
    }

    #[test]
    fn read_records_skips_truncated_tail() {
        let recs = vec![
            Record::new(b"alice", 42).unwrap(),
            Record::new(b"bob", 3).unwrap(),
        ];
        let mut buf = vec![];
        write_records(&mut buf, &recs).unwrap();
        buf.extend_from_slice(&[5, b'e', b'v']);

        let read = read_records(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read, recs);
    }

    #[test]
    fn entry_conversion() {
        let entry = RecordEntry {
            name: "alice".to_owned(),
            sunspots: 42,
        };
        let rec = entry.to_record().unwrap();
        assert_eq!(RecordEntry::from(&rec), entry);
    }
}
