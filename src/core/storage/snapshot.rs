// src/core/storage/snapshot.rs

//! The snapshot loader: turns a binary dump file into `(key, value, expiry)`
//! entries for the store to merge, and holds the fixed empty dump a master
//! serves to replicas when no file has been loaded.
//!
//! Only the subset of the dump format that string keyspaces produce is
//! understood: the header, auxiliary fields, database selectors, hash table
//! size hints, both expiry opcodes, and string values (including the integer
//! encodings). The trailing checksum is not verified.

use crate::core::CitrineError;
use crate::core::storage::data_types::DataValue;
use bytes::Bytes;
use once_cell::sync::Lazy;
use std::path::Path;
use tracing::debug;

/// Hex dump of an empty keyspace: `REDIS0011` header, auxiliary metadata,
/// `FF` terminator, and the 8-byte checksum.
const EMPTY_SNAPSHOT_HEX: &str = "524544495330303131fa0972656469732d76657205372e322e30fa0a72656469732d62697473c040fa056374696d65c26d08bc65fa08757365642d6d656dc2b0c41000fa08616f662d62617365c000fff06e3bfec0ff5aa2";

/// The snapshot bytes served on PSYNC when no dump file has been loaded.
pub static EMPTY_SNAPSHOT: Lazy<Bytes> = Lazy::new(|| {
    Bytes::from(hex::decode(EMPTY_SNAPSHOT_HEX).expect("embedded snapshot constant is valid hex"))
});

/// One keyspace entry yielded by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub key: Bytes,
    pub value: DataValue,
    pub expires_at_ms: Option<u64>,
}

/// Reads and parses the dump file at `<dir>/<filename>`.
///
/// Returns `Ok(None)` when the file does not exist (a fresh server), otherwise
/// the raw file bytes (re-served on PSYNC) together with the parsed entries.
pub fn load_file(
    dir: &str,
    filename: &str,
) -> Result<Option<(Bytes, Vec<SnapshotEntry>)>, CitrineError> {
    let path = Path::new(dir).join(filename);
    if !path.exists() {
        debug!("No snapshot file at {}; starting empty.", path.display());
        return Ok(None);
    }
    let raw = std::fs::read(&path)?;
    let entries = parse_snapshot(&raw)?;
    Ok(Some((Bytes::from(raw), entries)))
}

/// Parses dump bytes into keyspace entries.
pub fn parse_snapshot(raw: &[u8]) -> Result<Vec<SnapshotEntry>, CitrineError> {
    let mut reader = SnapshotReader::new(raw);
    reader.parse()
}

/// A decoded length field: either a plain byte count or one of the special
/// string encodings.
enum Length {
    Plain(usize),
    Encoded(u8),
}

struct SnapshotReader<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> SnapshotReader<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    fn parse(&mut self) -> Result<Vec<SnapshotEntry>, CitrineError> {
        let magic = self.take(5)?;
        if magic != b"REDIS" {
            return Err(CitrineError::SnapshotError(
                "missing REDIS magic in dump header".to_string(),
            ));
        }
        // Four version digits follow the magic.
        self.take(4)?;

        let mut entries = Vec::new();
        let mut pending_expiry_ms: Option<u64> = None;

        loop {
            let opcode = self.take_byte()?;
            match opcode {
                // Auxiliary field: two strings, ignored.
                0xFA => {
                    self.read_string()?;
                    self.read_string()?;
                }
                // Database selector.
                0xFE => {
                    self.read_length()?;
                }
                // Hash table size hints.
                0xFB => {
                    self.read_length()?;
                    self.read_length()?;
                }
                // Expiry in milliseconds, 8 bytes little-endian.
                0xFC => {
                    let bytes = self.take(8)?;
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(bytes);
                    pending_expiry_ms = Some(u64::from_le_bytes(buf));
                }
                // Expiry in seconds, 4 bytes little-endian.
                0xFD => {
                    let bytes = self.take(4)?;
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(bytes);
                    pending_expiry_ms = Some(u64::from(u32::from_le_bytes(buf)) * 1_000);
                }
                // End of file; the 8-byte checksum after it is not verified.
                0xFF => break,
                // String value.
                0x00 => {
                    let key = self.read_string()?;
                    let value = self.read_string()?;
                    entries.push(SnapshotEntry {
                        key,
                        value: DataValue::String(value),
                        expires_at_ms: pending_expiry_ms.take(),
                    });
                }
                other => {
                    return Err(CitrineError::SnapshotError(format!(
                        "unsupported value type 0x{other:02x} in dump"
                    )));
                }
            }
        }

        Ok(entries)
    }

    /// Reads a length-encoded integer. The top two bits of the first byte
    /// select the width; `0b11` announces a specially-encoded string instead.
    fn read_length(&mut self) -> Result<Length, CitrineError> {
        let first = self.take_byte()?;
        match first >> 6 {
            0b00 => Ok(Length::Plain(usize::from(first & 0x3F))),
            0b01 => {
                let second = self.take_byte()?;
                Ok(Length::Plain(
                    (usize::from(first & 0x3F) << 8) | usize::from(second),
                ))
            }
            0b10 => {
                let bytes = self.take(4)?;
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Length::Plain(u32::from_be_bytes(buf) as usize))
            }
            _ => Ok(Length::Encoded(first & 0x3F)),
        }
    }

    fn read_string(&mut self) -> Result<Bytes, CitrineError> {
        match self.read_length()? {
            Length::Plain(len) => Ok(Bytes::copy_from_slice(self.take(len)?)),
            // Integer encodings decode to their decimal representation.
            Length::Encoded(0) => {
                let v = self.take_byte()? as i8;
                Ok(Bytes::from(v.to_string()))
            }
            Length::Encoded(1) => {
                let bytes = self.take(2)?;
                let mut buf = [0u8; 2];
                buf.copy_from_slice(bytes);
                Ok(Bytes::from(i16::from_le_bytes(buf).to_string()))
            }
            Length::Encoded(2) => {
                let bytes = self.take(4)?;
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Bytes::from(i32::from_le_bytes(buf).to_string()))
            }
            Length::Encoded(enc) => Err(CitrineError::SnapshotError(format!(
                "unsupported string encoding {enc} in dump"
            ))),
        }
    }

    fn take_byte(&mut self) -> Result<u8, CitrineError> {
        let byte = *self
            .src
            .get(self.pos)
            .ok_or_else(|| CitrineError::SnapshotError("truncated dump".to_string()))?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CitrineError> {
        if self.pos + n > self.src.len() {
            return Err(CitrineError::SnapshotError("truncated dump".to_string()));
        }
        let slice = &self.src[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}
