//! Document record format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record)
//! +------------------+
//! | Collection       | (length-prefixed string)
//! +------------------+
//! | Document Key     | (length-prefixed string)
//! +------------------+
//! | Tombstone Flag   | (u8: 0 = live, 1 = deleted)
//! +------------------+
//! | Document Body    | (length-prefixed bytes, JSON)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Cursor, Read};

use super::checksum::compute_checksum;

/// len + collection len + key len + tombstone + body len + checksum
pub const MIN_RECORD_SIZE: usize = 4 + 4 + 4 + 1 + 4 + 4;

/// One append-only record of the document file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Owning collection
    pub collection: String,
    /// Canonical `_id` text
    pub document_key: String,
    /// Whether this is a tombstone (deleted document)
    pub is_tombstone: bool,
    /// Serialized JSON document (empty for tombstones)
    pub body: Vec<u8>,
}

impl DocumentRecord {
    /// Create a record for a live document
    pub fn live(collection: impl Into<String>, document_key: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            collection: collection.into(),
            document_key: document_key.into(),
            is_tombstone: false,
            body,
        }
    }

    /// Create a tombstone record for a deleted document
    pub fn tombstone(collection: impl Into<String>, document_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            document_key: document_key.into(),
            is_tombstone: true,
            body: Vec::new(),
        }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        buf.extend_from_slice(&(self.collection.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.collection.as_bytes());

        buf.extend_from_slice(&(self.document_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.document_key.as_bytes());

        buf.push(if self.is_tombstone { 1 } else { 0 });

        buf.extend_from_slice(&(self.body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.body);

        buf
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();

        // Record length = 4 (length) + body.len() + 4 (checksum)
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);

        let checksum = compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Decodes one record from the front of `data`, checking the checksum
    /// before looking at any field. Returns the record and its length.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        let record_length = data
            .get(..4)
            .map(le_u32)
            .ok_or_else(|| invalid("record shorter than its length prefix"))? as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(invalid(format!(
                "record length {} below minimum {}",
                record_length, MIN_RECORD_SIZE
            )));
        }
        let record = data.get(..record_length).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record needs {} bytes, {} available", record_length, data.len()),
            )
        })?;

        let (covered, trailer) = record.split_at(record_length - 4);
        let stored = le_u32(trailer);
        let computed = compute_checksum(covered);
        if computed != stored {
            return Err(invalid(format!(
                "checksum mismatch (stored {:08x}, computed {:08x})",
                stored, computed
            )));
        }

        let fields = &covered[4..];
        let mut cursor = Cursor::new(fields);
        let collection = read_string(&mut cursor)?;
        let document_key = read_string(&mut cursor)?;

        let mut flag = [0u8; 1];
        cursor.read_exact(&mut flag)?;
        let is_tombstone = match flag[0] {
            0 => false,
            1 => true,
            other => return Err(invalid(format!("tombstone flag {} is neither 0 nor 1", other))),
        };

        let body = read_bytes(&mut cursor)?;
        if cursor.position() as usize != fields.len() {
            return Err(invalid("unused bytes before checksum"));
        }

        Ok((
            Self {
                collection,
                document_key,
                is_tombstone,
                body,
            },
            record_length,
        ))
    }
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_string<R: Read>(reader: &mut R) -> io::Result<String> {
    String::from_utf8(read_bytes(reader)?).map_err(|e| invalid(format!("name is not UTF-8: {}", e)))
}
